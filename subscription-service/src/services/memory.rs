use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::store::Store;
use crate::models::{
    AdminSession, AdminUser, Lookup, LookupKind, MagazineSubscriber, PaymentMode, PlanLineage,
    SearchField, SubscriberFilter, Subscription, SubscriptionPlan,
};

#[derive(Default)]
struct Tables {
    counters: HashMap<String, u64>,
    lookups: HashMap<LookupKind, BTreeMap<String, Lookup>>,
    payment_modes: BTreeMap<String, PaymentMode>,
    plans: BTreeMap<String, SubscriptionPlan>,
    subscribers: BTreeMap<String, MagazineSubscriber>,
    subscriptions: BTreeMap<String, Subscription>,
    admins: BTreeMap<String, AdminUser>,
    sessions: HashMap<String, AdminSession>,
}

/// Process-local store keeping the same uniqueness rules as the MongoDB indexes.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("memory store lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("memory store lock poisoned")))
    }
}

fn duplicate(what: &str) -> AppError {
    AppError::conflict(format!("Record already exists: duplicate {}", what))
}

fn insert_new<T: Clone>(
    table: &mut BTreeMap<String, T>,
    id: &str,
    value: &T,
) -> Result<(), AppError> {
    if table.contains_key(id) {
        return Err(duplicate("_id"));
    }
    table.insert(id.to_string(), value.clone());
    Ok(())
}

fn replace_existing<T: Clone>(table: &mut BTreeMap<String, T>, id: &str, value: &T) -> bool {
    match table.get_mut(id) {
        Some(slot) => {
            *slot = value.clone();
            true
        }
        None => false,
    }
}

fn check_lookup_name(
    table: &BTreeMap<String, Lookup>,
    lookup: &Lookup,
) -> Result<(), AppError> {
    if table
        .values()
        .any(|other| other.id != lookup.id && other.name == lookup.name)
    {
        return Err(duplicate("name"));
    }
    Ok(())
}

fn check_plan_version(
    table: &BTreeMap<String, SubscriptionPlan>,
    plan: &SubscriptionPlan,
) -> Result<(), AppError> {
    let lineage = plan.lineage();
    if table.values().any(|other| {
        other.id != plan.id
            && other.lineage() == lineage
            && other.effective_version_number() == plan.effective_version_number()
    }) {
        return Err(duplicate("plan version"));
    }
    Ok(())
}

fn check_registration_number(
    table: &BTreeMap<String, MagazineSubscriber>,
    subscriber: &MagazineSubscriber,
) -> Result<(), AppError> {
    let Some(number) = subscriber.registration_number.as_ref() else {
        return Ok(());
    };
    if table.values().any(|other| {
        other.id != subscriber.id && other.registration_number.as_ref() == Some(number)
    }) {
        return Err(duplicate("registration_number"));
    }
    Ok(())
}

fn check_admin_identity(
    table: &BTreeMap<String, AdminUser>,
    admin: &AdminUser,
) -> Result<(), AppError> {
    for other in table.values().filter(|other| other.id != admin.id) {
        if other.username == admin.username {
            return Err(duplicate("username"));
        }
        if other.email == admin.email {
            return Err(duplicate("email"));
        }
        if other.aadhaar == admin.aadhaar {
            return Err(duplicate("aadhaar"));
        }
        if other.mobile == admin.mobile {
            return Err(duplicate("mobile"));
        }
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }

    async fn next_sequence(&self, counter: &str) -> Result<u64, AppError> {
        let mut tables = self.write()?;
        let value = tables.counters.entry(counter.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn insert_lookup(&self, kind: LookupKind, lookup: &Lookup) -> Result<(), AppError> {
        let mut tables = self.write()?;
        let table = tables.lookups.entry(kind).or_default();
        check_lookup_name(table, lookup)?;
        insert_new(table, &lookup.id, lookup)
    }

    async fn get_lookup(&self, kind: LookupKind, id: &str) -> Result<Option<Lookup>, AppError> {
        let tables = self.read()?;
        Ok(tables.lookups.get(&kind).and_then(|t| t.get(id)).cloned())
    }

    async fn find_lookup_by_name(
        &self,
        kind: LookupKind,
        name: &str,
    ) -> Result<Option<Lookup>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .lookups
            .get(&kind)
            .and_then(|t| t.values().find(|l| l.name == name))
            .cloned())
    }

    async fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .lookups
            .get(&kind)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn replace_lookup(&self, kind: LookupKind, lookup: &Lookup) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let table = tables.lookups.entry(kind).or_default();
        if !table.contains_key(&lookup.id) {
            return Ok(false);
        }
        check_lookup_name(table, lookup)?;
        Ok(replace_existing(table, &lookup.id, lookup))
    }

    async fn delete_lookup(&self, kind: LookupKind, id: &str) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        Ok(tables
            .lookups
            .get_mut(&kind)
            .and_then(|t| t.remove(id))
            .is_some())
    }

    async fn insert_payment_mode(&self, mode: &PaymentMode) -> Result<(), AppError> {
        let mut tables = self.write()?;
        insert_new(&mut tables.payment_modes, &mode.id, mode)
    }

    async fn get_payment_mode(&self, id: &str) -> Result<Option<PaymentMode>, AppError> {
        Ok(self.read()?.payment_modes.get(id).cloned())
    }

    async fn list_payment_modes(&self) -> Result<Vec<PaymentMode>, AppError> {
        Ok(self.read()?.payment_modes.values().cloned().collect())
    }

    async fn replace_payment_mode(&self, mode: &PaymentMode) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        Ok(replace_existing(&mut tables.payment_modes, &mode.id, mode))
    }

    async fn delete_payment_mode(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.write()?.payment_modes.remove(id).is_some())
    }

    async fn insert_plan(&self, plan: &SubscriptionPlan) -> Result<(), AppError> {
        let mut tables = self.write()?;
        check_plan_version(&tables.plans, plan)?;
        insert_new(&mut tables.plans, &plan.id, plan)
    }

    async fn get_plan(&self, id: &str) -> Result<Option<SubscriptionPlan>, AppError> {
        Ok(self.read()?.plans.get(id).cloned())
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        Ok(self.read()?.plans.values().cloned().collect())
    }

    async fn latest_plan_in_lineage(
        &self,
        lineage: &PlanLineage,
    ) -> Result<Option<SubscriptionPlan>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .plans
            .values()
            .filter(|plan| &plan.lineage() == lineage)
            .max_by_key(|plan| plan.effective_version_number())
            .cloned())
    }

    async fn replace_plan(&self, plan: &SubscriptionPlan) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        if !tables.plans.contains_key(&plan.id) {
            return Ok(false);
        }
        check_plan_version(&tables.plans, plan)?;
        Ok(replace_existing(&mut tables.plans, &plan.id, plan))
    }

    async fn delete_plan(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.write()?.plans.remove(id).is_some())
    }

    async fn insert_subscriber(&self, subscriber: &MagazineSubscriber) -> Result<(), AppError> {
        let mut tables = self.write()?;
        check_registration_number(&tables.subscribers, subscriber)?;
        insert_new(&mut tables.subscribers, &subscriber.id, subscriber)
    }

    async fn get_subscriber(&self, id: &str) -> Result<Option<MagazineSubscriber>, AppError> {
        Ok(self.read()?.subscribers.get(id).cloned())
    }

    async fn list_subscribers(
        &self,
        filter: &SubscriberFilter,
    ) -> Result<Vec<MagazineSubscriber>, AppError> {
        let tables = self.read()?;
        let matching = tables
            .subscribers
            .values()
            .filter(|s| filter.matches(s))
            .skip(filter.skip as usize)
            .cloned();
        Ok(match filter.limit {
            Some(limit) => matching.take(limit.max(0) as usize).collect(),
            None => matching.collect(),
        })
    }

    async fn count_subscribers(&self, filter: &SubscriberFilter) -> Result<u64, AppError> {
        let tables = self.read()?;
        Ok(tables.subscribers.values().filter(|s| filter.matches(s)).count() as u64)
    }

    async fn search_subscribers(
        &self,
        field: SearchField,
        query: &str,
    ) -> Result<Vec<MagazineSubscriber>, AppError> {
        let needle = query.to_lowercase();
        let tables = self.read()?;
        Ok(tables
            .subscribers
            .values()
            .filter(|s| {
                field
                    .value_of(s)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn replace_subscriber(&self, subscriber: &MagazineSubscriber) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        if !tables.subscribers.contains_key(&subscriber.id) {
            return Ok(false);
        }
        check_registration_number(&tables.subscribers, subscriber)?;
        Ok(replace_existing(&mut tables.subscribers, &subscriber.id, subscriber))
    }

    async fn set_subscriber_active_flag(&self, id: &str, value: bool) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        Ok(match tables.subscribers.get_mut(id) {
            Some(subscriber) => {
                subscriber.has_active_subscriptions = value;
                true
            }
            None => false,
        })
    }

    async fn set_subscriber_deleted(&self, id: &str, deleted: bool) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        Ok(match tables.subscribers.get_mut(id) {
            Some(subscriber) => {
                subscriber.is_deleted = deleted;
                true
            }
            None => false,
        })
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        let mut tables = self.write()?;
        insert_new(&mut tables.subscriptions, &subscription.id, subscription)
    }

    async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, AppError> {
        Ok(self.read()?.subscriptions.get(id).cloned())
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, AppError> {
        Ok(self.read()?.subscriptions.values().cloned().collect())
    }

    async fn list_subscriptions_for_subscriber(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .subscriptions
            .values()
            .filter(|s| s.subscriber_id == subscriber_id)
            .cloned()
            .collect())
    }

    async fn replace_subscription(&self, subscription: &Subscription) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        Ok(replace_existing(
            &mut tables.subscriptions,
            &subscription.id,
            subscription,
        ))
    }

    async fn delete_subscription(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.write()?.subscriptions.remove(id).is_some())
    }

    async fn count_current_subscriptions(
        &self,
        subscriber_id: &str,
        today: NaiveDate,
    ) -> Result<u64, AppError> {
        let tables = self.read()?;
        Ok(tables
            .subscriptions
            .values()
            .filter(|s| s.subscriber_id == subscriber_id && s.is_current(today))
            .count() as u64)
    }

    async fn find_overlapping_subscription(
        &self,
        subscriber_id: &str,
        plan_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<Option<Subscription>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .subscriptions
            .values()
            .find(|s| {
                s.subscriber_id == subscriber_id
                    && s.plan_id.as_deref() == Some(plan_id)
                    && Some(s.id.as_str()) != exclude_id
                    && s.overlaps(start_date, end_date)
            })
            .cloned())
    }

    async fn count_subscriptions_for_plan(&self, plan_id: &str) -> Result<u64, AppError> {
        let tables = self.read()?;
        Ok(tables
            .subscriptions
            .values()
            .filter(|s| s.plan_id.as_deref() == Some(plan_id))
            .count() as u64)
    }

    async fn insert_admin(&self, admin: &AdminUser) -> Result<(), AppError> {
        let mut tables = self.write()?;
        check_admin_identity(&tables.admins, admin)?;
        insert_new(&mut tables.admins, &admin.id, admin)
    }

    async fn get_admin(&self, id: &str) -> Result<Option<AdminUser>, AppError> {
        Ok(self.read()?.admins.get(id).cloned())
    }

    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .admins
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError> {
        Ok(self.read()?.admins.values().cloned().collect())
    }

    async fn replace_admin(&self, admin: &AdminUser) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        if !tables.admins.contains_key(&admin.id) {
            return Ok(false);
        }
        check_admin_identity(&tables.admins, admin)?;
        Ok(replace_existing(&mut tables.admins, &admin.id, admin))
    }

    async fn delete_admin(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.write()?.admins.remove(id).is_some())
    }

    async fn insert_session(&self, session: &AdminSession) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if tables.sessions.contains_key(&session.token_digest) {
            return Err(duplicate("session"));
        }
        tables
            .sessions
            .insert(session.token_digest.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<AdminSession>, AppError> {
        Ok(self.read()?.sessions.get(token_digest).cloned())
    }

    async fn delete_session(&self, token_digest: &str) -> Result<bool, AppError> {
        Ok(self.write()?.sessions.remove(token_digest).is_some())
    }

    async fn delete_sessions_for_admin(&self, admin_id: &str) -> Result<u64, AppError> {
        let mut tables = self.write()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.admin_id != admin_id);
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn plan(id: &str, version_number: i32, price: i64) -> SubscriptionPlan {
        SubscriptionPlan {
            id: id.to_string(),
            version: format!("v{}", version_number),
            version_number,
            name: "6 months - English - Print".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            price: Decimal::from(price),
            language_id: "SLANG000001".to_string(),
            mode_id: "SMODE000001".to_string(),
            duration_in_months: 6,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_plan_version_conflicts() {
        let store = MemoryStore::new();
        store.insert_plan(&plan("SPLAN000001", 1, 500)).await.unwrap();

        let err = store
            .insert_plan(&plan("SPLAN000002", 1, 600))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_latest_plan_orders_numerically() {
        let store = MemoryStore::new();
        store.insert_plan(&plan("SPLAN000001", 2, 500)).await.unwrap();
        store.insert_plan(&plan("SPLAN000002", 10, 700)).await.unwrap();
        store.insert_plan(&plan("SPLAN000003", 9, 600)).await.unwrap();

        let latest = store
            .latest_plan_in_lineage(&plan("x", 0, 0).lineage())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, "SPLAN000002");
    }

    #[tokio::test]
    async fn test_lookup_names_are_unique_per_kind() {
        let store = MemoryStore::new();
        let english = Lookup {
            id: "SLANG000001".to_string(),
            name: "English".to_string(),
        };
        store
            .insert_lookup(LookupKind::Language, &english)
            .await
            .unwrap();

        let clash = Lookup {
            id: "SLANG000002".to_string(),
            name: "English".to_string(),
        };
        assert!(store
            .insert_lookup(LookupKind::Language, &clash)
            .await
            .unwrap_err()
            .is_conflict());

        // Same name under another kind is fine.
        store
            .insert_lookup(LookupKind::Mode, &clash)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_missing_returns_false() {
        let store = MemoryStore::new();
        assert!(!store.replace_plan(&plan("SPLAN000009", 1, 500)).await.unwrap());
        assert!(!store.delete_subscription("SUBSCR000001").await.unwrap());
    }
}
