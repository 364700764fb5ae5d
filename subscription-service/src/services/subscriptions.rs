//! Subscription writes and the subscriber's aggregate "has active
//! subscriptions" flag.

use chrono::NaiveDate;
use service_core::error::AppError;
use std::sync::Arc;

use super::calendar::BusinessCalendar;
use super::ids::{EntityKind, IdGenerator};
use super::locks::{plan_reference_key, KeyedGuard, KeyedLocks};
use super::metrics::record_flag_update;
use super::period::resolve_period;
use super::store::Store;
use crate::models::{PaymentStatus, Subscription, SubscriptionPlan};

/// Validated subscription attributes from a create or replace request.
#[derive(Debug, Clone)]
pub struct SubscriptionDraft {
    pub subscriber_id: String,
    pub plan_id: String,
    pub start_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    pub payment_mode_id: Option<String>,
    pub payment_id: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

/// New value for the aggregate flag, if it differs from the stored one.
pub fn aggregate_update(current: bool, current_subscriptions: u64) -> Option<bool> {
    let next = current_subscriptions > 0;
    (next != current).then_some(next)
}

fn subscriber_key(subscriber_id: &str) -> String {
    format!("subscriber:{}", subscriber_id)
}

#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn Store>,
    ids: IdGenerator,
    locks: KeyedLocks,
    calendar: BusinessCalendar,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn Store>,
        ids: IdGenerator,
        locks: KeyedLocks,
        calendar: BusinessCalendar,
    ) -> Self {
        Self {
            store,
            ids,
            locks,
            calendar,
        }
    }

    pub async fn create(&self, draft: SubscriptionDraft) -> Result<Subscription, AppError> {
        let _guard = self.locks.lock(&subscriber_key(&draft.subscriber_id)).await;
        let _plan_guard = self.locks.lock(&plan_reference_key(&draft.plan_id)).await;
        let plan = self.check_references(&draft).await?;

        let today = self.calendar.today();
        let period = resolve_period(draft.start_date, plan_duration(&plan), today)?;
        self.reject_overlap(&draft, period.start_date, period.end_date, None)
            .await?;

        let now = self.calendar.now();
        let subscription = Subscription {
            id: self.ids.next(EntityKind::Subscription).await?,
            subscriber_id: draft.subscriber_id,
            plan_id: Some(draft.plan_id),
            start_date: period.start_date,
            end_date: period.end_date,
            active: period.active,
            payment_status: draft.payment_status,
            payment_mode_id: draft.payment_mode_id,
            payment_id: draft.payment_id,
            payment_date: draft.payment_date,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_subscription(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            subscriber_id = %subscription.subscriber_id,
            start_date = %subscription.start_date,
            end_date = %subscription.end_date,
            active = subscription.active,
            "Subscription created"
        );

        self.refresh_after_write(&subscription.subscriber_id, today)
            .await;
        Ok(subscription)
    }

    /// Full replacement. Period and activity are derived again from the
    /// request, so a lapsed subscription turns inactive on any edit.
    pub async fn replace(
        &self,
        id: &str,
        draft: SubscriptionDraft,
    ) -> Result<Subscription, AppError> {
        let existing = self
            .store
            .get_subscription(id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscription not found"))?;
        let _guards = self
            .lock_subscribers(&existing.subscriber_id, &draft.subscriber_id)
            .await;
        let _plan_guard = self.locks.lock(&plan_reference_key(&draft.plan_id)).await;
        let plan = self.check_references(&draft).await?;

        let today = self.calendar.today();
        let period = resolve_period(draft.start_date, plan_duration(&plan), today)?;
        self.reject_overlap(&draft, period.start_date, period.end_date, Some(id))
            .await?;

        let subscription = Subscription {
            id: existing.id.clone(),
            subscriber_id: draft.subscriber_id,
            plan_id: Some(draft.plan_id),
            start_date: period.start_date,
            end_date: period.end_date,
            active: period.active,
            payment_status: draft.payment_status,
            payment_mode_id: draft.payment_mode_id,
            payment_id: draft.payment_id,
            payment_date: draft.payment_date,
            created_at: existing.created_at,
            updated_at: self.calendar.now(),
        };
        if !self.store.replace_subscription(&subscription).await? {
            return Err(AppError::not_found("Subscription not found"));
        }

        tracing::info!(
            subscription_id = %subscription.id,
            end_date = %subscription.end_date,
            active = subscription.active,
            "Subscription replaced"
        );

        self.refresh_after_write(&subscription.subscriber_id, today)
            .await;
        if existing.subscriber_id != subscription.subscriber_id {
            self.refresh_after_write(&existing.subscriber_id, today)
                .await;
        }
        Ok(subscription)
    }

    pub async fn get(&self, id: &str) -> Result<Subscription, AppError> {
        self.store
            .get_subscription(id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscription not found"))
    }

    pub async fn list(&self) -> Result<Vec<Subscription>, AppError> {
        self.store.list_subscriptions().await
    }

    pub async fn list_for_subscriber(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        if self.store.get_subscriber(subscriber_id).await?.is_none() {
            return Err(AppError::not_found("Subscriber not found"));
        }
        self.store.list_subscriptions_for_subscriber(subscriber_id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let existing = self
            .store
            .get_subscription(id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscription not found"))?;
        let _guard = self
            .locks
            .lock(&subscriber_key(&existing.subscriber_id))
            .await;

        if !self.store.delete_subscription(id).await? {
            return Err(AppError::not_found("Subscription not found"));
        }
        tracing::info!(subscription_id = %id, "Subscription deleted");

        self.refresh_after_write(&existing.subscriber_id, self.calendar.today())
            .await;
        Ok(())
    }

    /// The subscription write already succeeded, so a failed refresh is
    /// logged and left for the next write of this subscriber to correct.
    async fn refresh_after_write(&self, subscriber_id: &str, today: NaiveDate) {
        if let Err(e) = self.refresh_subscriber_flag(subscriber_id, today).await {
            tracing::error!(
                subscriber_id = %subscriber_id,
                error = %e,
                "Failed to refresh subscriber aggregate flag"
            );
        }
    }

    /// Recompute the subscriber's aggregate flag and write it only when it
    /// changed. Callers hold the subscriber lock.
    async fn refresh_subscriber_flag(
        &self,
        subscriber_id: &str,
        today: NaiveDate,
    ) -> Result<bool, AppError> {
        let Some(subscriber) = self.store.get_subscriber(subscriber_id).await? else {
            tracing::warn!(subscriber_id = %subscriber_id, "Subscriber vanished before flag refresh");
            return Ok(false);
        };

        let current = self
            .store
            .count_current_subscriptions(subscriber_id, today)
            .await?;
        let Some(value) = aggregate_update(subscriber.has_active_subscriptions, current) else {
            return Ok(false);
        };

        self.store
            .set_subscriber_active_flag(subscriber_id, value)
            .await?;
        record_flag_update(value);
        tracing::info!(
            subscriber_id = %subscriber_id,
            has_active_subscriptions = value,
            "Subscriber aggregate flag updated"
        );
        Ok(true)
    }

    async fn check_references(
        &self,
        draft: &SubscriptionDraft,
    ) -> Result<SubscriptionPlan, AppError> {
        if self.store.get_subscriber(&draft.subscriber_id).await?.is_none() {
            return Err(AppError::not_found("Subscriber not found"));
        }
        let plan = self
            .store
            .get_plan(&draft.plan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscription plan not found"))?;
        if let Some(payment_mode_id) = &draft.payment_mode_id {
            if self.store.get_payment_mode(payment_mode_id).await?.is_none() {
                return Err(AppError::not_found("Payment mode not found"));
            }
        }
        Ok(plan)
    }

    async fn reject_overlap(
        &self,
        draft: &SubscriptionDraft,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<(), AppError> {
        let overlapping = self
            .store
            .find_overlapping_subscription(
                &draft.subscriber_id,
                &draft.plan_id,
                start_date,
                end_date,
                exclude_id,
            )
            .await?;
        match overlapping {
            Some(other) => Err(AppError::conflict(format!(
                "Duplicate subscription not allowed: overlaps {}",
                other.id
            ))),
            None => Ok(()),
        }
    }

    /// Lock one or two subscribers in a fixed order.
    async fn lock_subscribers(&self, a: &str, b: &str) -> Vec<KeyedGuard> {
        let mut keys = vec![subscriber_key(a), subscriber_key(b)];
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.locks.lock(&key).await);
        }
        guards
    }
}

fn plan_duration(plan: &SubscriptionPlan) -> u32 {
    plan.duration_in_months.max(0) as u32
}
