//! Store wrapper for service tests that observes subscriber flag writes.

use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::memory::MemoryStore;
use super::store::Store;
use crate::models::{
    AdminSession, AdminUser, Lookup, LookupKind, MagazineSubscriber, PaymentMode, PlanLineage,
    SearchField, SubscriberFilter, Subscription, SubscriptionPlan,
};

/// Counts `set_subscriber_active_flag` calls and can be told to fail them.
#[derive(Default)]
pub struct FlagWatchStore {
    inner: MemoryStore,
    flag_writes: AtomicUsize,
    fail_flag_writes: AtomicBool,
}

impl FlagWatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag_writes(&self) -> usize {
        self.flag_writes.load(Ordering::SeqCst)
    }

    pub fn fail_flag_writes(&self, fail: bool) {
        self.fail_flag_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for FlagWatchStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.inner.health_check().await
    }

    async fn next_sequence(&self, counter: &str) -> Result<u64, AppError> {
        self.inner.next_sequence(counter).await
    }

    async fn insert_lookup(&self, kind: LookupKind, lookup: &Lookup) -> Result<(), AppError> {
        self.inner.insert_lookup(kind, lookup).await
    }

    async fn get_lookup(&self, kind: LookupKind, id: &str) -> Result<Option<Lookup>, AppError> {
        self.inner.get_lookup(kind, id).await
    }

    async fn find_lookup_by_name(&self, kind: LookupKind, name: &str) -> Result<Option<Lookup>, AppError> {
        self.inner.find_lookup_by_name(kind, name).await
    }

    async fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>, AppError> {
        self.inner.list_lookups(kind).await
    }

    async fn replace_lookup(&self, kind: LookupKind, lookup: &Lookup) -> Result<bool, AppError> {
        self.inner.replace_lookup(kind, lookup).await
    }

    async fn delete_lookup(&self, kind: LookupKind, id: &str) -> Result<bool, AppError> {
        self.inner.delete_lookup(kind, id).await
    }

    async fn insert_payment_mode(&self, mode: &PaymentMode) -> Result<(), AppError> {
        self.inner.insert_payment_mode(mode).await
    }

    async fn get_payment_mode(&self, id: &str) -> Result<Option<PaymentMode>, AppError> {
        self.inner.get_payment_mode(id).await
    }

    async fn list_payment_modes(&self) -> Result<Vec<PaymentMode>, AppError> {
        self.inner.list_payment_modes().await
    }

    async fn replace_payment_mode(&self, mode: &PaymentMode) -> Result<bool, AppError> {
        self.inner.replace_payment_mode(mode).await
    }

    async fn delete_payment_mode(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_payment_mode(id).await
    }

    async fn insert_plan(&self, plan: &SubscriptionPlan) -> Result<(), AppError> {
        self.inner.insert_plan(plan).await
    }

    async fn get_plan(&self, id: &str) -> Result<Option<SubscriptionPlan>, AppError> {
        self.inner.get_plan(id).await
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        self.inner.list_plans().await
    }

    async fn latest_plan_in_lineage(&self, lineage: &PlanLineage) -> Result<Option<SubscriptionPlan>, AppError> {
        self.inner.latest_plan_in_lineage(lineage).await
    }

    async fn replace_plan(&self, plan: &SubscriptionPlan) -> Result<bool, AppError> {
        self.inner.replace_plan(plan).await
    }

    async fn delete_plan(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_plan(id).await
    }

    async fn insert_subscriber(&self, subscriber: &MagazineSubscriber) -> Result<(), AppError> {
        self.inner.insert_subscriber(subscriber).await
    }

    async fn get_subscriber(&self, id: &str) -> Result<Option<MagazineSubscriber>, AppError> {
        self.inner.get_subscriber(id).await
    }

    async fn list_subscribers(&self, filter: &SubscriberFilter) -> Result<Vec<MagazineSubscriber>, AppError> {
        self.inner.list_subscribers(filter).await
    }

    async fn count_subscribers(&self, filter: &SubscriberFilter) -> Result<u64, AppError> {
        self.inner.count_subscribers(filter).await
    }

    async fn search_subscribers(&self, field: SearchField, query: &str) -> Result<Vec<MagazineSubscriber>, AppError> {
        self.inner.search_subscribers(field, query).await
    }

    async fn replace_subscriber(&self, subscriber: &MagazineSubscriber) -> Result<bool, AppError> {
        self.inner.replace_subscriber(subscriber).await
    }

    async fn set_subscriber_active_flag(&self, id: &str, value: bool) -> Result<bool, AppError> {
        self.flag_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_flag_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!("flag write refused")));
        }
        self.inner.set_subscriber_active_flag(id, value).await
    }

    async fn set_subscriber_deleted(&self, id: &str, deleted: bool) -> Result<bool, AppError> {
        self.inner.set_subscriber_deleted(id, deleted).await
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.inner.insert_subscription(subscription).await
    }

    async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, AppError> {
        self.inner.get_subscription(id).await
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, AppError> {
        self.inner.list_subscriptions().await
    }

    async fn list_subscriptions_for_subscriber(&self, subscriber_id: &str) -> Result<Vec<Subscription>, AppError> {
        self.inner.list_subscriptions_for_subscriber(subscriber_id).await
    }

    async fn replace_subscription(&self, subscription: &Subscription) -> Result<bool, AppError> {
        self.inner.replace_subscription(subscription).await
    }

    async fn delete_subscription(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_subscription(id).await
    }

    async fn count_current_subscriptions(&self, subscriber_id: &str, today: NaiveDate) -> Result<u64, AppError> {
        self.inner.count_current_subscriptions(subscriber_id, today).await
    }

    async fn find_overlapping_subscription(
        &self,
        subscriber_id: &str,
        plan_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<Option<Subscription>, AppError> {
        self.inner
            .find_overlapping_subscription(subscriber_id, plan_id, start_date, end_date, exclude_id)
            .await
    }

    async fn count_subscriptions_for_plan(&self, plan_id: &str) -> Result<u64, AppError> {
        self.inner.count_subscriptions_for_plan(plan_id).await
    }

    async fn insert_admin(&self, admin: &AdminUser) -> Result<(), AppError> {
        self.inner.insert_admin(admin).await
    }

    async fn get_admin(&self, id: &str) -> Result<Option<AdminUser>, AppError> {
        self.inner.get_admin(id).await
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<AdminUser>, AppError> {
        self.inner.find_admin_by_username(username).await
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError> {
        self.inner.list_admins().await
    }

    async fn replace_admin(&self, admin: &AdminUser) -> Result<bool, AppError> {
        self.inner.replace_admin(admin).await
    }

    async fn delete_admin(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_admin(id).await
    }

    async fn insert_session(&self, session: &AdminSession) -> Result<(), AppError> {
        self.inner.insert_session(session).await
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<AdminSession>, AppError> {
        self.inner.find_session(token_digest).await
    }

    async fn delete_session(&self, token_digest: &str) -> Result<bool, AppError> {
        self.inner.delete_session(token_digest).await
    }

    async fn delete_sessions_for_admin(&self, admin_id: &str) -> Result<u64, AppError> {
        self.inner.delete_sessions_for_admin(admin_id).await
    }
}
