use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;

use crate::models::{
    AdminSession, AdminUser, Lookup, LookupKind, MagazineSubscriber, PaymentMode, PlanLineage,
    SearchField, SubscriberFilter, Subscription, SubscriptionPlan,
};

/// Persistence contract for every record the service manages.
///
/// `replace_*` and `delete_*` return `false` when no record has the given id.
/// Unique constraint violations surface as `AppError::Conflict`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    /// Next value of a named sequence, starting at 1.
    async fn next_sequence(&self, counter: &str) -> Result<u64, AppError>;

    // Lookups

    async fn insert_lookup(&self, kind: LookupKind, lookup: &Lookup) -> Result<(), AppError>;
    async fn get_lookup(&self, kind: LookupKind, id: &str) -> Result<Option<Lookup>, AppError>;
    async fn find_lookup_by_name(
        &self,
        kind: LookupKind,
        name: &str,
    ) -> Result<Option<Lookup>, AppError>;
    async fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>, AppError>;
    async fn replace_lookup(&self, kind: LookupKind, lookup: &Lookup) -> Result<bool, AppError>;
    async fn delete_lookup(&self, kind: LookupKind, id: &str) -> Result<bool, AppError>;

    // Payment modes

    async fn insert_payment_mode(&self, mode: &PaymentMode) -> Result<(), AppError>;
    async fn get_payment_mode(&self, id: &str) -> Result<Option<PaymentMode>, AppError>;
    async fn list_payment_modes(&self) -> Result<Vec<PaymentMode>, AppError>;
    async fn replace_payment_mode(&self, mode: &PaymentMode) -> Result<bool, AppError>;
    async fn delete_payment_mode(&self, id: &str) -> Result<bool, AppError>;

    // Plans

    async fn insert_plan(&self, plan: &SubscriptionPlan) -> Result<(), AppError>;
    async fn get_plan(&self, id: &str) -> Result<Option<SubscriptionPlan>, AppError>;
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError>;
    /// Highest version number in the lineage.
    async fn latest_plan_in_lineage(
        &self,
        lineage: &PlanLineage,
    ) -> Result<Option<SubscriptionPlan>, AppError>;
    async fn replace_plan(&self, plan: &SubscriptionPlan) -> Result<bool, AppError>;
    async fn delete_plan(&self, id: &str) -> Result<bool, AppError>;

    // Subscribers

    async fn insert_subscriber(&self, subscriber: &MagazineSubscriber) -> Result<(), AppError>;
    async fn get_subscriber(&self, id: &str) -> Result<Option<MagazineSubscriber>, AppError>;
    /// Ordered by id, honouring the filter's skip and limit.
    async fn list_subscribers(
        &self,
        filter: &SubscriberFilter,
    ) -> Result<Vec<MagazineSubscriber>, AppError>;
    async fn count_subscribers(&self, filter: &SubscriberFilter) -> Result<u64, AppError>;
    /// Case-insensitive substring match on one field.
    async fn search_subscribers(
        &self,
        field: SearchField,
        query: &str,
    ) -> Result<Vec<MagazineSubscriber>, AppError>;
    async fn replace_subscriber(&self, subscriber: &MagazineSubscriber) -> Result<bool, AppError>;
    async fn set_subscriber_active_flag(&self, id: &str, value: bool) -> Result<bool, AppError>;
    async fn set_subscriber_deleted(&self, id: &str, deleted: bool) -> Result<bool, AppError>;

    // Subscriptions

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), AppError>;
    async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, AppError>;
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, AppError>;
    async fn list_subscriptions_for_subscriber(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<Subscription>, AppError>;
    async fn replace_subscription(&self, subscription: &Subscription) -> Result<bool, AppError>;
    async fn delete_subscription(&self, id: &str) -> Result<bool, AppError>;
    /// Active subscriptions of the subscriber ending on or after `today`.
    async fn count_current_subscriptions(
        &self,
        subscriber_id: &str,
        today: NaiveDate,
    ) -> Result<u64, AppError>;
    /// A subscription of the same subscriber and plan whose period
    /// intersects `[start_date, end_date]`, other than `exclude_id`.
    async fn find_overlapping_subscription(
        &self,
        subscriber_id: &str,
        plan_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<Option<Subscription>, AppError>;
    async fn count_subscriptions_for_plan(&self, plan_id: &str) -> Result<u64, AppError>;

    // Admins and sessions

    async fn insert_admin(&self, admin: &AdminUser) -> Result<(), AppError>;
    async fn get_admin(&self, id: &str) -> Result<Option<AdminUser>, AppError>;
    async fn find_admin_by_username(&self, username: &str)
        -> Result<Option<AdminUser>, AppError>;
    async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError>;
    async fn replace_admin(&self, admin: &AdminUser) -> Result<bool, AppError>;
    async fn delete_admin(&self, id: &str) -> Result<bool, AppError>;

    async fn insert_session(&self, session: &AdminSession) -> Result<(), AppError>;
    async fn find_session(&self, token_digest: &str) -> Result<Option<AdminSession>, AppError>;
    async fn delete_session(&self, token_digest: &str) -> Result<bool, AppError>;
    async fn delete_sessions_for_admin(&self, admin_id: &str) -> Result<u64, AppError>;
}
