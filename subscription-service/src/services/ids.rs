use std::sync::Arc;

use service_core::error::AppError;

use super::store::Store;

/// Entity families that receive generated identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    SubscriberCategory,
    SubscriberType,
    SubscriptionLanguage,
    SubscriptionMode,
    SubscriptionPlan,
    PaymentMode,
    Subscriber,
    Subscription,
    Admin,
}

impl EntityKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::SubscriberCategory => "SCAT",
            EntityKind::SubscriberType => "STYPE",
            EntityKind::SubscriptionLanguage => "SLANG",
            EntityKind::SubscriptionMode => "SMODE",
            EntityKind::SubscriptionPlan => "SPLAN",
            EntityKind::PaymentMode => "PMODE",
            EntityKind::Subscriber => "SUBS",
            EntityKind::Subscription => "SUBSCR",
            EntityKind::Admin => "ADMIN",
        }
    }

    /// Name of the sequence counter backing this kind.
    pub fn counter(&self) -> &'static str {
        match self {
            EntityKind::SubscriberCategory => "subscriber_category",
            EntityKind::SubscriberType => "subscriber_type",
            EntityKind::SubscriptionLanguage => "subscription_language",
            EntityKind::SubscriptionMode => "subscription_mode",
            EntityKind::SubscriptionPlan => "subscription_plan",
            EntityKind::PaymentMode => "payment_mode",
            EntityKind::Subscriber => "subscriber",
            EntityKind::Subscription => "subscription",
            EntityKind::Admin => "admin",
        }
    }
}

pub fn format_id(kind: EntityKind, sequence: u64) -> String {
    format!("{}{:06}", kind.prefix(), sequence)
}

/// Issues prefixed identifiers from per-kind sequences kept in the store.
#[derive(Clone)]
pub struct IdGenerator {
    store: Arc<dyn Store>,
}

impl IdGenerator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn next(&self, kind: EntityKind) -> Result<String, AppError> {
        let sequence = self.store.next_sequence(kind.counter()).await?;
        Ok(format_id(kind, sequence))
    }
}
