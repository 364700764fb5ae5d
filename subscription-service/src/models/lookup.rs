//! Named reference records: subscriber categories and types, subscription
//! languages and modes.

use serde::{Deserialize, Serialize};

use crate::services::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Category,
    SubscriberType,
    Language,
    Mode,
}

impl LookupKind {
    pub const ALL: [LookupKind; 4] = [
        LookupKind::Category,
        LookupKind::SubscriberType,
        LookupKind::Language,
        LookupKind::Mode,
    ];

    pub fn collection(&self) -> &'static str {
        match self {
            LookupKind::Category => "subscriber_categories",
            LookupKind::SubscriberType => "subscriber_types",
            LookupKind::Language => "subscription_languages",
            LookupKind::Mode => "subscription_modes",
        }
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            LookupKind::Category => EntityKind::SubscriberCategory,
            LookupKind::SubscriberType => EntityKind::SubscriberType,
            LookupKind::Language => EntityKind::SubscriptionLanguage,
            LookupKind::Mode => EntityKind::SubscriptionMode,
        }
    }

    pub fn max_name_length(&self) -> usize {
        match self {
            LookupKind::Category | LookupKind::SubscriberType => 255,
            LookupKind::Language | LookupKind::Mode => 50,
        }
    }

    /// Human readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            LookupKind::Category => "Subscriber category",
            LookupKind::SubscriberType => "Subscriber type",
            LookupKind::Language => "Subscription language",
            LookupKind::Mode => "Subscription mode",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lookup {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}
