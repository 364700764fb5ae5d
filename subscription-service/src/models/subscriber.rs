use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagazineSubscriber {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub registration_number: Option<String>,
    pub address: String,
    pub city_town: String,
    pub district: Option<String>,
    pub state: String,
    pub pincode: String,
    pub phone: String,
    pub email: Option<String>,
    pub category_id: Option<String>,
    pub stype_id: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "hasActiveSubscriptions", default)]
    pub has_active_subscriptions: bool,
    #[serde(rename = "isDeleted", default)]
    pub is_deleted: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Which side of the soft-delete flag a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
    All,
}

impl StatusFilter {
    /// `active` and `inactive` select on the soft-delete flag, anything else means all.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("active") => StatusFilter::Active,
            Some("inactive") => StatusFilter::Inactive,
            Some(_) => StatusFilter::All,
        }
    }

    pub fn is_deleted(&self) -> Option<bool> {
        match self {
            StatusFilter::Active => Some(false),
            StatusFilter::Inactive => Some(true),
            StatusFilter::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Inactive => "inactive",
            StatusFilter::All => "all",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscriberFilter {
    pub status: StatusFilter,
    pub category_id: Option<String>,
    pub stype_id: Option<String>,
    pub skip: u64,
    pub limit: Option<i64>,
}

impl SubscriberFilter {
    pub fn matches(&self, subscriber: &MagazineSubscriber) -> bool {
        if let Some(deleted) = self.status.is_deleted() {
            if subscriber.is_deleted != deleted {
                return false;
            }
        }
        if let Some(category_id) = &self.category_id {
            if subscriber.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }
        if let Some(stype_id) = &self.stype_id {
            if subscriber.stype_id.as_ref() != Some(stype_id) {
                return false;
            }
        }
        true
    }
}

/// Fields open to substring search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    RegistrationNumber,
    Address,
    CityTown,
    District,
    State,
    Pincode,
    Phone,
    Email,
    Notes,
}

impl SearchField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "name" => Some(SearchField::Name),
            "registration_number" => Some(SearchField::RegistrationNumber),
            "address" => Some(SearchField::Address),
            "city_town" => Some(SearchField::CityTown),
            "district" => Some(SearchField::District),
            "state" => Some(SearchField::State),
            "pincode" => Some(SearchField::Pincode),
            "phone" => Some(SearchField::Phone),
            "email" => Some(SearchField::Email),
            "notes" => Some(SearchField::Notes),
            _ => None,
        }
    }

    /// Stored document field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::RegistrationNumber => "registration_number",
            SearchField::Address => "address",
            SearchField::CityTown => "city_town",
            SearchField::District => "district",
            SearchField::State => "state",
            SearchField::Pincode => "pincode",
            SearchField::Phone => "phone",
            SearchField::Email => "email",
            SearchField::Notes => "notes",
        }
    }

    pub fn value_of<'a>(&self, subscriber: &'a MagazineSubscriber) -> Option<&'a str> {
        match self {
            SearchField::Name => Some(subscriber.name.as_str()),
            SearchField::RegistrationNumber => subscriber.registration_number.as_deref(),
            SearchField::Address => Some(subscriber.address.as_str()),
            SearchField::CityTown => Some(subscriber.city_town.as_str()),
            SearchField::District => subscriber.district.as_deref(),
            SearchField::State => Some(subscriber.state.as_str()),
            SearchField::Pincode => Some(subscriber.pincode.as_str()),
            SearchField::Phone => Some(subscriber.phone.as_str()),
            SearchField::Email => subscriber.email.as_deref(),
            SearchField::Notes => subscriber.notes.as_deref(),
        }
    }
}
