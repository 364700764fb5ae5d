use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::subscription::SubscriptionResponse;
use crate::models::MagazineSubscriber;

#[derive(Debug, Deserialize, Validate)]
pub struct SubscriberRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
    #[validate(length(max = 255))]
    pub registration_number: Option<String>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, max = 255, message = "City/town is required"))]
    pub city_town: String,
    #[validate(length(max = 255))]
    pub district: Option<String>,
    #[validate(length(min = 1, max = 255, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 6, message = "Pincode is required (max 6 characters)"))]
    pub pincode: String,
    #[validate(length(min = 1, max = 10, message = "Phone is required (max 10 characters)"))]
    pub phone: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "Subscriber type is required"))]
    pub stype: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSubscribersQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub filter: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriberResponse {
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
    pub category: Option<String>,
    pub stype: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "hasActiveSubscriptions")]
    pub has_active_subscriptions: bool,
    #[serde(rename = "isDeleted")]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<Vec<SubscriptionResponse>>,
}

impl From<MagazineSubscriber> for SubscriberResponse {
    fn from(subscriber: MagazineSubscriber) -> Self {
        Self {
            id: subscriber.id,
            name: subscriber.name,
            registration_number: subscriber.registration_number,
            address: subscriber.address,
            city_town: subscriber.city_town,
            district: subscriber.district,
            state: subscriber.state,
            pincode: subscriber.pincode,
            phone: subscriber.phone,
            email: subscriber.email,
            category: subscriber.category_id,
            stype: subscriber.stype_id,
            notes: subscriber.notes,
            has_active_subscriptions: subscriber.has_active_subscriptions,
            is_deleted: subscriber.is_deleted,
            created_at: subscriber.created_at,
            subscriptions: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriberPage {
    pub items: Vec<SubscriberResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}
