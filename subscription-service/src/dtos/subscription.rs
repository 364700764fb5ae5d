use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use super::non_blank;
use crate::models::{PaymentStatus, Subscription};
use crate::services::period::parse_date_field;
use crate::services::subscriptions::SubscriptionDraft;

#[derive(Debug, Deserialize, Validate)]
pub struct SubscriptionRequest {
    #[validate(length(min = 1, message = "Subscriber is required"))]
    pub subscriber: String,
    pub subscription_plan: Option<String>,
    pub start_date: Option<String>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub payment_mode: Option<String>,
    #[validate(length(max = 100, message = "Payment id must be at most 100 characters"))]
    pub payment_id: Option<String>,
    pub payment_date: Option<String>,
}

impl SubscriptionRequest {
    pub fn into_draft(self) -> Result<SubscriptionDraft, AppError> {
        let plan_id = non_blank(self.subscription_plan).ok_or_else(|| {
            AppError::validation(
                "subscription_plan",
                "required",
                "Subscription plan is required",
            )
        })?;
        let start_date = parse_date_field("start_date", self.start_date.as_deref())?;
        let payment_date = parse_date_field("payment_date", self.payment_date.as_deref())?;

        Ok(SubscriptionDraft {
            subscriber_id: self.subscriber.trim().to_string(),
            plan_id,
            start_date,
            payment_status: self.payment_status,
            payment_mode_id: non_blank(self.payment_mode),
            payment_id: non_blank(self.payment_id),
            payment_date,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub subscriber: String,
    pub subscription_plan: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
    pub payment_status: PaymentStatus,
    pub payment_mode: Option<String>,
    pub payment_id: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id,
            subscriber: subscription.subscriber_id,
            subscription_plan: subscription.plan_id,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            active: subscription.active,
            payment_status: subscription.payment_status,
            payment_mode: subscription.payment_mode_id,
            payment_id: subscription.payment_id,
            payment_date: subscription.payment_date,
        }
    }
}
