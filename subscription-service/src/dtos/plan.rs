use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use crate::models::SubscriptionPlan;
use crate::services::period::parse_date_field;
use crate::services::plans::PlanTerms;
use crate::services::versioning::validate_plan_terms;

/// Body of plan create and replace. Every field is optional at the JSON
/// level so that missing values surface as field-level validation errors.
#[derive(Debug, Deserialize, Validate)]
pub struct PlanRequest {
    pub subscription_language: Option<String>,
    pub subscription_mode: Option<String>,
    pub duration_in_months: Option<i32>,
    pub subscription_price: Option<Decimal>,
    pub start_date: Option<String>,
}

impl PlanRequest {
    pub fn into_terms(self) -> Result<PlanTerms, AppError> {
        validate_plan_terms(
            self.subscription_language.as_deref(),
            self.subscription_mode.as_deref(),
            self.duration_in_months,
            self.subscription_price,
        )?;
        let start_date = parse_date_field("start_date", self.start_date.as_deref())?;

        match (
            self.subscription_language,
            self.subscription_mode,
            self.duration_in_months,
            self.subscription_price,
        ) {
            (Some(language_id), Some(mode_id), Some(duration_in_months), Some(price)) => {
                Ok(PlanTerms {
                    language_id: language_id.trim().to_string(),
                    mode_id: mode_id.trim().to_string(),
                    duration_in_months,
                    price,
                    start_date,
                })
            }
            _ => Err(AppError::validation(
                "plan",
                "required",
                "Language, mode, duration and price are required",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub version: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub subscription_price: Decimal,
    pub subscription_language: String,
    pub subscription_mode: String,
    pub duration_in_months: i32,
}

impl From<SubscriptionPlan> for PlanResponse {
    fn from(plan: SubscriptionPlan) -> Self {
        Self {
            id: plan.id,
            version: plan.version,
            name: plan.name,
            start_date: plan.start_date,
            subscription_price: plan.price,
            subscription_language: plan.language_id,
            subscription_mode: plan.mode_id,
            duration_in_months: plan.duration_in_months,
        }
    }
}
