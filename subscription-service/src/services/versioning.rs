//! Plan version resolution within a lineage.

use rust_decimal::Decimal;
use service_core::error::AppError;
use validator::{ValidationError, ValidationErrors};

use crate::models::{version_tag, SubscriptionPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDecision {
    /// No plan exists for the lineage yet.
    First,
    /// Price matches the latest plan, its version is kept.
    Reuse(i32),
    /// Price differs from the latest plan, a new version is minted.
    Next(i32),
}

impl VersionDecision {
    pub fn number(&self) -> i32 {
        match self {
            VersionDecision::First => 1,
            VersionDecision::Reuse(n) | VersionDecision::Next(n) => *n,
        }
    }

    pub fn tag(&self) -> String {
        version_tag(self.number())
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            VersionDecision::First => "first",
            VersionDecision::Reuse(_) => "reused",
            VersionDecision::Next(_) => "minted",
        }
    }
}

pub fn resolve_version(latest: Option<&SubscriptionPlan>, price: Decimal) -> VersionDecision {
    match latest {
        None => VersionDecision::First,
        Some(plan) if plan.price == price => VersionDecision::Reuse(plan.effective_version_number()),
        Some(plan) => VersionDecision::Next(plan.effective_version_number() + 1),
    }
}

/// Preconditions checked before any lookup or write.
pub fn validate_plan_terms(
    language_id: Option<&str>,
    mode_id: Option<&str>,
    duration_in_months: Option<i32>,
    price: Option<Decimal>,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    if language_id.map_or(true, |v| v.trim().is_empty()) {
        errors.add("language", field_error("required", "Language is required"));
    }
    if mode_id.map_or(true, |v| v.trim().is_empty()) {
        errors.add("mode", field_error("required", "Mode is required"));
    }
    if duration_in_months.map_or(true, |d| d <= 0) {
        errors.add(
            "duration_in_months",
            field_error("range", "Duration must be a positive number of months"),
        );
    }
    if price.map_or(true, |p| p <= Decimal::ZERO) {
        errors.add("price", field_error("range", "Price must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(errors))
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;

    fn plan(version: &str, version_number: i32, price: &str) -> SubscriptionPlan {
        SubscriptionPlan {
            id: "SPLAN000001".to_string(),
            version: version.to_string(),
            version_number,
            name: "6 months - English - Print".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            price: Decimal::from_str(price).unwrap(),
            language_id: "SLANG000001".to_string(),
            mode_id: "SMODE000001".to_string(),
            duration_in_months: 6,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_plan_is_v1() {
        let decision = resolve_version(None, Decimal::from(500));
        assert_eq!(decision, VersionDecision::First);
        assert_eq!(decision.tag(), "v1");
    }

    #[test]
    fn test_same_price_reuses_latest_version() {
        let latest = plan("v2", 2, "600.00");
        let decision = resolve_version(Some(&latest), Decimal::from(600));
        assert_eq!(decision, VersionDecision::Reuse(2));
        assert_eq!(decision.tag(), "v2");
    }

    #[test]
    fn test_new_price_mints_next_version() {
        let latest = plan("v9", 9, "500");
        let decision = resolve_version(Some(&latest), Decimal::from(600));
        assert_eq!(decision, VersionDecision::Next(10));
        assert_eq!(decision.tag(), "v10");
    }

    #[test]
    fn test_legacy_tag_without_number() {
        let latest = plan("v4", 0, "500");
        assert_eq!(
            resolve_version(Some(&latest), Decimal::from(550)),
            VersionDecision::Next(5)
        );

        let malformed = plan("draft", 0, "500");
        assert_eq!(
            resolve_version(Some(&malformed), Decimal::from(550)).tag(),
            "v1"
        );
    }

    #[test]
    fn test_validate_plan_terms() {
        assert!(validate_plan_terms(
            Some("SLANG000001"),
            Some("SMODE000001"),
            Some(6),
            Some(Decimal::from(500))
        )
        .is_ok());

        let err = validate_plan_terms(None, Some(" "), Some(0), Some(Decimal::ZERO)).unwrap_err();
        match err {
            AppError::ValidationError(errors) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("language"));
                assert!(fields.contains_key("mode"));
                assert!(fields.contains_key("duration_in_months"));
                assert!(fields.contains_key("price"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_negative_price_rejected() {
        assert!(validate_plan_terms(
            Some("SLANG000001"),
            Some("SMODE000001"),
            Some(3),
            Some(Decimal::from(-1))
        )
        .is_err());
    }
}
