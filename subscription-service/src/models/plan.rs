//! Subscription plan model and version tag helpers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Render the public tag for a version number.
pub fn version_tag(number: i32) -> String {
    format!("v{}", number)
}

/// Numeric suffix of a `v{n}` tag. Malformed tags count as version 0.
pub fn parse_version_tag(tag: &str) -> i32 {
    tag.trim()
        .trim_start_matches('v')
        .parse::<i32>()
        .map(|n| n.max(0))
        .unwrap_or(0)
}

/// The (language, mode, duration) triple that groups plans into one lineage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanLineage {
    pub language_id: String,
    pub mode_id: String,
    pub duration_in_months: i32,
}

impl PlanLineage {
    pub fn lock_key(&self) -> String {
        format!(
            "plan:{}:{}:{}",
            self.language_id, self.mode_id, self.duration_in_months
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(rename = "_id")]
    pub id: String,
    pub version: String,
    /// Ordering key within a lineage. Older records may only carry `version`.
    #[serde(default)]
    pub version_number: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub price: Decimal,
    pub language_id: String,
    pub mode_id: String,
    pub duration_in_months: i32,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionPlan {
    pub fn lineage(&self) -> PlanLineage {
        PlanLineage {
            language_id: self.language_id.clone(),
            mode_id: self.mode_id.clone(),
            duration_in_months: self.duration_in_months,
        }
    }

    pub fn effective_version_number(&self) -> i32 {
        if self.version_number > 0 {
            self.version_number
        } else {
            parse_version_tag(&self.version)
        }
    }

    pub fn display_name(duration_in_months: i32, language: &str, mode: &str) -> String {
        format!("{} months - {} - {}", duration_in_months, language, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_tag() {
        assert_eq!(parse_version_tag("v1"), 1);
        assert_eq!(parse_version_tag("v12"), 12);
        assert_eq!(parse_version_tag("vv3"), 3);
        assert_eq!(parse_version_tag("version-two"), 0);
        assert_eq!(parse_version_tag(""), 0);
        assert_eq!(parse_version_tag("v-4"), 0);
    }

    #[test]
    fn test_version_tag_round_trip() {
        assert_eq!(version_tag(7), "v7");
        assert_eq!(parse_version_tag(&version_tag(10)), 10);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            SubscriptionPlan::display_name(6, "English", "Print"),
            "6 months - English - Print"
        );
    }
}
