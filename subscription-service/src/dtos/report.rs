use serde::Deserialize;
use service_core::error::AppError;

use crate::models::StatusFilter;
use crate::services::pdf::{header_text, GridOptions, Orientation};
use crate::services::ReportFilter;

/// Query of the report and its PDF rendering.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub char_limit: Option<usize>,
    #[serde(rename = "subscriberStatus")]
    pub subscriber_status: Option<String>,
    #[serde(rename = "subscriberType")]
    pub subscriber_type: Option<String>,
    #[serde(rename = "subscriberCategory")]
    pub subscriber_category: Option<String>,
    pub cols: Option<usize>,
    pub rows: Option<usize>,
    pub orientation: Option<String>,
}

impl ReportQuery {
    pub fn filter(&self, default_char_limit: usize) -> Result<ReportFilter, AppError> {
        let char_limit = self.char_limit.unwrap_or(default_char_limit);
        if char_limit == 0 {
            return Err(AppError::validation(
                "char_limit",
                "range",
                "char_limit must be positive",
            ));
        }

        Ok(ReportFilter {
            status: StatusFilter::from_param(self.subscriber_status.as_deref()),
            subscriber_type: non_empty(&self.subscriber_type),
            subscriber_category: non_empty(&self.subscriber_category),
            char_limit,
        })
    }

    pub fn grid(&self, char_limit: usize) -> Result<GridOptions, AppError> {
        GridOptions::new(
            self.cols,
            self.rows,
            Orientation::parse(self.orientation.as_deref())?,
            char_limit,
        )
    }

    /// Echoes the requested status, falling back to the default filter.
    pub fn header(&self, filter: &ReportFilter) -> String {
        let status = non_empty(&self.subscriber_status);
        header_text(
            status.as_deref().unwrap_or(filter.status.as_str()),
            filter.subscriber_category.as_deref(),
            filter.subscriber_type.as_deref(),
        )
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = ReportQuery::default();
        let filter = query.filter(42).unwrap();
        assert_eq!(filter.status, StatusFilter::Active);
        assert_eq!(filter.char_limit, 42);
        assert!(filter.subscriber_category.is_none());

        let grid = query.grid(filter.char_limit).unwrap();
        assert_eq!((grid.columns, grid.rows), (2, 5));
        assert_eq!(grid.orientation, Orientation::Portrait);
        assert_eq!(
            query.header(&filter),
            "Status: Active | Category: ALL | Type: ALL"
        );
    }

    #[test]
    fn test_blank_names_mean_all_and_unknown_status_means_all() {
        let query = ReportQuery {
            subscriber_status: Some("everything".to_string()),
            subscriber_category: Some("  ".to_string()),
            subscriber_type: Some("Gift".to_string()),
            ..Default::default()
        };
        let filter = query.filter(42).unwrap();
        assert_eq!(filter.status, StatusFilter::All);
        assert!(filter.subscriber_category.is_none());
        assert_eq!(
            query.header(&filter),
            "Status: Everything | Category: ALL | Type: Gift"
        );
    }

    #[test]
    fn test_zero_char_limit_is_rejected() {
        let query = ReportQuery {
            char_limit: Some(0),
            ..Default::default()
        };
        assert!(matches!(query.filter(42), Err(AppError::ValidationError(_))));
    }
}
