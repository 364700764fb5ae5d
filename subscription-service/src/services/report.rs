//! Flat subscriber report used by the JSON and PDF exports.

use serde::Serialize;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;

use super::store::Store;
use crate::models::{LookupKind, MagazineSubscriber, StatusFilter, SubscriberFilter};

pub const DEFAULT_CHAR_LIMIT: usize = 42;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Active")]
    pub active: bool,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Type")]
    pub stype: String,
    #[serde(rename = "Address line 1")]
    pub address_line_1: String,
    #[serde(rename = "Address line 2")]
    pub address_line_2: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Pincode")]
    pub pincode: String,
    #[serde(rename = "Phone Number")]
    pub phone: String,
}

/// Report selection after name lookups are resolved.
#[derive(Debug, Clone)]
pub struct ReportFilter {
    pub status: StatusFilter,
    pub subscriber_type: Option<String>,
    pub subscriber_category: Option<String>,
    pub char_limit: usize,
}

impl Default for ReportFilter {
    fn default() -> Self {
        Self {
            status: StatusFilter::Active,
            subscriber_type: None,
            subscriber_category: None,
            char_limit: DEFAULT_CHAR_LIMIT,
        }
    }
}

/// Break an address into lines of at most `char_limit` characters,
/// preferring to cut at the last space that fits.
pub fn split_address(address: &str, char_limit: usize) -> Vec<String> {
    let char_limit = char_limit.max(1);
    let mut remaining: Vec<char> = address.chars().collect();
    if remaining.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    while remaining.len() > char_limit {
        let split_at = remaining[..char_limit]
            .iter()
            .rposition(|c| *c == ' ')
            .filter(|at| *at > 0)
            .unwrap_or(char_limit);
        let line: String = remaining[..split_at].iter().collect();
        lines.push(line.trim().to_string());
        let rest: String = remaining[split_at..].iter().collect();
        remaining = rest.trim().chars().collect();
    }
    lines.push(remaining.into_iter().collect());
    lines
}

pub fn build_row(
    subscriber: &MagazineSubscriber,
    category: Option<&str>,
    stype: Option<&str>,
    char_limit: usize,
) -> ReportRow {
    let mut address = split_address(&subscriber.address, char_limit).into_iter();
    ReportRow {
        name: subscriber.name.clone(),
        active: !subscriber.is_deleted,
        category: category.unwrap_or("N/A").to_string(),
        stype: stype.unwrap_or("N/A").to_string(),
        address_line_1: address.next().unwrap_or_default(),
        address_line_2: address.next().unwrap_or_default(),
        city: subscriber.city_town.clone(),
        district: subscriber.district.clone().unwrap_or_default(),
        state: subscriber.state.clone(),
        pincode: subscriber.pincode.clone(),
        phone: subscriber.phone.clone(),
    }
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
    max_records: usize,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>, max_records: usize) -> Self {
        Self { store, max_records }
    }

    pub async fn rows(&self, filter: &ReportFilter) -> Result<Vec<ReportRow>, AppError> {
        let category_id = match &filter.subscriber_category {
            Some(name) => Some(self.lookup_id(LookupKind::Category, name).await?),
            None => None,
        };
        let stype_id = match &filter.subscriber_type {
            Some(name) => Some(self.lookup_id(LookupKind::SubscriberType, name).await?),
            None => None,
        };

        let subscribers = self
            .store
            .list_subscribers(&SubscriberFilter {
                status: filter.status,
                category_id,
                stype_id,
                skip: 0,
                limit: Some(self.max_records as i64),
            })
            .await?;

        let categories = self.names(LookupKind::Category).await?;
        let types = self.names(LookupKind::SubscriberType).await?;

        let rows: Vec<ReportRow> = subscribers
            .iter()
            .map(|s| {
                build_row(
                    s,
                    s.category_id
                        .as_ref()
                        .and_then(|id| categories.get(id))
                        .map(String::as_str),
                    s.stype_id
                        .as_ref()
                        .and_then(|id| types.get(id))
                        .map(String::as_str),
                    filter.char_limit,
                )
            })
            .collect();

        if rows.len() >= self.max_records {
            tracing::warn!(
                max_records = self.max_records,
                "Subscriber report truncated at record limit"
            );
        }
        Ok(rows)
    }

    async fn lookup_id(&self, kind: LookupKind, name: &str) -> Result<String, AppError> {
        self.store
            .find_lookup_by_name(kind, name)
            .await?
            .map(|lookup| lookup.id)
            .ok_or_else(|| {
                AppError::not_found(format!("Invalid {}: {}", kind.label().to_lowercase(), name))
            })
    }

    async fn names(&self, kind: LookupKind) -> Result<HashMap<String, String>, AppError> {
        Ok(self
            .store
            .list_lookups(kind)
            .await?
            .into_iter()
            .map(|lookup| (lookup.id, lookup.name))
            .collect())
    }
}
