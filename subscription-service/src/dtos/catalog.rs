use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use super::non_blank;
use crate::models::{Lookup, LookupKind, PaymentMode};

#[derive(Debug, Deserialize, Validate)]
pub struct LookupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

impl LookupRequest {
    /// Trimmed name, checked against the kind's length limit.
    pub fn name_for(&self, kind: LookupKind) -> Result<String, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "required", "Name is required"));
        }
        if name.chars().count() > kind.max_name_length() {
            return Err(AppError::validation(
                "name",
                "length",
                format!(
                    "Name must be at most {} characters",
                    kind.max_name_length()
                ),
            ));
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

impl From<Lookup> for LookupResponse {
    fn from(lookup: Lookup) -> Self {
        Self {
            id: lookup.id,
            name: lookup.name,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentModeRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
    #[validate(length(max = 400, message = "Details must be at most 400 characters"))]
    pub details: Option<String>,
}

impl PaymentModeRequest {
    pub fn into_payment_mode(self, id: String) -> PaymentMode {
        PaymentMode {
            id,
            name: self.name.trim().to_string(),
            details: non_blank(self.details),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentModeResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<PaymentMode> for PaymentModeResponse {
    fn from(mode: PaymentMode) -> Self {
        Self {
            id: mode.id,
            name: mode.name,
            details: mode.details,
        }
    }
}
