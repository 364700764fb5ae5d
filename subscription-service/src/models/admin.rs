use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub aadhaar: String,
    pub mobile: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub last_login: Option<mongodb::bson::DateTime>,
    pub active: bool,
}

/// A logged-in session. Only the SHA-256 digest of the bearer token is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    #[serde(rename = "_id")]
    pub token_digest: String,
    pub admin_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}
