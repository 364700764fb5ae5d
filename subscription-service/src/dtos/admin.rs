use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::AdminUser;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(equal = 12, message = "Aadhaar must be 12 digits"))]
    pub aadhaar: String,
    #[validate(length(equal = 10, message = "Mobile must be 10 digits"))]
    pub mobile: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdminRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(equal = 12, message = "Aadhaar must be 12 digits"))]
    pub aadhaar: String,
    #[validate(length(equal = 10, message = "Mobile must be 10 digits"))]
    pub mobile: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub aadhaar: String,
    pub mobile: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub active: bool,
}

impl From<AdminUser> for AdminResponse {
    fn from(admin: AdminUser) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            email: admin.email,
            first_name: admin.first_name,
            last_name: admin.last_name,
            aadhaar: admin.aadhaar,
            mobile: admin.mobile,
            created_at: admin.created_at,
            last_login: admin.last_login.map(|at| at.to_chrono()),
            active: admin.active,
        }
    }
}
