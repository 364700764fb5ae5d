//! Admin accounts and opaque bearer-token sessions.

use mongodb::bson::DateTime as BsonDateTime;
use service_core::error::AppError;
use std::sync::Arc;

use super::calendar::BusinessCalendar;
use super::ids::{EntityKind, IdGenerator};
use super::store::Store;
use crate::dtos::admin::{LoginRequest, SignupRequest, UpdateAdminRequest};
use crate::models::{AdminSession, AdminUser};
use crate::utils::{
    generate_session_token, hash_password, token_digest, verify_password, Password,
    PasswordHashString,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    ids: IdGenerator,
    calendar: BusinessCalendar,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, ids: IdGenerator, calendar: BusinessCalendar) -> Self {
        Self {
            store,
            ids,
            calendar,
        }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<AdminUser, AppError> {
        let password_hash = hash_password(&Password::new(req.password))?;

        let admin = AdminUser {
            id: self.ids.next(EntityKind::Admin).await?,
            username: req.username.trim().to_string(),
            password_hash: password_hash.into_string(),
            email: req.email.trim().to_string(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            aadhaar: req.aadhaar,
            mobile: req.mobile,
            created_at: self.calendar.now(),
            last_login: None,
            active: true,
        };
        self.store.insert_admin(&admin).await?;

        tracing::info!(admin_id = %admin.id, username = %admin.username, "Admin registered");
        Ok(admin)
    }

    /// Verify credentials and open a session. Returns the raw token, which
    /// is not stored anywhere.
    pub async fn login(&self, req: LoginRequest) -> Result<(String, AdminUser), AppError> {
        let mut admin = self
            .store
            .find_admin_by_username(req.username.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!(INVALID_CREDENTIALS)))?;

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(admin.password_hash.clone()),
        )
        .map_err(|_| {
            tracing::warn!(username = %admin.username, "Admin login with wrong password");
            AppError::Unauthorized(anyhow::anyhow!(INVALID_CREDENTIALS))
        })?;

        if !admin.active {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Admin account is deactivated"
            )));
        }

        let now = self.calendar.now();
        admin.last_login = Some(BsonDateTime::from_chrono(now));
        self.store.replace_admin(&admin).await?;

        let token = generate_session_token();
        self.store
            .insert_session(&AdminSession {
                token_digest: token_digest(&token),
                admin_id: admin.id.clone(),
                created_at: now,
            })
            .await?;

        tracing::info!(admin_id = %admin.id, "Admin logged in");
        Ok((token, admin))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        if !self.store.delete_session(&token_digest(token)).await? {
            return Err(AppError::Unauthorized(anyhow::anyhow!("Session not found")));
        }
        Ok(())
    }

    /// Resolve a bearer token to the active admin that owns it.
    pub async fn authenticate(&self, token: &str) -> Result<AdminUser, AppError> {
        let session = self
            .store
            .find_session(&token_digest(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token")))?;

        match self.store.get_admin(&session.admin_id).await? {
            Some(admin) if admin.active => Ok(admin),
            _ => Err(AppError::Unauthorized(anyhow::anyhow!(
                "Invalid or expired token"
            ))),
        }
    }

    pub async fn list(&self) -> Result<Vec<AdminUser>, AppError> {
        self.store.list_admins().await
    }

    pub async fn get(&self, id: &str) -> Result<AdminUser, AppError> {
        self.store
            .get_admin(id)
            .await?
            .ok_or_else(|| AppError::not_found("Admin not found"))
    }

    pub async fn update(&self, id: &str, req: UpdateAdminRequest) -> Result<AdminUser, AppError> {
        let mut admin = self.get(id).await?;

        admin.email = req.email.trim().to_string();
        admin.first_name = req.first_name.trim().to_string();
        admin.last_name = req.last_name.trim().to_string();
        admin.aadhaar = req.aadhaar;
        admin.mobile = req.mobile;
        if let Some(password) = req.password {
            admin.password_hash = hash_password(&Password::new(password))?.into_string();
        }

        if !self.store.replace_admin(&admin).await? {
            return Err(AppError::not_found("Admin not found"));
        }
        tracing::info!(admin_id = %admin.id, "Admin updated");
        Ok(admin)
    }

    /// Deactivation also ends every open session of the admin.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<AdminUser, AppError> {
        let mut admin = self.get(id).await?;
        admin.active = active;
        if !self.store.replace_admin(&admin).await? {
            return Err(AppError::not_found("Admin not found"));
        }

        if !active {
            let revoked = self.store.delete_sessions_for_admin(id).await?;
            tracing::info!(admin_id = %id, revoked, "Admin deactivated");
        } else {
            tracing::info!(admin_id = %id, "Admin activated");
        }
        Ok(admin)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.store.delete_admin(id).await? {
            return Err(AppError::not_found("Admin not found"));
        }
        self.store.delete_sessions_for_admin(id).await?;
        tracing::info!(admin_id = %id, "Admin deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::calendar::FixedClock;
    use crate::services::MemoryStore;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn service() -> AuthService {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let calendar = BusinessCalendar::new(
            FixedOffset::east_opt(330 * 60).unwrap(),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap())),
        );
        AuthService::new(store.clone(), IdGenerator::new(store), calendar)
    }

    fn signup(username: &str, suffix: u8) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: "s3cret-pass".to_string(),
            email: format!("{}@example.com", username),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            aadhaar: format!("12345678901{}", suffix),
            mobile: format!("987654321{}", suffix),
        }
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_token_that_authenticates() {
        let auth = service();
        let admin = auth.signup(signup("asha", 1)).await.unwrap();
        assert_eq!(admin.id, "ADMIN000001");
        assert!(admin.password_hash.starts_with("$argon2"));

        let (token, logged_in) = auth.login(login("asha", "s3cret-pass")).await.unwrap();
        assert!(logged_in.last_login.is_some());

        let resolved = auth.authenticate(&token).await.unwrap();
        assert_eq!(resolved.id, admin.id);

        auth.logout(&token).await.unwrap();
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let auth = service();
        auth.signup(signup("asha", 1)).await.unwrap();

        assert!(matches!(
            auth.login(login("asha", "wrong-pass")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.login(login("nobody", "s3cret-pass")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivation_blocks_login_and_revokes_sessions() {
        let auth = service();
        let admin = auth.signup(signup("asha", 1)).await.unwrap();
        let (token, _) = auth.login(login("asha", "s3cret-pass")).await.unwrap();

        auth.set_active(&admin.id, false).await.unwrap();

        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.login(login("asha", "s3cret-pass")).await,
            Err(AppError::Forbidden(_))
        ));

        auth.set_active(&admin.id, true).await.unwrap();
        assert!(auth.login(login("asha", "s3cret-pass")).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let auth = service();
        auth.signup(signup("asha", 1)).await.unwrap();

        let mut again = signup("asha", 2);
        again.email = "other@example.com".to_string();
        assert!(auth.signup(again).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_update_changes_password() {
        let auth = service();
        let admin = auth.signup(signup("asha", 1)).await.unwrap();

        auth.update(
            &admin.id,
            UpdateAdminRequest {
                email: "asha@example.org".to_string(),
                first_name: "Asha".to_string(),
                last_name: "Rao".to_string(),
                aadhaar: admin.aadhaar.clone(),
                mobile: admin.mobile.clone(),
                password: Some("new-password".to_string()),
            },
        )
        .await
        .unwrap();

        assert!(auth.login(login("asha", "s3cret-pass")).await.is_err());
        let (_, updated) = auth.login(login("asha", "new-password")).await.unwrap();
        assert_eq!(updated.email, "asha@example.org");
    }
}
