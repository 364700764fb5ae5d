use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::admin::{
    AdminResponse, LoginRequest, LoginResponse, SignupRequest, UpdateAdminRequest,
};
use crate::dtos::MessageResponse;
use crate::middleware::AdminContext;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// POST /admins/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<AdminResponse>), AppError> {
    let admin = state.auth.signup(req).await?;
    Ok((StatusCode::CREATED, Json(admin.into())))
}

/// POST /admins/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, _) = state.auth.login(req).await?;
    Ok(Json(LoginResponse {
        token,
        message: "Login successful".to_string(),
    }))
}

/// POST /admins/logout ends the session of the presented token.
pub async fn logout(
    State(state): State<AppState>,
    admin: AdminContext,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.logout(&admin.token).await?;
    tracing::info!(admin_id = %admin.admin_id, "Admin logged out");
    Ok(Json(MessageResponse::new("Logout successful")))
}

/// GET /admins
pub async fn list_admins(State(state): State<AppState>) -> Result<Json<Vec<AdminResponse>>, AppError> {
    let admins = state.auth.list().await?;
    Ok(Json(admins.into_iter().map(Into::into).collect()))
}

/// GET /admins/:id
pub async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminResponse>, AppError> {
    Ok(Json(state.auth.get(&id).await?.into()))
}

/// PUT /admins/:id
pub async fn update_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateAdminRequest>,
) -> Result<Json<AdminResponse>, AppError> {
    Ok(Json(state.auth.update(&id, req).await?.into()))
}

/// DELETE /admins/:id
pub async fn delete_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    admin: AdminContext,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.delete(&id).await?;
    tracing::info!(admin_id = %id, by = %admin.username, "Admin removed");
    Ok(Json(MessageResponse::new("Admin deleted")))
}

/// POST /admins/:id/activate
pub async fn activate_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminResponse>, AppError> {
    Ok(Json(state.auth.set_active(&id, true).await?.into()))
}

/// POST /admins/:id/deactivate
pub async fn deactivate_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminResponse>, AppError> {
    Ok(Json(state.auth.set_active(&id, false).await?.into()))
}
