use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::catalog::{PaymentModeRequest, PaymentModeResponse};
use crate::dtos::MessageResponse;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// GET /payment-modes
pub async fn list_payment_modes(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentModeResponse>>, AppError> {
    let modes = state.catalog.list_payment_modes().await?;
    Ok(Json(modes.into_iter().map(Into::into).collect()))
}

/// POST /payment-modes
pub async fn create_payment_mode(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PaymentModeRequest>,
) -> Result<(StatusCode, Json<PaymentModeResponse>), AppError> {
    let id = state.catalog.next_payment_mode_id().await?;
    let mode = state
        .catalog
        .create_payment_mode(req.into_payment_mode(id))
        .await?;
    Ok((StatusCode::CREATED, Json(mode.into())))
}

/// GET /payment-modes/:id
pub async fn get_payment_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentModeResponse>, AppError> {
    Ok(Json(state.catalog.get_payment_mode(&id).await?.into()))
}

/// PUT /payment-modes/:id
pub async fn replace_payment_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<PaymentModeRequest>,
) -> Result<Json<PaymentModeResponse>, AppError> {
    let mode = state
        .catalog
        .replace_payment_mode(req.into_payment_mode(id))
        .await?;
    Ok(Json(mode.into()))
}

/// DELETE /payment-modes/:id
pub async fn delete_payment_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.catalog.delete_payment_mode(&id).await?;
    Ok(Json(MessageResponse::new("Payment mode deleted")))
}
