use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::subscription::{SubscriptionRequest, SubscriptionResponse};
use crate::dtos::MessageResponse;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// GET /subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let subscriptions = state.subscriptions.list().await?;
    Ok(Json(subscriptions.into_iter().map(Into::into).collect()))
}

/// POST /subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    let subscription = state.subscriptions.create(req.into_draft()?).await?;
    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// GET /subscriptions/:id
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    Ok(Json(state.subscriptions.get(&id).await?.into()))
}

/// PUT /subscriptions/:id
pub async fn replace_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription = state.subscriptions.replace(&id, req.into_draft()?).await?;
    Ok(Json(subscription.into()))
}

/// DELETE /subscriptions/:id
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.subscriptions.delete(&id).await?;
    Ok(Json(MessageResponse::new("Subscription deleted")))
}

/// GET /subscriptions/by-subscriber/:subscriber_id
pub async fn list_for_subscriber(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let subscriptions = state.subscriptions.list_for_subscriber(&subscriber_id).await?;
    Ok(Json(subscriptions.into_iter().map(Into::into).collect()))
}
