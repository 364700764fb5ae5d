use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::plan::{PlanRequest, PlanResponse};
use crate::dtos::MessageResponse;
use crate::services::PlanWrite;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// GET /plans
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<PlanResponse>>, AppError> {
    let plans = state.plans.list().await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

/// POST /plans
///
/// 201 with a new version, or 200 with the latest plan of the lineage when
/// the price has not changed.
pub async fn create_plan(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PlanRequest>,
) -> Result<(StatusCode, Json<PlanResponse>), AppError> {
    let terms = req.into_terms()?;
    match state.plans.create(terms).await? {
        PlanWrite::Created(plan) => Ok((StatusCode::CREATED, Json(plan.into()))),
        PlanWrite::Unchanged(plan) => Ok((StatusCode::OK, Json(plan.into()))),
    }
}

/// GET /plans/:id
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlanResponse>, AppError> {
    Ok(Json(state.plans.get(&id).await?.into()))
}

/// PUT /plans/:id
pub async fn replace_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<PlanRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    let terms = req.into_terms()?;
    Ok(Json(state.plans.replace(&id, terms).await?.into()))
}

/// DELETE /plans/:id
pub async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.plans.delete(&id).await?;
    Ok(Json(MessageResponse::new("Subscription plan deleted")))
}
