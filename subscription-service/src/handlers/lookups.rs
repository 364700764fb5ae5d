//! Handlers shared by the four lookup collections. The router mounts them
//! once per kind with the kind as a request extension.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use service_core::error::AppError;

use crate::dtos::catalog::{LookupRequest, LookupResponse};
use crate::dtos::MessageResponse;
use crate::models::LookupKind;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

pub async fn list_lookups(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
) -> Result<Json<Vec<LookupResponse>>, AppError> {
    let lookups = state.catalog.list_lookups(kind).await?;
    Ok(Json(lookups.into_iter().map(Into::into).collect()))
}

pub async fn create_lookup(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    ValidatedJson(req): ValidatedJson<LookupRequest>,
) -> Result<(StatusCode, Json<LookupResponse>), AppError> {
    let name = req.name_for(kind)?;
    let lookup = state.catalog.create_lookup(kind, name).await?;
    Ok((StatusCode::CREATED, Json(lookup.into())))
}

pub async fn get_lookup(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Path(id): Path<String>,
) -> Result<Json<LookupResponse>, AppError> {
    Ok(Json(state.catalog.get_lookup(kind, &id).await?.into()))
}

pub async fn replace_lookup(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<LookupRequest>,
) -> Result<Json<LookupResponse>, AppError> {
    let name = req.name_for(kind)?;
    Ok(Json(state.catalog.replace_lookup(kind, &id, name).await?.into()))
}

pub async fn delete_lookup(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.catalog.delete_lookup(kind, &id).await?;
    Ok(Json(MessageResponse::new(format!("{} deleted", kind.label()))))
}
