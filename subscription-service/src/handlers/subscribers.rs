use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use service_core::error::AppError;

use crate::dtos::report::ReportQuery;
use crate::dtos::subscriber::{
    ListSubscribersQuery, SearchQuery, SubscriberPage, SubscriberRequest, SubscriberResponse,
};
use crate::dtos::MessageResponse;
use crate::models::{StatusFilter, SubscriberFilter};
use crate::services::pdf::layout_report;
use crate::services::subscribers::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::services::ReportRow;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

const REPORT_FILENAME: &str = "subscriber_report.pdf";

/// GET /subscribers?status=active|inactive|all&page=&page_size=
pub async fn list_subscribers(
    State(state): State<AppState>,
    Query(query): Query<ListSubscribersQuery>,
) -> Result<Json<SubscriberPage>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let filter = SubscriberFilter {
        status: StatusFilter::from_param(query.status.as_deref()),
        ..Default::default()
    };

    let (items, total) = state.subscribers.list(filter, page, page_size).await?;
    Ok(Json(SubscriberPage {
        items: items.into_iter().map(Into::into).collect(),
        total,
        page,
        page_size,
    }))
}

/// POST /subscribers
pub async fn create_subscriber(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SubscriberRequest>,
) -> Result<(StatusCode, Json<SubscriberResponse>), AppError> {
    let subscriber = state.subscribers.create(req).await?;
    Ok((StatusCode::CREATED, Json(subscriber.into())))
}

/// GET /subscribers/:id, with the subscriber's subscriptions.
pub async fn get_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubscriberResponse>, AppError> {
    let (subscriber, subscriptions) = state.subscribers.get_with_subscriptions(&id).await?;
    let mut response = SubscriberResponse::from(subscriber);
    response.subscriptions = Some(subscriptions.into_iter().map(Into::into).collect());
    Ok(Json(response))
}

/// PUT /subscribers/:id
pub async fn replace_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<SubscriberRequest>,
) -> Result<Json<SubscriberResponse>, AppError> {
    Ok(Json(state.subscribers.replace(&id, req).await?.into()))
}

/// DELETE /subscribers/:id flags the subscriber as deleted.
pub async fn soft_delete_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.subscribers.soft_delete(&id).await?;
    Ok(Json(MessageResponse::new("Subscriber deleted")))
}

/// POST /subscribers/:id/activate
pub async fn activate_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.subscribers.activate(&id).await?;
    Ok(Json(MessageResponse::new("Subscriber activated")))
}

/// GET /subscribers/search?filter=<field>&query=<text>
pub async fn search_subscribers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SubscriberResponse>>, AppError> {
    let subscribers = state
        .subscribers
        .search(query.filter.as_deref(), query.query.as_deref())
        .await?;
    Ok(Json(subscribers.into_iter().map(Into::into).collect()))
}

/// Client errors keep their status. Anything else becomes a generic 500.
fn report_failure(error: AppError) -> Response {
    match error {
        AppError::InternalError(_) | AppError::DatabaseError(_) | AppError::ConfigError(_) => {
            tracing::error!(error = %error, "Failed to generate subscriber report");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate subscriber report" })),
            )
                .into_response()
        }
        other => other.into_response(),
    }
}

/// GET /subscribers/report
pub async fn subscriber_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let filter = match query.filter(state.config.report.char_limit) {
        Ok(filter) => filter,
        Err(e) => return report_failure(e),
    };

    match state.reports.rows(&filter).await {
        Ok(rows) => Json::<Vec<ReportRow>>(rows).into_response(),
        Err(e) => report_failure(e),
    }
}

/// GET /subscribers/report/pdf
pub async fn subscriber_report_pdf(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Response {
    match render_report(&state, &query).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, state.renderer.content_type().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", REPORT_FILENAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => report_failure(e),
    }
}

async fn render_report(state: &AppState, query: &ReportQuery) -> Result<Vec<u8>, AppError> {
    let filter = query.filter(state.config.report.char_limit)?;
    let grid = query.grid(filter.char_limit)?;
    let rows = state.reports.rows(&filter).await?;

    let layout = layout_report(&rows, &query.header(&filter), &grid);
    let pages = layout.pages.len();
    let renderer = state.renderer.clone();

    let bytes = tokio::task::spawn_blocking(move || renderer.render(&layout))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("report renderer panicked: {}", e)))??;

    tracing::info!(records = rows.len(), pages, "Subscriber report rendered");
    Ok(bytes)
}
