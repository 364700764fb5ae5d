use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::startup::AppState;

/// The admin resolved from the bearer token of the current request.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub admin_id: String,
    pub username: String,
    pub token: String,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Reject requests without a valid session token of an active admin.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!(
                "Missing or invalid Authorization header"
            ))
        })?
        .to_string();

    let admin = state.auth.authenticate(&token).await?;

    tracing::Span::current().record("admin_id", admin.id.as_str());
    req.extensions_mut().insert(AdminContext {
        admin_id: admin.id,
        username: admin.username,
        token,
    });

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AdminContext>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Admin context missing from request extensions"
            ))
        })
    }
}
