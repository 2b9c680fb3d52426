//! services/api/src/web/middleware.rs
//!
//! Bearer-token authentication for protected routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use lms_core::access::{check_permission, Permission};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::services::AuthUser;
use crate::web::state::AppState;

/// Middleware that validates the `Authorization: Bearer` token.
///
/// If valid, inserts the verified `AuthUser` into request extensions for handlers to use.
/// A missing header or a failed verification ends the request with 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;

    let user = state.auth.verify_token(token).await?;
    debug!("Authenticated {} ({})", user.username, user.role);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Fails with 403 unless the caller's role grants `permission`.
pub fn require_permission(user: &AuthUser, permission: Permission) -> ServiceResult<()> {
    if check_permission(user.role, permission) {
        Ok(())
    } else {
        debug!("{} lacks {}", user.username, permission);
        Err(ServiceError::Forbidden("Permission denied".to_string()))
    }
}
