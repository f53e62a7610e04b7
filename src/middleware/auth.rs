use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, AuthError, Viewer};
use crate::config::SecurityConfig;
use crate::error::Error;

/// Viewer used for unauthenticated requests when authentication is off
pub const ANONYMOUS: &str = "anonymous";

/// Resolves the request's `Viewer` from a Bearer JWT and stores it as a
/// request extension. Without a token the request is rejected, unless
/// authentication is disabled, in which case it runs as an anonymous admin.
pub async fn authenticate(
    State(security): State<Arc<SecurityConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let viewer = match extract_bearer(request.headers()) {
        Ok(token) => validate_jwt(token, &security.jwt_secret)
            .map(Viewer::from)
            .map_err(reject)?,
        Err(AuthError::MissingHeader) if !security.require_auth => Viewer::cluster_admin(ANONYMOUS),
        Err(e) => return Err(reject(e)),
    };

    tracing::debug!(user = %viewer.username, "authenticated");
    request.extensions_mut().insert(viewer);
    Ok(next.run(request).await)
}

fn reject(err: AuthError) -> Error {
    match err {
        AuthError::InvalidSecret => {
            tracing::error!("rejecting request: {}", err);
            Error::internal("authentication is not configured")
        }
        err => Error::unauthenticated(err.to_string()),
    }
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::BadScheme)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::BadScheme),
    }
}
