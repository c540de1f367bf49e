//! # Authentication Middleware
//!
//! Axum middleware for JWT token validation on protected HTTP routes.
//!
//! Extracts and validates the token from the `Authorization` header, then
//! injects the authenticated user's claims into the request extensions, where
//! handlers pick them up via `Extension<Claims>`.
//!
//! The chat WebSocket does not use this layer: its credential arrives as a
//! query parameter and is verified by the upgrade handler before admission.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use lib_auth::decode_jwt;
use lib_core::config::core_config;
use tracing::{debug, warn};

/// Authentication middleware that validates JWT tokens.
///
/// # Behavior
///
/// - **Valid token**: Continues to next middleware/handler with `Claims` in extensions
/// - **Missing/invalid token**: Returns `401 Unauthorized`
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            warn!("[AUTH] Missing Authorization header");
            StatusCode::UNAUTHORIZED
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("[AUTH] Invalid Authorization header format");
        StatusCode::UNAUTHORIZED
    })?;

    let config = core_config();
    let claims = decode_jwt(token, &config.jwt_secret).map_err(|e| {
        warn!("[AUTH] JWT validation failed: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    debug!("[AUTH] Authenticated user: {} (id: {})", claims.username, claims.sub);

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
