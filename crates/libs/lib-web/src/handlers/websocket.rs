//! # WebSocket Handlers
//!
//! HTTP endpoint upgrading authenticated clients into chat sessions.
//!
//! ## Endpoints
//!
//! - `GET /api/ws/chat?token=<jwt>` - WebSocket connection into the shared room

use crate::chat::{run_session, SessionIdentity};
use crate::server::AppState;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum::response::Response;
use lib_auth::decode_jwt;
use lib_core::model::store::UserRepository;
use lib_core::AppError;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct ChatSocketParams {
    token: Option<String>,
}

/// WebSocket handler for the chat room.
///
/// **Route**: `GET /api/ws/chat?token=<jwt>`
///
/// The bearer credential (query parameter, or `Authorization` header for
/// non-browser clients) is verified BEFORE the upgrade is accepted: a
/// connection that fails verification is rejected with 401 and never
/// admitted, so it contributes to no presence counter and receives no
/// history.
pub async fn chat_websocket(
    ws: WebSocketUpgrade,
    Query(params): Query<ChatSocketParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let token = params
        .token
        .clone()
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|t| t.to_string())
        })
        .ok_or_else(|| AppError::Auth("No token provided".to_string()))?;

    let claims = decode_jwt(&token, &state.config.jwt_secret).map_err(|e| {
        warn!("[WS] credential rejected: {}", e);
        AppError::Auth("Authentication error".to_string())
    })?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Auth("Invalid subject claim".to_string()))?;

    // Resolve the full identity (display name, avatar) once; it stays bound
    // to the connection for its lifetime.
    let user = UserRepository::find_by_id(state.room.db(), user_id)
        .await?
        .ok_or_else(|| AppError::Auth("Unknown user".to_string()))?;

    if !user.is_active {
        return Err(AppError::Auth("Account is deactivated".to_string()));
    }

    let identity = SessionIdentity {
        user_id,
        username: user.username,
        avatar: user.avatar,
    };

    info!(user = %identity.username, "[WS] upgrading authenticated chat connection");

    let room = state.room.clone();
    let generation = state.generation.clone();
    Ok(ws.on_upgrade(move |socket| run_session(socket, identity, room, generation)))
}
