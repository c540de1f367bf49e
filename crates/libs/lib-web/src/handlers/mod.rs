//! # HTTP Request Handlers
//!
//! Axum HTTP request handlers organized by feature domain.
//!
//! ## Handler Modules
//!
//! - **[`auth`]**: User authentication endpoints
//!   - `POST /api/auth/signup` - Create new user account
//!   - `POST /api/auth/login` - Authenticate with email/username + password
//!
//! - **[`upload`]**: File-upload collaborator
//!   - `POST /api/upload` - Store one attachment, return its server-relative path
//!
//! - **[`websocket`]**: Realtime chat entry point
//!   - `GET /api/ws/chat` - Authenticated WebSocket upgrade into the room
//!
//! ## Authentication
//!
//! Protected HTTP endpoints use `Extension<Claims>` injected by the auth
//! middleware. The WebSocket verifies its credential in the upgrade handler
//! itself, before the connection is admitted.

pub mod auth;
pub mod upload;
pub mod websocket;
