//! # Data Transfer Objects (DTOs)
//!
//! This module contains all data structures used for communication between
//! chat clients and the backend, over both the REST API and the WebSocket.

pub mod auth;
pub mod chat;

pub use auth::*;
pub use chat::*;
