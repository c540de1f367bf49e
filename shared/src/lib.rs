//! # Shared Data Transfer Objects Library
//!
//! This library defines the contract between chat clients and the backend API.
//! All DTOs use JSON serialization via `serde`.
//!
//! ## Structure
//!
//! - **[`dto::auth`]**: Authentication and user management DTOs
//! - **[`dto::chat`]**: Chat messages and the WebSocket event protocol
//!
//! ## Wire Format
//!
//! Auth DTOs serialize with default `serde` behavior (snake_case). The chat
//! protocol uses camelCase field and event names (`chatMessage`, `filePath`,
//! `createdAt`) so payloads match what browser clients already speak.
//! Optional fields are omitted from JSON when `None`.

pub mod dto;

// Re-export commonly used types for convenience
pub use dto::*;
