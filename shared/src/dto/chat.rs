//! # Chat Data Transfer Objects
//!
//! Defines the persisted message record and the tagged event envelopes
//! exchanged over the chat WebSocket.

use serde::{Deserialize, Serialize};

/// A persisted chat message, as stored and as broadcast to every client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Store-assigned unique id, needed for targeted deletion
    pub id: i64,
    /// Author display name
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Server-assigned creation timestamp (RFC 3339)
    pub created_at: String,
}

/// A client's chat submission, before the server stamps identity and time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatSubmission {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Events a client sends to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Submit a message; routed to the direct or bot path by the server
    ChatMessage(ChatSubmission),
    /// Request deletion of a message by store id
    DeleteMessage { id: i64 },
}

/// Events the server sends to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Recent history, sent once to a newly admitted connection only
    ChatHistory(Vec<ChatMessage>),
    /// A newly persisted message, broadcast to all connections
    ChatMessage(ChatMessage),
    /// A deletion, broadcast to all connections
    DeleteMessage { id: i64 },
    /// Presence count update, broadcast on every connect/disconnect
    OnlineUsers(usize),
    /// Request-scoped failure report, sent to the submitting connection only
    Error { message: String },
}

/// Response from the file-upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Server-relative path clients attach to a subsequent chat submission
    pub file_path: String,
}
