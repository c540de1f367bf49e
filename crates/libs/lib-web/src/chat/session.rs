//! # Chat Session
//!
//! Per-connection event loop. Each admitted WebSocket gets one session: an
//! outbound pump draining the connection's event queue into the socket, and
//! an inbound loop dispatching client events (submissions, deletions) against
//! the shared [`ChatRoom`].
//!
//! A `/bot` submission runs as a detached task so a slow generation never
//! blocks this connection's socket reads, other connections' submissions, or
//! presence updates; a disconnect of the submitter does not abort the call.

use crate::chat::generation::GenerationClient;
use crate::chat::state::{ChatRoom, BOT_NAME};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use lib_core::model::store::models::MessageForCreate;
use lib_core::AppError;
use shared::dto::{ChatSubmission, ClientEvent, ServerEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The reserved bot-invocation prefix (case-sensitive literal).
const BOT_PREFIX: &str = "/bot";

/// Identity resolved from the verified credential at admission time.
///
/// Bound to the connection for its whole lifetime; never persisted.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: i64,
    pub username: String,
    pub avatar: Option<String>,
}

/// If `text` is a bot command, extract the prompt: the remainder after the
/// `/bot` prefix with the one following whitespace run stripped.
fn bot_prompt(text: &str) -> Option<&str> {
    text.strip_prefix(BOT_PREFIX).map(str::trim_start)
}

/// Drive an admitted connection until it disconnects.
///
/// The caller has already verified the credential; admission (registration +
/// presence broadcast), history replay, event dispatch, and teardown all
/// happen here.
pub async fn run_session(
    socket: WebSocket,
    identity: SessionIdentity,
    room: Arc<ChatRoom>,
    generation: Arc<GenerationClient>,
) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let (conn_id, online) = room.admit(tx.clone()).await;
    info!(
        conn_id,
        user = %identity.username,
        online,
        "chat connection admitted"
    );

    // Replay recent history, to this connection only. A store failure here is
    // logged and the session continues with an empty view.
    match room.history().await {
        Ok(history) => {
            let _ = tx.send(ServerEvent::ChatHistory(history));
        }
        Err(e) => error!(conn_id, "failed to load chat history: {}", e),
    }

    // Outbound pump: queued room events -> socket frames.
    let send_conn_id = conn_id;
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!(conn_id = send_conn_id, "failed to serialize event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop: client frames -> dispatch.
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => dispatch(&identity, &room, &generation, &tx, event).await,
                Err(e) => {
                    // malformed frames are a validation error local to the
                    // request; the connection stays up
                    warn!(conn_id, "ignoring malformed client frame: {}", e);
                }
            },
            Ok(Message::Close(_)) => {
                debug!(conn_id, "close frame received");
                break;
            }
            Ok(_) => {} // ping/pong/binary: nothing to do
            Err(e) => {
                warn!(conn_id, "websocket error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    let online = room.remove(conn_id).await;
    info!(
        conn_id,
        user = %identity.username,
        online,
        "chat connection closed"
    );
}

async fn dispatch(
    identity: &SessionIdentity,
    room: &Arc<ChatRoom>,
    generation: &Arc<GenerationClient>,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::ChatMessage(submission) => {
            handle_submission(identity, room, generation, tx, submission).await
        }
        ClientEvent::DeleteMessage { id } => handle_delete(identity, room, tx, id).await,
    }
}

async fn handle_submission(
    identity: &SessionIdentity,
    room: &Arc<ChatRoom>,
    generation: &Arc<GenerationClient>,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    submission: ChatSubmission,
) {
    if let Some(prompt) = bot_prompt(&submission.text) {
        let prompt = prompt.to_string();
        let room = Arc::clone(room);
        let generation = Arc::clone(generation);
        tokio::spawn(async move {
            run_bot_path(room, generation, prompt).await;
        });
        return;
    }

    // empty text with no attachment would create an empty record
    if submission.text.trim().is_empty() && submission.file_path.is_none() {
        debug!(user = %identity.username, "rejecting empty submission");
        return;
    }

    let data = MessageForCreate {
        user: identity.username.clone(),
        avatar: identity.avatar.clone(),
        text: submission.text,
        file_path: submission.file_path,
    };

    if let Err(e) = room.publish(data).await {
        // the message must not vanish silently: log and tell the submitter
        error!(user = %identity.username, "failed to persist chat message: {}", e);
        let _ = tx.send(ServerEvent::Error {
            message: e.user_message(),
        });
    }
}

async fn handle_delete(
    identity: &SessionIdentity,
    room: &Arc<ChatRoom>,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    id: i64,
) {
    match room.delete(id, &identity.username).await {
        Ok(true) => debug!(id, user = %identity.username, "message deleted"),
        Ok(false) => debug!(id, "delete for unknown message id ignored"),
        Err(AppError::Forbidden(reason)) => {
            warn!(id, user = %identity.username, "delete rejected: {}", reason);
            let _ = tx.send(ServerEvent::Error { message: reason });
        }
        Err(e) => {
            error!(id, "failed to delete message: {}", e);
            let _ = tx.send(ServerEvent::Error {
                message: e.user_message(),
            });
        }
    }
}

/// The bot path: one prompt in, one persisted+broadcast bot message out.
///
/// Proxy failures become a visible bot message so the room is never left
/// waiting silently; an empty prompt is rejected by the proxy before any
/// network call and ends the path as a no-op.
async fn run_bot_path(room: Arc<ChatRoom>, generation: Arc<GenerationClient>, prompt: String) {
    let text = match generation.generate(&prompt).await {
        Ok(text) => text,
        Err(AppError::InvalidInput(reason)) => {
            debug!("bot command rejected: {}", reason);
            return;
        }
        Err(e) => {
            warn!("generation failed: {}", e);
            format!("Ollama error: {}", e.user_message())
        }
    };

    if text.is_empty() {
        debug!("generation produced an empty response, nothing to persist");
        return;
    }

    if let Err(e) = room.publish(MessageForCreate::text(BOT_NAME, None, text)).await {
        error!("failed to persist bot response: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_room() -> Arc<ChatRoom> {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user TEXT NOT NULL,
                avatar TEXT,
                text TEXT NOT NULL DEFAULT '',
                file_path TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .expect("Failed to create messages table");

        Arc::new(ChatRoom::new(pool))
    }

    fn test_identity() -> SessionIdentity {
        SessionIdentity {
            user_id: 1,
            username: "alice".to_string(),
            avatar: Some("https://example.com/a.png".to_string()),
        }
    }

    /// A client whose backend address is unroutable: every generation attempt
    /// fails at the transport layer.
    fn unreachable_generation() -> Arc<GenerationClient> {
        Arc::new(GenerationClient::new("http://127.0.0.1:1", "llama3.2:1b"))
    }

    #[tokio::test]
    async fn test_direct_path_persists_and_broadcasts_with_bound_identity() {
        let room = setup_room().await;
        let generation = unreachable_generation();
        let identity = test_identity();

        let (tx, mut rx) = mpsc::unbounded_channel();
        room.admit(tx.clone()).await;
        let _ = rx.try_recv(); // presence update

        handle_submission(
            &identity,
            &room,
            &generation,
            &tx,
            ChatSubmission {
                text: "hello room".to_string(),
                file_path: None,
            },
        )
        .await;

        let history = room.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, "alice");
        assert_eq!(history[0].avatar.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(history[0].text, "hello room");

        // the sender received its own message back
        let event = rx.try_recv().unwrap();
        assert_eq!(event, ServerEvent::ChatMessage(history[0].clone()));
    }

    #[tokio::test]
    async fn test_empty_submission_has_no_side_effects() {
        let room = setup_room().await;
        let generation = unreachable_generation();
        let identity = test_identity();

        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_submission(&identity, &room, &generation, &tx, ChatSubmission::default()).await;
        handle_submission(
            &identity,
            &room,
            &generation,
            &tx,
            ChatSubmission {
                text: "   ".to_string(),
                file_path: None,
            },
        )
        .await;

        assert!(room.history().await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_attachment_only_submission_is_accepted() {
        let room = setup_room().await;
        let generation = unreachable_generation();
        let identity = test_identity();

        let (tx, _rx) = mpsc::unbounded_channel();

        handle_submission(
            &identity,
            &room,
            &generation,
            &tx,
            ChatSubmission {
                text: String::new(),
                file_path: Some("/uploads/photo.png".to_string()),
            },
        )
        .await;

        let history = room.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].file_path.as_deref(), Some("/uploads/photo.png"));
    }

    #[tokio::test]
    async fn test_bot_path_surfaces_proxy_failure_as_bot_message() {
        let room = setup_room().await;
        let generation = unreachable_generation();

        run_bot_path(room.clone(), generation, "hello".to_string()).await;

        let history = room.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, BOT_NAME);
        assert!(history[0].text.starts_with("Ollama error:"));
    }

    #[tokio::test]
    async fn test_bot_path_empty_prompt_is_a_noop() {
        let room = setup_room().await;
        let generation = unreachable_generation();

        run_bot_path(room.clone(), generation, "   ".to_string()).await;

        assert!(room.history().await.unwrap().is_empty());
    }

    #[test]
    fn test_bot_prompt_strips_prefix_and_whitespace_run() {
        assert_eq!(bot_prompt("/bot hello"), Some("hello"));
        assert_eq!(bot_prompt("/bot    spaced   out"), Some("spaced   out"));
        assert_eq!(bot_prompt("/bot\twhat is rust?"), Some("what is rust?"));
    }

    #[test]
    fn test_bot_prompt_without_separator() {
        // the literal prefix is all that is required
        assert_eq!(bot_prompt("/bothello"), Some("hello"));
    }

    #[test]
    fn test_bot_prompt_bare_command_is_empty() {
        assert_eq!(bot_prompt("/bot"), Some(""));
        assert_eq!(bot_prompt("/bot   "), Some(""));
    }

    #[test]
    fn test_non_commands_are_not_bot_prompts() {
        assert_eq!(bot_prompt("hello /bot"), None);
        assert_eq!(bot_prompt("/Bot hello"), None); // case-sensitive
        assert_eq!(bot_prompt(""), None);
    }
}
