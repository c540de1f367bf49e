//! # Chat Room State
//!
//! Server-side state of the single shared room: the registry of admitted
//! connections (whose size is the presence count) and the persist-then-
//! broadcast pipeline for messages and deletions.
//!
//! Membership changes and presence broadcasts happen under the registry's
//! write lock, so counts are exact and never interleave. A separate publish
//! lock serializes append+broadcast, which keeps the order every client
//! observes identical to the order the store assigned.

use lib_core::model::store::models::MessageForCreate;
use lib_core::model::store::MessageRepository;
use lib_core::{AppError, DbPool, Result};
use shared::dto::{ChatMessage, ServerEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex, RwLock};

/// How many messages a newly admitted connection receives as replay.
pub const HISTORY_LIMIT: i64 = 50;

/// Display name stamped on every message the bot path authors.
pub const BOT_NAME: &str = "Ollama";

/// Identifier of an admitted connection, unique for the process lifetime.
pub type ConnectionId = u64;

/// Outbound half of a connection: events queued here are written to its socket.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Shared state of the room.
pub struct ChatRoom {
    db: DbPool,
    connections: RwLock<HashMap<ConnectionId, EventSender>>,
    next_conn_id: AtomicU64,
    /// Serializes append+broadcast so broadcast order equals persistence order.
    publish_lock: Mutex<()>,
}

impl ChatRoom {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            connections: RwLock::new(HashMap::new()),
            next_conn_id: AtomicU64::new(1),
            publish_lock: Mutex::new(()),
        }
    }

    pub fn db(&self) -> &DbPool {
        &self.db
    }

    /// Admit a connection to the room.
    ///
    /// Inserts its sender into the registry and broadcasts the new presence
    /// count to every admitted connection (the new one included) while still
    /// holding the registry lock. Returns the connection id and the count.
    pub async fn admit(&self, sender: EventSender) -> (ConnectionId, usize) {
        let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let mut connections = self.connections.write().await;
        connections.insert(id, sender);
        let count = connections.len();
        for tx in connections.values() {
            let _ = tx.send(ServerEvent::OnlineUsers(count));
        }
        (id, count)
    }

    /// Remove a connection from the room.
    ///
    /// Broadcasts the decremented presence count to the remaining
    /// connections. Returns the new count.
    pub async fn remove(&self, id: ConnectionId) -> usize {
        let mut connections = self.connections.write().await;
        connections.remove(&id);
        let count = connections.len();
        for tx in connections.values() {
            let _ = tx.send(ServerEvent::OnlineUsers(count));
        }
        count
    }

    /// Current presence count.
    pub async fn online_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Deliver an event to every admitted connection.
    ///
    /// A send failure means the receiving session is already tearing down;
    /// its entry is removed by its own `remove` call.
    pub async fn broadcast(&self, event: ServerEvent) {
        let connections = self.connections.read().await;
        for tx in connections.values() {
            let _ = tx.send(event.clone());
        }
    }

    /// The most recent messages, oldest-first, for replay to a new connection.
    pub async fn history(&self) -> Result<Vec<ChatMessage>> {
        Ok(MessageRepository::recent(&self.db, HISTORY_LIMIT).await?)
    }

    /// Persist a message, then broadcast it.
    ///
    /// Both steps run under the publish lock: a message is never broadcast
    /// before it is durably recorded, and two racing publishers cannot
    /// deliver out of store order.
    pub async fn publish(&self, data: MessageForCreate) -> Result<ChatMessage> {
        let _guard = self.publish_lock.lock().await;
        let message = MessageRepository::append(&self.db, data).await?;
        self.broadcast(ServerEvent::ChatMessage(message.clone())).await;
        Ok(message)
    }

    /// Delete a message on behalf of `requester`.
    ///
    /// Unknown ids are a silent no-op (`Ok(false)`, nothing broadcast).
    /// Only the author may delete a message; a mismatch is a permission
    /// error. On success the deletion is broadcast to all connections.
    pub async fn delete(&self, id: i64, requester: &str) -> Result<bool> {
        let _guard = self.publish_lock.lock().await;

        let Some(existing) = MessageRepository::find_by_id(&self.db, id).await? else {
            return Ok(false);
        };

        if existing.user != requester {
            return Err(AppError::Forbidden(format!(
                "only the author may delete message {}",
                id
            )));
        }

        let deleted = MessageRepository::delete_by_id(&self.db, id).await?;
        if deleted {
            self.broadcast(ServerEvent::DeleteMessage { id }).await;
        }
        Ok(deleted)
    }
}
