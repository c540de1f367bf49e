//! # Chat Module
//!
//! The single shared room: connection registry and presence tracking
//! ([`state`]), the per-connection session loop ([`session`]), and the
//! generation proxy that backs the `/bot` command ([`generation`]).

pub mod generation;
pub mod session;
pub mod state;

pub use generation::GenerationClient;
pub use session::{run_session, SessionIdentity};
pub use state::ChatRoom;
