//! Hubcore - the chat hub behind hubbot
//!
//! Everything here is platform-neutral: inbound events arrive as plain
//! values, outbound messages leave through the [`transport::Transport`] seam.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging and cooldown locks
//! - `session`: command paths, interactions, TTL registries and message hooks
//! - `router`: menu trees, keyboards, text commands and inline queries
//! - `storage`: users, XP counters and stored files (SQLite)
//! - `features`: the hub menu, account, stats, profile pictures and games
//! - `testing`: recording transport and in-memory hubs

pub mod core;
pub mod features;
pub mod hub;
pub mod router;
pub mod session;
pub mod storage;
pub mod testing;
pub mod transport;

// Re-export commonly used types for convenience
pub use crate::core::config::HubConfig;
pub use crate::core::{init_logger, HubError, HubResult};
pub use hub::{Ctx, Hub};
pub use storage::{create_memory_pool, create_pool, SqliteStore, UserStore};
pub use transport::{Actor, ChatKind, ChatRef, IncomingMessage, MessageRef, PhotoRef, Transport};
