//! # causerie-store
//!
//! Durable client state for Causerie.
//!
//! Everything is kept as JSON text under fixed keys in an opaque key-value
//! store (see [`keys`]). The default backend is a small SQLite database;
//! [`MemoryStore`] serves tests and ephemeral sessions. [`Storage`] wraps
//! either one and exposes typed accessors for preferences, conversation
//! history, the auth session and JSON exports.

pub mod database;
pub mod entries;
pub mod export;
pub mod history;
pub mod keys;
pub mod kv;
pub mod memory;
pub mod migrations;
pub mod preferences;
pub mod session;
pub mod storage;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use export::{ConversationExport, DataExport, ImportStats, SettingsExport};
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use session::StoredSession;
pub use storage::Storage;
