//! # causerie-client
//!
//! Conversation state manager for the Causerie chat client: the displayed
//! message list, the send pipeline to the chat webhook, conversation
//! history, preferences, auth session and transient notifications.
//!
//! Views drive a [`ChatClient`] through its command methods and render
//! [`ChatSnapshot`]s, refreshing on [`ClientEvent`]s.

pub mod client;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod debounce;
pub mod error;
pub mod events;
pub mod history;
pub mod menus;
pub mod messages;
pub mod notification;
pub mod state;

use tracing_subscriber::{fmt, EnvFilter};

pub use client::ChatClient;
pub use config::ClientConfig;
pub use confirm::{AutoConfirm, Confirm};
pub use error::{ClientError, Result};
pub use events::ClientEvent;
pub use history::HistoryFilter;
pub use menus::Panel;
pub use notification::Notice;
pub use state::ChatSnapshot;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("causerie_client=debug,causerie_net=info,causerie_store=info,warn")
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
