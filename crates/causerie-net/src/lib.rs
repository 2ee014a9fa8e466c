//! # causerie-net
//!
//! HTTP collaborators of the chat client.
//!
//! - [`chat`]: the assistant webhook and the auxiliary conversation
//!   endpoints, behind the [`ChatBackend`] trait.
//! - [`auth`]: signup, login, logout and session checks, behind the
//!   [`AuthBackend`] trait.
//!
//! Both traits exist so the state manager can be driven by fakes in tests.

pub mod auth;
pub mod chat;
pub mod error;
mod http;

pub use auth::{AuthBackend, AuthClient};
pub use chat::{ChatBackend, WebhookClient, WebhookConfig};
pub use error::{NetError, Result};
