//! # causerie-shared
//!
//! Domain types shared by every Causerie crate: identifiers, messages,
//! conversations, user profiles and preferences, the JSON payloads spoken
//! with the webhook and auth backends, plus the pure text helpers
//! (reply extraction, suggested questions, markup rendering, validation).

pub mod constants;
pub mod error;
pub mod markup;
pub mod models;
pub mod protocol;
pub mod suggestions;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use models::*;
pub use types::*;
