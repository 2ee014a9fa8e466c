//! Operations on [`crate::ChatClient`], one sub-module per concern.
//!
//! Every public function here is an `impl ChatClient` method; views call
//! them and then re-read the snapshot or react to the emitted events.

pub mod attachments;
pub mod auth;
pub mod conversations;
pub mod exports;
pub mod messaging;
pub mod settings;
pub mod ui;
