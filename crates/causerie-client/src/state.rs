//! Application state owned by [`crate::ChatClient`].
//!
//! [`AppState`] lives behind a mutex inside the client; views never touch it
//! directly and work on [`ChatSnapshot`] copies instead.

use std::collections::BTreeSet;

use causerie_shared::{
    ConnectionStatus, Conversation, ConversationId, Message, MessageId, Preferences, SessionId,
    UserProfile,
};
use serde::Serialize;

use crate::menus::{MenuState, Panel};
use crate::messages::MessageList;
use crate::notification::Notice;

pub struct AppState {
    /// Messages of the displayed conversation.
    pub messages: MessageList,

    /// Id under which the displayed conversation is saved. `None` before
    /// login, after logout, and when nothing has been started yet.
    pub active_conversation: Option<ConversationId>,

    /// Chat session sent with every webhook call; one per client run.
    pub session_id: SessionId,

    pub connection: ConnectionStatus,

    /// A chat send is in flight.
    pub is_loading: bool,

    /// An auth call is in flight.
    pub auth_loading: bool,

    pub menus: MenuState,

    /// Text currently typed in the composer.
    pub input: String,

    pub web_search_active: bool,

    pub user: Option<UserProfile>,
    pub session_token: Option<String>,

    pub preferences: Preferences,

    /// Saved conversations, newest first.
    pub history: Vec<Conversation>,

    pub pinned: BTreeSet<MessageId>,
    pub favorites: BTreeSet<ConversationId>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            messages: MessageList::new(),
            active_conversation: None,
            session_id: SessionId::new(),
            connection: ConnectionStatus::Disconnected,
            is_loading: false,
            auth_loading: false,
            menus: MenuState::default(),
            input: String::new(),
            web_search_active: false,
            user: None,
            session_token: None,
            preferences: Preferences::default(),
            history: Vec::new(),
            pinned: BTreeSet::new(),
            favorites: BTreeSet::new(),
        }
    }

    pub fn find_conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.history.iter().find(|c| &c.id == id)
    }

    pub fn find_conversation_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.history.iter_mut().find(|c| &c.id == id)
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }

    pub fn snapshot(&self, notice: Option<Notice>) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.messages.to_vec(),
            active_conversation: self.active_conversation.clone(),
            connection: self.connection,
            is_loading: self.is_loading,
            auth_loading: self.auth_loading,
            open_panel: self.menus.open_panel(),
            sidebar_open: self.menus.sidebar_open(),
            input: self.input.clone(),
            web_search_active: self.web_search_active,
            user: self.user.clone(),
            preferences: self.preferences,
            history: self.history.clone(),
            pinned: self.pinned.clone(),
            favorites: self.favorites.clone(),
            notice,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of everything a view renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub active_conversation: Option<ConversationId>,
    pub connection: ConnectionStatus,
    pub is_loading: bool,
    pub auth_loading: bool,
    pub open_panel: Option<Panel>,
    pub sidebar_open: bool,
    pub input: String,
    pub web_search_active: bool,
    pub user: Option<UserProfile>,
    pub preferences: Preferences,
    pub history: Vec<Conversation>,
    pub pinned: BTreeSet<MessageId>,
    pub favorites: BTreeSet<ConversationId>,
    pub notice: Option<Notice>,
}

impl ChatSnapshot {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}
