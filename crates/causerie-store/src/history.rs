//! Conversation history, active conversation, pins and favorites.

use std::collections::BTreeSet;

use causerie_shared::{Conversation, ConversationId, MessageId};

use crate::error::Result;
use crate::keys;
use crate::kv::{get_json, get_json_or_bare, set_json};
use crate::storage::Storage;

impl Storage {
    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Stored history, newest first. Unreadable history is logged and
    /// treated as empty so the client can still start.
    pub fn load_history(&self) -> Vec<Conversation> {
        match get_json::<Vec<Conversation>>(self.kv(), keys::CONVERSATION_HISTORY) {
            Ok(history) => history.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "conversation history unreadable, starting empty");
                Vec::new()
            }
        }
    }

    pub fn save_history(&self, history: &[Conversation]) -> Result<()> {
        set_json(self.kv(), keys::CONVERSATION_HISTORY, history)
    }

    // ------------------------------------------------------------------
    // Active conversation
    // ------------------------------------------------------------------

    pub fn active_conversation_id(&self) -> Result<Option<ConversationId>> {
        get_json_or_bare(self.kv(), keys::CURRENT_CONVERSATION_ID)
    }

    pub fn set_active_conversation_id(&self, id: Option<&ConversationId>) -> Result<()> {
        match id {
            Some(id) => set_json(self.kv(), keys::CURRENT_CONVERSATION_ID, id),
            None => self.kv().remove(keys::CURRENT_CONVERSATION_ID).map(|_| ()),
        }
    }

    // ------------------------------------------------------------------
    // Pins and favorites
    // ------------------------------------------------------------------

    pub fn pinned_messages(&self) -> Result<BTreeSet<MessageId>> {
        Ok(get_json(self.kv(), keys::PINNED_MESSAGES)?.unwrap_or_default())
    }

    pub fn save_pinned_messages(&self, pinned: &BTreeSet<MessageId>) -> Result<()> {
        set_json(self.kv(), keys::PINNED_MESSAGES, pinned)
    }

    pub fn favorite_conversations(&self) -> Result<BTreeSet<ConversationId>> {
        Ok(get_json(self.kv(), keys::FAVORITE_CONVERSATIONS)?.unwrap_or_default())
    }

    pub fn save_favorite_conversations(&self, favorites: &BTreeSet<ConversationId>) -> Result<()> {
        set_json(self.kv(), keys::FAVORITE_CONVERSATIONS, favorites)
    }
}
