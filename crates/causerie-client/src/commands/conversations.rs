//! Conversation lifecycle: welcome, save, load, new, clear, delete, pins,
//! favorites, tags and search.

use std::collections::BTreeSet;
use std::time::Duration;

use causerie_shared::constants::SHORT_NOTIFICATION_MS;
use causerie_shared::protocol::ConversationSummary;
use causerie_shared::{
    ConnectionStatus, Conversation, ConversationId, Message, MessageId, NoticeKind,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::client::ChatClient;
use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::history::{self, HistoryFilter};
use crate::messages::MessageList;

pub const CLEAR_PROMPT: &str = "Effacer cette conversation ?";
pub const DELETE_PROMPT: &str = "Supprimer définitivement cette conversation ?";

impl ChatClient {
    /// Replace the list with the welcome message. No network call.
    pub fn initialize_chat(&self, name: Option<&str>) -> Result<()> {
        {
            let mut state = self.lock()?;
            let name = name.map(str::to_string).or_else(|| state.user_name().map(str::to_string));
            state.messages = MessageList::from_messages(vec![Message::welcome(name.as_deref())]);
            state.connection = ConnectionStatus::Connected;
        }
        self.emit(ClientEvent::MessagesChanged);
        self.emit(ClientEvent::ConnectionChanged {
            status: ConnectionStatus::Connected,
        });
        Ok(())
    }

    /// Write the displayed conversation into history.
    ///
    /// No-op (returns `false`) without an active conversation id or when
    /// only welcome/preview messages are displayed.
    pub fn save_current_conversation(&self) -> Result<bool> {
        let id = {
            let mut state = self.lock()?;
            let Some(id) = state.active_conversation.clone() else {
                return Ok(false);
            };
            let messages = state.messages.to_vec();
            let Some(mut record) = Conversation::from_messages(id.clone(), &messages, Utc::now())
            else {
                return Ok(false);
            };
            record.is_favorite = state.favorites.contains(&id);
            history::upsert(&mut state.history, record);

            self.inner.storage.save_history(&state.history)?;
            self.inner.storage.set_active_conversation_id(Some(&id))?;
            id
        };

        debug!(conversation_id = %id, "conversation saved");
        self.emit(ClientEvent::ConversationSaved { id });
        self.emit(ClientEvent::HistoryChanged);
        Ok(true)
    }

    /// Display a stored conversation.
    pub fn load_conversation(&self, id: &ConversationId) -> Result<()> {
        let (known, current) = {
            let state = self.lock()?;
            (state.find_conversation(id).is_some(), state.active_conversation.clone())
        };
        if !known {
            self.notify("Conversation introuvable", NoticeKind::Error);
            return Err(ClientError::NotFound(format!("Conversation {id}")));
        }

        if current.as_ref() != Some(id) {
            self.save_current_conversation()?;
        }
        self.inner.saver.cancel();

        let menus = {
            let mut state = self.lock()?;
            let messages = state
                .find_conversation(id)
                .map(|c| c.messages.clone())
                .ok_or_else(|| ClientError::NotFound(format!("Conversation {id}")))?;
            state.messages = MessageList::from_messages(messages);
            state.active_conversation = Some(id.clone());
            state.menus.set_sidebar(false);
            self.inner.storage.set_active_conversation_id(Some(id))?;
            state.menus
        };

        info!(conversation_id = %id, "conversation loaded");
        self.emit(ClientEvent::MessagesChanged);
        self.emit(ClientEvent::MenusChanged {
            open: menus.open_panel(),
            sidebar_open: menus.sidebar_open(),
        });
        self.notify_for(
            "Conversation chargée",
            NoticeKind::Success,
            Duration::from_millis(SHORT_NOTIFICATION_MS),
        );
        Ok(())
    }

    /// Save the current conversation, then start an empty one.
    pub fn create_new_conversation(&self) -> Result<ConversationId> {
        self.save_current_conversation()?;
        self.inner.saver.cancel();

        let id = ConversationId::new();
        let menus = {
            let mut state = self.lock()?;
            let welcome = Message::welcome(state.user_name());
            state.messages = MessageList::from_messages(vec![welcome]);
            state.active_conversation = Some(id.clone());
            state.menus.set_sidebar(false);
            self.inner.storage.set_active_conversation_id(Some(&id))?;
            state.menus
        };

        info!(conversation_id = %id, "new conversation");
        self.emit(ClientEvent::MessagesChanged);
        self.emit(ClientEvent::MenusChanged {
            open: menus.open_panel(),
            sidebar_open: menus.sidebar_open(),
        });
        Ok(id)
    }

    /// Empty the displayed conversation after confirmation. History keeps
    /// whatever was saved.
    pub async fn clear_chat(&self) -> Result<bool> {
        if !self.inner.confirm.confirm(CLEAR_PROMPT).await {
            return Ok(false);
        }
        {
            let mut state = self.lock()?;
            let welcome = Message::welcome(state.user_name());
            state.messages = MessageList::from_messages(vec![welcome]);
        }
        self.inner.saver.cancel();
        self.emit(ClientEvent::MessagesChanged);
        self.notify("Conversation effacée", NoticeKind::Info);
        Ok(true)
    }

    /// Returns whether the message is pinned afterwards.
    pub fn toggle_pin_message(&self, id: &MessageId) -> Result<bool> {
        let pinned = {
            let mut state = self.lock()?;
            let pinned = if state.pinned.remove(id) {
                false
            } else {
                state.pinned.insert(id.clone());
                true
            };
            self.inner.storage.save_pinned_messages(&state.pinned)?;
            pinned
        };

        if pinned {
            self.notify("Message épinglé", NoticeKind::Success);
        } else {
            self.notify("Message désépinglé", NoticeKind::Info);
        }
        Ok(pinned)
    }

    /// Returns whether the conversation is a favorite afterwards.
    pub fn toggle_favorite(&self, id: &ConversationId) -> Result<bool> {
        let favorite = {
            let mut state = self.lock()?;
            let favorite = if state.favorites.remove(id) {
                false
            } else {
                state.favorites.insert(id.clone());
                true
            };
            self.inner.storage.save_favorite_conversations(&state.favorites)?;
            if let Some(record) = state.find_conversation_mut(id) {
                record.is_favorite = favorite;
                self.inner.storage.save_history(&state.history)?;
            }
            favorite
        };

        self.emit(ClientEvent::HistoryChanged);
        if favorite {
            self.notify("Ajouté aux favoris", NoticeKind::Success);
        } else {
            self.notify("Retiré des favoris", NoticeKind::Info);
        }
        Ok(favorite)
    }

    /// Delete a conversation remotely, then locally.
    ///
    /// Nothing changes locally when the user declines or the backend
    /// refuses. Deleting the displayed conversation starts a new one.
    pub async fn delete_conversation(&self, id: &ConversationId) -> Result<bool> {
        if !self.inner.confirm.confirm(DELETE_PROMPT).await {
            return Ok(false);
        }

        let user_id = self.lock()?.user.as_ref().map(|u| u.id.clone());
        if let Err(e) = self
            .inner
            .chat
            .delete_conversation(id, user_id.as_deref())
            .await
        {
            warn!(conversation_id = %id, error = %e, "remote delete failed");
            self.notify(
                format!("Impossible de supprimer la conversation : {e}"),
                NoticeKind::Error,
            );
            return Err(e.into());
        }

        let was_active = {
            let mut state = self.lock()?;
            state.history.retain(|c| &c.id != id);
            state.favorites.remove(id);
            self.inner.storage.save_history(&state.history)?;
            self.inner.storage.save_favorite_conversations(&state.favorites)?;

            let was_active = state.active_conversation.as_ref() == Some(id);
            if was_active {
                state.messages.clear();
                state.active_conversation = None;
            }
            was_active
        };

        info!(conversation_id = %id, was_active, "conversation deleted");
        self.emit(ClientEvent::HistoryChanged);
        if was_active {
            self.inner.saver.cancel();
            self.create_new_conversation()?;
        }
        self.notify("Conversation supprimée", NoticeKind::Success);
        Ok(true)
    }

    /// Local search over saved conversations.
    pub fn search_history(&self, query: &str, filter: HistoryFilter) -> Result<Vec<Conversation>> {
        let state = self.lock()?;
        Ok(history::search(&state.history, query, filter, Utc::now())
            .into_iter()
            .cloned()
            .collect())
    }

    /// Server-side search through the chat backend.
    pub async fn search_remote(&self, query: &str) -> Result<Vec<ConversationSummary>> {
        let user_id = self.lock()?.user.as_ref().map(|u| u.id.clone());
        match self
            .inner
            .chat
            .search_conversations(query, user_id.as_deref())
            .await
        {
            Ok(found) => Ok(found),
            Err(e) => {
                warn!(error = %e, "remote search failed");
                self.notify("Erreur lors de la recherche", NoticeKind::Error);
                Err(e.into())
            }
        }
    }

    /// Replace a conversation's tags on the backend and mirror them locally.
    pub async fn set_conversation_tags(&self, id: &ConversationId, tags: BTreeSet<String>) -> Result<()> {
        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if let Err(e) = self.inner.chat.update_tags(id, &tags).await {
            warn!(conversation_id = %id, error = %e, "tag update failed");
            self.notify("Erreur lors de la mise à jour des tags", NoticeKind::Error);
            return Err(e.into());
        }

        {
            let mut state = self.lock()?;
            if let Some(record) = state.find_conversation_mut(id) {
                record.tags = tags;
                self.inner.storage.save_history(&state.history)?;
            }
        }
        self.emit(ClientEvent::HistoryChanged);
        Ok(())
    }
}
