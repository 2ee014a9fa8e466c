//! The conversation state manager.
//!
//! [`ChatClient`] owns the [`AppState`], the storage facade, both backends,
//! the confirmation prompt and the notifier. Operations live in the
//! `commands` modules, grouped by concern, as `impl ChatClient` blocks.
//!
//! The state mutex is only held for short synchronous sections, never across
//! an `.await`.

use std::sync::{Arc, MutexGuard, Weak};
use std::time::Duration;

use causerie_net::{AuthBackend, AuthClient, ChatBackend, WebhookClient};
use causerie_shared::{ConnectionStatus, Conversation, MessageStatus, NoticeKind};
use causerie_store::Storage;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::confirm::Confirm;
use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventBus};
use crate::notification::Notifier;
use crate::state::{AppState, ChatSnapshot};

/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) state: std::sync::Mutex<AppState>,
    pub(crate) storage: Storage,
    pub(crate) chat: Arc<dyn ChatBackend>,
    pub(crate) auth: Arc<dyn AuthBackend>,
    pub(crate) confirm: Arc<dyn Confirm>,
    pub(crate) notifier: Notifier,
    pub(crate) saver: Debouncer,
    pub(crate) events: EventBus,
    pub(crate) config: ClientConfig,
}

impl ChatClient {
    /// Build a client from explicit collaborators and load persisted state.
    ///
    /// Messages left in `sending` by a previous run are marked `error`.
    pub fn new(
        config: ClientConfig,
        storage: Storage,
        chat: Arc<dyn ChatBackend>,
        auth: Arc<dyn AuthBackend>,
        confirm: Arc<dyn Confirm>,
    ) -> Result<Self> {
        let events = EventBus::new();
        let notifier = Notifier::new(events.clone(), config.notification_duration);

        let mut state = AppState::new();
        state.preferences = storage.load_preferences();
        state.history = storage.load_history();
        state.pinned = storage.pinned_messages()?;
        state.favorites = storage.favorite_conversations()?;
        storage.device_id()?;

        if fail_stale_sends(&mut state.history) > 0 {
            storage.save_history(&state.history)?;
        }
        for conversation in &mut state.history {
            conversation.is_favorite = state.favorites.contains(&conversation.id);
        }
        notifier.set_sound_enabled(state.preferences.sound_enabled);

        info!(
            conversations = state.history.len(),
            session_id = %state.session_id,
            "chat client ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                state: std::sync::Mutex::new(state),
                storage,
                chat,
                auth,
                confirm,
                notifier,
                saver: Debouncer::new(config.save_debounce),
                events,
                config,
            }),
        })
    }

    /// Build a client with the SQLite store and HTTP backends described by
    /// `config`.
    pub fn connect(config: ClientConfig, confirm: Arc<dyn Confirm>) -> Result<Self> {
        let storage = Storage::open(config.data_dir.as_deref())?;
        let chat = WebhookClient::new(&config.webhook_config())?;
        let auth = AuthClient::new(&config.auth_api_url, config.request_timeout)?;
        Self::new(config, storage, Arc::new(chat), Arc::new(auth), confirm)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> Result<ChatSnapshot> {
        let notice = self.inner.notifier.current();
        Ok(self.lock()?.snapshot(notice))
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, AppState>> {
        self.inner.state.lock().map_err(|_| ClientError::LockPoisoned)
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        self.inner.events.emit(event);
    }

    /// Never call while holding the state lock.
    pub(crate) fn notify(&self, message: impl Into<String>, kind: NoticeKind) {
        self.inner.notifier.show(message, kind);
    }

    pub(crate) fn notify_for(&self, message: impl Into<String>, kind: NoticeKind, duration: Duration) {
        self.inner.notifier.show_for(message, kind, duration);
    }

    pub(crate) fn set_connection(&self, status: ConnectionStatus) -> Result<()> {
        let changed = {
            let mut state = self.lock()?;
            let changed = state.connection != status;
            state.connection = status;
            changed
        };
        if changed {
            self.emit(ClientEvent::ConnectionChanged { status });
        }
        Ok(())
    }

    /// Announce a message-list mutation and (re)start the save timer.
    pub(crate) fn messages_changed(&self) {
        self.emit(ClientEvent::MessagesChanged);

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.saver.schedule(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let client = ChatClient { inner };
            if let Err(e) = client.save_current_conversation() {
                warn!(error = %e, "debounced save failed");
            }
        });
    }

    /// Raise a busy flag for the lifetime of the returned guard.
    pub(crate) fn loading_guard(&self, kind: LoadingKind) -> LoadingGuard {
        LoadingGuard {
            client: self.clone(),
            kind,
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("storage", &self.inner.storage)
            .finish_non_exhaustive()
    }
}

/// Stored messages still `sending` belong to a request that died with the
/// previous process.
fn fail_stale_sends(history: &mut [Conversation]) -> usize {
    let mut fixed = 0;
    for message in history.iter_mut().flat_map(|c| c.messages.iter_mut()) {
        if message.status == MessageStatus::Sending {
            message.status = MessageStatus::Error;
            fixed += 1;
        }
    }
    if fixed > 0 {
        warn!(count = fixed, "marked interrupted sends as failed");
    }
    fixed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadingKind {
    Chat,
    Auth,
}

/// Clears its loading flag on drop, whatever path the operation took.
pub(crate) struct LoadingGuard {
    client: ChatClient,
    kind: LoadingKind,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        match self.client.lock() {
            Ok(mut state) => match self.kind {
                LoadingKind::Chat => state.is_loading = false,
                LoadingKind::Auth => state.auth_loading = false,
            },
            Err(_) => {
                tracing::error!("state lock poisoned while clearing loading flag");
                return;
            }
        }
        let event = match self.kind {
            LoadingKind::Chat => ClientEvent::LoadingChanged { loading: false },
            LoadingKind::Auth => ClientEvent::AuthLoadingChanged { loading: false },
        };
        self.client.emit(event);
    }
}
