use causerie_shared::{ConnectionStatus, ConversationId, MessageId, MessageStatus, NoticeKind};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::menus::Panel;

const EVENT_CAPACITY: usize = 256;

/// State changes pushed to views.
///
/// Views re-read [`crate::ChatClient::snapshot`] on the coarse events and
/// may apply the fine-grained ones directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    MessagesChanged,
    MessageAdded { id: MessageId },
    MessageStatusChanged { id: MessageId, status: MessageStatus },
    ConnectionChanged { status: ConnectionStatus },
    LoadingChanged { loading: bool },
    AuthLoadingChanged { loading: bool },
    Notice { id: u64, message: String, kind: NoticeKind },
    NoticeDismissed { id: u64 },
    PlaySound,
    ConversationSaved { id: ConversationId },
    HistoryChanged,
    SessionChanged { logged_in: bool },
    MenusChanged { open: Option<Panel>, sidebar_open: bool },
    PreferencesChanged,
    /// A reply arrived for a conversation that is no longer displayed.
    LateReply { conversation_id: ConversationId },
}

/// Fan-out of [`ClientEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ClientEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::trace!(event = ?e.0, "no subscriber for event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
