use causerie_shared::constants::DEFAULT_FILE_PROMPT;
use causerie_shared::protocol::{extract_reply, ChatRequest, FileDataPayload};
use causerie_shared::suggestions::extract_suggested_questions;
use causerie_shared::{
    ConnectionStatus, ConversationId, Message, MessageId, MessageStatus, NoticeKind,
    ValidationError,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::client::{ChatClient, LoadingKind};
use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::messages::StatusUpdate;
use crate::state::AppState;

pub const CROSS_ORIGIN_ERROR: &str = "Erreur CORS : vérifiez la configuration de votre webhook.";
pub const CONNECTIVITY_ERROR: &str = "Erreur de connexion. Réessayez plus tard.";

/// A send that has been committed to the message list and awaits the
/// webhook.
#[derive(Debug)]
struct PendingSend {
    message_id: MessageId,
    /// Conversation displayed when the send started.
    conversation_id: Option<ConversationId>,
    request: ChatRequest,
}

enum Settled {
    InView { reply_id: Option<MessageId> },
    Late { conversation_id: ConversationId },
    Dropped,
}

fn build_request(state: &AppState, chat_input: String, file: Option<FileDataPayload>) -> ChatRequest {
    ChatRequest {
        chat_input,
        session_id: state.session_id.to_string(),
        user_id: state.user.as_ref().map(|u| u.id.clone()),
        timestamp: Utc::now(),
        web_search_active: state.web_search_active,
        file_data: file,
    }
}

/// Move an attachment message to `sending` and build its request.
fn begin_file_send(state: &mut AppState, id: &MessageId) -> Result<PendingSend> {
    if state.messages.get(id).map(|m| m.status) == Some(MessageStatus::Preview) {
        state.messages.set_status(id, MessageStatus::Sending);
    }
    let message = state
        .messages
        .get(id)
        .cloned()
        .ok_or_else(|| ClientError::NotFound(format!("Message {id}")))?;

    let chat_input = message
        .caption
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .or(Some(message.text.as_str()).filter(|t| !t.trim().is_empty()))
        .unwrap_or(DEFAULT_FILE_PROMPT)
        .to_string();
    let file = message.file_data.as_ref().map(FileDataPayload::from);

    state.messages.strip_welcome();
    Ok(PendingSend {
        message_id: message.id,
        conversation_id: state.active_conversation.clone(),
        request: build_request(state, chat_input, file),
    })
}

impl ChatClient {
    pub fn set_input(&self, text: impl Into<String>) -> Result<()> {
        self.lock()?.input = text.into();
        Ok(())
    }

    /// Copy a suggested question into the composer.
    pub fn use_suggested_question(&self, question: &str) -> Result<()> {
        self.set_input(question)
    }

    /// Send whatever is in the composer.
    pub async fn submit_input(&self) -> Result<()> {
        let text = self.lock()?.input.clone();
        self.send_message(&text).await
    }

    /// Send `text`, or the staged attachment with `text` as its caption.
    ///
    /// The user message is appended in `sending` before the webhook is
    /// called and ends `delivered` or `error`. Fails with `Busy` while
    /// another send is in flight.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let trimmed = text.trim();
        let pending = {
            let mut state = self.lock()?;
            if state.is_loading {
                return Err(ClientError::Busy);
            }

            let pending = match state.messages.preview_id() {
                Some(preview_id) => {
                    if !trimmed.is_empty() {
                        if let Some(preview) = state.messages.get_mut(&preview_id) {
                            preview.caption = Some(trimmed.to_string());
                        }
                    }
                    begin_file_send(&mut state, &preview_id)?
                }
                None => {
                    if trimmed.is_empty() {
                        return Err(ValidationError::EmptyMessage.into());
                    }
                    let message = Message::user(trimmed);
                    let message_id = message.id.clone();
                    state.messages.strip_welcome();
                    state.messages.push(message);
                    PendingSend {
                        message_id,
                        conversation_id: state.active_conversation.clone(),
                        request: build_request(&state, trimmed.to_string(), None),
                    }
                }
            };

            state.input.clear();
            state.is_loading = true;
            state.connection = ConnectionStatus::Connecting;
            pending
        };

        self.send_started(&pending);
        self.dispatch(pending).await
    }

    /// Send an attachment message. It is appended when not already listed.
    pub async fn send_message_with_file(&self, message: Message) -> Result<()> {
        if let Some(file) = &message.file_data {
            if let Err(e) = file.check_size() {
                self.notify(e.to_string(), NoticeKind::Error);
                return Err(e.into());
            }
        }

        let pending = {
            let mut state = self.lock()?;
            if state.is_loading {
                return Err(ClientError::Busy);
            }
            let id = message.id.clone();
            if !state.messages.contains(&id) {
                state.messages.push(message);
            }
            let pending = begin_file_send(&mut state, &id)?;
            state.input.clear();
            state.is_loading = true;
            state.connection = ConnectionStatus::Connecting;
            pending
        };

        self.send_started(&pending);
        self.dispatch(pending).await
    }

    fn send_started(&self, pending: &PendingSend) {
        info!(
            msg_id = %pending.message_id,
            has_file = pending.request.file_data.is_some(),
            "sending message"
        );
        self.emit(ClientEvent::LoadingChanged { loading: true });
        self.emit(ClientEvent::ConnectionChanged {
            status: ConnectionStatus::Connecting,
        });
        self.emit(ClientEvent::MessageStatusChanged {
            id: pending.message_id.clone(),
            status: MessageStatus::Sending,
        });
        self.messages_changed();
    }

    async fn dispatch(&self, pending: PendingSend) -> Result<()> {
        let _loading = self.loading_guard(LoadingKind::Chat);

        match self.inner.chat.send(&pending.request).await {
            Ok(body) => {
                let reply = extract_reply(&body);
                let suggestions = extract_suggested_questions(&reply);
                debug!(
                    msg_id = %pending.message_id,
                    suggestions = suggestions.len(),
                    "reply received"
                );
                self.settle(&pending, MessageStatus::Delivered, Some(Message::bot(reply, suggestions)))?;
                self.set_connection(ConnectionStatus::Connected)?;
                Ok(())
            }
            Err(e) => {
                warn!(
                    msg_id = %pending.message_id,
                    error = %e,
                    transport = e.is_transport(),
                    status = e.status(),
                    "send failed"
                );
                self.settle(&pending, MessageStatus::Error, None)?;
                self.set_connection(ConnectionStatus::Error)?;
                let text = if e.is_cross_origin() {
                    CROSS_ORIGIN_ERROR
                } else {
                    CONNECTIVITY_ERROR
                };
                self.notify(text, NoticeKind::Error);
                Err(e.into())
            }
        }
    }

    /// Apply the outcome of a send.
    ///
    /// When the user has moved to another conversation meanwhile, the
    /// outcome is written into the stored record of the conversation the
    /// send started in.
    fn settle(&self, pending: &PendingSend, status: MessageStatus, reply: Option<Message>) -> Result<()> {
        let id = &pending.message_id;
        let outcome = {
            let mut state = self.lock()?;
            let same_conversation = state.active_conversation == pending.conversation_id;

            if same_conversation && state.messages.contains(id) {
                if let StatusUpdate::Rejected { from } = state.messages.set_status(id, status) {
                    warn!(msg_id = %id, ?from, to = ?status, "ignored illegal status change");
                }
                let reply_id = reply.map(|r| {
                    let reply_id = r.id.clone();
                    state.messages.push(r);
                    reply_id
                });
                Settled::InView { reply_id }
            } else if let (false, Some(conversation_id)) = (same_conversation, &pending.conversation_id) {
                match state.find_conversation_mut(conversation_id) {
                    Some(record) => {
                        if let Some(m) = record.messages.iter_mut().find(|m| &m.id == id) {
                            if m.status.can_transition_to(status) {
                                m.status = status;
                            }
                        }
                        if let Some(reply) = reply {
                            record.last_message = Some(reply.text.clone());
                            record.messages.push(reply);
                        }
                        self.inner.storage.save_history(&state.history)?;
                        Settled::Late {
                            conversation_id: conversation_id.clone(),
                        }
                    }
                    None => Settled::Dropped,
                }
            } else {
                Settled::Dropped
            }
        };

        match outcome {
            Settled::InView { reply_id } => {
                self.emit(ClientEvent::MessageStatusChanged {
                    id: id.clone(),
                    status,
                });
                if let Some(reply_id) = reply_id {
                    self.emit(ClientEvent::MessageAdded { id: reply_id });
                }
                self.messages_changed();
            }
            Settled::Late { conversation_id } => {
                info!(msg_id = %id, conversation_id = %conversation_id, "late reply stored in history");
                self.emit(ClientEvent::LateReply { conversation_id });
                self.emit(ClientEvent::HistoryChanged);
            }
            Settled::Dropped => {
                debug!(msg_id = %id, "send outcome dropped, message no longer exists");
            }
        }
        Ok(())
    }
}
