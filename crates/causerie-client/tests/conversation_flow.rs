//! End-to-end flows through `ChatClient` with an in-memory store and fake
//! backends.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use causerie_client::commands::messaging::{CONNECTIVITY_ERROR, CROSS_ORIGIN_ERROR};
use causerie_client::{AutoConfirm, ChatClient, ClientConfig, ClientError, ClientEvent, HistoryFilter};
use causerie_net::{AuthBackend, ChatBackend, NetError};
use causerie_shared::protocol::{
    ChatRequest, ConversationSummary, LoginRequest, LoginResponse, MessageResponse,
    SignupRequest, SignupResponse,
};
use causerie_shared::{
    ConnectionStatus, Conversation, ConversationId, Credentials, FileData, Message, MessageId,
    MessageStatus, Sender, UserProfile, ValidationError,
};
use causerie_store::{DataExport, Storage};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeChat {
    replies: Mutex<VecDeque<Result<Value, NetError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    /// When set, `send` waits for a permit before answering.
    gate: Option<Arc<Notify>>,
    fail_delete: bool,
    deleted: Mutex<Vec<ConversationId>>,
    /// Body served by the conversation export endpoint.
    remote_export: Option<Value>,
}

impl FakeChat {
    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    fn replying(replies: Vec<Result<Value, NetError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for FakeChat {
    async fn send(&self, request: &ChatRequest) -> causerie_net::Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "response": "Bonjour, que puis-je faire ?" })))
    }

    async fn delete_conversation(
        &self,
        id: &ConversationId,
        _user_id: Option<&str>,
    ) -> causerie_net::Result<()> {
        if self.fail_delete {
            return Err(NetError::Backend {
                status: 500,
                message: "Erreur HTTP 500".into(),
            });
        }
        self.deleted.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn search_conversations(
        &self,
        query: &str,
        _user_id: Option<&str>,
    ) -> causerie_net::Result<Vec<ConversationSummary>> {
        Ok(vec![ConversationSummary {
            id: "conv_remote".into(),
            title: format!("Résultat pour {query}"),
            last_message: None,
            created_at: None,
        }])
    }

    async fn export_conversation(&self, _id: &ConversationId) -> causerie_net::Result<Value> {
        Ok(self.remote_export.clone().unwrap_or(Value::Null))
    }

    async fn update_tags(
        &self,
        _id: &ConversationId,
        _tags: &BTreeSet<String>,
    ) -> causerie_net::Result<()> {
        Ok(())
    }
}

struct FakeAuth {
    logins: AtomicUsize,
    logouts: AtomicUsize,
    session_valid: bool,
}

impl Default for FakeAuth {
    fn default() -> Self {
        Self {
            logins: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
            session_valid: true,
        }
    }
}

fn awa() -> UserProfile {
    UserProfile {
        id: "user_1".into(),
        name: "Awa".into(),
        email: "awa@exemple.fr".into(),
        email_verified: true,
    }
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn signup(&self, _request: &SignupRequest) -> causerie_net::Result<SignupResponse> {
        Ok(SignupResponse {
            user: None,
            message: Some("Compte créé".into()),
        })
    }

    async fn login(&self, request: &LoginRequest) -> causerie_net::Result<LoginResponse> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if request.password == "mauvais" {
            return Err(NetError::Backend {
                status: 401,
                message: "Identifiants invalides".into(),
            });
        }
        Ok(LoginResponse {
            user: awa(),
            session_token: "tok_123".into(),
        })
    }

    async fn logout(&self, _session_token: &str) -> causerie_net::Result<()> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn verify_session(&self, _session_token: &str) -> causerie_net::Result<bool> {
        Ok(self.session_valid)
    }

    async fn verify_email(&self, _token: &str) -> causerie_net::Result<MessageResponse> {
        Ok(MessageResponse {
            message: Some("E-mail confirmé".into()),
        })
    }
}

fn config() -> ClientConfig {
    ClientConfig {
        save_debounce: Duration::from_millis(1000),
        ..ClientConfig::default()
    }
}

fn build(chat: Arc<FakeChat>, auth: Arc<FakeAuth>, storage: Storage, confirm: bool) -> ChatClient {
    ChatClient::new(config(), storage, chat, auth, Arc::new(AutoConfirm(confirm))).unwrap()
}

fn client(chat: Arc<FakeChat>) -> ChatClient {
    build(chat, Arc::new(FakeAuth::default()), Storage::in_memory(), true)
}

async fn wait_for_requests(chat: &FakeChat, count: usize) {
    while chat.request_count() < count {
        tokio::task::yield_now().await;
    }
}

fn notice_text(client: &ChatClient) -> Option<String> {
    client.snapshot().unwrap().notice.map(|n| n.message)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_appends_one_sending_message_before_the_reply() {
    let gate = Arc::new(Notify::new());
    let chat = Arc::new(FakeChat::gated(gate.clone()));
    let client = client(chat.clone());
    client.create_new_conversation().unwrap();

    let sender = client.clone();
    let task = tokio::spawn(async move { sender.send_message("  Bonjour  ").await });
    wait_for_requests(&chat, 1).await;

    let snap = client.snapshot().unwrap();
    let users: Vec<_> = snap.messages.iter().filter(|m| m.sender == Sender::User).collect();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].text, "Bonjour");
    assert_eq!(users[0].status, MessageStatus::Sending);
    assert!(snap.is_loading);
    assert!(snap.messages.iter().all(|m| !m.is_welcome));
    assert_eq!(snap.connection, ConnectionStatus::Connecting);

    // A second send while the first is in flight is refused.
    assert!(matches!(client.send_message("encore").await, Err(ClientError::Busy)));

    gate.notify_one();
    task.await.unwrap().unwrap();

    let snap = client.snapshot().unwrap();
    assert_eq!(snap.messages.len(), 2);
    assert_eq!(snap.messages[0].status, MessageStatus::Delivered);
    assert_eq!(snap.messages[1].sender, Sender::Bot);
    assert_eq!(snap.messages[1].text, "Bonjour, que puis-je faire ?");
    assert!(!snap.is_loading);
    assert_eq!(snap.connection, ConnectionStatus::Connected);

    let request = &chat.requests.lock().unwrap()[0];
    assert_eq!(request.chat_input, "Bonjour");
    assert!(request.file_data.is_none());
}

#[tokio::test]
async fn empty_text_is_rejected_without_a_request() {
    let chat = Arc::new(FakeChat::default());
    let client = client(chat.clone());

    let err = client.send_message("   ").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ValidationError::EmptyMessage)));
    assert_eq!(chat.request_count(), 0);
    assert!(client.snapshot().unwrap().messages.is_empty());
}

#[tokio::test]
async fn transport_failure_marks_message_error() {
    let chat = Arc::new(FakeChat::replying(vec![
        Err(NetError::Connectivity("connection refused".into())),
        Err(NetError::CrossOrigin("blocked by CORS policy".into())),
    ]));
    let client = client(chat.clone());
    client.create_new_conversation().unwrap();

    assert!(client.send_message("premier").await.is_err());
    let snap = client.snapshot().unwrap();
    assert_eq!(snap.messages.len(), 1);
    assert_eq!(snap.messages[0].status, MessageStatus::Error);
    assert_eq!(snap.connection, ConnectionStatus::Error);
    assert!(!snap.is_loading);
    assert_eq!(notice_text(&client).as_deref(), Some(CONNECTIVITY_ERROR));

    assert!(client.send_message("second").await.is_err());
    assert_eq!(notice_text(&client).as_deref(), Some(CROSS_ORIGIN_ERROR));
    let statuses: Vec<_> = client
        .snapshot()
        .unwrap()
        .messages
        .iter()
        .map(|m| m.status)
        .collect();
    assert_eq!(statuses, vec![MessageStatus::Error, MessageStatus::Error]);
}

#[tokio::test]
async fn reply_suggestions_and_fallback() {
    let chat = Arc::new(FakeChat::replying(vec![
        Ok(json!([{ "output": "Voici.\n---\n- Comment aller plus loin ?\n- Quelles sont les limites ?" }])),
        Ok(json!({ "unexpected": true })),
    ]));
    let client = client(chat);

    client.send_message("question").await.unwrap();
    let snap = client.snapshot().unwrap();
    let bot = snap.messages.last().unwrap();
    assert_eq!(
        bot.suggested_questions,
        vec!["Comment aller plus loin ?", "Quelles sont les limites ?"]
    );

    client.send_message("autre").await.unwrap();
    let snap = client.snapshot().unwrap();
    assert_eq!(
        snap.messages.last().unwrap().text,
        "Désolé, je n'ai pas pu traiter votre demande."
    );
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn staged_preview_is_sent_with_the_input_as_caption() {
    let gate = Arc::new(Notify::new());
    let chat = Arc::new(FakeChat::gated(gate.clone()));
    let client = client(chat.clone());
    client.create_new_conversation().unwrap();

    let preview_id = client
        .stage_attachment(FileData::from_bytes("note.txt", "text/plain", b"bonjour"))
        .unwrap();
    assert_eq!(
        client.snapshot().unwrap().messages.last().unwrap().status,
        MessageStatus::Preview
    );

    client.set_input("Résume ce document").unwrap();
    let sender = client.clone();
    let task = tokio::spawn(async move { sender.submit_input().await });
    wait_for_requests(&chat, 1).await;

    let snap = client.snapshot().unwrap();
    let sent = snap.messages.iter().find(|m| m.id == preview_id).unwrap();
    assert_eq!(sent.status, MessageStatus::Sending);
    assert_eq!(sent.caption.as_deref(), Some("Résume ce document"));
    assert!(snap.input.is_empty());

    {
        let requests = chat.requests.lock().unwrap();
        assert_eq!(requests[0].chat_input, "Résume ce document");
        let file = requests[0].file_data.as_ref().unwrap();
        assert_eq!(file.name, "note.txt");
        assert!(file.base64.starts_with("data:text/plain;base64,"));
    }

    gate.notify_one();
    task.await.unwrap().unwrap();
    let snap = client.snapshot().unwrap();
    let sent = snap.messages.iter().find(|m| m.id == preview_id).unwrap();
    assert_eq!(sent.status, MessageStatus::Delivered);
}

#[tokio::test]
async fn preview_without_text_uses_default_prompt() {
    let chat = Arc::new(FakeChat::default());
    let client = client(chat.clone());

    client
        .stage_attachment(FileData::from_bytes("", "application/pdf", b"%PDF"))
        .unwrap();
    client.send_message("").await.unwrap();
    assert_eq!(chat.requests.lock().unwrap()[0].chat_input, "Analyse ce fichier");
}

#[tokio::test]
async fn oversized_attachment_is_refused() {
    let chat = Arc::new(FakeChat::default());
    let client = client(chat.clone());

    let big = vec![0u8; 5 * 1024 * 1024 + 1];
    let err = client
        .stage_attachment(FileData::from_bytes("gros.bin", "application/octet-stream", &big))
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::AttachmentTooLarge { .. })
    ));
    assert!(client.snapshot().unwrap().messages.is_empty());
    assert_eq!(notice_text(&client).as_deref(), Some("Fichier trop volumineux (max 5MB)"));
    assert_eq!(chat.request_count(), 0);
}

#[tokio::test]
async fn staging_replaces_previous_preview() {
    let client = client(Arc::new(FakeChat::default()));
    client
        .stage_attachment(FileData::from_bytes("a.txt", "text/plain", b"a"))
        .unwrap();
    client
        .stage_attachment(FileData::from_bytes("voix.webm", "audio/webm", b"b"))
        .unwrap();

    let snap = client.snapshot().unwrap();
    assert_eq!(snap.messages.len(), 1);
    assert_eq!(snap.messages[0].text, "Message vocal");
    assert_eq!(
        notice_text(&client).as_deref(),
        Some("Audio enregistré. Cliquez sur Envoyer.")
    );

    assert!(client.discard_preview().unwrap());
    assert!(client.snapshot().unwrap().messages.is_empty());
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[tokio::test]
async fn saving_requires_real_content() {
    let storage = Storage::in_memory();
    let client = build(
        Arc::new(FakeChat::default()),
        Arc::new(FakeAuth::default()),
        storage.clone(),
        true,
    );
    let id = client.create_new_conversation().unwrap();

    assert!(!client.save_current_conversation().unwrap());
    assert!(client.snapshot().unwrap().history.is_empty());

    let text = "Comment configurer mon webhook pour la production sans coupure ?";
    client.send_message(text).await.unwrap();
    assert!(client.save_current_conversation().unwrap());

    let history = client.snapshot().unwrap().history;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
    assert!(text.starts_with(&history[0].title));
    assert_eq!(history[0].title.chars().count(), 50);
    assert!(history[0].messages.iter().all(|m| !m.is_welcome));
    assert_eq!(storage.load_history().len(), 1);
    assert_eq!(storage.active_conversation_id().unwrap(), Some(id));
}

#[tokio::test]
async fn loading_unknown_conversation_changes_nothing() {
    let client = client(Arc::new(FakeChat::default()));
    let current = client.create_new_conversation().unwrap();
    let before = client.snapshot().unwrap().messages;

    let err = client
        .load_conversation(&ConversationId::from("conv_absent"))
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));

    let snap = client.snapshot().unwrap();
    assert_eq!(snap.messages, before);
    assert_eq!(snap.active_conversation, Some(current));
    assert_eq!(notice_text(&client).as_deref(), Some("Conversation introuvable"));
}

#[tokio::test]
async fn loading_restores_stored_messages() {
    let client = client(Arc::new(FakeChat::default()));
    let first = client.create_new_conversation().unwrap();
    client.send_message("Première conversation").await.unwrap();

    let second = client.create_new_conversation().unwrap();
    assert_ne!(first, second);
    client.send_message("Deuxième conversation").await.unwrap();

    client.load_conversation(&first).unwrap();
    let snap = client.snapshot().unwrap();
    let stored = snap.history.iter().find(|c| c.id == first).unwrap();
    assert_eq!(snap.messages, stored.messages);
    assert_eq!(snap.active_conversation, Some(first));
    assert!(!snap.sidebar_open);
    assert_eq!(notice_text(&client).as_deref(), Some("Conversation chargée"));

    // Leaving the second conversation saved it.
    assert_eq!(snap.history.len(), 2);
    assert_eq!(snap.history[0].id, second);
}

#[tokio::test]
async fn late_reply_lands_in_the_originating_conversation() {
    let gate = Arc::new(Notify::new());
    let chat = Arc::new(FakeChat::gated(gate.clone()));
    let client = client(chat.clone());
    let mut events = client.subscribe();
    let origin = client.create_new_conversation().unwrap();

    let sender = client.clone();
    let task = tokio::spawn(async move { sender.send_message("Question lente").await });
    wait_for_requests(&chat, 1).await;

    let other = client.create_new_conversation().unwrap();
    gate.notify_one();
    task.await.unwrap().unwrap();

    let snap = client.snapshot().unwrap();
    assert_eq!(snap.active_conversation, Some(other));
    assert!(snap.messages.iter().all(|m| m.is_welcome));

    let record = snap.history.iter().find(|c| c.id == origin).unwrap();
    assert_eq!(record.messages.len(), 2);
    assert_eq!(record.messages[0].status, MessageStatus::Delivered);
    assert_eq!(record.messages[1].sender, Sender::Bot);

    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, ClientEvent::LateReply { conversation_id } if *conversation_id == origin)));
}

#[tokio::test]
async fn clear_chat_keeps_history() {
    let client = client(Arc::new(FakeChat::default()));
    client.create_new_conversation().unwrap();
    client.send_message("à garder").await.unwrap();
    client.save_current_conversation().unwrap();

    assert!(client.clear_chat().await.unwrap());
    let snap = client.snapshot().unwrap();
    assert_eq!(snap.messages.len(), 1);
    assert!(snap.messages[0].is_welcome);
    assert_eq!(snap.history.len(), 1);
    assert_eq!(notice_text(&client).as_deref(), Some("Conversation effacée"));
}

#[tokio::test]
async fn declined_confirmation_changes_nothing() {
    let chat = Arc::new(FakeChat::default());
    let client = build(chat.clone(), Arc::new(FakeAuth::default()), Storage::in_memory(), false);
    let id = client.create_new_conversation().unwrap();
    client.send_message("reste là").await.unwrap();

    assert!(!client.clear_chat().await.unwrap());
    assert!(!client.delete_conversation(&id).await.unwrap());
    assert_eq!(client.snapshot().unwrap().messages.len(), 2);
    assert!(chat.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_the_active_conversation_starts_a_new_one() {
    let chat = Arc::new(FakeChat::default());
    let client = client(chat.clone());
    let id = client.create_new_conversation().unwrap();
    client.send_message("à supprimer").await.unwrap();
    client.save_current_conversation().unwrap();
    client.toggle_favorite(&id).unwrap();

    assert!(client.delete_conversation(&id).await.unwrap());
    let snap = client.snapshot().unwrap();
    assert!(snap.history.is_empty());
    assert!(snap.favorites.is_empty());
    assert_ne!(snap.active_conversation, Some(id.clone()));
    assert!(snap.active_conversation.is_some());
    assert!(snap.messages[0].is_welcome);
    assert_eq!(*chat.deleted.lock().unwrap(), vec![id]);
}

#[tokio::test]
async fn remote_delete_failure_keeps_local_copy() {
    let chat = Arc::new(FakeChat {
        fail_delete: true,
        ..Default::default()
    });
    let client = client(chat);
    let id = client.create_new_conversation().unwrap();
    client.send_message("toujours là").await.unwrap();
    client.save_current_conversation().unwrap();

    assert!(client.delete_conversation(&id).await.is_err());
    let snap = client.snapshot().unwrap();
    assert_eq!(snap.history.len(), 1);
    assert_eq!(snap.active_conversation, Some(id));
}

#[tokio::test]
async fn history_search_and_remote_search() {
    let client = client(Arc::new(FakeChat::default()));
    client.create_new_conversation().unwrap();
    client.send_message("Recette de la tarte aux pommes").await.unwrap();
    client.create_new_conversation().unwrap();
    client.send_message("Horaires du train").await.unwrap();
    client.save_current_conversation().unwrap();

    let found = client.search_history("TARTE", HistoryFilter::Today).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].title.starts_with("Recette"));
    assert_eq!(client.search_history("", HistoryFilter::All).unwrap().len(), 2);

    let remote = client.search_remote("train").await.unwrap();
    assert_eq!(remote[0].title, "Résultat pour train");
}

#[tokio::test]
async fn tags_are_mirrored_locally() {
    let client = client(Arc::new(FakeChat::default()));
    let id = client.create_new_conversation().unwrap();
    client.send_message("à étiqueter").await.unwrap();
    client.save_current_conversation().unwrap();

    let tags: BTreeSet<String> = [" travail ", "", "urgent"].iter().map(|t| t.to_string()).collect();
    client.set_conversation_tags(&id, tags).await.unwrap();

    let record = client.snapshot().unwrap().history.remove(0);
    assert_eq!(
        record.tags.into_iter().collect::<Vec<_>>(),
        vec!["travail".to_string(), "urgent".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn edits_are_saved_after_the_debounce_delay() {
    let storage = Storage::in_memory();
    let client = build(
        Arc::new(FakeChat::default()),
        Arc::new(FakeAuth::default()),
        storage.clone(),
        true,
    );
    client.create_new_conversation().unwrap();
    client.send_message("sauvegarde automatique").await.unwrap();
    assert!(storage.load_history().is_empty());

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(storage.load_history().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let history = storage.load_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].messages.len(), 2);
}

// ---------------------------------------------------------------------------
// Pins, favorites, preferences, menus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pin_toggle_twice_restores_the_set() {
    let storage = Storage::in_memory();
    let client = build(
        Arc::new(FakeChat::default()),
        Arc::new(FakeAuth::default()),
        storage.clone(),
        true,
    );
    let mut events = client.subscribe();
    let id = MessageId::from("msg_42");
    let before = client.snapshot().unwrap().pinned;

    assert!(client.toggle_pin_message(&id).unwrap());
    assert!(storage.pinned_messages().unwrap().contains(&id));
    assert!(!client.toggle_pin_message(&id).unwrap());

    assert_eq!(client.snapshot().unwrap().pinned, before);
    assert!(storage.pinned_messages().unwrap().is_empty());

    let notices: Vec<String> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            ClientEvent::Notice { message, .. } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(notices, vec!["Message épinglé", "Message désépinglé"]);
}

#[tokio::test]
async fn preferences_persist_and_control_sound() {
    let storage = Storage::in_memory();
    let client = build(
        Arc::new(FakeChat::default()),
        Arc::new(FakeAuth::default()),
        storage.clone(),
        true,
    );
    let mut events = client.subscribe();

    client.set_dark_mode(true).unwrap();
    client.set_sound_enabled(false).unwrap();
    assert!(storage.load_preferences().dark_mode);
    assert!(!storage.load_preferences().sound_enabled);

    drain(&mut events);
    client.toggle_pin_message(&MessageId::from("msg_1")).unwrap();
    assert!(!drain(&mut events).contains(&ClientEvent::PlaySound));
}

#[tokio::test]
async fn web_search_toggle_closes_options() {
    let chat = Arc::new(FakeChat::default());
    let client = client(chat.clone());

    client.open_menu(causerie_client::Panel::Options).unwrap();
    client.open_menu(causerie_client::Panel::Emoji).unwrap();
    assert_eq!(
        client.snapshot().unwrap().open_panel,
        Some(causerie_client::Panel::Emoji)
    );

    client.open_menu(causerie_client::Panel::Options).unwrap();
    assert!(client.toggle_web_search().unwrap());
    let snap = client.snapshot().unwrap();
    assert!(snap.web_search_active);
    assert_eq!(snap.open_panel, None);

    client.send_message("actualités").await.unwrap();
    assert!(chat.requests.lock().unwrap()[0].web_search_active);
}

// ---------------------------------------------------------------------------
// Auth session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_then_logout() {
    let storage = Storage::in_memory();
    let auth = Arc::new(FakeAuth::default());
    let client = build(Arc::new(FakeChat::default()), auth.clone(), storage.clone(), true);
    let device = storage.device_id().unwrap();

    let user = client
        .login(&Credentials {
            email: " Awa@Exemple.fr ".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
    assert_eq!(user.name, "Awa");

    let snap = client.snapshot().unwrap();
    assert!(snap.is_logged_in());
    assert!(!snap.auth_loading);
    assert!(snap.active_conversation.is_some());
    assert!(snap.messages[0].is_welcome);
    assert!(snap.messages[0].text.contains("Awa"));
    assert_eq!(notice_text(&client).as_deref(), Some("Bienvenue Awa !"));
    assert_eq!(storage.load_session().unwrap().token, "tok_123");

    client.send_message("avant de partir").await.unwrap();
    client.logout().await.unwrap();

    let snap = client.snapshot().unwrap();
    assert!(!snap.is_logged_in());
    assert!(snap.messages.is_empty());
    assert_eq!(snap.active_conversation, None);
    assert_eq!(snap.connection, ConnectionStatus::Disconnected);
    assert_eq!(snap.history.len(), 1);
    assert_eq!(notice_text(&client).as_deref(), Some("À bientôt !"));
    assert!(storage.load_session().is_none());
    assert_eq!(storage.device_id().unwrap(), device);
    assert_eq!(auth.logouts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_validation_and_backend_errors() {
    let auth = Arc::new(FakeAuth::default());
    let client = build(Arc::new(FakeChat::default()), auth.clone(), Storage::in_memory(), true);

    let err = client
        .login(&Credentials {
            email: "awa@exemple.fr".into(),
            password: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(ValidationError::MissingCredentials)));
    assert_eq!(auth.logins.load(Ordering::SeqCst), 0);

    client
        .login(&Credentials {
            email: "awa@exemple.fr".into(),
            password: "mauvais".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(notice_text(&client).as_deref(), Some("Identifiants invalides"));
    let snap = client.snapshot().unwrap();
    assert!(!snap.is_logged_in());
    assert!(!snap.auth_loading);
}

#[tokio::test]
async fn restored_session_reopens_last_conversation() {
    let storage = Storage::in_memory();
    let first = build(
        Arc::new(FakeChat::default()),
        Arc::new(FakeAuth::default()),
        storage.clone(),
        true,
    );
    first
        .login(&Credentials {
            email: "awa@exemple.fr".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
    first.send_message("on reprend plus tard").await.unwrap();
    let id = first.snapshot().unwrap().active_conversation.unwrap();
    first.save_current_conversation().unwrap();

    let second = build(
        Arc::new(FakeChat::default()),
        Arc::new(FakeAuth::default()),
        storage,
        true,
    );
    let user = second.restore_session().await.unwrap().unwrap();
    assert_eq!(user, awa());

    let snap = second.snapshot().unwrap();
    assert_eq!(snap.active_conversation, Some(id));
    assert_eq!(snap.messages.len(), 2);
    assert_eq!(snap.messages[0].text, "on reprend plus tard");
}

#[tokio::test]
async fn rejected_session_is_cleared_when_verification_is_enabled() {
    let storage = Storage::in_memory();
    storage.save_session("tok_old", &awa()).unwrap();

    let auth = Arc::new(FakeAuth {
        session_valid: false,
        ..Default::default()
    });
    let config = ClientConfig {
        verify_session_remotely: true,
        ..config()
    };
    let client = ChatClient::new(
        config,
        storage.clone(),
        Arc::new(FakeChat::default()),
        auth,
        Arc::new(AutoConfirm(true)),
    )
    .unwrap();

    assert!(client.restore_session().await.unwrap().is_none());
    assert!(storage.load_session().is_none());
    assert!(!client.snapshot().unwrap().is_logged_in());
}

#[tokio::test]
async fn signup_validates_before_calling_backend() {
    let client = client(Arc::new(FakeChat::default()));
    let mut form = causerie_shared::SignupForm {
        username: "awa".into(),
        email: "awa@exemple.fr".into(),
        password: "secret1".into(),
        confirm_password: "secret2".into(),
    };

    let err = client.signup(&form).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ValidationError::PasswordMismatch)));

    form.confirm_password = "secret1".into();
    assert_eq!(client.signup(&form).await.unwrap(), "Compte créé");
    assert_eq!(client.verify_email("jeton").await.unwrap(), "E-mail confirmé");
}

// ---------------------------------------------------------------------------
// Exports and wipe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn export_and_import_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let source = client(Arc::new(FakeChat::default()));
    let id = source.create_new_conversation().unwrap();
    source.send_message("à exporter").await.unwrap();

    let path = source.export_data(dir.path()).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("causerie-data-"));
    assert_eq!(
        notice_text(&source).as_deref(),
        Some("Données exportées avec succès !")
    );

    let export: DataExport = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(export.version, "1.0.0");
    assert_eq!(export.conversations.len(), 1);

    let conversation_path = source.export_conversation(&id, dir.path()).await.unwrap();
    assert!(conversation_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with(&format!("conversation-{id}-")));
    assert!(source
        .export_settings(dir.path())
        .unwrap()
        .exists());

    let target = client(Arc::new(FakeChat::default()));
    let stats = target.import_data(&path).await.unwrap();
    assert_eq!(stats.conversations_imported, 1);
    assert_eq!(target.snapshot().unwrap().history[0].id, id);

    let again = target.import_data(&path).await.unwrap();
    assert_eq!(again.conversations_skipped, 1);
}

#[tokio::test]
async fn exporting_unknown_conversation_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(Arc::new(FakeChat::default()));
    let err = client
        .export_conversation(&ConversationId::from("conv_absent"), dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(notice_text(&client).as_deref(), Some("Erreur lors de l'export"));
}

#[tokio::test]
async fn exporting_remote_only_conversation_uses_backend() {
    let dir = tempfile::tempdir().unwrap();
    let chat = Arc::new(FakeChat {
        remote_export: Some(json!({ "title": "Depuis le serveur", "messages": [] })),
        ..Default::default()
    });
    let client = client(chat);

    let path = client
        .export_conversation(&ConversationId::from("conv_remote"), dir.path())
        .await
        .unwrap();
    let written: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(written["title"], "Depuis le serveur");
    assert_eq!(notice_text(&client).as_deref(), Some("Conversation exportée !"));
}

#[tokio::test]
async fn import_into_full_history_reports_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::in_memory();
    let full: Vec<Conversation> = (0..50)
        .map(|i| {
            Conversation::from_messages(
                ConversationId::from(format!("conv_{i}")),
                &[Message::user(format!("ancien {i}"))],
                Utc::now(),
            )
            .unwrap()
        })
        .collect();
    storage.save_history(&full).unwrap();

    let path = dir.path().join("import.json");
    let export = DataExport {
        user: None,
        conversations: vec![Conversation::from_messages(
            ConversationId::from("conv_new"),
            &[Message::user("nouveau")],
            Utc::now(),
        )
        .unwrap()],
        export_date: Utc::now(),
        version: "1.0.0".into(),
    };
    std::fs::write(&path, serde_json::to_vec(&export).unwrap()).unwrap();

    let client = build(
        Arc::new(FakeChat::default()),
        Arc::new(FakeAuth::default()),
        storage,
        true,
    );
    let stats = client.import_data(&path).await.unwrap();
    assert_eq!(stats.conversations_imported, 0);
    assert_eq!(stats.conversations_dropped, 1);
    let snap = client.snapshot().unwrap();
    assert_eq!(snap.history.len(), 50);
    assert!(snap.history.iter().all(|c| c.id.as_str() != "conv_new"));
    assert_eq!(
        notice_text(&client).as_deref(),
        Some("0 conversation(s) importée(s), 1 ignorée(s) : historique plein")
    );
}

#[tokio::test]
async fn clear_all_data_wipes_and_logs_out() {
    let storage = Storage::in_memory();
    let client = build(
        Arc::new(FakeChat::default()),
        Arc::new(FakeAuth::default()),
        storage.clone(),
        true,
    );
    client
        .login(&Credentials {
            email: "awa@exemple.fr".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
    client.send_message("bientôt effacé").await.unwrap();
    client.save_current_conversation().unwrap();
    client.set_dark_mode(true).unwrap();

    assert!(client.clear_all_data().await.unwrap());
    let snap = client.snapshot().unwrap();
    assert!(!snap.is_logged_in());
    assert!(snap.history.is_empty());
    assert!(!snap.preferences.dark_mode);
    assert!(storage.load_history().is_empty());
    assert!(storage.load_session().is_none());
    assert_eq!(
        notice_text(&client).as_deref(),
        Some("Toutes les données ont été effacées")
    );
}
