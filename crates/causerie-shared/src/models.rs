//! Domain records held in memory and persisted as JSON.
//!
//! Field names are serialized in camelCase so the stored history stays
//! readable by (and compatible with) the web client's storage layout.

use std::collections::BTreeSet;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONVERSATION_TITLE, DEFAULT_USER_NAME, MAX_ATTACHMENT_SIZE, TITLE_MAX_CHARS,
    VOICE_MESSAGE_LABEL,
};
use crate::error::ValidationError;
use crate::types::{ConversationId, FontSize, MessageId, MessageStatus, Sender};

fn is_false(b: &bool) -> bool {
    !*b
}

/// Display timestamp used on message bubbles (`HH:MM`, local time).
pub fn display_time() -> String {
    Local::now().format("%H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// An attachment carried inline as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size of the raw file in bytes.
    pub size: u64,
    /// `data:<mime>;base64,<payload>`
    pub base64: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_audio: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_image: bool,
}

impl FileData {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        let mime_type = mime_type.into();
        let base64 = format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes));
        Self {
            name: name.into(),
            is_audio: mime_type.starts_with("audio/"),
            is_image: mime_type.starts_with("image/"),
            mime_type,
            size: bytes.len() as u64,
            base64,
        }
    }

    /// Reject attachments above [`MAX_ATTACHMENT_SIZE`].
    pub fn check_size(&self) -> Result<(), ValidationError> {
        check_attachment_size(self.size)
    }
}

pub fn check_attachment_size(size: u64) -> Result<(), ValidationError> {
    if size > MAX_ATTACHMENT_SIZE {
        return Err(ValidationError::AttachmentTooLarge {
            size,
            max_mb: MAX_ATTACHMENT_SIZE / (1024 * 1024),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    /// Local `HH:MM` string, for display only.
    pub timestamp: String,
    pub status: MessageStatus,
    /// When true, `text` is lightweight markup (bold, code, headers).
    #[serde(default)]
    pub formatted: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_welcome: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl Message {
    fn base(text: String, sender: Sender, status: MessageStatus) -> Self {
        Self {
            id: MessageId::new(),
            text,
            sender,
            timestamp: display_time(),
            status,
            formatted: false,
            is_welcome: false,
            suggested_questions: Vec::new(),
            file_data: None,
            caption: None,
        }
    }

    /// A user message about to be sent.
    pub fn user(text: impl Into<String>) -> Self {
        Self::base(text.into(), Sender::User, MessageStatus::Sending)
    }

    /// A bot reply; always rendered as markup.
    pub fn bot(text: impl Into<String>, suggested_questions: Vec<String>) -> Self {
        Self {
            formatted: true,
            suggested_questions,
            ..Self::base(text.into(), Sender::Bot, MessageStatus::Delivered)
        }
    }

    /// The synthesized greeting shown at the top of an empty conversation.
    pub fn welcome(name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_USER_NAME);
        Self {
            is_welcome: true,
            ..Self::bot(
                format!(
                    "Bonjour {name} ! Je suis votre assistant IA. Comment puis-je vous aider aujourd'hui ?"
                ),
                Vec::new(),
            )
        }
    }

    /// A staged attachment awaiting confirmation.
    pub fn attachment_preview(file: FileData) -> Self {
        let text = if file.is_audio {
            VOICE_MESSAGE_LABEL.to_string()
        } else {
            file.name.clone()
        };
        Self {
            file_data: Some(file),
            ..Self::base(text, Sender::User, MessageStatus::Preview)
        }
    }

    /// Whether this message counts as real conversation content.
    pub fn is_persistable(&self) -> bool {
        !self.is_welcome && self.status != MessageStatus::Preview
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Conversation {
    /// Build a history record from the live message list.
    ///
    /// Welcome and preview messages are dropped. Returns `None` when nothing
    /// real is left.
    pub fn from_messages(
        id: ConversationId,
        messages: &[Message],
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        let kept: Vec<Message> = messages
            .iter()
            .filter(|m| m.is_persistable())
            .cloned()
            .collect();
        let first = kept.first()?;
        let title = truncate_title(&first.text);
        let last_message = kept.last().map(|m| m.text.clone());

        Some(Self {
            id,
            title,
            messages: kept,
            created_at,
            last_message,
            tags: BTreeSet::new(),
            is_favorite: false,
        })
    }

    /// Case-insensitive match on the title or any message text.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self
                .messages
                .iter()
                .any(|m| m.text.to_lowercase().contains(&query))
    }
}

/// First [`TITLE_MAX_CHARS`] characters of the text.
pub fn truncate_title(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return DEFAULT_CONVERSATION_TITLE.to_string();
    }
    text.chars().take(TITLE_MAX_CHARS).collect()
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Profile returned by the auth backend and cached as `userInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "nom", alias = "username", alias = "name")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "emailVerified")]
    pub email_verified: bool,
}

/// Signup screen input.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login screen input.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub dark_mode: bool,
    pub font_size: FontSize,
    pub sound_enabled: bool,
    pub tts_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            font_size: FontSize::Medium,
            sound_enabled: true,
            tts_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_message_defaults_name() {
        let msg = Message::welcome(None);
        assert!(msg.is_welcome);
        assert!(msg.formatted);
        assert_eq!(msg.sender, Sender::Bot);
        assert!(msg.text.starts_with("Bonjour utilisateur !"));

        let named = Message::welcome(Some("Awa"));
        assert!(named.text.starts_with("Bonjour Awa !"));
    }

    #[test]
    fn test_file_data_flags_and_data_url() {
        let file = FileData::from_bytes("photo.png", "image/png", b"abc");
        assert!(file.is_image);
        assert!(!file.is_audio);
        assert_eq!(file.size, 3);
        assert_eq!(file.base64, "data:image/png;base64,YWJj");

        let voice = Message::attachment_preview(FileData::from_bytes("a.webm", "audio/webm", b"x"));
        assert_eq!(voice.text, VOICE_MESSAGE_LABEL);
        assert_eq!(voice.status, MessageStatus::Preview);
    }

    #[test]
    fn test_attachment_size_limit() {
        assert!(check_attachment_size(MAX_ATTACHMENT_SIZE).is_ok());
        let err = check_attachment_size(MAX_ATTACHMENT_SIZE + 1).unwrap_err();
        assert_eq!(err.to_string(), "Fichier trop volumineux (max 5MB)");
    }

    #[test]
    fn test_conversation_skips_welcome_and_preview() {
        let welcome = Message::welcome(None);
        assert!(Conversation::from_messages(ConversationId::new(), &[welcome.clone()], Utc::now())
            .is_none());

        let first = Message::user("Quelle est la capitale du Burkina Faso ?");
        let reply = Message::bot("Ouagadougou.", Vec::new());
        let preview = Message::attachment_preview(FileData::from_bytes("a.txt", "text/plain", b"x"));
        let conv = Conversation::from_messages(
            ConversationId::from("conv_1"),
            &[welcome, first.clone(), reply, preview],
            Utc::now(),
        )
        .unwrap();

        assert_eq!(conv.messages.len(), 2);
        assert!(first.text.starts_with(&conv.title));
        assert_eq!(conv.title.chars().count(), TITLE_MAX_CHARS.min(first.text.chars().count()));
        assert_eq!(conv.last_message.as_deref(), Some("Ouagadougou."));
    }

    #[test]
    fn test_title_truncates_on_char_boundary() {
        let text = "é".repeat(80);
        let title = truncate_title(&text);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert_eq!(truncate_title("   "), DEFAULT_CONVERSATION_TITLE);
    }

    #[test]
    fn test_user_profile_accepts_backend_field_names() {
        let json = r#"{"_id":"u1","username":"awa","email":"a@b.co"}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "awa");
        assert!(!user.email_verified);

        let stored = serde_json::to_value(&user).unwrap();
        assert_eq!(stored["nom"], "awa");
    }

    #[test]
    fn test_message_json_uses_camel_case() {
        let mut msg = Message::welcome(None);
        msg.suggested_questions = vec!["Une question assez longue ?".into()];
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["isWelcome"], true);
        assert_eq!(value["status"], "delivered");
        assert!(value["suggestedQuestions"].is_array());
        assert!(value.get("fileData").is_none());
    }
}
