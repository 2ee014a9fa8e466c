//! JSON payloads exchanged with the chat webhook and the auth backend.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::FALLBACK_REPLY;
use crate::models::{FileData, UserProfile};

// ---------------------------------------------------------------------------
// Chat webhook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub chat_input: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub web_search_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileDataPayload>,
}

/// Attachment as sent on the wire. `isAudio` only appears for recordings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDataPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_audio: Option<bool>,
}

impl From<&FileData> for FileDataPayload {
    fn from(file: &FileData) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            base64: file.base64.clone(),
            is_audio: file.is_audio.then_some(true),
        }
    }
}

/// Reply field lookup order. Each entry is a path into the JSON body.
pub const REPLY_FIELD_PRIORITY: &[&[&str]] = &[&["data", "response"], &["response"], &["output"]];

/// Pull the bot reply out of a webhook response body.
///
/// A top-level array is unwrapped to its first element. Blank and non-string
/// fields are skipped. Falls back to [`FALLBACK_REPLY`], so the result is
/// never empty.
pub fn extract_reply(body: &Value) -> String {
    let body = match body {
        Value::Array(items) => match items.first() {
            Some(first) => first,
            None => return FALLBACK_REPLY.to_string(),
        },
        other => other,
    };

    REPLY_FIELD_PRIORITY
        .iter()
        .find_map(|path| {
            let mut cursor = body;
            for key in path.iter() {
                cursor = cursor.get(key)?;
            }
            cursor
                .as_str()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_REPLY.to_string())
}

/// Server-side conversation summary returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagUpdateRequest {
    pub tags: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Auth backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub device_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub device_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub session_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserProfile,
    pub session_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// `{ "error": { "message": "..." } }`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Non-blank message carried by an error body, if the body has one.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|env| env.error.message)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Strip the optional `{ "data": ... }` wrapper used by the auth backend.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
