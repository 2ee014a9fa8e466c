//! JSON exports written to disk, and re-import of a data export.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use causerie_shared::constants::{EXPORT_VERSION, HISTORY_LIMIT};
use causerie_shared::{Conversation, FontSize, Message, Preferences, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Storage;

/// A single conversation, as offered for download from the history screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationExport {
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub export_date: DateTime<Utc>,
}

impl ConversationExport {
    pub fn new(conversation: &Conversation) -> Self {
        Self {
            title: conversation.title.clone(),
            messages: conversation.messages.clone(),
            created_at: conversation.created_at,
            export_date: Utc::now(),
        }
    }
}

/// Everything the user owns: profile snapshot and full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    pub user: Option<UserProfile>,
    pub conversations: Vec<Conversation>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsExport {
    pub dark_mode: bool,
    pub font_size: FontSize,
    pub sound_enabled: bool,
    pub tts_enabled: bool,
    pub export_date: DateTime<Utc>,
}

impl From<&Preferences> for SettingsExport {
    fn from(prefs: &Preferences) -> Self {
        Self {
            dark_mode: prefs.dark_mode,
            font_size: prefs.font_size,
            sound_enabled: prefs.sound_enabled,
            tts_enabled: prefs.tts_enabled,
            export_date: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub conversations_imported: usize,
    /// Already present locally.
    pub conversations_skipped: usize,
    /// Not imported because history was full.
    pub conversations_dropped: usize,
}

/// `{stem}-{YYYY-MM-DD}.json`
pub fn export_file_name(stem: &str, at: DateTime<Utc>) -> String {
    format!("{stem}-{}.json", at.format("%Y-%m-%d"))
}

/// Pretty-print `value` to `dir/file_name`, creating `dir` if needed.
pub fn write_export<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, json)?;
    tracing::info!(path = %path.display(), "export written");
    Ok(path)
}

impl Storage {
    pub fn export_data(&self, user: Option<&UserProfile>) -> DataExport {
        DataExport {
            user: user.cloned(),
            conversations: self.load_history(),
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn export_settings(&self) -> SettingsExport {
        SettingsExport::from(&self.load_preferences())
    }

    /// Merge conversations from a data export into local history.
    ///
    /// Conversations whose id is already known are skipped. New ones are
    /// appended after the existing history until it holds the history limit;
    /// the rest are dropped.
    pub fn import_data(&self, export: &DataExport) -> Result<ImportStats> {
        let mut history = self.load_history();
        let mut known: HashSet<_> = history.iter().map(|c| c.id.clone()).collect();
        let mut stats = ImportStats::default();

        for conversation in &export.conversations {
            if known.contains(&conversation.id) {
                stats.conversations_skipped += 1;
            } else if history.len() >= HISTORY_LIMIT {
                stats.conversations_dropped += 1;
            } else {
                known.insert(conversation.id.clone());
                history.push(conversation.clone());
                stats.conversations_imported += 1;
            }
        }

        self.save_history(&history)?;
        tracing::info!(
            imported = stats.conversations_imported,
            skipped = stats.conversations_skipped,
            dropped = stats.conversations_dropped,
            "data export imported"
        );
        Ok(stats)
    }
}
