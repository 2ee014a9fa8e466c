//! JSON exports, data import, and the clear-everything action.

use std::path::{Path, PathBuf};

use causerie_shared::{ConversationId, NoticeKind, Preferences};
use causerie_store::export::{export_file_name, write_export};
use causerie_store::{ConversationExport, DataExport, ImportStats, StoreError};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::client::ChatClient;
use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::messages::MessageList;

pub const EXPORT_FAILED: &str = "Erreur lors de l'export";
pub const CLEAR_ALL_PROMPT: &str =
    "Êtes-vous sûr de vouloir effacer toutes vos données ? Cette action est irréversible.";

impl ChatClient {
    /// Write one conversation to `dir`. The displayed conversation is saved
    /// first so the export reflects what is on screen. Conversations not in
    /// local history are exported from the backend.
    pub async fn export_conversation(&self, id: &ConversationId, dir: &Path) -> Result<PathBuf> {
        let result = self.write_conversation_export(id, dir).await;
        self.report_export(result, "Conversation exportée !")
    }

    async fn write_conversation_export(&self, id: &ConversationId, dir: &Path) -> Result<PathBuf> {
        if self.lock()?.active_conversation.as_ref() == Some(id) {
            self.save_current_conversation()?;
        }
        let local = self.lock()?.find_conversation(id).map(ConversationExport::new);
        let name = export_file_name(&format!("conversation-{id}"), Utc::now());
        if let Some(export) = local {
            return Ok(write_export(dir, &name, &export)?);
        }

        debug!(conversation_id = %id, "not in local history, asking the backend");
        let remote = self.inner.chat.export_conversation(id).await?;
        if remote.is_null() {
            return Err(ClientError::NotFound(format!("Conversation {id}")));
        }
        Ok(write_export(dir, &name, &remote)?)
    }

    /// Write the profile snapshot and the whole history to `dir`.
    pub fn export_data(&self, dir: &Path) -> Result<PathBuf> {
        let result = self.write_data_export(dir);
        self.report_export(result, "Données exportées avec succès !")
    }

    fn write_data_export(&self, dir: &Path) -> Result<PathBuf> {
        self.save_current_conversation()?;
        let user = self.lock()?.user.clone();
        let export = self.inner.storage.export_data(user.as_ref());
        let name = export_file_name("causerie-data", Utc::now());
        Ok(write_export(dir, &name, &export)?)
    }

    pub fn export_settings(&self, dir: &Path) -> Result<PathBuf> {
        let export = self.inner.storage.export_settings();
        let name = export_file_name("causerie-settings", Utc::now());
        let result = write_export(dir, &name, &export).map_err(ClientError::from);
        self.report_export(result, "Paramètres exportés !")
    }

    fn report_export(&self, result: Result<PathBuf>, success: &str) -> Result<PathBuf> {
        match &result {
            Ok(path) => {
                info!(path = %path.display(), "export written");
                self.notify(success, NoticeKind::Success);
            }
            Err(e) => {
                error!(error = %e, "export failed");
                self.notify(EXPORT_FAILED, NoticeKind::Error);
            }
        }
        result
    }

    /// Merge a data export file into history. Known conversation ids are
    /// skipped.
    pub async fn import_data(&self, path: &Path) -> Result<ImportStats> {
        let stats = match self.read_and_import(path).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "import failed");
                self.notify("Erreur lors de l'import", NoticeKind::Error);
                return Err(e);
            }
        };

        {
            let mut guard = self.lock()?;
            let state = &mut *guard;
            state.history = self.inner.storage.load_history();
            for conversation in &mut state.history {
                conversation.is_favorite = state.favorites.contains(&conversation.id);
            }
        }
        self.emit(ClientEvent::HistoryChanged);
        let mut message = format!("{} conversation(s) importée(s)", stats.conversations_imported);
        if stats.conversations_dropped > 0 {
            message.push_str(&format!(
                ", {} ignorée(s) : historique plein",
                stats.conversations_dropped
            ));
        }
        self.notify(message, NoticeKind::Success);
        Ok(stats)
    }

    async fn read_and_import(&self, path: &Path) -> Result<ImportStats> {
        let raw = tokio::fs::read(path).await?;
        let export: DataExport = serde_json::from_slice(&raw).map_err(StoreError::from)?;
        self.save_current_conversation()?;
        Ok(self.inner.storage.import_data(&export)?)
    }

    /// Wipe every stored key after confirmation, then log out.
    pub async fn clear_all_data(&self) -> Result<bool> {
        if !self.inner.confirm.confirm(CLEAR_ALL_PROMPT).await {
            return Ok(false);
        }

        self.inner.saver.cancel();
        {
            let mut state = self.lock()?;
            state.messages = MessageList::new();
            state.active_conversation = None;
            self.inner.storage.clear_all()?;
            state.history.clear();
            state.pinned.clear();
            state.favorites.clear();
            state.preferences = Preferences::default();
        }
        self.inner
            .notifier
            .set_sound_enabled(Preferences::default().sound_enabled);

        warn!("all local data cleared");
        self.emit(ClientEvent::MessagesChanged);
        self.emit(ClientEvent::HistoryChanged);
        self.emit(ClientEvent::PreferencesChanged);
        self.logout().await?;
        self.notify("Toutes les données ont été effacées", NoticeKind::Success);
        Ok(true)
    }
}
