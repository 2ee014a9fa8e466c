use std::path::Path;

use causerie_shared::models::check_attachment_size;
use causerie_shared::{FileData, Message, MessageId, NoticeKind};
use tracing::info;

use crate::client::ChatClient;
use crate::error::Result;
use crate::events::ClientEvent;
use crate::menus::Panel;

pub const AUDIO_STAGED_NOTICE: &str = "Audio enregistré. Cliquez sur Envoyer.";

impl ChatClient {
    /// Stage an attachment as a `preview` message, replacing any previous
    /// preview. Oversized files are rejected before anything changes.
    pub fn stage_attachment(&self, file: FileData) -> Result<MessageId> {
        if let Err(e) = file.check_size() {
            self.notify(e.to_string(), NoticeKind::Error);
            return Err(e.into());
        }

        let is_audio = file.is_audio;
        let preview = Message::attachment_preview(file);
        let id = preview.id.clone();
        let menus = {
            let mut state = self.lock()?;
            state.messages.remove_previews();
            state.messages.push(preview);
            state.menus.close(Panel::Attach);
            state.menus
        };

        info!(msg_id = %id, is_audio, "attachment staged");
        self.emit(ClientEvent::MessageAdded { id: id.clone() });
        self.emit(ClientEvent::MenusChanged {
            open: menus.open_panel(),
            sidebar_open: menus.sidebar_open(),
        });
        self.messages_changed();
        if is_audio {
            self.notify(AUDIO_STAGED_NOTICE, NoticeKind::Info);
        }
        Ok(id)
    }

    /// Read a file from disk and stage it.
    pub async fn attach_file(&self, path: &Path) -> Result<MessageId> {
        let size = tokio::fs::metadata(path).await?.len();
        if let Err(e) = check_attachment_size(size) {
            self.notify(e.to_string(), NoticeKind::Error);
            return Err(e.into());
        }

        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "fichier".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        self.stage_attachment(FileData::from_bytes(name, mime.essence_str(), &bytes))
    }

    /// Drop the staged attachment, if any.
    pub fn discard_preview(&self) -> Result<bool> {
        let removed = self.lock()?.messages.remove_previews() > 0;
        if removed {
            self.emit(ClientEvent::MessagesChanged);
        }
        Ok(removed)
    }
}
