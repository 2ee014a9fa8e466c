use causerie_shared::{FontSize, Preferences};
use tracing::debug;

use crate::client::ChatClient;
use crate::error::Result;
use crate::events::ClientEvent;

impl ChatClient {
    pub fn preferences(&self) -> Result<Preferences> {
        Ok(self.lock()?.preferences)
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.update_preferences(|p| p.dark_mode = enabled)
    }

    pub fn set_font_size(&self, size: FontSize) -> Result<()> {
        self.update_preferences(|p| p.font_size = size)
    }

    /// Also governs the success chime.
    pub fn set_sound_enabled(&self, enabled: bool) -> Result<()> {
        self.update_preferences(|p| p.sound_enabled = enabled)?;
        self.inner.notifier.set_sound_enabled(enabled);
        Ok(())
    }

    pub fn set_tts_enabled(&self, enabled: bool) -> Result<()> {
        self.update_preferences(|p| p.tts_enabled = enabled)
    }

    fn update_preferences(&self, change: impl FnOnce(&mut Preferences)) -> Result<()> {
        let prefs = {
            let mut state = self.lock()?;
            change(&mut state.preferences);
            self.inner.storage.save_preferences(&state.preferences)?;
            state.preferences
        };
        debug!(?prefs, "preferences updated");
        self.emit(ClientEvent::PreferencesChanged);
        Ok(())
    }
}
