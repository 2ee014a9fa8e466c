//! Display and sound preferences, each under its own key.

use causerie_shared::{FontSize, Preferences};
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::keys;
use crate::kv::{get_json, get_json_or_bare, set_json};
use crate::storage::Storage;

impl Storage {
    /// Load preferences. Missing or unreadable keys fall back to defaults
    /// individually.
    pub fn load_preferences(&self) -> Preferences {
        let defaults = Preferences::default();
        Preferences {
            dark_mode: self.pref_or(keys::DARK_MODE, defaults.dark_mode),
            font_size: match get_json_or_bare::<FontSize>(self.kv(), keys::FONT_SIZE) {
                Ok(Some(size)) => size,
                Ok(None) => defaults.font_size,
                Err(e) => {
                    tracing::warn!(key = keys::FONT_SIZE, error = %e, "ignoring unreadable preference");
                    defaults.font_size
                }
            },
            sound_enabled: self.pref_or(keys::SOUND_ENABLED, defaults.sound_enabled),
            tts_enabled: self.pref_or(keys::TTS_ENABLED, defaults.tts_enabled),
        }
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        set_json(self.kv(), keys::DARK_MODE, &prefs.dark_mode)?;
        set_json(self.kv(), keys::FONT_SIZE, &prefs.font_size)?;
        set_json(self.kv(), keys::SOUND_ENABLED, &prefs.sound_enabled)?;
        set_json(self.kv(), keys::TTS_ENABLED, &prefs.tts_enabled)?;
        Ok(())
    }

    fn pref_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match get_json::<T>(self.kv(), key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring unreadable preference");
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KeyValueStore;

    #[test]
    fn defaults_when_empty() {
        let storage = Storage::in_memory();
        let prefs = storage.load_preferences();
        assert_eq!(prefs, Preferences::default());
        assert!(prefs.sound_enabled);
        assert_eq!(prefs.font_size, FontSize::Medium);
    }

    #[test]
    fn save_then_load() {
        let storage = Storage::in_memory();
        let prefs = Preferences {
            dark_mode: true,
            font_size: FontSize::Large,
            sound_enabled: false,
            tts_enabled: true,
        };
        storage.save_preferences(&prefs).unwrap();
        assert_eq!(storage.load_preferences(), prefs);
        assert_eq!(storage.kv().get(keys::FONT_SIZE).unwrap().as_deref(), Some("\"large\""));
    }

    #[test]
    fn corrupt_key_falls_back_alone() {
        let storage = Storage::in_memory();
        storage.kv().set(keys::DARK_MODE, "true").unwrap();
        storage.kv().set(keys::FONT_SIZE, "\"gigantic\"").unwrap();

        let prefs = storage.load_preferences();
        assert!(prefs.dark_mode);
        assert_eq!(prefs.font_size, FontSize::Medium);
    }

    #[test]
    fn bare_font_size_is_accepted() {
        let storage = Storage::in_memory();
        storage.kv().set(keys::FONT_SIZE, "large").unwrap();
        assert_eq!(storage.load_preferences().font_size, FontSize::Large);

        storage.kv().set(keys::FONT_SIZE, "gigantic").unwrap();
        assert_eq!(storage.load_preferences().font_size, FontSize::Medium);
    }
}
