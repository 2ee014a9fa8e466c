//! Device identity and the logged-in session.

use causerie_shared::{DeviceId, UserProfile};

use crate::error::Result;
use crate::keys;
use crate::kv::{get_json, set_json};
use crate::storage::Storage;

/// A session read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub user: UserProfile,
}

impl Storage {
    /// The installation's device id, created on first use.
    pub fn device_id(&self) -> Result<DeviceId> {
        if let Some(id) = get_json::<DeviceId>(self.kv(), keys::DEVICE_ID)? {
            return Ok(id);
        }
        let id = DeviceId::new();
        set_json(self.kv(), keys::DEVICE_ID, &id)?;
        tracing::info!(device_id = %id, "created device id");
        Ok(id)
    }

    /// Token and user snapshot, when both are present and readable.
    pub fn load_session(&self) -> Option<StoredSession> {
        let token = match get_json::<String>(self.kv(), keys::SESSION_TOKEN) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "session token unreadable");
                return None;
            }
        };
        match get_json::<UserProfile>(self.kv(), keys::USER_INFO) {
            Ok(Some(user)) => Some(StoredSession { token, user }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "stored user unreadable");
                None
            }
        }
    }

    pub fn save_session(&self, token: &str, user: &UserProfile) -> Result<()> {
        set_json(self.kv(), keys::SESSION_TOKEN, token)?;
        set_json(self.kv(), keys::USER_INFO, user)
    }

    /// Forget token and user. The device id is kept.
    pub fn clear_session(&self) -> Result<()> {
        self.kv().remove(keys::SESSION_TOKEN)?;
        self.kv().remove(keys::USER_INFO)?;
        Ok(())
    }
}
