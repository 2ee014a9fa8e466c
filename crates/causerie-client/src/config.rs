//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client runs against a local webhook
//! and auth backend with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use causerie_net::WebhookConfig;
use causerie_shared::constants::{NOTIFICATION_DURATION_MS, SAVE_DEBOUNCE_MS};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chat webhook endpoint.
    /// Env: `CAUSERIE_WEBHOOK_URL`
    pub webhook_url: String,

    /// Sent as `x-api-key` on every chat request; empty disables the header.
    /// Env: `CAUSERIE_WEBHOOK_API_KEY`
    pub webhook_api_key: String,

    /// Base URL of the auxiliary conversation endpoints.
    /// Env: `CAUSERIE_CHAT_API_URL`
    pub chat_api_url: String,

    /// Env: `CAUSERIE_AUTH_API_URL`
    pub auth_api_url: String,

    /// Directory holding `causerie.db`. `None` uses the platform data dir.
    /// Env: `CAUSERIE_DATA_DIR`
    pub data_dir: Option<PathBuf>,

    /// Env: `CAUSERIE_SAVE_DEBOUNCE_MS`
    pub save_debounce: Duration,

    /// Env: `CAUSERIE_NOTIFICATION_MS`
    pub notification_duration: Duration,

    /// Ask the auth backend to confirm a stored session on startup.
    /// Env: `CAUSERIE_VERIFY_SESSION` (true/false)
    pub verify_session_remotely: bool,

    /// Env: `CAUSERIE_REQUEST_TIMEOUT_SECS`
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:5678/webhook/mobile-chat".to_string(),
            webhook_api_key: String::new(),
            chat_api_url: "http://localhost:4000/api/chat".to_string(),
            auth_api_url: "http://localhost:4000/api/auth".to_string(),
            data_dir: None,
            save_debounce: Duration::from_millis(SAVE_DEBOUNCE_MS),
            notification_duration: Duration::from_millis(NOTIFICATION_DURATION_MS),
            verify_session_remotely: false,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("CAUSERIE_WEBHOOK_URL") {
            config.webhook_url = url;
        }
        if let Some(key) = lookup("CAUSERIE_WEBHOOK_API_KEY") {
            config.webhook_api_key = key;
        }
        if let Some(url) = lookup("CAUSERIE_CHAT_API_URL") {
            config.chat_api_url = url;
        }
        if let Some(url) = lookup("CAUSERIE_AUTH_API_URL") {
            config.auth_api_url = url;
        }
        if let Some(dir) = lookup("CAUSERIE_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(val) = lookup("CAUSERIE_SAVE_DEBOUNCE_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.save_debounce = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %val, "Invalid CAUSERIE_SAVE_DEBOUNCE_MS, using default"),
            }
        }
        if let Some(val) = lookup("CAUSERIE_NOTIFICATION_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.notification_duration = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %val, "Invalid CAUSERIE_NOTIFICATION_MS, using default"),
            }
        }
        if let Some(val) = lookup("CAUSERIE_VERIFY_SESSION") {
            config.verify_session_remotely = val == "true" || val == "1";
        }
        if let Some(val) = lookup("CAUSERIE_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(0) => config.request_timeout = None,
                Ok(secs) => config.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => tracing::warn!(value = %val, "Invalid CAUSERIE_REQUEST_TIMEOUT_SECS, ignoring"),
            }
        }

        config
    }

    pub fn webhook_config(&self) -> WebhookConfig {
        WebhookConfig {
            webhook_url: self.webhook_url.clone(),
            chat_api_url: self.chat_api_url.clone(),
            api_key: self.webhook_api_key.clone(),
            timeout: self.request_timeout,
        }
    }
}
