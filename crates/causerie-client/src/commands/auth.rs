//! Signup, login, logout and session restore.

use causerie_net::NetError;
use causerie_shared::protocol::{LoginRequest, SignupRequest};
use causerie_shared::validation::{normalize_email, validate_login, validate_signup};
use causerie_shared::{
    ConnectionStatus, ConversationId, Credentials, Message, NoticeKind, SignupForm, UserProfile,
};
use tracing::{info, warn};

use crate::client::{ChatClient, LoadingKind};
use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::messages::MessageList;

pub const SERVER_UNREACHABLE: &str = "Impossible de contacter le serveur. Vérifiez votre connexion.";
pub const INVALID_RESPONSE: &str = "Réponse invalide du serveur";
pub const SIGNUP_DEFAULT_MESSAGE: &str =
    "Compte créé ! Vérifiez votre e-mail pour activer votre compte.";

/// User-facing text for an auth backend failure.
pub fn auth_error_message(error: &NetError) -> String {
    match error {
        NetError::CrossOrigin(_) | NetError::Connectivity(_) => SERVER_UNREACHABLE.to_string(),
        NetError::Backend { message, .. } => message.clone(),
        NetError::Decode(_) => INVALID_RESPONSE.to_string(),
        NetError::InvalidUrl(_) => SERVER_UNREACHABLE.to_string(),
    }
}

impl ChatClient {
    fn begin_auth(&self) -> Result<()> {
        self.lock()?.auth_loading = true;
        self.emit(ClientEvent::AuthLoadingChanged { loading: true });
        Ok(())
    }

    fn auth_failed(&self, action: &str, error: NetError) -> ClientError {
        warn!(action, error = %error, status = error.status(), "auth request failed");
        self.notify(auth_error_message(&error), NoticeKind::Error);
        error.into()
    }

    /// Create an account. Returns the backend's confirmation message.
    pub async fn signup(&self, form: &SignupForm) -> Result<String> {
        if let Err(e) = validate_signup(form) {
            self.notify(e.to_string(), NoticeKind::Error);
            return Err(e.into());
        }

        let request = SignupRequest {
            username: form.username.trim().to_string(),
            email: normalize_email(&form.email),
            password: form.password.clone(),
            device_id: self.inner.storage.device_id()?.to_string(),
        };

        self.begin_auth()?;
        let _loading = self.loading_guard(LoadingKind::Auth);
        let response = self
            .inner
            .auth
            .signup(&request)
            .await
            .map_err(|e| self.auth_failed("signup", e))?;

        let message = response
            .message
            .unwrap_or_else(|| SIGNUP_DEFAULT_MESSAGE.to_string());
        self.notify(message.clone(), NoticeKind::Success);
        Ok(message)
    }

    /// Log in and open a fresh conversation.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile> {
        if let Err(e) = validate_login(credentials) {
            self.notify(e.to_string(), NoticeKind::Error);
            return Err(e.into());
        }

        let request = LoginRequest {
            email: normalize_email(&credentials.email),
            password: credentials.password.clone(),
            device_id: self.inner.storage.device_id()?.to_string(),
        };

        self.begin_auth()?;
        let _loading = self.loading_guard(LoadingKind::Auth);
        let response = self
            .inner
            .auth
            .login(&request)
            .await
            .map_err(|e| self.auth_failed("login", e))?;

        let user = response.user;
        self.inner
            .storage
            .save_session(&response.session_token, &user)?;

        let conversation_id = ConversationId::new();
        {
            let mut state = self.lock()?;
            state.user = Some(user.clone());
            state.session_token = Some(response.session_token);
            state.messages = MessageList::from_messages(vec![Message::welcome(Some(user.name.as_str()))]);
            state.active_conversation = Some(conversation_id.clone());
            state.connection = ConnectionStatus::Connected;
            self.inner
                .storage
                .set_active_conversation_id(Some(&conversation_id))?;
        }

        info!(user_id = %user.id, conversation_id = %conversation_id, "logged in");
        self.emit(ClientEvent::SessionChanged { logged_in: true });
        self.emit(ClientEvent::MessagesChanged);
        self.emit(ClientEvent::ConnectionChanged {
            status: ConnectionStatus::Connected,
        });
        self.notify(format!("Bienvenue {} !", user.name), NoticeKind::Success);
        Ok(user)
    }

    /// Save, tell the backend (best effort), then forget the session locally.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.save_current_conversation() {
            warn!(error = %e, "could not save conversation before logout");
        }
        self.inner.saver.cancel();

        let token = self.lock()?.session_token.clone();
        if let Some(token) = token {
            if let Err(e) = self.inner.auth.logout(&token).await {
                warn!(error = %e, "remote logout failed, clearing local session anyway");
            }
        }

        self.clear_local_session()?;
        self.notify("À bientôt !", NoticeKind::Info);
        Ok(())
    }

    fn clear_local_session(&self) -> Result<()> {
        self.inner.storage.clear_session()?;
        self.inner.storage.set_active_conversation_id(None)?;
        let menus = {
            let mut state = self.lock()?;
            state.user = None;
            state.session_token = None;
            state.messages = MessageList::new();
            state.active_conversation = None;
            state.connection = ConnectionStatus::Disconnected;
            state.menus.close_all();
            state.menus
        };

        info!("logged out");
        self.emit(ClientEvent::SessionChanged { logged_in: false });
        self.emit(ClientEvent::MessagesChanged);
        self.emit(ClientEvent::ConnectionChanged {
            status: ConnectionStatus::Disconnected,
        });
        self.emit(ClientEvent::MenusChanged {
            open: menus.open_panel(),
            sidebar_open: menus.sidebar_open(),
        });
        Ok(())
    }

    /// Pick up the session saved by a previous run.
    ///
    /// With remote verification enabled a rejected token logs out locally;
    /// an unreachable backend keeps the stored session.
    pub async fn restore_session(&self) -> Result<Option<UserProfile>> {
        let Some(stored) = self.inner.storage.load_session() else {
            return Ok(None);
        };

        if self.inner.config.verify_session_remotely {
            match self.inner.auth.verify_session(&stored.token).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(user_id = %stored.user.id, "stored session rejected");
                    self.clear_local_session()?;
                    return Ok(None);
                }
                Err(e) => {
                    warn!(error = %e, "session check unavailable, keeping local session");
                }
            }
        }

        let last = self.inner.storage.active_conversation_id()?;
        let reopen = {
            let mut state = self.lock()?;
            state.user = Some(stored.user.clone());
            state.session_token = Some(stored.token);
            let known = last.filter(|id| state.find_conversation(id).is_some());
            known
        };
        self.emit(ClientEvent::SessionChanged { logged_in: true });

        match reopen {
            Some(id) => {
                let messages = {
                    let mut state = self.lock()?;
                    let messages = state
                        .find_conversation(&id)
                        .map(|c| c.messages.clone())
                        .unwrap_or_default();
                    state.messages = MessageList::from_messages(messages);
                    state.active_conversation = Some(id.clone());
                    state.connection = ConnectionStatus::Connected;
                    state.messages.len()
                };
                info!(conversation_id = %id, messages, "session restored");
                self.emit(ClientEvent::MessagesChanged);
                self.emit(ClientEvent::ConnectionChanged {
                    status: ConnectionStatus::Connected,
                });
            }
            None => {
                let id = ConversationId::new();
                self.lock()?.active_conversation = Some(id.clone());
                self.inner.storage.set_active_conversation_id(Some(&id))?;
                self.initialize_chat(Some(stored.user.name.as_str()))?;
                info!(conversation_id = %id, "session restored with a new conversation");
            }
        }

        Ok(Some(stored.user))
    }

    /// Confirm an e-mail address with the token from the verification link.
    pub async fn verify_email(&self, token: &str) -> Result<String> {
        self.begin_auth()?;
        let _loading = self.loading_guard(LoadingKind::Auth);
        let response = self
            .inner
            .auth
            .verify_email(token)
            .await
            .map_err(|e| self.auth_failed("verify_email", e))?;

        let message = response
            .message
            .unwrap_or_else(|| "E-mail vérifié".to_string());
        self.notify(message.clone(), NoticeKind::Success);
        Ok(message)
    }
}
