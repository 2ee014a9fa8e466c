//! Authentication backend client.

use std::time::Duration;

use async_trait::async_trait;
use causerie_shared::protocol::{
    unwrap_data, LoginRequest, LoginResponse, LogoutRequest, MessageResponse, SignupRequest,
    SignupResponse,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{NetError, Result};
use crate::http::{build_client, join, parse_base_url, read_json};

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse>;
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
    async fn logout(&self, session_token: &str) -> Result<()>;
    /// `Ok(false)` when the backend rejects the token.
    async fn verify_session(&self, session_token: &str) -> Result<bool>;
    async fn verify_email(&self, token: &str) -> Result<MessageResponse>;
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: parse_base_url(base_url)?,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        join(&self.base_url, segments)
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    let body = match body {
        Value::Null => Value::Object(Default::default()),
        other => unwrap_data(other),
    };
    serde_json::from_value(body).map_err(|e| NetError::Decode(e.to_string()))
}

#[async_trait]
impl AuthBackend for AuthClient {
    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse> {
        let response = self
            .client
            .post(self.url(&["signup"])?)
            .json(request)
            .send()
            .await?;
        let body = read_json(response, None).await?;
        info!(email = %request.email, "account created");

        // The message may sit next to `data` rather than inside it.
        let top_message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut parsed: SignupResponse = decode(body)?;
        if parsed.message.is_none() {
            parsed.message = top_message;
        }
        Ok(parsed)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let response = self
            .client
            .post(self.url(&["login"])?)
            .json(request)
            .send()
            .await?;
        let body = read_json(response, None).await?;
        decode(body)
    }

    async fn logout(&self, session_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(&["logout"])?)
            .bearer_auth(session_token)
            .json(&LogoutRequest {
                session_token: session_token.to_string(),
            })
            .send()
            .await?;
        read_json(response, None).await?;
        Ok(())
    }

    async fn verify_session(&self, session_token: &str) -> Result<bool> {
        let response = self
            .client
            .post(self.url(&["verify-session"])?)
            .bearer_auth(session_token)
            .send()
            .await?;
        let status = response.status();
        debug!(status = status.as_u16(), "session verification answered");
        Ok(status.is_success())
    }

    async fn verify_email(&self, token: &str) -> Result<MessageResponse> {
        let response = self
            .client
            .get(self.url(&["verify", token])?)
            .send()
            .await?;
        let body = read_json(response, Some("Token invalide")).await?;
        let top_message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut parsed: MessageResponse = decode(body)?;
        if parsed.message.is_none() {
            parsed.message = top_message;
        }
        Ok(parsed)
    }
}
