//! Chat webhook client and auxiliary conversation endpoints.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use causerie_shared::protocol::{ChatRequest, ConversationSummary, TagUpdateRequest};
use causerie_shared::ConversationId;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{NetError, Result};
use crate::http::{build_client, join, parse_base_url, read_json};

const API_KEY_HEADER: &str = "x-api-key";

/// Everything the chat backend needs.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// POST one chat turn; returns the raw response body (`Null` when the
    /// body is empty or not JSON).
    async fn send(&self, request: &ChatRequest) -> Result<Value>;

    async fn delete_conversation(&self, id: &ConversationId, user_id: Option<&str>) -> Result<()>;

    async fn search_conversations(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ConversationSummary>>;

    async fn export_conversation(&self, id: &ConversationId) -> Result<Value>;

    async fn update_tags(&self, id: &ConversationId, tags: &BTreeSet<String>) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub webhook_url: String,
    pub chat_api_url: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

/// reqwest implementation of [`ChatBackend`].
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    webhook_url: Url,
    chat_api_url: Url,
    api_key: String,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout)?,
            webhook_url: parse_base_url(&config.webhook_url)?,
            chat_api_url: parse_base_url(&config.chat_api_url)?,
            api_key: config.api_key.clone(),
        })
    }

    fn with_key(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.header(API_KEY_HEADER, &self.api_key)
        }
    }

    fn conversation_url(&self, id: &ConversationId, tail: &[&str]) -> Result<Url> {
        let mut segments = vec!["conversations", id.as_str()];
        segments.extend_from_slice(tail);
        join(&self.chat_api_url, &segments)
    }
}

#[async_trait]
impl ChatBackend for WebhookClient {
    async fn send(&self, request: &ChatRequest) -> Result<Value> {
        debug!(
            session_id = %request.session_id,
            has_file = request.file_data.is_some(),
            web_search = request.web_search_active,
            "posting chat turn"
        );
        let response = self
            .with_key(self.client.post(self.webhook_url.clone()))
            .json(request)
            .send()
            .await?;
        read_json(response, None).await
    }

    async fn delete_conversation(&self, id: &ConversationId, user_id: Option<&str>) -> Result<()> {
        let mut url = self.conversation_url(id, &[])?;
        if let Some(user_id) = user_id {
            url.query_pairs_mut().append_pair("userId", user_id);
        }
        let response = self.with_key(self.client.delete(url)).send().await?;
        read_json(response, None).await?;
        info!(conversation_id = %id, "remote conversation deleted");
        Ok(())
    }

    async fn search_conversations(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ConversationSummary>> {
        let mut url = join(&self.chat_api_url, &["conversations", "search"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            if let Some(user_id) = user_id {
                pairs.append_pair("userId", user_id);
            }
        }
        let response = self.with_key(self.client.get(url)).send().await?;
        let body = read_json(response, None).await?;
        parse_summaries(body)
    }

    async fn export_conversation(&self, id: &ConversationId) -> Result<Value> {
        let url = self.conversation_url(id, &["export"])?;
        let response = self.with_key(self.client.get(url)).send().await?;
        read_json(response, None).await
    }

    async fn update_tags(&self, id: &ConversationId, tags: &BTreeSet<String>) -> Result<()> {
        let url = self.conversation_url(id, &["tags"])?;
        let body = TagUpdateRequest { tags: tags.clone() };
        let response = self
            .with_key(self.client.put(url))
            .json(&body)
            .send()
            .await?;
        read_json(response, None).await?;
        Ok(())
    }
}

/// Accepts a bare array, `{data: [...]}` or `{conversations: [...]}`.
fn parse_summaries(body: Value) -> Result<Vec<ConversationSummary>> {
    let list = match body {
        Value::Array(_) => body,
        Value::Null => return Ok(Vec::new()),
        Value::Object(mut map) => map
            .remove("data")
            .filter(Value::is_array)
            .or_else(|| map.remove("conversations"))
            .ok_or_else(|| NetError::Decode("no conversation list in search response".into()))?,
        _ => return Err(NetError::Decode("unexpected search response".into())),
    };
    serde_json::from_value(list).map_err(|e| NetError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summaries_accept_all_shapes() {
        let item = json!({"_id": "conv_1", "title": "Bonjour"});
        assert_eq!(parse_summaries(json!([item.clone()])).unwrap().len(), 1);
        assert_eq!(parse_summaries(json!({"data": [item.clone()]})).unwrap().len(), 1);
        assert_eq!(parse_summaries(json!({"conversations": [item]})).unwrap().len(), 1);
        assert!(parse_summaries(Value::Null).unwrap().is_empty());
        assert!(parse_summaries(json!({"foo": 1})).is_err());
    }
}
