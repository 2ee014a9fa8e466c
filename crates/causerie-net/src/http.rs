use std::time::Duration;

use causerie_shared::protocol::ErrorEnvelope;
use reqwest::{Client, Response, Url};
use serde_json::Value;

use crate::error::{NetError, Result};

pub(crate) fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| NetError::InvalidUrl(format!("{trimmed}: {e}")))
}

/// `base` + `/segment/segment...`, each segment percent-encoded.
pub(crate) fn join(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| NetError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Read the body, turning non-success statuses into [`NetError::Backend`].
///
/// A success body that is empty or not JSON is returned as `Value::Null`.
pub(crate) async fn read_json(response: Response, fallback_error: Option<&str>) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = ErrorEnvelope::message_from(&text)
            .or_else(|| fallback_error.map(str::to_string))
            .unwrap_or_else(|| format!("Erreur HTTP {}", status.as_u16()));
        tracing::debug!(status = status.as_u16(), %message, "backend returned an error");
        return Err(NetError::Backend {
            status: status.as_u16(),
            message,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(error = %e, "success response is not JSON");
            Ok(Value::Null)
        }
    }
}
