use thiserror::Error;

/// Failure talking to the webhook or the auth backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// The request was refused before reaching the server (browser-style
    /// cross-origin rejection, reported by proxies and embedded webviews).
    #[error("cross-origin request rejected: {0}")]
    CrossOrigin(String),

    /// The server could not be reached at all.
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// The server answered with a non-success status. `message` comes from
    /// the `{error: {message}}` envelope, else `Erreur HTTP {status}`.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, NetError>;

const CROSS_ORIGIN_MARKERS: &[&str] = &["failed to fetch", "cors", "cross-origin"];

impl NetError {
    pub fn is_cross_origin(&self) -> bool {
        matches!(self, Self::CrossOrigin(_))
    }

    /// Whether the request never got an HTTP answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::CrossOrigin(_) | Self::Connectivity(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a transport failure by its text.
    pub fn transport(text: String) -> Self {
        let lower = text.to_lowercase();
        if CROSS_ORIGIN_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::CrossOrigin(text)
        } else {
            Self::Connectivity(text)
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            return Self::InvalidUrl(e.to_string());
        }
        if e.is_decode() {
            return Self::Decode(e.to_string());
        }
        if let Some(status) = e.status() {
            return Self::Backend {
                status: status.as_u16(),
                message: format!("Erreur HTTP {}", status.as_u16()),
            };
        }

        // reqwest's Display stops at the outermost layer; the interesting
        // part (refused, dns, tls) sits in the source chain.
        let mut text = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            text.push_str(": ");
            text.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::transport(text)
    }
}
