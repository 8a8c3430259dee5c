//! Remote chat endpoint client.
//!
//! The widget never generates replies itself; it posts the user message plus
//! the transcript-so-far to a remote endpoint and reads back `{"reply": ...}`.
//! [`ChatBackend`] is the seam the controller talks through, with
//! [`HttpBackend`] as the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::transcript::Turn;

/// Errors from the chat endpoint.
///
/// Only [`BackendError::Status`] is absorbed into the user-visible fallback;
/// transport and payload errors propagate to the caller.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The endpoint answered, but not with a 2xx.
    #[error("chat endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    /// The request never completed.
    #[error("chat endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// The endpoint answered 2xx with a body that is not `{"reply": ...}`.
    #[error("malformed reply payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Wire format of the outbound request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [Turn],
}

/// Wire format of a successful response.
#[derive(Debug, Deserialize)]
struct ChatReply {
    reply: String,
}

/// Source of assistant replies.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask the endpoint for a reply to `message` given the transcript so far.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Status`] on a non-2xx response,
    /// [`BackendError::Transport`] when the request fails outright, and
    /// [`BackendError::Payload`] when a 2xx body does not parse.
    async fn reply(&self, message: &str, history: &[Turn]) -> Result<String, BackendError>;
}

/// HTTP implementation posting JSON to a configured endpoint.
///
/// No timeout is set on the request; the endpoint is trusted to answer or
/// fail, and the demo delay is the only time-bounded wait in the widget.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    endpoint: String,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpBackend {
    /// Create a client for the given chat endpoint URL.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint URL this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn reply(&self, message: &str, history: &[Turn]) -> Result<String, BackendError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&ChatRequest { message, history })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }

        // Read the body as text first so a 2xx with garbage surfaces as a
        // payload error rather than a transport one.
        let body = resp.text().await?;
        let parsed: ChatReply = serde_json::from_str(&body)?;
        Ok(parsed.reply)
    }
}
