//! Command dispatch to device endpoints
//!
//! Every command is a single plain-text POST. Failures are folded into the
//! result rather than propagated: controllers render them as UI state.

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Outcome of a dispatched command
///
/// `ok` is true only for a transport-level success with a 2xx status. For
/// HTTP-level failures `body` carries the server's text (used directly as a
/// user-facing message); for transport failures it is empty and the
/// controller substitutes its own generic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded
    pub ok: bool,

    /// Response body (or server-supplied error text)
    pub body: String,
}

impl CommandResult {
    /// A successful result with the given body
    #[must_use]
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            ok: true,
            body: body.into(),
        }
    }

    /// A failed result with the given body
    #[must_use]
    pub fn failure(body: impl Into<String>) -> Self {
        Self {
            ok: false,
            body: body.into(),
        }
    }
}

/// Trait for sending a single command to a remote endpoint
///
/// Dispatch is attempted exactly once; no retries.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Send `payload` (if any) to `endpoint` and return the outcome
    async fn dispatch(&self, endpoint: &str, payload: Option<&str>) -> CommandResult;
}

/// Dispatches commands over HTTP
pub struct HttpDispatcher {
    client: reqwest::Client,
}

impl HttpDispatcher {
    /// Create a new dispatcher with an explicit request timeout
    ///
    /// A timed-out request is indistinguishable from an unreachable host:
    /// both map to a transport failure.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Dispatch for HttpDispatcher {
    async fn dispatch(&self, endpoint: &str, payload: Option<&str>) -> CommandResult {
        let mut request = self.client.post(endpoint);
        if let Some(text) = payload {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(text.to_string());
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                let ok = status.is_success();
                let body = response.text().await.unwrap_or_default();

                if ok {
                    tracing::debug!(endpoint, status = %status, "command dispatched");
                } else {
                    tracing::warn!(endpoint, status = %status, body = %body, "server rejected command");
                }

                CommandResult { ok, body }
            }
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "dispatch transport failure");
                CommandResult::failure(String::new())
            }
        }
    }
}
