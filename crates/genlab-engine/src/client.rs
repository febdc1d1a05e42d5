use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::GenerationError;
use crate::extract;
use crate::poller::{CancellationToken, Poller};
use crate::transport::{HttpTransport, Transport};

const REJECTION_BODY_CHARS: usize = 512;

/// Configured access to the generation API.
pub struct ApiClient {
    config: ClientConfig,
    transport: Box<dyn Transport>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POSTs `body` and returns the parsed reply.
    ///
    /// A 2xx reply whose body is not JSON comes back as `Value::Null`, leaving
    /// the caller's extractor to report what is missing.
    pub fn post(&self, url: &str, body: &Value) -> Result<Value, GenerationError> {
        let reply = self
            .transport
            .post_json(url, &self.config.api_key, body)
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        if !reply.is_success() {
            let message = reply
                .json()
                .and_then(|payload| extract::server_message().extract(&payload))
                .or_else(|| {
                    let text = reply.body.trim();
                    (!text.is_empty()).then(|| truncate_text(text, REJECTION_BODY_CHARS))
                });
            log::debug!("POST {url} rejected with {}", reply.status);
            return Err(GenerationError::GenerationRejected {
                status: reply.status,
                message,
            });
        }
        Ok(reply.json().unwrap_or(Value::Null))
    }

    pub fn poller<'a>(&'a self, cancel: &'a CancellationToken) -> Poller<'a> {
        Poller::new(
            self.transport.as_ref(),
            &self.config.api_key,
            &self.config.poll,
            cancel,
        )
    }
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
