use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{url}: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// The network seam. Every request carries the bearer credential it is given.
pub trait Transport: Send + Sync {
    fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<HttpReply, TransportError>;
    fn get(&self, url: &str, bearer: &str) -> Result<HttpReply, TransportError>;
}

pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    fn finish(
        url: &str,
        result: reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<HttpReply, TransportError> {
        let response = result.map_err(|err| TransportError {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|err| TransportError {
            url: url.to_string(),
            message: format!("response body read failed: {err}"),
        })?;
        Ok(HttpReply { status, body })
    }
}

impl Transport for HttpTransport {
    fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &Value,
    ) -> Result<HttpReply, TransportError> {
        log::debug!("POST {url}");
        let result = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send();
        Self::finish(url, result)
    }

    fn get(&self, url: &str, bearer: &str) -> Result<HttpReply, TransportError> {
        log::debug!("GET {url}");
        let result = self
            .http
            .get(url)
            .bearer_auth(bearer)
            .header(CONTENT_TYPE, "application/json")
            .send();
        Self::finish(url, result)
    }
}
