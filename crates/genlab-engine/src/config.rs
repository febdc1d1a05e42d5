use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use genlab_contracts::request::GenerationMode;

pub const DEFAULT_API_BASE: &str = "https://ark.ap-southeast.bytepluses.com/api/v3";
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 30 * 1024 * 1024;

/// Cadence and budget of the status loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Synthetic progress added per attempt when the server reports none.
    pub progress_step: u8,
    /// Synthetic progress never reaches this value; only success shows 100.
    pub synthetic_cap: u8,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 100,
            progress_step: 3,
            synthetic_cap: 98,
        }
    }
}

impl PollConfig {
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }

    /// Clamps into 0.2..=30 seconds. NaN and infinities are rejected.
    pub fn with_interval_seconds(mut self, seconds: f64) -> Result<Self> {
        if !seconds.is_finite() {
            bail!("poll interval must be a finite number of seconds (got {seconds})");
        }
        self.interval = Duration::from_secs_f64(seconds.clamp(0.2, 30.0));
        Ok(self)
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.clamp(1, 1000);
        self
    }
}

/// Everything a call site needs to talk to the generation API.
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base: String,
    pub api_key: String,
    pub image_model: Option<String>,
    pub video_model: Option<String>,
    pub poll: PollConfig,
    pub max_attachment_bytes: u64,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: normalize_base(&api_base.into()),
            api_key: api_key.into().trim().to_string(),
            image_model: None,
            video_model: None,
            poll: PollConfig::default(),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(non_empty_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let Some(api_key) = lookup("GENLAB_API_KEY").or_else(|| lookup("ARK_API_KEY")) else {
            bail!("GENLAB_API_KEY not set");
        };
        let api_base = lookup("GENLAB_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let mut config = Self::new(api_base, api_key);
        config.image_model = lookup("GENLAB_IMAGE_MODEL");
        config.video_model = lookup("GENLAB_VIDEO_MODEL");
        if let Some(seconds) =
            lookup("GENLAB_POLL_INTERVAL").and_then(|raw| raw.parse::<f64>().ok())
        {
            config.poll = config
                .poll
                .with_interval_seconds(seconds)
                .context("invalid GENLAB_POLL_INTERVAL")?;
        }
        if let Some(attempts) =
            lookup("GENLAB_POLL_MAX_ATTEMPTS").and_then(|raw| raw.parse::<u32>().ok())
        {
            config.poll = config.poll.with_max_attempts(attempts);
        }
        Ok(config)
    }

    pub fn model_override(&self, mode: GenerationMode) -> Option<&str> {
        match mode {
            GenerationMode::Image => self.image_model.as_deref(),
            GenerationMode::Video => self.video_model.as_deref(),
        }
    }

    pub fn image_generations_url(&self) -> String {
        format!("{}/images/generations", self.api_base)
    }

    pub fn tasks_url(&self) -> String {
        format!("{}/contents/generations/tasks", self.api_base)
    }

    pub fn task_url(&self, task_id: &str) -> String {
        format!("{}/{}", self.tasks_url(), task_id.trim())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("image_model", &self.image_model)
            .field("video_model", &self.video_model)
            .field("poll", &self.poll)
            .field("max_attachment_bytes", &self.max_attachment_bytes)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn normalize_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
