use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const MAX_DURATION_SECONDS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Image,
    Video,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "image" | "img" => Ok(Self::Image),
            "video" | "vid" => Ok(Self::Video),
            other => Err(format!("unknown generation mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [Self::Square, Self::Landscape, Self::Portrait];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }

    /// Pixel dimensions quoted in the prompt suffix.
    pub fn resolution_hint(&self) -> &'static str {
        match self {
            Self::Square => "1080x1080",
            Self::Landscape => "1920x1080",
            Self::Portrait => "1080x1920",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['x', '/'], ":");
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == normalized)
            .ok_or_else(|| {
                format!("unsupported aspect ratio '{}' (expected 1:1, 16:9 or 9:16)", raw.trim())
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DurationSeconds(u32);

impl DurationSeconds {
    pub fn new(seconds: u32) -> Result<Self, String> {
        if seconds == 0 || seconds > MAX_DURATION_SECONDS {
            return Err(format!(
                "duration must be between 1 and {MAX_DURATION_SECONDS} seconds (got {seconds})"
            ));
        }
        Ok(Self(seconds))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for DurationSeconds {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u32> for DurationSeconds {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DurationSeconds> for u32 {
    fn from(value: DurationSeconds) -> Self {
        value.0
    }
}

impl fmt::Display for DurationSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DurationSeconds {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_suffix('s').unwrap_or(trimmed).trim();
        let seconds = digits
            .parse::<u32>()
            .map_err(|_| format!("invalid duration '{trimmed}'"))?;
        Self::new(seconds)
    }
}

/// Mode-specific knob chosen next to the prompt box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ModeOption {
    AspectRatio(AspectRatio),
    Duration(DurationSeconds),
}

impl ModeOption {
    pub fn mode(&self) -> GenerationMode {
        match self {
            Self::AspectRatio(_) => GenerationMode::Image,
            Self::Duration(_) => GenerationMode::Video,
        }
    }
}

/// An attached image, base64 encoded for embedding in a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub mime_type: String,
    pub size_bytes: u64,
    pub data: String,
}

impl EncodedImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub option: ModeOption,
    pub attachment: Option<EncodedImage>,
}

impl GenerationRequest {
    pub fn image(prompt: impl Into<String>, ratio: AspectRatio) -> Self {
        Self {
            prompt: prompt.into(),
            option: ModeOption::AspectRatio(ratio),
            attachment: None,
        }
    }

    pub fn video(prompt: impl Into<String>, duration: DurationSeconds) -> Self {
        Self {
            prompt: prompt.into(),
            option: ModeOption::Duration(duration),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Option<EncodedImage>) -> Self {
        self.attachment = attachment;
        self
    }

    pub fn mode(&self) -> GenerationMode {
        self.option.mode()
    }

    pub fn trimmed_prompt(&self) -> &str {
        self.prompt.trim()
    }

    /// A request needs prompt text or an attached image.
    pub fn is_submittable(&self) -> bool {
        !self.trimmed_prompt().is_empty() || self.attachment.is_some()
    }
}
