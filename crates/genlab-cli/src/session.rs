use std::path::{Path, PathBuf};

use genlab_contracts::chat::CHAT_HELP_COMMANDS;
use genlab_contracts::request::{
    AspectRatio, DurationSeconds, EncodedImage, GenerationMode, GenerationRequest,
};
use genlab_contracts::sink::LatestResult;
use genlab_engine::AttachmentError;

/// Selections of an interactive session: the active tab, its option, the
/// attached image and the last result shown.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub mode: GenerationMode,
    pub ratio: AspectRatio,
    pub duration: DurationSeconds,
    pub attachment: Option<(PathBuf, EncodedImage)>,
    pub latest: LatestResult,
}

impl ChatSession {
    pub fn new(mode: GenerationMode) -> Self {
        Self {
            mode,
            ratio: AspectRatio::default(),
            duration: DurationSeconds::default(),
            attachment: None,
            latest: LatestResult::new(),
        }
    }

    /// Switching tabs drops the attachment and the shown result.
    pub fn switch_mode(&mut self, mode: GenerationMode) -> String {
        self.mode = mode;
        self.attachment = None;
        self.latest.reset();
        format!("Mode: {mode}")
    }

    pub fn set_ratio(&mut self, raw: &str) -> String {
        match raw.parse::<AspectRatio>() {
            Ok(ratio) => {
                self.ratio = ratio;
                let mut message = format!("Aspect ratio set to {ratio}");
                if self.mode != GenerationMode::Image {
                    message.push_str(" (applies to image mode)");
                }
                message
            }
            Err(err) => err,
        }
    }

    pub fn set_duration(&mut self, raw: &str) -> String {
        match raw.parse::<DurationSeconds>() {
            Ok(duration) => {
                self.duration = duration;
                let mut message = format!("Duration set to {duration}s");
                if self.mode != GenerationMode::Video {
                    message.push_str(" (applies to video mode)");
                }
                message
            }
            Err(err) => err,
        }
    }

    pub fn attach(
        &mut self,
        path: &Path,
        encode: impl FnOnce(&Path) -> Result<EncodedImage, AttachmentError>,
    ) -> String {
        match encode(path) {
            Ok(image) => {
                let message = format!(
                    "Attached {} ({}, {} bytes)",
                    path.display(),
                    image.mime_type,
                    image.size_bytes
                );
                self.attachment = Some((path.to_path_buf(), image));
                message
            }
            Err(err) => format!("Attach failed: {err}"),
        }
    }

    pub fn detach(&mut self) -> String {
        match self.attachment.take() {
            Some((path, _)) => format!("Detached {}", path.display()),
            None => "No attachment".to_string(),
        }
    }

    pub fn request(&self, prompt: &str) -> GenerationRequest {
        let attachment = self.attachment.as_ref().map(|(_, image)| image.clone());
        match self.mode {
            GenerationMode::Image => GenerationRequest::image(prompt, self.ratio),
            GenerationMode::Video => GenerationRequest::video(prompt, self.duration),
        }
        .with_attachment(attachment)
    }

    pub fn status_lines(&self, model: &str) -> Vec<String> {
        let mut lines = vec![format!("Mode: {} ({model})", self.mode)];
        match self.mode {
            GenerationMode::Image => lines.push(format!("Aspect ratio: {}", self.ratio)),
            GenerationMode::Video => lines.push(format!("Duration: {}s", self.duration)),
        }
        lines.push(match &self.attachment {
            Some((path, image)) => format!("Attachment: {} ({})", path.display(), image.mime_type),
            None => "Attachment: none".to_string(),
        });
        if let Some(url) = self.latest.media_url() {
            lines.push(format!("Last result: {url}"));
        } else if let Some(error) = &self.latest.error {
            lines.push(format!("Last error: {error}"));
        } else if let Some(progress) = self.latest.progress {
            lines.push(format!("Progress: {progress}%"));
        }
        lines
    }
}

pub fn help_line() -> String {
    format!(
        "Commands: {} (anything else is a prompt)",
        CHAT_HELP_COMMANDS.join(" ")
    )
}
