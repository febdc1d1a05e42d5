use crate::request::GenerationMode;

/// Receiver of generation status updates, typically a display surface.
pub trait ResultSink {
    fn on_progress(&mut self, percent: u8);
    fn on_success(&mut self, media_url: &str, mode: GenerationMode);
    fn on_error(&mut self, message: &str);
}

/// Keeps the latest value of every update for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestResult {
    pub progress: Option<u8>,
    pub media: Option<(String, GenerationMode)>,
    pub error: Option<String>,
}

impl LatestResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears everything, as switching modes does.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn media_url(&self) -> Option<&str> {
        self.media.as_ref().map(|(url, _)| url.as_str())
    }
}

impl ResultSink for LatestResult {
    fn on_progress(&mut self, percent: u8) {
        self.progress = Some(percent);
    }

    fn on_success(&mut self, media_url: &str, mode: GenerationMode) {
        self.media = Some((media_url.to_string(), mode));
        self.error = None;
    }

    fn on_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.media = None;
    }
}

/// Forwards every update to each wrapped sink in order.
#[derive(Default)]
pub struct FanoutSink<'a> {
    sinks: Vec<&'a mut dyn ResultSink>,
}

impl<'a> FanoutSink<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: &'a mut dyn ResultSink) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ResultSink for FanoutSink<'_> {
    fn on_progress(&mut self, percent: u8) {
        for sink in self.sinks.iter_mut() {
            sink.on_progress(percent);
        }
    }

    fn on_success(&mut self, media_url: &str, mode: GenerationMode) {
        for sink in self.sinks.iter_mut() {
            sink.on_success(media_url, mode);
        }
    }

    fn on_error(&mut self, message: &str) {
        for sink in self.sinks.iter_mut() {
            sink.on_error(message);
        }
    }
}
