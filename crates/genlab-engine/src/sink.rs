use genlab_contracts::events::{EventKind, EventPayload, EventWriter};
use genlab_contracts::request::GenerationMode;
use genlab_contracts::sink::ResultSink;
use serde_json::Value;

/// Mirrors sink updates into `events.jsonl`.
///
/// Write failures are logged and dropped; the event log never aborts a job.
pub struct EventSink {
    writer: EventWriter,
    mode: GenerationMode,
    task_id: Option<String>,
    last_progress: Option<u8>,
}

impl EventSink {
    pub fn new(writer: EventWriter, mode: GenerationMode) -> Self {
        Self {
            writer,
            mode,
            task_id: None,
            last_progress: None,
        }
    }

    pub fn set_task_id(&mut self, task_id: impl Into<String>) {
        self.task_id = Some(task_id.into());
    }

    fn emit(&self, kind: EventKind, mut payload: EventPayload) {
        payload.insert("mode".to_string(), Value::String(self.mode.to_string()));
        if let Some(task_id) = &self.task_id {
            payload.insert("task_id".to_string(), Value::String(task_id.clone()));
        }
        if let Err(err) = self.writer.emit(kind, payload) {
            log::warn!("failed to write {} event: {err:#}", kind.as_str());
        }
    }
}

impl ResultSink for EventSink {
    fn on_progress(&mut self, percent: u8) {
        if self.last_progress == Some(percent) {
            return;
        }
        self.last_progress = Some(percent);
        let mut payload = EventPayload::new();
        payload.insert("progress_percent".to_string(), Value::from(percent));
        self.emit(EventKind::JobProgress, payload);
    }

    fn on_success(&mut self, media_url: &str, _mode: GenerationMode) {
        let mut payload = EventPayload::new();
        payload.insert("media_url".to_string(), Value::String(media_url.to_string()));
        self.emit(EventKind::GenerationSucceeded, payload);
    }

    fn on_error(&mut self, message: &str) {
        let mut payload = EventPayload::new();
        payload.insert("error".to_string(), Value::String(message.to_string()));
        self.emit(EventKind::GenerationFailed, payload);
    }
}
