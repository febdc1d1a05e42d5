pub mod builder;
pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod poller;
pub mod sink;
pub mod transport;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use genlab_contracts::events::{EventKind, EventPayload, EventWriter};
use genlab_contracts::job::{Job, JobStatus};
use genlab_contracts::models::{ModelSelector, SEEDANCE_MODEL_ID, SEEDREAM_MODEL_ID};
use genlab_contracts::request::{
    AspectRatio, DurationSeconds, EncodedImage, GenerationMode, GenerationRequest, ModeOption,
};
use genlab_contracts::runs::receipts::{
    build_receipt, receipt_path, write_receipt, ProviderExchange, ReceiptOutcome,
};
use genlab_contracts::sink::ResultSink;
use serde_json::Value;
use uuid::Uuid;

pub use client::ApiClient;
pub use config::{ClientConfig, PollConfig};
pub use error::{AttachmentError, GenerationError};
pub use poller::CancellationToken;
pub use sink::EventSink;
pub use transport::{HttpReply, HttpTransport, Transport, TransportError};

/// A finished generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub mode: GenerationMode,
    pub model: String,
    pub url: String,
    pub task_id: Option<String>,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Submits generation requests and follows them to a result.
///
/// One request is in flight at a time; a second call while the first is
/// running fails with [`GenerationError::Busy`].
pub struct Generator {
    client: ApiClient,
    selector: ModelSelector,
    events: Option<EventWriter>,
    receipts_dir: Option<PathBuf>,
    busy: AtomicBool,
}

/// What was sent for the receipt, filled in as the run progresses.
struct RunRecord {
    model: String,
    endpoint: String,
    payload: Value,
    task_id: Option<String>,
    attempts: u32,
}

/// The caller's sink plus the optional event log.
struct Reporter<'a> {
    sink: &'a mut dyn ResultSink,
    events: Option<EventSink>,
}

impl Reporter<'_> {
    fn set_task_id(&mut self, task_id: &str) {
        if let Some(events) = self.events.as_mut() {
            events.set_task_id(task_id);
        }
    }
}

impl ResultSink for Reporter<'_> {
    fn on_progress(&mut self, percent: u8) {
        self.sink.on_progress(percent);
        if let Some(events) = self.events.as_mut() {
            events.on_progress(percent);
        }
    }

    fn on_success(&mut self, media_url: &str, mode: GenerationMode) {
        self.sink.on_success(media_url, mode);
        if let Some(events) = self.events.as_mut() {
            events.on_success(media_url, mode);
        }
    }

    fn on_error(&mut self, message: &str) {
        self.sink.on_error(message);
        if let Some(events) = self.events.as_mut() {
            events.on_error(message);
        }
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, GenerationError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| GenerationError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Generator {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            selector: ModelSelector::new(None),
            events: None,
            receipts_dir: None,
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_events(mut self, writer: EventWriter) -> Self {
        self.events = Some(writer);
        self
    }

    pub fn with_receipts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.receipts_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &ClientConfig {
        self.client.config()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Reads and encodes an attachment under the configured size limit.
    pub fn encode_attachment(&self, path: &Path) -> Result<EncodedImage, AttachmentError> {
        encoder::encode_file(path, self.config().max_attachment_bytes)
    }

    /// The model a request in `mode` is sent to.
    ///
    /// A configured name outside the registry is sent verbatim; the server is
    /// the authority on which models exist.
    pub fn resolve_model(&self, mode: GenerationMode) -> String {
        let requested = self.config().model_override(mode);
        match self.selector.select(requested, mode) {
            Ok(selection) => {
                if let (Some(name), Some(reason)) =
                    (selection.requested.as_ref(), selection.fallback_reason.as_ref())
                {
                    log::warn!("{reason} Sending '{name}' as configured.");
                    return name.clone();
                }
                selection.model.name
            }
            Err(message) => {
                log::warn!("{message}");
                requested
                    .map(str::to_string)
                    .unwrap_or_else(|| default_model(mode).to_string())
            }
        }
    }

    /// Runs one generation to completion and reports it to `sink`.
    ///
    /// The terminal outcome goes to the sink as well as the return value:
    /// `on_success` with the media URL, or `on_error` with the error's display
    /// text. A `Busy` rejection is returned without touching the sink, which
    /// still belongs to the running job.
    pub fn generate(
        &self,
        request: &GenerationRequest,
        sink: &mut dyn ResultSink,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let mode = request.mode();
        let mut reporter = Reporter {
            sink,
            events: self
                .events
                .clone()
                .map(|writer| EventSink::new(writer, mode)),
        };

        if let Err(err) = self.validate(request) {
            reporter.on_error(&err.to_string());
            return Err(err);
        }

        let started = Instant::now();
        let mut record = RunRecord {
            model: self.resolve_model(mode),
            endpoint: String::new(),
            payload: Value::Null,
            task_id: None,
            attempts: 0,
        };
        if let Some(writer) = &self.events {
            if let Err(err) = writer.emit_started(mode, &record.model, request.trimmed_prompt()) {
                log::warn!("failed to write generation_started event: {err:#}");
            }
        }

        let attachment = request.attachment.as_ref();
        let result = match request.option {
            ModeOption::AspectRatio(ratio) => {
                self.run_image(request.trimmed_prompt(), ratio, attachment, &mut record)
            }
            ModeOption::Duration(duration) => self.run_video(
                request.trimmed_prompt(),
                duration,
                attachment,
                &mut record,
                &mut reporter,
                cancel,
            ),
        };
        let elapsed = started.elapsed();

        match &result {
            Ok(url) => {
                log::info!("{mode} generation finished in {:.1}s", elapsed.as_secs_f64());
                reporter.on_success(url, mode);
            }
            Err(err) => {
                log::info!("{mode} generation ended: {err}");
                reporter.on_error(&err.to_string());
            }
        }
        self.write_receipt(request, &record, &result, elapsed);

        let url = result?;
        Ok(GenerationOutcome {
            mode,
            model: record.model,
            url,
            task_id: record.task_id,
            attempts: record.attempts,
            elapsed,
        })
    }

    fn validate(&self, request: &GenerationRequest) -> Result<(), GenerationError> {
        if !request.is_submittable() {
            return Err(GenerationError::EmptyRequest);
        }
        let limit = self.config().max_attachment_bytes;
        if let Some(image) = &request.attachment {
            if !image.mime_type.starts_with("image/") {
                return Err(AttachmentError::InvalidType(image.mime_type.clone()).into());
            }
            if image.size_bytes > limit {
                return Err(AttachmentError::TooLarge {
                    size: image.size_bytes,
                    limit,
                }
                .into());
            }
        }
        Ok(())
    }

    fn run_image(
        &self,
        prompt: &str,
        ratio: AspectRatio,
        attachment: Option<&EncodedImage>,
        record: &mut RunRecord,
    ) -> Result<String, GenerationError> {
        record.endpoint = self.config().image_generations_url();
        record.payload = builder::image_payload(&record.model, prompt, ratio, attachment);
        let reply = self.client.post(&record.endpoint, &record.payload)?;
        extract::image_result_url()
            .extract(&reply)
            .ok_or(GenerationError::MissingResult)
    }

    fn run_video(
        &self,
        prompt: &str,
        duration: DurationSeconds,
        attachment: Option<&EncodedImage>,
        record: &mut RunRecord,
        reporter: &mut Reporter<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        record.endpoint = self.config().tasks_url();
        record.payload = builder::video_payload(&record.model, prompt, duration, attachment);
        let reply = self.client.post(&record.endpoint, &record.payload)?;
        let task_id = extract::task_id()
            .extract(&reply)
            .ok_or(GenerationError::MissingTaskId)?;
        record.task_id = Some(task_id.clone());
        log::info!("video task {task_id} created");
        self.emit_task_created(&task_id, &record.model);
        reporter.set_task_id(&task_id);

        let mut job = Job::new(task_id.as_str());
        let report = self.client.poller(cancel).run(
            &self.config().task_url(&task_id),
            &mut job,
            |job| reporter.on_progress(job.progress_percent()),
        );
        record.attempts = report.attempts;
        if job.status() == JobStatus::Succeeded {
            reporter.on_progress(job.progress_percent());
        }
        report.result
    }

    fn emit_task_created(&self, task_id: &str, model: &str) {
        let Some(writer) = &self.events else {
            return;
        };
        let mut payload = EventPayload::new();
        payload.insert("task_id".to_string(), Value::String(task_id.to_string()));
        payload.insert("model".to_string(), Value::String(model.to_string()));
        if let Err(err) = writer.emit(EventKind::TaskCreated, payload) {
            log::warn!("failed to write task_created event: {err:#}");
        }
    }

    fn write_receipt(
        &self,
        request: &GenerationRequest,
        record: &RunRecord,
        result: &Result<String, GenerationError>,
        elapsed: Duration,
    ) {
        let Some(dir) = &self.receipts_dir else {
            return;
        };
        let exchange = ProviderExchange {
            model: record.model.clone(),
            endpoint: record.endpoint.clone(),
            payload: record.payload.clone(),
            task_id: record.task_id.clone(),
        };
        let outcome = ReceiptOutcome {
            status: match result {
                Ok(_) => JobStatus::Succeeded,
                Err(err) => terminal_status(err),
            },
            media_url: result.as_ref().ok().cloned(),
            error: result.as_ref().err().map(ToString::to_string),
            attempts: record.attempts,
            elapsed_s: elapsed.as_secs_f64(),
        };
        let receipt = build_receipt(request, &exchange, &outcome);
        let run_id = Uuid::new_v4().simple().to_string();
        let path = receipt_path(dir, Utc::now().timestamp_millis(), &run_id);
        match write_receipt(&path, &receipt) {
            Ok(()) => log::debug!("receipt written to {}", path.display()),
            Err(err) => log::warn!("failed to write receipt {}: {err:#}", path.display()),
        }
    }
}

fn terminal_status(err: &GenerationError) -> JobStatus {
    match err {
        GenerationError::Timeout { .. } => JobStatus::TimedOut,
        GenerationError::Cancelled => JobStatus::Cancelled,
        _ => JobStatus::Failed,
    }
}

fn default_model(mode: GenerationMode) -> &'static str {
    match mode {
        GenerationMode::Image => SEEDREAM_MODEL_ID,
        GenerationMode::Video => SEEDANCE_MODEL_ID,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use genlab_contracts::events::EventWriter;
    use genlab_contracts::request::{
        AspectRatio, DurationSeconds, EncodedImage, GenerationMode, GenerationRequest,
    };
    use genlab_contracts::sink::LatestResult;
    use serde_json::{json, Value};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Post { url: String, bearer: String, body: Value },
        Get { url: String, bearer: String },
    }

    /// Scripted server. Replies are consumed in order; the last GET reply
    /// repeats once the queue is down to one.
    #[derive(Clone, Default)]
    struct Scripted {
        posts: Arc<Mutex<VecDeque<HttpReply>>>,
        gets: Arc<Mutex<VecDeque<HttpReply>>>,
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Scripted {
        fn post_reply(self, status: u16, body: Value) -> Self {
            self.posts
                .lock()
                .unwrap()
                .push_back(HttpReply::new(status, body.to_string()));
            self
        }

        fn get_reply(self, body: Value) -> Self {
            self.gets
                .lock()
                .unwrap()
                .push_back(HttpReply::new(200, body.to_string()));
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for Scripted {
        fn post_json(
            &self,
            url: &str,
            bearer: &str,
            body: &Value,
        ) -> Result<HttpReply, TransportError> {
            self.calls.lock().unwrap().push(Call::Post {
                url: url.to_string(),
                bearer: bearer.to_string(),
                body: body.clone(),
            });
            self.posts.lock().unwrap().pop_front().ok_or(TransportError {
                url: url.to_string(),
                message: "no scripted POST reply".to_string(),
            })
        }

        fn get(&self, url: &str, bearer: &str) -> Result<HttpReply, TransportError> {
            self.calls.lock().unwrap().push(Call::Get {
                url: url.to_string(),
                bearer: bearer.to_string(),
            });
            let mut gets = self.gets.lock().unwrap();
            let reply = if gets.len() > 1 {
                gets.pop_front()
            } else {
                gets.front().cloned()
            };
            reply.ok_or(TransportError {
                url: url.to_string(),
                message: "no scripted GET reply".to_string(),
            })
        }
    }

    const BASE: &str = "https://api.test/v3";

    fn generator(server: &Scripted) -> Generator {
        let mut config = ClientConfig::new(BASE, "test-key");
        config.poll.interval = Duration::ZERO;
        Generator::new(ApiClient::with_transport(config, server.clone()))
    }

    fn png_attachment() -> EncodedImage {
        EncodedImage {
            mime_type: "image/png".to_string(),
            size_bytes: 8,
            data: "iVBORw0KGgo=".to_string(),
        }
    }

    #[test]
    fn empty_request_never_reaches_the_network() {
        let server = Scripted::default();
        let mut sink = LatestResult::new();
        let request = GenerationRequest::image("   ", AspectRatio::Landscape);

        let err = generator(&server).generate(&request, &mut sink, &CancellationToken::new());

        assert_eq!(err, Err(GenerationError::EmptyRequest));
        assert!(server.calls().is_empty());
        assert_eq!(
            sink.error.as_deref(),
            Some("enter a prompt or attach an image first")
        );
    }

    #[test]
    fn image_generation_posts_once_and_returns_first_url() -> Result<(), GenerationError> {
        let server = Scripted::default().post_reply(
            200,
            json!({"data": [{"url": "https://x/y.png"}, {"url": "https://x/z.png"}]}),
        );
        let mut sink = LatestResult::new();
        let request = GenerationRequest::image("a red bicycle", AspectRatio::Landscape);

        let outcome = generator(&server).generate(&request, &mut sink, &CancellationToken::new())?;

        assert_eq!(outcome.url, "https://x/y.png");
        assert_eq!(outcome.model, SEEDREAM_MODEL_ID);
        assert_eq!(outcome.task_id, None);
        assert_eq!(sink.media, Some(("https://x/y.png".to_string(), GenerationMode::Image)));
        assert_eq!(sink.progress, None);

        let calls = server.calls();
        assert_eq!(calls.len(), 1);
        let Call::Post { url, bearer, body } = &calls[0] else {
            panic!("expected a POST, got {calls:?}");
        };
        assert_eq!(url, "https://api.test/v3/images/generations");
        assert_eq!(bearer, "test-key");
        assert_eq!(body["size"], json!("2K"));
        assert!(body["prompt"]
            .as_str()
            .unwrap_or_default()
            .contains("aspect ratio: 16:9"));
        Ok(())
    }

    #[test]
    fn image_without_results_is_missing_result() {
        let server = Scripted::default().post_reply(200, json!({"data": []}));
        let mut sink = LatestResult::new();
        let request = GenerationRequest::image("a red bicycle", AspectRatio::Square);

        let err = generator(&server).generate(&request, &mut sink, &CancellationToken::new());

        assert_eq!(err, Err(GenerationError::MissingResult));
        assert_eq!(sink.media, None);
        assert!(sink.error.is_some());
    }

    #[test]
    fn rejected_image_request_carries_status() {
        let server = Scripted::default()
            .post_reply(401, json!({"error": {"message": "invalid api key"}}));
        let mut sink = LatestResult::new();
        let request = GenerationRequest::image("a red bicycle", AspectRatio::Square);

        let err = generator(&server).generate(&request, &mut sink, &CancellationToken::new());

        assert_eq!(
            err,
            Err(GenerationError::GenerationRejected {
                status: 401,
                message: Some("invalid api key".to_string()),
            })
        );
        assert_eq!(
            sink.error.as_deref(),
            Some("generation request rejected (401): invalid api key")
        );
    }

    #[test]
    fn video_generation_polls_to_success() -> Result<(), GenerationError> {
        let server = Scripted::default()
            .post_reply(200, json!({"id": "task-9"}))
            .get_reply(json!({"status": "processing"}))
            .get_reply(json!({"status": "processing"}))
            .get_reply(json!({"status": "processing"}))
            .get_reply(json!({"status": "succeeded", "video_url": "https://x/v.mp4"}));
        let mut sink = LatestResult::new();
        let request = GenerationRequest::video("ocean waves", DurationSeconds::default())
            .with_attachment(Some(png_attachment()));

        let outcome = generator(&server).generate(&request, &mut sink, &CancellationToken::new())?;

        assert_eq!(outcome.url, "https://x/v.mp4");
        assert_eq!(outcome.task_id.as_deref(), Some("task-9"));
        assert_eq!(outcome.attempts, 4);
        assert_eq!(sink.progress, Some(100));
        assert_eq!(sink.media, Some(("https://x/v.mp4".to_string(), GenerationMode::Video)));

        let calls = server.calls();
        assert_eq!(calls.len(), 5);
        let Call::Post { url, body, .. } = &calls[0] else {
            panic!("expected a POST first, got {calls:?}");
        };
        assert_eq!(url, "https://api.test/v3/contents/generations/tasks");
        assert_eq!(body["content"][0]["text"], json!("ocean waves --duration 5"));
        assert_eq!(
            body["content"][1]["image_url"]["url"],
            json!("data:image/png;base64,iVBORw0KGgo=")
        );
        assert!(calls[1..].iter().all(|call| matches!(
            call,
            Call::Get { url, bearer }
                if url == "https://api.test/v3/contents/generations/tasks/task-9"
                    && bearer == "test-key"
        )));
        Ok(())
    }

    #[test]
    fn video_task_id_can_be_wrapped() -> Result<(), GenerationError> {
        let server = Scripted::default()
            .post_reply(200, json!({"data": {"id": "task-3"}}))
            .get_reply(json!({
                "data": {"status": "Completed", "result": {"url": "https://x/r.mp4"}}
            }));
        let mut sink = LatestResult::new();
        let request = GenerationRequest::video("tide", DurationSeconds::default());

        let outcome = generator(&server).generate(&request, &mut sink, &CancellationToken::new())?;
        assert_eq!(outcome.task_id.as_deref(), Some("task-3"));
        assert_eq!(outcome.url, "https://x/r.mp4");
        Ok(())
    }

    #[test]
    fn video_without_task_id_stops_before_polling() {
        let server = Scripted::default().post_reply(200, json!({"result": "queued"}));
        let mut sink = LatestResult::new();
        let request = GenerationRequest::video("tide", DurationSeconds::default());

        let err = generator(&server).generate(&request, &mut sink, &CancellationToken::new());

        assert_eq!(err, Err(GenerationError::MissingTaskId));
        assert_eq!(server.calls().len(), 1);
    }

    #[test]
    fn video_failure_reports_reason() {
        let server = Scripted::default()
            .post_reply(200, json!({"id": "task-1"}))
            .get_reply(json!({"status": "failed", "failure_reason": "content policy"}));
        let mut sink = LatestResult::new();
        let request = GenerationRequest::video("tide", DurationSeconds::default());

        let err = generator(&server).generate(&request, &mut sink, &CancellationToken::new());

        assert_eq!(
            err,
            Err(GenerationError::GenerationFailed("content policy".to_string()))
        );
        assert_eq!(sink.error.as_deref(), Some("generation failed: content policy"));
    }

    #[test]
    fn cancelled_video_stops_polling() {
        let server = Scripted::default()
            .post_reply(200, json!({"id": "task-1"}))
            .get_reply(json!({"status": "running"}));
        let mut sink = LatestResult::new();
        let request = GenerationRequest::video("tide", DurationSeconds::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = generator(&server).generate(&request, &mut sink, &cancel);

        assert_eq!(err, Err(GenerationError::Cancelled));
        assert_eq!(server.calls().len(), 1);
        assert_eq!(sink.error.as_deref(), Some("generation cancelled"));
    }

    #[test]
    fn second_generation_while_busy_is_refused() -> Result<(), GenerationError> {
        let server = Scripted::default()
            .post_reply(200, json!({"data": [{"url": "https://x/y.png"}]}));
        let generator = generator(&server);
        let mut sink = LatestResult::new();
        let request = GenerationRequest::image("a red bicycle", AspectRatio::Square);

        generator.busy.store(true, Ordering::SeqCst);
        let err = generator.generate(&request, &mut sink, &CancellationToken::new());
        assert_eq!(err, Err(GenerationError::Busy));
        assert_eq!(sink, LatestResult::new());
        assert!(server.calls().is_empty());

        generator.busy.store(false, Ordering::SeqCst);
        generator.generate(&request, &mut sink, &CancellationToken::new())?;
        assert!(!generator.is_busy());
        Ok(())
    }

    #[test]
    fn oversized_attachment_is_rejected_locally() {
        let server = Scripted::default();
        let mut sink = LatestResult::new();
        let mut image = png_attachment();
        image.size_bytes = 31 * 1024 * 1024;
        let request =
            GenerationRequest::image("", AspectRatio::Square).with_attachment(Some(image));

        let err = generator(&server).generate(&request, &mut sink, &CancellationToken::new());

        assert!(matches!(
            err,
            Err(GenerationError::InvalidAttachment(AttachmentError::TooLarge { .. }))
        ));
        assert!(server.calls().is_empty());
    }

    #[test]
    fn configured_unknown_model_is_sent_verbatim() {
        let server = Scripted::default();
        let mut config = ClientConfig::new(BASE, "test-key");
        config.video_model = Some("seedance-preview".to_string());
        let generator = Generator::new(ApiClient::with_transport(config, server));

        assert_eq!(generator.resolve_model(GenerationMode::Video), "seedance-preview");
        assert_eq!(generator.resolve_model(GenerationMode::Image), SEEDREAM_MODEL_ID);
    }

    #[test]
    fn events_and_receipts_are_written() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("events.jsonl");
        let receipts = temp.path().join("receipts");
        let server = Scripted::default()
            .post_reply(200, json!({"id": "task-7"}))
            .get_reply(json!({"status": "running", "progress": 0.5}))
            .get_reply(json!({"status": "succeeded", "url": "https://x/v.mp4"}));
        let generator = generator(&server)
            .with_events(EventWriter::new(&events_path, "session-1"))
            .with_receipts_dir(&receipts);
        let mut sink = LatestResult::new();
        let request = GenerationRequest::video("ocean waves", DurationSeconds::default())
            .with_attachment(Some(png_attachment()));

        generator.generate(&request, &mut sink, &CancellationToken::new())?;

        let kinds: Vec<String> = fs::read_to_string(&events_path)?
            .lines()
            .map(|line| {
                serde_json::from_str::<Value>(line)
                    .map(|row| row["type"].as_str().unwrap_or_default().to_string())
            })
            .collect::<Result<_, _>>()?;
        assert_eq!(
            kinds,
            vec![
                "generation_started",
                "task_created",
                "job_progress",
                "job_progress",
                "generation_succeeded",
            ]
        );

        let entries: Vec<_> = fs::read_dir(&receipts)?.collect::<Result<_, _>>()?;
        assert_eq!(entries.len(), 1);
        let receipt: Value = serde_json::from_str(&fs::read_to_string(entries[0].path())?)?;
        assert_eq!(receipt["provider"]["task_id"], json!("task-7"));
        assert_eq!(receipt["outcome"]["status"], json!("succeeded"));
        assert_eq!(receipt["outcome"]["attempts"], json!(2));
        let rendered = receipt.to_string();
        assert!(!rendered.contains("iVBORw0KGgo"));
        Ok(())
    }

    #[test]
    fn back_to_back_runs_keep_separate_receipts() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let server = Scripted::default()
            .post_reply(200, json!({"data": [{"url": "https://x/one.png"}]}))
            .post_reply(200, json!({"data": [{"url": "https://x/two.png"}]}));
        let generator = generator(&server).with_receipts_dir(temp.path());
        let mut sink = LatestResult::new();
        let request = GenerationRequest::image("a red bicycle", AspectRatio::Square);

        generator.generate(&request, &mut sink, &CancellationToken::new())?;
        generator.generate(&request, &mut sink, &CancellationToken::new())?;

        let mut urls: Vec<String> = fs::read_dir(temp.path())?
            .map(|entry| -> anyhow::Result<String> {
                let receipt: Value = serde_json::from_str(&fs::read_to_string(entry?.path())?)?;
                Ok(receipt["outcome"]["media_url"].as_str().unwrap_or_default().to_string())
            })
            .collect::<anyhow::Result<_>>()?;
        urls.sort();
        assert_eq!(urls, vec!["https://x/one.png", "https://x/two.png"]);
        Ok(())
    }
}
