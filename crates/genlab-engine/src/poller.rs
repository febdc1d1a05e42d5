use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use genlab_contracts::job::{Job, JobStatus};
use serde_json::Value;

use crate::config::PollConfig;
use crate::error::GenerationError;
use crate::extract::{self, Extractor};
use crate::transport::Transport;

const FALLBACK_FAILURE_REASON: &str = "unknown reason";

/// Shared flag that stops an in-flight status loop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Succeeded,
    Failed,
    Pending,
}

/// Maps the server's status word onto the three states the loop acts on.
pub fn classify_status(raw: &str) -> RemoteStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "succeed" | "succeeded" | "completed" | "success" => RemoteStatus::Succeeded,
        "failed" | "error" => RemoteStatus::Failed,
        _ => RemoteStatus::Pending,
    }
}

/// Result of one status loop: how many checks ran, and the media URL or the
/// reason there is none. The job passed in holds the matching terminal state.
#[derive(Debug)]
pub struct PollReport {
    pub attempts: u32,
    pub result: Result<String, GenerationError>,
}

struct TaskReaders {
    status: Extractor<String>,
    progress: Extractor<u8>,
    media_url: Extractor<String>,
    failure_reason: Extractor<String>,
}

impl TaskReaders {
    fn standard() -> Self {
        Self {
            status: extract::task_status(),
            progress: extract::task_progress(),
            media_url: extract::task_media_url(),
            failure_reason: extract::task_failure_reason(),
        }
    }
}

/// Drives one video task from pending to a terminal state.
pub struct Poller<'a> {
    transport: &'a dyn Transport,
    bearer: &'a str,
    config: &'a PollConfig,
    cancel: &'a CancellationToken,
    readers: TaskReaders,
}

impl<'a> Poller<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        bearer: &'a str,
        config: &'a PollConfig,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            transport,
            bearer,
            config,
            cancel,
            readers: TaskReaders::standard(),
        }
    }

    /// Checks `status_url` until the task settles, the attempt budget runs
    /// out, or the token is cancelled. `on_progress` sees the job after every
    /// attempt that did not end the loop.
    pub fn run(
        &self,
        status_url: &str,
        job: &mut Job,
        mut on_progress: impl FnMut(&Job),
    ) -> PollReport {
        let mut attempts = 0u32;
        while attempts < self.config.max_attempts {
            if !self.wait() {
                return self.cancelled(job, attempts);
            }
            attempts += 1;
            let synthetic = self.synthetic_progress(attempts);

            let payload = match self.fetch(status_url) {
                Some(payload) => payload,
                None => {
                    job.advance_progress(synthetic);
                    on_progress(job);
                    continue;
                }
            };

            let status = self.readers.status.extract(&payload).unwrap_or_default();
            let reported = self.readers.progress.extract(&payload);
            job.advance_progress(reported.unwrap_or(synthetic));

            match classify_status(&status) {
                RemoteStatus::Succeeded => {
                    let Some(url) = self.readers.media_url.extract(&payload) else {
                        let err = GenerationError::MissingResultUrl;
                        job.fail(JobStatus::Failed, err.to_string());
                        return PollReport {
                            attempts,
                            result: Err(err),
                        };
                    };
                    job.succeed(url.clone());
                    return PollReport {
                        attempts,
                        result: Ok(url),
                    };
                }
                RemoteStatus::Failed => {
                    let reason = self
                        .readers
                        .failure_reason
                        .extract(&payload)
                        .unwrap_or_else(|| FALLBACK_FAILURE_REASON.to_string());
                    let err = GenerationError::GenerationFailed(reason);
                    job.fail(JobStatus::Failed, err.to_string());
                    return PollReport {
                        attempts,
                        result: Err(err),
                    };
                }
                RemoteStatus::Pending => on_progress(job),
            }
        }

        let err = GenerationError::Timeout { attempts };
        job.fail(JobStatus::TimedOut, err.to_string());
        PollReport {
            attempts,
            result: Err(err),
        }
    }

    fn synthetic_progress(&self, attempt: u32) -> u8 {
        let step = u32::from(self.config.progress_step);
        let cap = u32::from(self.config.synthetic_cap);
        attempt.saturating_mul(step).min(cap) as u8
    }

    /// Sleeps one interval. Returns false if the token fired before the wait
    /// or by the time it ends.
    fn wait(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if !self.config.interval.is_zero() {
            thread::sleep(self.config.interval);
        }
        !self.cancel.is_cancelled()
    }

    /// One status check. Transport errors, non-2xx replies and unreadable
    /// bodies are transient and yield `None`.
    fn fetch(&self, status_url: &str) -> Option<Value> {
        let reply = match self.transport.get(status_url, self.bearer) {
            Ok(reply) => reply,
            Err(err) => {
                log::debug!("status check failed: {err}");
                return None;
            }
        };
        if !reply.is_success() {
            log::debug!("status check returned {} for {status_url}", reply.status);
            return None;
        }
        let payload = reply.json();
        if payload.is_none() {
            log::debug!("status check body was not JSON ({status_url})");
        }
        payload
    }

    fn cancelled(&self, job: &mut Job, attempts: u32) -> PollReport {
        job.fail(JobStatus::Cancelled, GenerationError::Cancelled.to_string());
        PollReport {
            attempts,
            result: Err(GenerationError::Cancelled),
        }
    }
}
