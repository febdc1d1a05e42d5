use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Server-side video task as tracked locally while it is polled.
///
/// Once a terminal status is recorded every further mutation is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: String,
    status: JobStatus,
    progress_percent: u8,
    result_url: Option<String>,
    error_message: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            progress_percent: 0,
            result_url: None,
            error_message: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Raises the displayed progress. Returns the value now held, which never
    /// decreases.
    pub fn advance_progress(&mut self, percent: u8) -> u8 {
        if !self.status.is_terminal() {
            self.progress_percent = self.progress_percent.max(percent.min(100));
        }
        self.progress_percent
    }

    pub fn succeed(&mut self, url: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Succeeded;
        self.progress_percent = 100;
        self.result_url = Some(url.into());
        true
    }

    pub fn fail(&mut self, status: JobStatus, message: impl Into<String>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() || status == JobStatus::Succeeded {
            return false;
        }
        self.status = status;
        self.error_message = Some(message.into());
        true
    }
}
