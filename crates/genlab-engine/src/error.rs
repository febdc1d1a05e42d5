use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("only image files can be attached (got {0})")]
    InvalidType(String),

    #[error("attachment is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("could not read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
}

/// Terminal outcomes of a generation attempt other than success.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("enter a prompt or attach an image first")]
    EmptyRequest,

    #[error("a generation is already in flight")]
    Busy,

    #[error(transparent)]
    InvalidAttachment(#[from] AttachmentError),

    #[error("generation request rejected ({status}){}", rejection_detail(.message))]
    GenerationRejected { status: u16, message: Option<String> },

    #[error("response did not contain a result URL")]
    MissingResult,

    #[error("task creation response did not contain a task id")]
    MissingTaskId,

    #[error("generation completed but no media URL was found in the response")]
    MissingResultUrl,

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("generation cancelled")]
    Cancelled,

    #[error("request could not be sent: {0}")]
    Transport(String),
}

fn rejection_detail(message: &Option<String>) -> String {
    match message {
        Some(text) => format!(": {text}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachmentError, GenerationError};

    #[test]
    fn rejected_message_is_optional() {
        let bare = GenerationError::GenerationRejected {
            status: 401,
            message: None,
        };
        assert_eq!(bare.to_string(), "generation request rejected (401)");

        let detailed = GenerationError::GenerationRejected {
            status: 400,
            message: Some("invalid prompt".to_string()),
        };
        assert_eq!(
            detailed.to_string(),
            "generation request rejected (400): invalid prompt"
        );
    }

    #[test]
    fn attachment_errors_convert() {
        let err: GenerationError = AttachmentError::InvalidType("text/plain".to_string()).into();
        assert_eq!(err.to_string(), "only image files can be attached (got text/plain)");
    }
}
