use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("`{command}` failed: {detail}")]
    ExternalTool { command: String, detail: String },
    #[error("change-set pipeline timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("change-set pipeline was cancelled")]
    Cancelled,
    #[error("change-set pipeline error: {0}")]
    Pipeline(String),
    #[error("issue tracker error: {0}")]
    IssueTracker(String),
    #[error("notification error: {0}")]
    Notification(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
