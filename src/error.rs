use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Failed to create output directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("Failed to write artifact {}: {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture cancelled before the strategy finished")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaptureError {
    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        CaptureError::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        CaptureError::Render(message.into())
    }

    pub fn artifact_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaptureError::ArtifactWrite {
            path: path.into(),
            source,
        }
    }

    /// Errors that stop the whole run instead of being recorded on a strategy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CaptureError::InvalidUrl { .. }
                | CaptureError::DirectoryCreate { .. }
                | CaptureError::Config(_)
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CaptureError::InvalidUrl { .. } | CaptureError::Config(_) => ErrorCategory::Config,
            CaptureError::DirectoryCreate { .. } | CaptureError::ArtifactWrite { .. } => {
                ErrorCategory::Filesystem
            }
            CaptureError::Network(_) => ErrorCategory::Network,
            CaptureError::Render(_) => ErrorCategory::Render,
            CaptureError::Timeout(_) => ErrorCategory::Timeout,
            CaptureError::Cancelled => ErrorCategory::Cancelled,
        }
    }

    pub fn to_info(&self) -> ErrorInfo {
        let remediation = match self {
            CaptureError::InvalidUrl { .. } => {
                "Pass a hostname or an absolute URL (e.g., example.com or https://example.com)."
            }
            CaptureError::DirectoryCreate { .. } => {
                "Check that the output directory is writable and has free space; use --output-dir to pick another location."
            }
            CaptureError::Network(e) if e.is_timeout() => {
                "The server did not answer in time; raise --fetch-timeout or retry later."
            }
            CaptureError::Network(_) => "Check connectivity/DNS/TLS for the target host.",
            CaptureError::Render(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("launch") || lower.contains("executable") {
                    "Install Chrome/Chromium or point --chrome at the browser binary."
                } else {
                    "Run with --verbose to see which browser step failed."
                }
            }
            CaptureError::Timeout(_) => {
                "The page did not settle before the deadline; raise --render-deadline."
            }
            CaptureError::ArtifactWrite { .. } => {
                "Check file permissions and free disk space in the output directory."
            }
            CaptureError::Cancelled => "The run was interrupted; rerun to capture again.",
            CaptureError::Config(_) => {
                "Check the config file (TOML) and flag values such as --viewport WIDTHxHEIGHT."
            }
        };
        ErrorInfo::new(self.category(), self.to_string(), remediation)
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Filesystem,
    Network,
    Render,
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorInfo {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
