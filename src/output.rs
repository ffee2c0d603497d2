use serde::{Deserialize, Serialize};

use crate::error::ErrorInfo;
use crate::orchestrator::CaptureResult;

/// Schema version for output payloads.
pub const SNAP_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SnapOutput {
    Capture(CaptureOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutput {
    pub version: String,
    #[serde(flatten)]
    pub result: CaptureResult,
}

impl From<CaptureResult> for CaptureOutput {
    fn from(result: CaptureResult) -> Self {
        Self {
            version: SNAP_OUTPUT_VERSION.to_string(),
            result,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    pub error: ErrorInfo,
}

impl From<ErrorInfo> for ErrorOutput {
    fn from(error: ErrorInfo) -> Self {
        Self {
            version: SNAP_OUTPUT_VERSION.to_string(),
            error,
        }
    }
}
