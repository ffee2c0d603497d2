//! The two independent ways of acquiring a page.
//!
//! - [`static_fetch`] - one plain HTTP GET, raw body saved as-is
//! - [`rendered`] - browser-rendered markup plus a full-page screenshot
//! - [`jitter`] - randomized waits, injectable for tests
//!
//! Each strategy reports a [`StrategyOutcome`] and never returns an error
//! to its caller.

pub mod jitter;
pub mod rendered;
pub mod static_fetch;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, ErrorInfo};
use crate::session::ArtifactPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    Static,
    Rendered,
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyName::Static => f.write_str("static"),
            StrategyName::Rendered => f.write_str("rendered"),
        }
    }
}

/// Result of one strategy in one run. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutcome {
    strategy: StrategyName,
    succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
    artifacts: BTreeSet<ArtifactPath>,
}

impl StrategyOutcome {
    pub fn success(strategy: StrategyName, artifacts: impl IntoIterator<Item = ArtifactPath>) -> Self {
        Self {
            strategy,
            succeeded: true,
            error: None,
            artifacts: artifacts.into_iter().collect(),
        }
    }

    /// A failed run. `artifacts` lists files that were written anyway.
    pub fn failure(
        strategy: StrategyName,
        error: &CaptureError,
        artifacts: impl IntoIterator<Item = ArtifactPath>,
    ) -> Self {
        Self {
            strategy,
            succeeded: false,
            error: Some(error.to_info()),
            artifacts: artifacts.into_iter().collect(),
        }
    }

    pub fn cancelled(strategy: StrategyName) -> Self {
        Self::failure(strategy, &CaptureError::Cancelled, [])
    }

    pub fn strategy(&self) -> StrategyName {
        self.strategy
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn artifacts(&self) -> &BTreeSet<ArtifactPath> {
        &self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::session::ArtifactKind;
    use std::path::PathBuf;

    #[test]
    fn failure_keeps_partial_artifacts_and_error_category() {
        let partial = ArtifactPath {
            kind: ArtifactKind::RenderedHtml,
            path: PathBuf::from("out/x_rendered.html"),
        };
        let err = CaptureError::artifact_write("out/x.jpg", std::io::Error::other("full"));
        let outcome = StrategyOutcome::failure(StrategyName::Rendered, &err, [partial.clone()]);

        assert!(!outcome.succeeded());
        assert_eq!(
            outcome.error().map(|e| e.category),
            Some(ErrorCategory::Filesystem)
        );
        assert!(outcome.artifacts().contains(&partial));
    }

    #[test]
    fn cancelled_outcome_has_no_artifacts() {
        let outcome = StrategyOutcome::cancelled(StrategyName::Static);
        assert!(!outcome.succeeded());
        assert!(outcome.artifacts().is_empty());
        assert_eq!(
            outcome.error().map(|e| e.category),
            Some(ErrorCategory::Cancelled)
        );
    }

    #[test]
    fn success_serializes_without_error_field() {
        let outcome = StrategyOutcome::success(StrategyName::Static, []);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["strategy"], "static");
        assert_eq!(json["succeeded"], true);
        assert!(json.get("error").is_none());
    }
}
