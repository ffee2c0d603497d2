//! Capture orchestration.
//!
//! A [`Capturer`] turns one raw target into a [`CaptureResult`]:
//!
//! ```text
//! Idle -> Normalizing -> Capturing -> Finalizing | Discarding -> Done
//! ```
//!
//! Both strategies always run. They are polled together but never see each
//! other, so a renderer timeout cannot hide a good static fetch or the
//! other way around. Only normalization and session creation can fail the
//! run as a whole.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::browser::{BrowserLauncher, ChromiumLauncher};
use crate::config::Config;
use crate::error::Result;
use crate::session::{ArtifactKind, Disposition, OutputSession};
use crate::strategy::jitter::{JitterSource, RandomJitter};
use crate::strategy::rendered::RenderedFetcher;
use crate::strategy::static_fetch::StaticFetcher;
use crate::strategy::{StrategyName, StrategyOutcome};
use crate::target::{normalize, CaptureTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Idle,
    Normalizing,
    Capturing,
    Finalizing,
    Discarding,
    Done,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub target: CaptureTarget,
    pub session_dir: PathBuf,
    pub static_outcome: StrategyOutcome,
    pub rendered_outcome: StrategyOutcome,
    pub disposition: Disposition,
}

impl CaptureResult {
    pub fn any_succeeded(&self) -> bool {
        self.static_outcome.succeeded() || self.rendered_outcome.succeeded()
    }

    pub fn outcomes(&self) -> [&StrategyOutcome; 2] {
        [&self.static_outcome, &self.rendered_outcome]
    }
}

pub struct Capturer {
    output_dir: PathBuf,
    static_fetcher: StaticFetcher,
    rendered_fetcher: RenderedFetcher,
    jitter: Box<dyn JitterSource>,
    state: CaptureState,
}

impl Capturer {
    /// Build a capturer that renders with a local Chromium.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_launcher(config, Arc::new(ChromiumLauncher))
    }

    pub fn with_launcher(config: &Config, launcher: Arc<dyn BrowserLauncher>) -> Result<Self> {
        let static_fetcher = StaticFetcher::new(&config.fetch, config.write_mode)?;
        let rendered_fetcher =
            RenderedFetcher::new(launcher, config.render.clone(), config.write_mode);
        Ok(Self::new(
            config.output_dir.clone(),
            static_fetcher,
            rendered_fetcher,
            Box::new(RandomJitter::new()),
        ))
    }

    pub fn new(
        output_dir: PathBuf,
        static_fetcher: StaticFetcher,
        rendered_fetcher: RenderedFetcher,
        jitter: Box<dyn JitterSource>,
    ) -> Self {
        Self {
            output_dir,
            static_fetcher,
            rendered_fetcher,
            jitter,
            state: CaptureState::Idle,
        }
    }

    /// Replace the jitter used for the rendered strategy's waits.
    pub fn with_jitter(mut self, jitter: Box<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub async fn capture(&mut self, raw_input: &str) -> Result<CaptureResult> {
        self.capture_until(raw_input, CancellationToken::new()).await
    }

    /// Capture `raw_input`, giving up on in-flight strategies once `cancel`
    /// fires. Strategies cut short are recorded as cancelled failures and
    /// the usual keep-or-discard rule applies to whatever already finished.
    pub async fn capture_until(
        &mut self,
        raw_input: &str,
        cancel: CancellationToken,
    ) -> Result<CaptureResult> {
        self.transition(CaptureState::Idle);

        self.transition(CaptureState::Normalizing);
        let target = match normalize(raw_input) {
            Ok(target) => target,
            Err(err) => {
                self.transition(CaptureState::Done);
                return Err(err);
            }
        };
        tracing::info!(url = target.normalized_url(), "target");

        let mut session = match OutputSession::open(&self.output_dir, &target) {
            Ok(session) => session,
            Err(err) => {
                self.transition(CaptureState::Done);
                return Err(err);
            }
        };

        self.transition(CaptureState::Capturing);
        let (static_outcome, rendered_outcome) =
            self.run_strategies(&target, &session, &cancel).await;

        let disposition = if static_outcome.succeeded() || rendered_outcome.succeeded() {
            self.transition(CaptureState::Finalizing);
            session.finalize();
            Disposition::Retained
        } else {
            self.transition(CaptureState::Discarding);
            session.discard();
            Disposition::Discarded
        };
        self.transition(CaptureState::Done);

        Ok(CaptureResult {
            target,
            session_dir: session.directory().to_path_buf(),
            static_outcome,
            rendered_outcome,
            disposition,
        })
    }

    async fn run_strategies(
        &mut self,
        target: &CaptureTarget,
        session: &OutputSession,
        cancel: &CancellationToken,
    ) -> (StrategyOutcome, StrategyOutcome) {
        let static_out = session.artifact_path(ArtifactKind::StaticHtml);
        let html_out = session.artifact_path(ArtifactKind::RenderedHtml);
        let screenshot_out = session.artifact_path(ArtifactKind::Screenshot(
            self.rendered_fetcher.settings().screenshot.format,
        ));

        let Self {
            static_fetcher,
            rendered_fetcher,
            jitter,
            ..
        } = self;

        let static_run = static_fetcher.run(target, &static_out);
        let rendered_run = rendered_fetcher.run(target, &html_out, &screenshot_out, &mut **jitter);
        tokio::pin!(static_run, rendered_run);

        let mut static_outcome = None;
        let mut rendered_outcome = None;
        while static_outcome.is_none() || rendered_outcome.is_none() {
            tokio::select! {
                outcome = &mut static_run, if static_outcome.is_none() => {
                    log_outcome(&outcome);
                    static_outcome = Some(outcome);
                }
                outcome = &mut rendered_run, if rendered_outcome.is_none() => {
                    log_outcome(&outcome);
                    rendered_outcome = Some(outcome);
                }
                _ = cancel.cancelled() => {
                    tracing::warn!("capture cancelled; abandoning unfinished strategies");
                    break;
                }
            }
        }

        (
            static_outcome.unwrap_or_else(|| StrategyOutcome::cancelled(StrategyName::Static)),
            rendered_outcome.unwrap_or_else(|| StrategyOutcome::cancelled(StrategyName::Rendered)),
        )
    }

    fn transition(&mut self, next: CaptureState) {
        tracing::debug!(from = ?self.state, to = ?next, "capture state");
        self.state = next;
    }
}

fn log_outcome(outcome: &StrategyOutcome) {
    tracing::info!(
        strategy = %outcome.strategy(),
        succeeded = outcome.succeeded(),
        "strategy finished"
    );
}
