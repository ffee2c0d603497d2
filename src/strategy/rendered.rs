//! Rendered capture: drive a real browser, then save markup and screenshot.

use std::sync::Arc;

use tokio::time::{timeout, timeout_at, Instant};

use super::jitter::JitterSource;
use super::{StrategyName, StrategyOutcome};
use crate::browser::{BrowserLauncher, BrowserSession};
use crate::config::{RenderSettings, WriteMode};
use crate::error::{CaptureError, Result};
use crate::session::{abandon_artifacts, commit_artifacts, write_artifact, ArtifactPath};
use crate::target::CaptureTarget;

/// What the browser handed back before anything touched the disk.
#[derive(Debug)]
struct RenderedPage {
    markup: String,
    screenshot: Vec<u8>,
}

pub struct RenderedFetcher {
    launcher: Arc<dyn BrowserLauncher>,
    settings: RenderSettings,
    write_mode: WriteMode,
}

impl RenderedFetcher {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        settings: RenderSettings,
        write_mode: WriteMode,
    ) -> Self {
        Self {
            launcher,
            settings,
            write_mode,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render `target` in a fresh browser and save markup then screenshot.
    ///
    /// Launch and every automation step share one deadline. Both files are
    /// required for success; in [`WriteMode::Direct`] a markup file written
    /// before a failed screenshot write stays on disk and is reported.
    pub async fn run(
        &self,
        target: &CaptureTarget,
        html_out: &ArtifactPath,
        screenshot_out: &ArtifactPath,
        jitter: &mut dyn JitterSource,
    ) -> StrategyOutcome {
        let started = Instant::now();
        let page = match self.capture(target, jitter).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(
                    url = target.normalized_url(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "rendered capture failed: {err}"
                );
                return StrategyOutcome::failure(StrategyName::Rendered, &err, []);
            }
        };
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            markup_bytes = page.markup.len(),
            screenshot_bytes = page.screenshot.len(),
            "rendered capture complete"
        );

        self.persist(page, html_out, screenshot_out)
    }

    async fn capture(
        &self,
        target: &CaptureTarget,
        jitter: &mut dyn JitterSource,
    ) -> Result<RenderedPage> {
        let budget = self.settings.deadline;
        let deadline = Instant::now() + budget;

        tracing::info!("launching browser");
        let mut browser = timeout_at(deadline, self.launcher.launch(&self.settings))
            .await
            .map_err(|_| CaptureError::Timeout(budget))??;

        let result = timeout_at(deadline, self.drive(browser.as_mut(), target, jitter)).await;

        match timeout(self.settings.teardown_grace, browser.close()).await {
            Ok(Ok(())) => tracing::debug!("browser closed"),
            Ok(Err(e)) => tracing::warn!("browser teardown failed: {e}"),
            Err(_) => tracing::warn!(
                grace_ms = self.settings.teardown_grace.as_millis() as u64,
                "browser teardown exceeded grace period"
            ),
        }

        result.map_err(|_| CaptureError::Timeout(budget))?
    }

    async fn drive(
        &self,
        browser: &mut dyn BrowserSession,
        target: &CaptureTarget,
        jitter: &mut dyn JitterSource,
    ) -> Result<RenderedPage> {
        let url = target.normalized_url();

        tracing::info!(url, "navigating");
        browser.navigate(url).await?;
        browser.wait_for_ready(&self.settings.ready_selector).await?;

        let settle = jitter.pick(self.settings.settle);
        tracing::debug!(ms = settle.as_millis() as u64, "waiting for page to settle");
        browser.sleep(settle).await;

        browser.evaluate_script(&self.settings.scroll_script).await?;

        let post_scroll = jitter.pick(self.settings.post_scroll);
        tracing::debug!(ms = post_scroll.as_millis() as u64, "waiting after scroll");
        browser.sleep(post_scroll).await;

        let markup = browser.capture_markup().await?;
        let screenshot = browser
            .capture_screenshot(&self.settings.screenshot)
            .await?;

        Ok(RenderedPage { markup, screenshot })
    }

    fn persist(
        &self,
        page: RenderedPage,
        html_out: &ArtifactPath,
        screenshot_out: &ArtifactPath,
    ) -> StrategyOutcome {
        let mode = self.write_mode;
        let paths = [html_out.path.as_path(), screenshot_out.path.as_path()];

        if let Err(err) = write_artifact(&html_out.path, page.markup.as_bytes(), mode) {
            abandon_artifacts(&paths, mode);
            tracing::warn!("rendered HTML not saved: {err}");
            return StrategyOutcome::failure(StrategyName::Rendered, &err, []);
        }

        if let Err(err) = write_artifact(&screenshot_out.path, &page.screenshot, mode) {
            abandon_artifacts(&paths, mode);
            let partial = match mode {
                WriteMode::Direct => vec![html_out.clone()],
                WriteMode::Atomic => Vec::new(),
            };
            tracing::warn!("screenshot not saved: {err}");
            return StrategyOutcome::failure(StrategyName::Rendered, &err, partial);
        }

        // A failed commit has already rolled back whatever it published.
        if let Err(err) = commit_artifacts(&paths, mode) {
            abandon_artifacts(&paths, mode);
            tracing::warn!("rendered artifacts not published: {err}");
            return StrategyOutcome::failure(StrategyName::Rendered, &err, []);
        }

        tracing::info!(path = %html_out.path.display(), "rendered HTML saved");
        tracing::info!(path = %screenshot_out.path.display(), "screenshot saved");
        StrategyOutcome::success(
            StrategyName::Rendered,
            [html_out.clone(), screenshot_out.clone()],
        )
    }
}
