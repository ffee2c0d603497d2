//! Chromium-backed browser sessions using chromiumoxide.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use super::{BrowserLauncher, BrowserSession};
use crate::config::{RenderSettings, ScreenshotFormat, ScreenshotSettings};
use crate::error::{CaptureError, Result};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches one Chromium process per capture, each with its own
/// throwaway profile directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, settings: &RenderSettings) -> Result<Box<dyn BrowserSession>> {
        let profile = TempDir::new()
            .map_err(|e| CaptureError::render(format!("failed to create browser profile: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .window_size(settings.viewport.width, settings.viewport.height)
            .viewport(None)
            .arg(settings.viewport.window_size_arg())
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !settings.headless {
            builder = builder.with_head();
            if settings.offscreen_window {
                builder = builder.arg("--window-position=-32000,-32000");
            }
        }
        if let Some(executable) = &settings.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder
            .build()
            .map_err(|e| CaptureError::render(format!("failed to build browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::render(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(CaptureError::render(format!("failed to open page: {e}")));
            }
        };

        tracing::debug!(
            headless = settings.headless,
            viewport = %settings.viewport,
            "browser launched"
        );

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            _profile: profile,
        }))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    // Removed from disk when the session is dropped.
    _profile: TempDir,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| CaptureError::render(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    /// Polls until `selector` matches. A missing element is retried; any
    /// protocol error (closed tab, dropped connection) ends the wait.
    async fn wait_for_ready(&mut self, selector: &str) -> Result<()> {
        let script = ready_check_script(selector);
        loop {
            let present: bool = self
                .page
                .evaluate(script.as_str())
                .await
                .map_err(|e| CaptureError::render(format!("ready check for {selector} failed: {e}")))?
                .into_value()
                .map_err(|e| CaptureError::render(format!("ready check returned no boolean: {e}")))?;
            if present {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn evaluate_script(&mut self, script: &str) -> Result<Option<serde_json::Value>> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| CaptureError::render(format!("script evaluation failed: {e}")))?;
        Ok(result.value().cloned())
    }

    async fn capture_markup(&mut self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| CaptureError::render(format!("failed to read page markup: {e}")))
    }

    async fn capture_screenshot(&mut self, settings: &ScreenshotSettings) -> Result<Vec<u8>> {
        let mut params = ScreenshotParams::builder()
            .format(cdp_format(settings.format))
            .full_page(settings.full_page);
        if settings.format.is_lossy() {
            params = params.quality(i64::from(settings.quality));
        }
        self.page
            .screenshot(params.build())
            .await
            .map_err(|e| CaptureError::render(format!("screenshot failed: {e}")))
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        let closed = self.browser.close().await;
        if closed.is_err() {
            let _ = self.browser.kill().await;
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        closed
            .map(|_| ())
            .map_err(|e| CaptureError::render(format!("failed to close browser: {e}")))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// Expression that is `true` once `selector` matches an element.
fn ready_check_script(selector: &str) -> String {
    // JSON string literals are valid JS string literals.
    let quoted = serde_json::Value::String(selector.to_string()).to_string();
    format!("document.querySelector({quoted}) !== null")
}

fn cdp_format(format: ScreenshotFormat) -> CaptureScreenshotFormat {
    match format {
        ScreenshotFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
        ScreenshotFormat::Png => CaptureScreenshotFormat::Png,
        ScreenshotFormat::Webp => CaptureScreenshotFormat::Webp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScreenshotSettings;

    #[test]
    fn screenshot_formats_map_to_cdp() {
        assert!(matches!(
            cdp_format(ScreenshotFormat::Jpeg),
            CaptureScreenshotFormat::Jpeg
        ));
        assert!(matches!(
            cdp_format(ScreenshotFormat::Webp),
            CaptureScreenshotFormat::Webp
        ));
    }

    #[test]
    fn ready_check_quotes_the_selector() {
        assert_eq!(
            ready_check_script("body"),
            r#"document.querySelector("body") !== null"#
        );
        assert_eq!(
            ready_check_script(r#"a[href="x"]"#),
            r#"document.querySelector("a[href=\"x\"]") !== null"#
        );
    }

    #[tokio::test]
    async fn missing_executable_fails_to_launch() {
        let settings = RenderSettings {
            chrome_executable: Some("/nonexistent/pagesnap/chrome".into()),
            ..RenderSettings::default()
        };

        let err = match ChromiumLauncher.launch(&settings).await {
            Ok(_) => panic!("launch should fail without a browser binary"),
            Err(e) => e,
        };

        assert!(matches!(err, CaptureError::Render(_)));
    }

    #[tokio::test]
    #[ignore] // Requires Chrome/Chromium to be installed
    async fn captures_markup_and_screenshot_from_data_url() {
        let settings = RenderSettings::default();
        let mut session = ChromiumLauncher.launch(&settings).await.expect("launch");

        session
            .navigate("data:text/html,<h1>Hello</h1>")
            .await
            .expect("navigate");
        session.wait_for_ready("body").await.expect("ready");
        let html = session.capture_markup().await.expect("markup");
        let shot = session
            .capture_screenshot(&ScreenshotSettings::default())
            .await
            .expect("screenshot");
        session.close().await.expect("close");

        assert!(html.contains("<h1>Hello</h1>"));
        assert!(!shot.is_empty());
    }
}
