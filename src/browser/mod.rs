//! Browser automation capability used by the rendered strategy.
//!
//! The rendered strategy only talks to these traits, so it can be driven by
//! a real Chromium ([`chromium`]) or by a scripted double in tests.
//!
//! # Module Structure
//!
//! - [`BrowserLauncher`] - starts an isolated browser for one capture
//! - [`BrowserSession`] - the individual steps of a capture
//! - [`chromium`] - implementation on top of chromiumoxide

pub mod chromium;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{RenderSettings, ScreenshotSettings};
use crate::error::Result;

pub use chromium::ChromiumLauncher;

/// Starts a browser. Every call must produce a fresh, unshared instance.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, settings: &RenderSettings) -> Result<Box<dyn BrowserSession>>;
}

/// One live browser page. Steps run in the order the caller issues them.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` and wait for the navigation to commit.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Block until an element matching `selector` exists.
    async fn wait_for_ready(&mut self, selector: &str) -> Result<()>;

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Run `script` in the page; returns its value when it is JSON-representable.
    async fn evaluate_script(&mut self, script: &str) -> Result<Option<serde_json::Value>>;

    /// Outer HTML of the whole document.
    async fn capture_markup(&mut self) -> Result<String>;

    async fn capture_screenshot(&mut self, settings: &ScreenshotSettings) -> Result<Vec<u8>>;

    /// Tear the browser down. Must not leave a process behind.
    async fn close(self: Box<Self>) -> Result<()>;
}
