//! pagesnap Library
//!
//! Captures a single web page with two independent strategies and keeps
//! whatever succeeded: a plain HTTP fetch of the raw document, and a
//! browser-rendered capture of the final markup plus a full-page screenshot.
//!
//! # Module Overview
//!
//! - [`target`] - Turn user input into an absolute URL
//! - [`session`] - Per-run output directory and artifact naming
//! - [`strategy`] - Static and rendered capture strategies
//! - [`browser`] - Browser automation traits and the Chromium backend
//! - [`orchestrator`] - Runs both strategies and keeps or discards the session
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use pagesnap_lib::{Capturer, Config};
//!
//! # async fn example() -> pagesnap_lib::Result<()> {
//! let config = Config::default();
//! let mut capturer = Capturer::from_config(&config)?;
//! let result = capturer.capture("example.com").await?;
//! println!(
//!     "static={} rendered={}",
//!     result.static_outcome.succeeded(),
//!     result.rendered_outcome.succeeded()
//! );
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod session;
pub mod strategy;
pub mod target;
pub mod viewport;

pub use browser::{BrowserLauncher, BrowserSession, ChromiumLauncher};
pub use config::{
    Config, FetchSettings, RateLimit, RenderSettings, ScreenshotFormat, ScreenshotSettings,
    SleepBand, WriteMode,
};
pub use error::{CaptureError, ErrorCategory, ErrorInfo, Result};
pub use orchestrator::{CaptureResult, CaptureState, Capturer};
pub use output::{CaptureOutput, ErrorOutput, SnapOutput, SNAP_OUTPUT_VERSION};
pub use session::{ArtifactKind, ArtifactPath, Disposition, OutputSession};
pub use strategy::jitter::{FixedJitter, JitterSource, RandomJitter};
pub use strategy::rendered::RenderedFetcher;
pub use strategy::static_fetch::{HostRateLimiter, StaticFetcher};
pub use strategy::{StrategyName, StrategyOutcome};
pub use target::{normalize, CaptureTarget};
pub use viewport::Viewport;
