use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, Result};
use crate::Viewport;

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                                      (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "tr-TR,tr;q=0.9,en-US;q=0.8";
pub const DEFAULT_REFERER: &str = "https://www.google.com/";

/// Per-request budget for the static fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Hard deadline covering the whole rendered capture.
pub const DEFAULT_RENDER_DEADLINE: Duration = Duration::from_secs(120);

/// How long browser teardown may take once the deadline has fired.
pub const DEFAULT_TEARDOWN_GRACE: Duration = Duration::from_secs(5);

pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base directory; each run creates one session directory inside it.
    pub output_dir: PathBuf,
    pub write_mode: WriteMode,
    pub fetch: FetchSettings,
    pub render: RenderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            write_mode: WriteMode::default(),
            fetch: FetchSettings::default(),
            render: RenderSettings::default(),
        }
    }
}

/// How strategies persist their artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Write each file in place; a strategy that fails halfway may leave
    /// the files it already wrote.
    #[default]
    Direct,
    /// Write to `*.partial` files and rename them only once every artifact
    /// of the strategy is on disk.
    Atomic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
    pub referer: String,
    pub rate_limit: RateLimit,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            rate_limit: RateLimit::default(),
        }
    }
}

/// Spacing between two requests to the same host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimit {
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// Upper bound of the random extra wait added on top of `delay`.
    #[serde(with = "humantime_serde")]
    pub jitter: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
            jitter: Duration::from_secs(1),
        }
    }
}

/// Inclusive range a randomized sleep is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SleepBand {
    #[serde(with = "humantime_serde")]
    pub min: Duration,
    #[serde(with = "humantime_serde")]
    pub max: Duration,
}

impl SleepBand {
    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    pub fn contains(&self, value: Duration) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    #[serde(with = "humantime_serde")]
    pub deadline: Duration,
    #[serde(with = "humantime_serde")]
    pub teardown_grace: Duration,
    pub viewport: Viewport,
    pub headless: bool,
    /// Park a headed window off-screen so it renders without getting in the way.
    pub offscreen_window: bool,
    pub chrome_executable: Option<PathBuf>,
    pub ready_selector: String,
    pub scroll_script: String,
    /// Wait after the page is ready, before scrolling.
    pub settle: SleepBand,
    /// Wait after scrolling, before capturing.
    pub post_scroll: SleepBand,
    pub screenshot: ScreenshotSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_RENDER_DEADLINE,
            teardown_grace: DEFAULT_TEARDOWN_GRACE,
            viewport: Viewport::default(),
            headless: true,
            offscreen_window: true,
            chrome_executable: None,
            ready_selector: "body".to_string(),
            scroll_script: SCROLL_TO_BOTTOM_SCRIPT.to_string(),
            settle: SleepBand::from_secs(3, 5),
            post_scroll: SleepBand::from_secs(2, 4),
            screenshot: ScreenshotSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenshotSettings {
    pub format: ScreenshotFormat,
    /// Compression quality, only meaningful for lossy formats.
    pub quality: u8,
    pub full_page: bool,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            format: ScreenshotFormat::Jpeg,
            quality: 90,
            full_page: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl ScreenshotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ScreenshotFormat::Jpeg => "jpg",
            ScreenshotFormat::Png => "png",
            ScreenshotFormat::Webp => "webp",
        }
    }

    pub fn is_lossy(self) -> bool {
        !matches!(self, ScreenshotFormat::Png)
    }
}

impl Config {
    /// Load from a TOML file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CaptureError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
            .map_err(|e| CaptureError::Config(format!("Invalid config ({}): {e}", path.display())))
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, String> {
        let config: Config = toml::from_str(raw).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.fetch.timeout.is_zero() {
            return Err("fetch.timeout must be greater than zero".to_string());
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err("fetch.user_agent must not be empty".to_string());
        }
        if self.render.deadline.is_zero() {
            return Err("render.deadline must be greater than zero".to_string());
        }
        if self.render.ready_selector.trim().is_empty() {
            return Err("render.ready_selector must not be empty".to_string());
        }
        for (name, band) in [
            ("render.settle", self.render.settle),
            ("render.post_scroll", self.render.post_scroll),
        ] {
            if band.min > band.max {
                return Err(format!(
                    "{name}: min ({:?}) is greater than max ({:?})",
                    band.min, band.max
                ));
            }
        }
        if self.render.screenshot.quality > 100 {
            return Err(format!(
                "render.screenshot.quality must be 0-100, got {}",
                self.render.screenshot.quality
            ));
        }
        if self.render.viewport.width == 0 || self.render.viewport.height == 0 {
            return Err("render.viewport dimensions must be positive".to_string());
        }
        Ok(())
    }
}
