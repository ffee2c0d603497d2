#![allow(dead_code)]

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pagesnap_lib::{
    BrowserLauncher, BrowserSession, CaptureError, Config, RenderSettings, Result,
    ScreenshotSettings,
};

pub const RENDERED_MARKUP: &str = "<html><body>rendered</body></html>";
pub const SCREENSHOT_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

/// How the scripted browser misbehaves.
#[derive(Debug, Clone, Default)]
pub enum Behavior {
    #[default]
    Works,
    LaunchFails,
    NavigationHangs,
    /// Occupy the screenshot file name with a directory inside the session
    /// under `base`, so saving the screenshot fails after the markup is saved.
    BlockScreenshotIn(PathBuf),
}

/// In-process browser double that records every step it is asked to run.
#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    pub behavior: Behavior,
    pub steps: Arc<Mutex<Vec<String>>>,
}

impl ScriptedLauncher {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            steps: Arc::default(),
        }
    }

    pub fn steps(&self) -> Vec<String> {
        self.steps.lock().unwrap().clone()
    }
}

struct ScriptedBrowser {
    behavior: Behavior,
    steps: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBrowser {
    fn record(&self, step: impl Into<String>) {
        self.steps.lock().unwrap().push(step.into());
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self, _settings: &RenderSettings) -> Result<Box<dyn BrowserSession>> {
        self.steps.lock().unwrap().push("launch".into());
        if matches!(self.behavior, Behavior::LaunchFails) {
            return Err(CaptureError::render("failed to launch browser: not installed"));
        }
        Ok(Box::new(ScriptedBrowser {
            behavior: self.behavior.clone(),
            steps: Arc::clone(&self.steps),
        }))
    }
}

#[async_trait]
impl BrowserSession for ScriptedBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.record(format!("navigate {url}"));
        if matches!(self.behavior, Behavior::NavigationHangs) {
            futures::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn wait_for_ready(&mut self, selector: &str) -> Result<()> {
        self.record(format!("wait {selector}"));
        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) {
        self.record(format!("sleep {}", duration.as_millis()));
    }

    async fn evaluate_script(&mut self, _script: &str) -> Result<Option<serde_json::Value>> {
        self.record("scroll");
        Ok(None)
    }

    async fn capture_markup(&mut self) -> Result<String> {
        self.record("markup");
        Ok(RENDERED_MARKUP.to_string())
    }

    async fn capture_screenshot(&mut self, settings: &ScreenshotSettings) -> Result<Vec<u8>> {
        self.record("screenshot");
        if let Behavior::BlockScreenshotIn(base) = &self.behavior {
            let session = only_session_dir(base);
            let name = session.file_name().unwrap().to_string_lossy().to_string();
            let blocker = session.join(format!("{name}.{}", settings.format.extension()));
            std::fs::create_dir(blocker).unwrap();
        }
        Ok(SCREENSHOT_BYTES.to_vec())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.record("close");
        Ok(())
    }
}

/// Config writing under `output_dir` with short deadlines for tests.
pub fn test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.output_dir = output_dir.to_path_buf();
    config.fetch.timeout = Duration::from_secs(5);
    config.render.deadline = Duration::from_millis(500);
    config.render.teardown_grace = Duration::from_millis(200);
    config
}

/// A loopback address nothing is listening on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}

pub fn session_dirs(base: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(base) {
        Ok(entries) => entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect(),
        Err(_) => Vec::new(),
    }
}

pub fn only_session_dir(base: &Path) -> PathBuf {
    let dirs = session_dirs(base);
    assert_eq!(dirs.len(), 1, "expected exactly one session in {base:?}: {dirs:?}");
    dirs.into_iter().next().unwrap()
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read session dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
