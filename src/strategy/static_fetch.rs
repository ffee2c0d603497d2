//! Static document fetch: one GET, body saved exactly as received.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER, SERVER};
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{StrategyName, StrategyOutcome};
use crate::config::{FetchSettings, RateLimit, WriteMode};
use crate::error::{CaptureError, Result};
use crate::session::{abandon_artifacts, commit_artifacts, write_artifact, ArtifactPath};
use crate::target::CaptureTarget;

#[derive(Debug)]
pub struct StaticFetcher {
    client: Client,
    limiter: HostRateLimiter,
    write_mode: WriteMode,
}

impl StaticFetcher {
    pub fn new(settings: &FetchSettings, write_mode: WriteMode) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, header_value("accept_language", &settings.accept_language)?);
        headers.insert(REFERER, header_value("referer", &settings.referer)?);

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(CaptureError::Network)?;

        Ok(Self {
            client,
            limiter: HostRateLimiter::new(settings.rate_limit),
            write_mode,
        })
    }

    /// Fetch `target` once and save whatever body comes back.
    ///
    /// Any HTTP status counts as success; only a request that cannot
    /// complete (or a failed write) is a failure.
    pub async fn run(&self, target: &CaptureTarget, out: &ArtifactPath) -> StrategyOutcome {
        match self.fetch(target, out).await {
            Ok(()) => StrategyOutcome::success(StrategyName::Static, [out.clone()]),
            Err(err) => {
                tracing::warn!(url = target.normalized_url(), "static fetch failed: {err}");
                StrategyOutcome::failure(StrategyName::Static, &err, [])
            }
        }
    }

    async fn fetch(&self, target: &CaptureTarget, out: &ArtifactPath) -> Result<()> {
        self.limiter.wait_turn(target.host()).await;

        tracing::info!(url = target.normalized_url(), "static request");
        let response = self.client.get(target.normalized_url()).send().await?;

        let status = response.status();
        let server = response
            .headers()
            .get(SERVER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        tracing::info!(status = status.as_u16(), server = %server, "static response");

        let body = response.bytes().await?;

        let paths = [out.path.as_path()];
        let written = write_artifact(&out.path, &body, self.write_mode)
            .and_then(|()| commit_artifacts(&paths, self.write_mode));
        if written.is_err() {
            abandon_artifacts(&paths, self.write_mode);
        }
        written?;

        tracing::info!(path = %out.path.display(), bytes = body.len(), "static HTML saved");
        Ok(())
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| CaptureError::Config(format!("fetch.{name} is not a valid header value: {e}")))
}

/// Keeps successive requests to one host apart by `delay` plus up to
/// `jitter` of random extra time. The first request to a host is free.
#[derive(Debug)]
pub struct HostRateLimiter {
    limit: RateLimit,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl HostRateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Sleep until `host` may be contacted again; returns how long it waited.
    pub async fn wait_turn(&self, host: &str) -> Duration {
        let wait = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let wait = slots
                .get(host)
                .map(|ready_at| ready_at.saturating_duration_since(now))
                .unwrap_or_default();
            let spacing = self.limit.delay + random_extra(self.limit.jitter);
            slots.insert(host.to_string(), now + wait + spacing);
            wait
        };

        if !wait.is_zero() {
            tracing::debug!(host, wait_ms = wait.as_millis() as u64, "rate limiting request");
            tokio::time::sleep(wait).await;
        }
        wait
    }
}

fn random_extra(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    let max_ms = max.as_millis() as u64;
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}
