use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CaptureError, Result};

const DEFAULT_SCHEME_PREFIX: &str = "https://";

/// The page a capture run points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureTarget {
    raw_input: String,
    normalized_url: String,
    host: String,
}

impl CaptureTarget {
    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    /// Absolute URL with an explicit `http://` or `https://` scheme.
    pub fn normalized_url(&self) -> &str {
        &self.normalized_url
    }

    /// Lowercased hostname of the normalized URL.
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Turn user input into a [`CaptureTarget`].
///
/// Bare hostnames get `https://` prepended. Nothing is resolved; the only
/// failure is a string that does not parse into a scheme and a host.
pub fn normalize(raw_input: &str) -> Result<CaptureTarget> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return Err(CaptureError::invalid_url(raw_input, "input is empty"));
    }

    let normalized_url = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_SCHEME_PREFIX}{trimmed}")
    };

    let parsed = Url::parse(&normalized_url)
        .map_err(|e| CaptureError::invalid_url(raw_input, e.to_string()))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| CaptureError::invalid_url(raw_input, "URL has no host"))?
        .to_ascii_lowercase();

    Ok(CaptureTarget {
        raw_input: raw_input.to_string(),
        normalized_url,
        host,
    })
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https() {
        let target = normalize("example.com").unwrap();
        assert_eq!(target.normalized_url(), "https://example.com");
        assert_eq!(target.raw_input(), "example.com");
        assert_eq!(target.host(), "example.com");
    }

    #[test]
    fn bare_host_and_https_host_normalize_identically() {
        for host in ["example.com", "www.example.org", "sub.domain.io", "localhost:8080"] {
            let bare = normalize(host).unwrap();
            let explicit = normalize(&format!("https://{host}")).unwrap();
            assert_eq!(bare.normalized_url(), explicit.normalized_url(), "host {host}");
        }
    }

    #[test]
    fn http_scheme_is_preserved() {
        let target = normalize("http://example.com/path?q=1").unwrap();
        assert_eq!(target.normalized_url(), "http://example.com/path?q=1");
    }

    #[test]
    fn scheme_check_is_case_insensitive() {
        let target = normalize("HTTPS://Example.COM").unwrap();
        assert_eq!(target.normalized_url(), "HTTPS://Example.COM");
        assert_eq!(target.host(), "example.com");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let target = normalize("  example.com \n").unwrap();
        assert_eq!(target.normalized_url(), "https://example.com");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            normalize("   "),
            Err(CaptureError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn scheme_without_host_is_rejected() {
        assert!(matches!(
            normalize("https://"),
            Err(CaptureError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn garbage_host_is_rejected() {
        assert!(matches!(
            normalize("exa mple.com"),
            Err(CaptureError::InvalidUrl { .. })
        ));
    }
}
