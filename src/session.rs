//! On-disk lifecycle of one capture run.
//!
//! An [`OutputSession`] owns a single directory under the output base
//! directory. Strategies only receive [`ArtifactPath`]s derived from it and
//! write through [`write_artifact`]; the orchestrator decides at the end
//! whether the directory is kept or removed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::{ScreenshotFormat, WriteMode};
use crate::error::{CaptureError, Result};
use crate::target::CaptureTarget;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const PARTIAL_SUFFIX: &str = "partial";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    StaticHtml,
    RenderedHtml,
    Screenshot(ScreenshotFormat),
}

impl ArtifactKind {
    fn file_name(self, base_name: &str) -> String {
        match self {
            ArtifactKind::StaticHtml => format!("{base_name}_static.html"),
            ArtifactKind::RenderedHtml => format!("{base_name}_rendered.html"),
            ArtifactKind::Screenshot(format) => format!("{base_name}.{}", format.extension()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPath {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// What happened to the session directory at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Retained,
    Discarded,
}

#[derive(Debug)]
pub struct OutputSession {
    directory: PathBuf,
    base_name: String,
    created_at: DateTime<Local>,
    disposition: Option<Disposition>,
}

impl OutputSession {
    pub fn open(base_dir: &Path, target: &CaptureTarget) -> Result<Self> {
        Self::open_at(base_dir, target, Local::now())
    }

    /// Like [`OutputSession::open`] with an explicit creation time.
    ///
    /// Fails instead of reusing a directory that already exists, so two
    /// runs never share one session.
    pub fn open_at(
        base_dir: &Path,
        target: &CaptureTarget,
        created_at: DateTime<Local>,
    ) -> Result<Self> {
        let base_name = session_name(target.host(), &created_at);
        let directory = base_dir.join(&base_name);

        let create = || -> io::Result<()> {
            fs::create_dir_all(base_dir)?;
            fs::create_dir(&directory)
        };
        create().map_err(|source| CaptureError::DirectoryCreate {
            path: directory.clone(),
            source,
        })?;

        tracing::debug!(directory = %directory.display(), "opened output session");

        Ok(Self {
            directory,
            base_name,
            created_at,
            disposition: None,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn disposition(&self) -> Option<Disposition> {
        self.disposition
    }

    pub fn artifact_path(&self, kind: ArtifactKind) -> ArtifactPath {
        ArtifactPath {
            kind,
            path: self.directory.join(kind.file_name(&self.base_name)),
        }
    }

    /// Keep the directory and everything in it.
    pub fn finalize(&mut self) {
        self.disposition = Some(Disposition::Retained);
    }

    /// Remove the directory and its contents.
    ///
    /// Safe to call more than once. A failed removal is logged and
    /// otherwise ignored.
    pub fn discard(&mut self) {
        self.disposition = Some(Disposition::Discarded);
        match fs::remove_dir_all(&self.directory) {
            Ok(()) => {
                tracing::debug!(directory = %self.directory.display(), "discarded output session")
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                directory = %self.directory.display(),
                "failed to remove session directory: {e}"
            ),
        }
    }
}

/// `<timestamp>_<host>` with `www.` dropped and dots flattened.
pub fn session_name(host: &str, created_at: &DateTime<Local>) -> String {
    let host = host.to_ascii_lowercase();
    let site = host.strip_prefix("www.").unwrap_or(&host).replace(['.', ':'], "_");
    format!("{}_{site}", created_at.format(TIMESTAMP_FORMAT))
}

/// Where `path` is staged before the final rename in atomic mode.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Persist one artifact. In atomic mode the bytes land in the staging
/// file and [`commit_artifacts`] must be called to publish them.
pub fn write_artifact(path: &Path, bytes: &[u8], mode: WriteMode) -> Result<()> {
    let dest = match mode {
        WriteMode::Direct => path.to_path_buf(),
        WriteMode::Atomic => staging_path(path),
    };
    fs::write(&dest, bytes).map_err(|e| CaptureError::artifact_write(path, e))
}

/// Publish staged artifacts; a no-op in direct mode.
///
/// All or nothing: if one rename fails, the files this call already
/// published are removed again.
pub fn commit_artifacts(paths: &[&Path], mode: WriteMode) -> Result<()> {
    if mode == WriteMode::Direct {
        return Ok(());
    }
    for (i, path) in paths.iter().enumerate() {
        if let Err(e) = fs::rename(staging_path(path), path) {
            for published in &paths[..i] {
                if let Err(e) = fs::remove_file(published) {
                    tracing::warn!(path = %published.display(), "failed to roll back artifact: {e}");
                }
            }
            return Err(CaptureError::artifact_write(*path, e));
        }
    }
    Ok(())
}

/// Drop whatever staging files exist for `paths`.
pub fn abandon_artifacts(paths: &[&Path], mode: WriteMode) {
    if mode == WriteMode::Direct {
        return;
    }
    for path in paths {
        let staged = staging_path(path);
        if let Err(e) = fs::remove_file(&staged) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %staged.display(), "failed to remove staged artifact: {e}");
            }
        }
    }
}
