//! Temporary build artifacts.
//!
//! Each artifact owns a [`TempPath`], so an early return removes it. The
//! pipeline decides explicitly when an artifact is deleted and when it is
//! kept for diagnosis.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};

use crate::error::RespawnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Source,
    Object,
    Executable,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Source => write!(f, "source"),
            ArtifactKind::Object => write!(f, "object"),
            ArtifactKind::Executable => write!(f, "executable"),
        }
    }
}

/// A temporary file that is removed on drop unless kept.
#[derive(Debug)]
pub struct Artifact {
    kind: ArtifactKind,
    path: TempPath,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting failure.
    pub fn remove(self) -> Result<(), RespawnError> {
        let path = self.path.to_path_buf();
        self.path.close().map_err(RespawnError::temp_file("remove"))?;
        tracing::debug!(kind = %self.kind, path = %path.display(), "removed artifact");
        Ok(())
    }

    /// Leave the file on disk and return its path.
    pub fn keep(self) -> PathBuf {
        let kind = self.kind;
        match self.path.keep() {
            Ok(path) => {
                tracing::warn!(kind = %kind, path = %path.display(), "keeping artifact");
                path
            }
            // Only fails on platforms that cannot disarm the guard; the
            // file still exists at the returned path.
            Err(err) => {
                let path = err.path.to_path_buf();
                std::mem::forget(err.path);
                path
            }
        }
    }
}

/// Creates artifacts in one directory with one name prefix.
#[derive(Debug, Clone)]
pub struct ArtifactFactory {
    dir: PathBuf,
    prefix: String,
}

impl ArtifactFactory {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Create an empty artifact.
    pub fn create(&self, kind: ArtifactKind, suffix: &str) -> Result<Artifact, RespawnError> {
        let file = Builder::new()
            .prefix(&self.prefix)
            .suffix(suffix)
            .tempfile_in(&self.dir)
            .map_err(RespawnError::temp_file("create"))?;
        let path = file.into_temp_path();
        tracing::debug!(kind = %kind, path = %path.display(), "created artifact");
        Ok(Artifact { kind, path })
    }

    /// Create an artifact holding `contents`, flushed and closed.
    pub fn create_with(
        &self,
        kind: ArtifactKind,
        suffix: &str,
        contents: &str,
    ) -> Result<Artifact, RespawnError> {
        let mut file = Builder::new()
            .prefix(&self.prefix)
            .suffix(suffix)
            .tempfile_in(&self.dir)
            .map_err(RespawnError::temp_file("create"))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(RespawnError::temp_file("write"))?;
        let path = file.into_temp_path();
        tracing::debug!(kind = %kind, path = %path.display(), "wrote artifact");
        Ok(Artifact { kind, path })
    }
}
