//! Import path validation and package lookup.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{RespawnConfig, SearchRoot};
use crate::error::RespawnError;

/// A package located on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImport {
    /// Absolute directory of the package.
    pub directory: PathBuf,
    /// Normalized import path as written into the generated program.
    pub clean_path: String,
    /// Identifier declared by the package's `package` clause.
    pub package_name: String,
}

/// Resolves import paths against ordered search roots.
///
/// Roots are tried in the order given; the first one containing the package
/// directory wins.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    roots: Vec<SearchRoot>,
    source_extension: String,
}

impl ImportResolver {
    pub fn new(roots: Vec<SearchRoot>, source_extension: impl Into<String>) -> Self {
        Self {
            roots,
            source_extension: source_extension.into(),
        }
    }

    pub fn from_config(config: &RespawnConfig) -> Self {
        Self::new(config.search_roots(), config.backend.source_extension.clone())
    }

    /// Validate `path`, locate its directory, and read its package name.
    pub fn resolve(&self, path: &str) -> Result<ResolvedImport, RespawnError> {
        let (directory, clean_path) = self.locate(path)?;
        let package_name = package_name_in(&directory, &self.source_extension)?;
        tracing::debug!(
            import = %clean_path,
            dir = %directory.display(),
            package = %package_name,
            "resolved import"
        );
        Ok(ResolvedImport {
            directory,
            clean_path,
            package_name,
        })
    }

    /// Validate `path` and find the first root that holds it as a directory.
    pub fn locate(&self, path: &str) -> Result<(PathBuf, String), RespawnError> {
        let clean = clean_import_path(path)?;
        let mut tried = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            let candidate = root.dir.join(&clean);
            if candidate.is_dir() {
                return Ok((absolutize(candidate), clean));
            }
            tried.push((root.label.clone(), candidate));
        }
        Err(RespawnError::ImportNotFound { path: clean, tried })
    }
}

/// Normalize an import path.
///
/// Separator-only empty segments (`a//b`, leading or trailing `/` after the
/// first segment) are dropped; every other segment is trimmed and must stay
/// non-empty.
pub fn clean_import_path(path: &str) -> Result<String, RespawnError> {
    let invalid = |reason| RespawnError::InvalidImportPath {
        path: path.to_string(),
        reason,
    };
    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if !path.is_ascii() {
        return Err(invalid("path must be ASCII"));
    }

    if path.starts_with('/') {
        return Err(invalid("cannot import absolute path"));
    }

    let mut cleaned = Vec::new();
    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        let trimmed = segment.trim_matches(|c| c == ' ' || c == '\n' || c == '\t');
        if trimmed.is_empty() {
            return Err(invalid("whitespace-only path segment"));
        }
        cleaned.push(trimmed);
    }
    Ok(cleaned.join("/"))
}

/// Read the package identifier declared by the first source file in `dir`.
///
/// Files are visited in name order; test files are skipped.
pub fn package_name_in(dir: &Path, extension: &str) -> Result<String, RespawnError> {
    let unknown = || RespawnError::PackageNameUnknown {
        directory: dir.to_path_buf(),
    };
    let entries = fs::read_dir(dir).map_err(|_| unknown())?;
    let mut sources: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_member_source(p, extension))
        .collect();
    sources.sort();

    for source in sources {
        let Ok(text) = fs::read_to_string(&source) else {
            continue;
        };
        if let Some(name) = parse_package_clause(&text) {
            return Ok(name.to_string());
        }
    }
    Err(unknown())
}

fn is_member_source(path: &Path, extension: &str) -> bool {
    let matches_ext = path.extension().and_then(|e| e.to_str()) == Some(extension);
    let is_test = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with("_test"));
    matches_ext && !is_test
}

/// Find `package <ident>` after any leading whitespace and comments.
pub fn parse_package_clause(source: &str) -> Option<&str> {
    let mut rest = source;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |i| &after[i + 1..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = &after[after.find("*/")? + 2..];
        } else {
            break;
        }
    }

    let after_kw = rest.strip_prefix("package")?;
    if !after_kw.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let after_kw = after_kw.trim_start();
    let end = after_kw
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(after_kw.len());
    let name = &after_kw[..end];
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_ok.then_some(name)
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}
