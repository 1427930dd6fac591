//! Error type shared by every pipeline stage.

use std::path::PathBuf;

/// Errors produced while regenerating, building, or handing off a session.
///
/// Every stage fails fast: the first error aborts the remaining pipeline and
/// the live session keeps running.
#[derive(Debug, thiserror::Error)]
pub enum RespawnError {
    #[error("bad import path {path:?}: {reason}")]
    InvalidImportPath { path: String, reason: &'static str },

    #[error("cannot find package \"{path}\" in any of:{}", format_tried(.tried))]
    ImportNotFound {
        path: String,
        /// `(root label, candidate directory)` in the order they were tried.
        tried: Vec<(String, PathBuf)>,
    },

    #[error("no package clause found in any source file under {}", .directory.display())]
    PackageNameUnknown { directory: PathBuf },

    #[error("{name} redeclared as imported package name\n\tprevious declaration at {first}\n\tredeclared by {second}")]
    PackageNameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("environment serialization failed: {0}")]
    Environment(String),

    #[error("failed to {action} temporary artifact")]
    TempFile {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("generated source failed to compile; please file a bug report with {} attached\n{output}", .source_path.display())]
    CompileFailure { output: String, source_path: PathBuf },

    #[error("generated object failed to link (object kept at {})\n{output}", .object_path.display())]
    LinkFailure { output: String, object_path: PathBuf },

    #[error("process image was not replaced")]
    ProcessReplaceFailure(#[source] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RespawnError {
    pub(crate) fn temp_file(action: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| RespawnError::TempFile { action, source }
    }
}

fn format_tried(tried: &[(String, PathBuf)]) -> String {
    tried
        .iter()
        .map(|(label, dir)| format!("\n\t{} (from {})", dir.display(), label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_every_root() {
        let err = RespawnError::ImportNotFound {
            path: "foo/bar".to_string(),
            tried: vec![
                ("workspace".to_string(), PathBuf::from("/ws/src/foo/bar")),
                ("system".to_string(), PathBuf::from("/sys/src/pkg/foo/bar")),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("cannot find package \"foo/bar\" in any of:"));
        assert!(msg.contains("\n\t/ws/src/foo/bar (from workspace)"));
        assert!(msg.contains("\n\t/sys/src/pkg/foo/bar (from system)"));
    }

    #[test]
    fn collision_names_both_paths() {
        let err = RespawnError::PackageNameCollision {
            name: "rand".to_string(),
            first: "math/rand".to_string(),
            second: "crypto/rand".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rand redeclared"));
        assert!(msg.contains("math/rand"));
        assert!(msg.contains("crypto/rand"));
    }

    #[test]
    fn compile_failure_mentions_source() {
        let err = RespawnError::CompileFailure {
            output: "x.go:3: undefined: y".to_string(),
            source_path: PathBuf::from("/tmp/respawn123"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/respawn123"));
        assert!(msg.ends_with("x.go:3: undefined: y"));
    }
}
