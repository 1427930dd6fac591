//! What a regenerated session has to carry over, independent of syntax.
//!
//! A [`TransferPlan`] holds the ordered import set, the environment
//! reconstruction block, the history to replay, and the executable the new
//! process must delete. Backends turn a plan into program text.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::env::EnvironmentSerializer;
use crate::error::RespawnError;
use crate::resolver::{clean_import_path, ImportResolver, ResolvedImport};

/// The session being regenerated.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Explicitly requested import paths, in submission order.
    pub imports: Vec<String>,
    /// Literal history entries, in submission order. Entries are stored as
    /// source literals and are emitted without any transformation.
    pub history: Vec<String>,
    /// Path of the currently running executable.
    pub predecessor: PathBuf,
}

impl Session {
    pub fn new(predecessor: impl Into<PathBuf>) -> Self {
        Self {
            predecessor: predecessor.into(),
            ..Self::default()
        }
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.extend(imports.into_iter().map(Into::into));
        self
    }

    pub fn with_history<I, S>(mut self, history: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.history.extend(history.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOrigin {
    /// Requested by the user.
    Explicit,
    /// Always required by the generated program.
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub clean_path: String,
    pub package_name: String,
    pub origin: ImportOrigin,
}

/// Package identifier -> import path that first declared it.
#[derive(Debug, Default)]
pub struct NameTable {
    declared: HashMap<String, String>,
}

impl NameTable {
    /// Record `name` for `path`; fails if another path already declared it.
    pub fn declare(&mut self, name: &str, path: &str) -> Result<(), RespawnError> {
        match self.declared.get(name) {
            Some(first) if first != path => Err(RespawnError::PackageNameCollision {
                name: name.to_string(),
                first: first.clone(),
                second: path.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.declared.insert(name.to_string(), path.to_string());
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub imports: Vec<ImportEntry>,
    /// Statements rebuilding the environment, as produced by the serializer.
    pub environment: String,
    pub history: Vec<String>,
    pub predecessor: PathBuf,
}

impl TransferPlan {
    /// Resolve imports, check package names, and collect everything the
    /// successor process needs. Fails before any artifact is created.
    pub fn build(
        session: &Session,
        resolver: &ImportResolver,
        required_imports: &[String],
        serializer: &dyn EnvironmentSerializer,
    ) -> Result<Self, RespawnError> {
        let mut names = NameTable::default();
        let mut imports: Vec<ImportEntry> = Vec::new();
        let mut resolved: Vec<ResolvedImport> = Vec::new();

        for raw in &session.imports {
            let import = resolver.resolve(raw)?;
            if imports.iter().any(|e| e.clean_path == import.clean_path) {
                tracing::debug!(import = %import.clean_path, "dropping repeated import");
                continue;
            }
            names.declare(&import.package_name, &import.clean_path)?;
            imports.push(ImportEntry {
                clean_path: import.clean_path.clone(),
                package_name: import.package_name.clone(),
                origin: ImportOrigin::Explicit,
            });
            resolved.push(import);
        }

        for raw in required_imports {
            let clean = clean_import_path(raw)?;
            if imports.iter().any(|e| e.clean_path == clean) {
                continue;
            }
            let package_name = match resolver.resolve(&clean) {
                Ok(found) => found.package_name,
                Err(err) => {
                    tracing::debug!(
                        import = %clean,
                        error = %err,
                        "using last path segment as package name"
                    );
                    last_segment(&clean).to_string()
                }
            };
            names.declare(&package_name, &clean)?;
            imports.push(ImportEntry {
                clean_path: clean,
                package_name,
                origin: ImportOrigin::Implicit,
            });
        }

        let environment = serializer.serialize(&resolved)?;

        Ok(Self {
            imports,
            environment,
            history: session.history.clone(),
            predecessor: session.predecessor.clone(),
        })
    }

    /// History entries in the order they must be replayed. Each entry is
    /// evaluated and then appended to the rebuilt history.
    pub fn replay_steps(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn explicit_imports(&self) -> impl Iterator<Item = &ImportEntry> {
        self.imports
            .iter()
            .filter(|e| e.origin == ImportOrigin::Explicit)
    }
}

fn last_segment(clean: &str) -> &str {
    clean.rsplit('/').next().unwrap_or(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchRoot;
    use crate::env::StatementBlock;
    use std::fs;
    use std::path::Path;

    fn package(root: &Path, path: &str, name: &str) {
        let dir = root.join(path);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("pkg.go"), format!("package {}\n", name)).unwrap();
    }

    fn resolver_for(root: &Path) -> ImportResolver {
        ImportResolver::new(
            vec![SearchRoot {
                label: "workspace".into(),
                dir: root.to_path_buf(),
            }],
            "go",
        )
    }

    fn required() -> Vec<String> {
        vec!["reflect".into(), "os".into(), "example.com/eval".into()]
    }

    #[test]
    fn name_table_rejects_second_path() {
        let mut names = NameTable::default();
        names.declare("rand", "math/rand").unwrap();
        names.declare("rand", "math/rand").unwrap();
        let err = names.declare("rand", "crypto/rand").unwrap_err();
        match err {
            RespawnError::PackageNameCollision { first, second, .. } => {
                assert_eq!(first, "math/rand");
                assert_eq!(second, "crypto/rand");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn explicit_order_then_missing_implicits() {
        let root = tempfile::tempdir().unwrap();
        package(root.path(), "strings", "strings");
        package(root.path(), "os", "os");
        package(root.path(), "fmt", "fmt");
        let session = Session::new("/bin/old").with_imports(["strings", "os", "fmt"]);
        let plan = TransferPlan::build(
            &session,
            &resolver_for(root.path()),
            &required(),
            &StatementBlock::default(),
        )
        .unwrap();
        let paths: Vec<&str> = plan.imports.iter().map(|e| e.clean_path.as_str()).collect();
        assert_eq!(paths, ["strings", "os", "fmt", "reflect", "example.com/eval"]);
        assert_eq!(plan.explicit_imports().count(), 3);
        // Unresolvable implicits fall back to the last path segment.
        assert_eq!(plan.imports[4].package_name, "eval");
    }

    #[test]
    fn repeated_explicit_import_is_kept_once() {
        let root = tempfile::tempdir().unwrap();
        package(root.path(), "fmt", "fmt");
        let session = Session::new("/bin/old").with_imports(["fmt", "fmt/"]);
        let plan = TransferPlan::build(
            &session,
            &resolver_for(root.path()),
            &[],
            &StatementBlock::default(),
        )
        .unwrap();
        assert_eq!(plan.imports.len(), 1);
    }

    #[test]
    fn collision_between_explicit_imports() {
        let root = tempfile::tempdir().unwrap();
        package(root.path(), "math/rand", "rand");
        package(root.path(), "crypto/rand", "rand");
        let session = Session::new("/bin/old").with_imports(["math/rand", "crypto/rand"]);
        let err = TransferPlan::build(
            &session,
            &resolver_for(root.path()),
            &[],
            &StatementBlock::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RespawnError::PackageNameCollision { ref name, .. } if name == "rand"
        ));
    }

    #[test]
    fn collision_with_implicit_import() {
        let root = tempfile::tempdir().unwrap();
        package(root.path(), "my/eval", "eval");
        let session = Session::new("/bin/old").with_imports(["my/eval"]);
        let err = TransferPlan::build(
            &session,
            &resolver_for(root.path()),
            &required(),
            &StatementBlock::default(),
        )
        .unwrap_err();
        match err {
            RespawnError::PackageNameCollision { first, second, .. } => {
                assert_eq!(first, "my/eval");
                assert_eq!(second, "example.com/eval");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn serializer_sees_explicit_imports_only() {
        let root = tempfile::tempdir().unwrap();
        package(root.path(), "fmt", "fmt");
        let session = Session::new("/bin/old").with_imports(["fmt"]);
        let serializer = |imports: &[ResolvedImport]| {
            let names: Vec<&str> = imports.iter().map(|i| i.package_name.as_str()).collect();
            Ok::<_, RespawnError>(format!("// env for {}\n", names.join(",")))
        };
        let plan = TransferPlan::build(
            &session,
            &resolver_for(root.path()),
            &required(),
            &serializer,
        )
        .unwrap();
        assert_eq!(plan.environment, "// env for fmt\n");
    }

    #[test]
    fn serializer_errors_propagate() {
        let root = tempfile::tempdir().unwrap();
        let serializer =
            |_: &[ResolvedImport]| Err::<String, _>(RespawnError::Environment("chan value".into()));
        let err = TransferPlan::build(
            &Session::new("/bin/old"),
            &resolver_for(root.path()),
            &[],
            &serializer,
        )
        .unwrap_err();
        assert!(matches!(err, RespawnError::Environment(_)));
    }

    #[test]
    fn replay_steps_keep_submission_order() {
        let root = tempfile::tempdir().unwrap();
        let session =
            Session::new("/bin/old").with_history(["\"x := 1\"", "\"x + 1\"", "\"x * 2\""]);
        let plan = TransferPlan::build(
            &session,
            &resolver_for(root.path()),
            &[],
            &StatementBlock::default(),
        )
        .unwrap();
        let steps: Vec<&str> = plan.replay_steps().collect();
        assert_eq!(steps, ["\"x := 1\"", "\"x + 1\"", "\"x * 2\""]);
    }
}
