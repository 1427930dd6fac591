//! Configuration for the regenerate-build-replace pipeline.
//!
//! The pipeline never reads process-wide state on its own; everything it
//! needs lives in a [`RespawnConfig`] value. [`RespawnConfig::load`] builds
//! one the way the CLI does: defaults, then `respawn.toml` (current dir,
//! its ancestors, then `~/.config/respawn/respawn.toml`), then environment
//! variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RespawnError;

/// Name of the per-project configuration file.
pub const CONFIG_FILE_NAME: &str = "respawn.toml";

/// Default prefix for temporary artifacts.
pub const DEFAULT_TEMP_PREFIX: &str = "respawn";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct RespawnConfig {
    /// Workspace-local root (searched first).
    pub workspace_root: PathBuf,
    /// System-wide root (searched second).
    pub system_root: PathBuf,
    /// Directory holding the compiler and linker binaries.
    /// Defaults to `<system_root>/pkg/tool/<os>_<arch>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_dir: Option<PathBuf>,
    pub os: String,
    pub arch: String,
    /// Where temporary artifacts are created.
    pub temp_dir: PathBuf,
    pub temp_prefix: String,
    /// Upper bound on each compiler/linker run. `None` waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_timeout_secs: Option<u64>,
    pub backend: BackendConfig,
}

/// Names the generated program uses to talk to the interactive runtime.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackendConfig {
    /// Imports every generated program needs, appended in this order.
    pub required_imports: Vec<String>,
    /// Function that evaluates one history entry against the environment.
    pub eval_call: String,
    /// Function that re-enters interactive mode.
    pub reentry_call: String,
    /// Binding the environment serializer declares for the rebuilt environment.
    pub env_binding: String,
    pub history_binding: String,
    /// File extension of package member sources.
    pub source_extension: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            required_imports: vec![
                "reflect".to_string(),
                "os".to_string(),
                "github.com/0xfaded/eval".to_string(),
                "github.com/0xfaded/gack".to_string(),
            ],
            eval_call: "eval.EvalEnv".to_string(),
            reentry_call: "gack.Repl".to_string(),
            env_binding: "root".to_string(),
            history_binding: "history".to_string(),
            source_extension: "go".to_string(),
        }
    }
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::new(),
            system_root: PathBuf::new(),
            tool_dir: None,
            os: host_os().to_string(),
            arch: host_arch().to_string(),
            temp_dir: std::env::temp_dir(),
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            tool_timeout_secs: None,
            backend: BackendConfig::default(),
        }
    }
}

/// One of the two known compiler/linker pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainFlavor {
    /// 64-bit x86 (`6g` / `6l`).
    Amd64,
    /// Everything else (`8g` / `8l`).
    X86,
}

impl ToolchainFlavor {
    pub fn for_arch(arch: &str) -> Self {
        if arch.starts_with("amd64") {
            ToolchainFlavor::Amd64
        } else {
            ToolchainFlavor::X86
        }
    }

    pub fn compiler(self) -> &'static str {
        match self {
            ToolchainFlavor::Amd64 => "6g",
            ToolchainFlavor::X86 => "8g",
        }
    }

    pub fn linker(self) -> &'static str {
        match self {
            ToolchainFlavor::Amd64 => "6l",
            ToolchainFlavor::X86 => "8l",
        }
    }
}

/// A labelled search root for package directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    pub label: String,
    pub dir: PathBuf,
}

impl RespawnConfig {
    /// Load defaults, the nearest `respawn.toml`, then environment overrides.
    pub fn load() -> Result<Self, RespawnError> {
        let mut cfg = match Self::find_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration file");
                Self::load_from(&path)?
            }
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Load config from a specific file path (no environment overrides).
    pub fn load_from(path: &Path) -> Result<Self, RespawnError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RespawnError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let cfg = Self::from_toml(&content).map_err(|e| {
            RespawnError::Config(format!("invalid toml in '{}': {}", path.display(), e))
        })?;
        if cfg.tool_timeout_secs == Some(0) {
            return Err(zero_timeout("tool-timeout-secs"));
        }
        Ok(cfg)
    }

    /// Parse a TOML string directly.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize the effective configuration, as printed by `respawn config`.
    pub fn to_toml(&self) -> Result<String, RespawnError> {
        toml::to_string_pretty(self).map_err(|e| RespawnError::Config(e.to_string()))
    }

    /// Override fields from environment variables, looked up through `get`.
    pub fn apply_env<F>(&mut self, get: F) -> Result<(), RespawnError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| get(key).filter(|v| !v.is_empty());
        if let Some(v) = lookup("GOPATH") {
            // Only the first entry of a list-valued GOPATH is searched.
            let first = std::env::split_paths(&v).next().unwrap_or_default();
            self.workspace_root = first;
        }
        if let Some(v) = lookup("GOROOT") {
            self.system_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("GOOS") {
            self.os = v;
        }
        if let Some(v) = lookup("GOARCH") {
            self.arch = v;
        }
        if let Some(v) = lookup("RESPAWN_TOOL_DIR") {
            self.tool_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("RESPAWN_TEMP_DIR") {
            self.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("RESPAWN_TOOL_TIMEOUT") {
            let secs = v.parse::<u64>().map_err(|_| {
                RespawnError::Config(format!(
                    "RESPAWN_TOOL_TIMEOUT must be whole seconds, got '{}'",
                    v
                ))
            })?;
            if secs == 0 {
                return Err(zero_timeout("RESPAWN_TOOL_TIMEOUT"));
            }
            self.tool_timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// `<os>_<arch>`, the namespace of library and tool directories.
    pub fn platform(&self) -> String {
        format!("{}_{}", self.os, self.arch)
    }

    /// Compiler/linker pair for the configured architecture.
    pub fn flavor(&self) -> ToolchainFlavor {
        ToolchainFlavor::for_arch(&self.arch)
    }

    /// Package search roots in priority order.
    pub fn search_roots(&self) -> Vec<SearchRoot> {
        vec![
            SearchRoot {
                label: "workspace".to_string(),
                dir: self.workspace_root.join("src"),
            },
            SearchRoot {
                label: "system".to_string(),
                dir: self.system_root.join("src").join("pkg"),
            },
        ]
    }

    /// Fails when either root is unset. An empty root would make every
    /// lookup relative to the current directory.
    pub fn require_roots(&self) -> Result<(), RespawnError> {
        let missing = [
            ("workspace", &self.workspace_root, "GOPATH", "workspace-root"),
            ("system", &self.system_root, "GOROOT", "system-root"),
        ]
        .into_iter()
        .find(|(_, root, _, _)| root.as_os_str().is_empty());
        match missing {
            Some((label, _, var, key)) => Err(RespawnError::Config(format!(
                "{} root not configured; set {} or `{}` in {}",
                label, var, key, CONFIG_FILE_NAME
            ))),
            None => Ok(()),
        }
    }

    /// Library directories, workspace first.
    pub fn library_dirs(&self) -> [PathBuf; 2] {
        let platform = self.platform();
        [
            self.workspace_root.join("pkg").join(&platform),
            self.system_root.join("pkg").join(&platform),
        ]
    }

    /// Explicit `tool-dir`, else `<system_root>/pkg/tool/<os>_<arch>`.
    pub fn tool_dir(&self) -> PathBuf {
        self.tool_dir.clone().unwrap_or_else(|| {
            self.system_root
                .join("pkg")
                .join("tool")
                .join(self.platform())
        })
    }

    /// `6g` or `8g` inside [`Self::tool_dir`].
    pub fn compiler_path(&self) -> PathBuf {
        self.tool_dir().join(self.flavor().compiler())
    }

    /// `6l` or `8l` inside [`Self::tool_dir`].
    pub fn linker_path(&self) -> PathBuf {
        self.tool_dir().join(self.flavor().linker())
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    fn find_file() -> Option<PathBuf> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                break;
            }
        }
        let home = std::env::var("HOME").ok().map(PathBuf::from)?;
        let global = home.join(".config").join("respawn").join(CONFIG_FILE_NAME);
        global.is_file().then_some(global)
    }
}

fn zero_timeout(source: &str) -> RespawnError {
    RespawnError::Config(format!(
        "{} must be at least 1 second; leave it unset to wait without a limit",
        source
    ))
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        other => other,
    }
}
