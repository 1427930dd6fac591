//! Replacing the running process with the freshly linked executable.

use std::convert::Infallible;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::artifacts::Artifact;
use crate::error::RespawnError;

/// Takes ownership of the linked executable and starts it.
///
/// `Output` is what a caller observes on success. For [`ExecHandoff`] it is
/// [`Infallible`]: success never returns.
pub trait Handoff {
    type Output;

    fn hand_off(&mut self, executable: Artifact) -> Result<Self::Output, RespawnError>;
}

/// The argument vector passed to the successor: just its own path.
pub fn successor_argv(executable: &Artifact) -> Vec<OsString> {
    vec![executable.path().as_os_str().to_os_string()]
}

/// Replaces the current process image via `exec`, forwarding the complete
/// environment unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecHandoff;

impl Handoff for ExecHandoff {
    type Output = Infallible;

    #[cfg(unix)]
    fn hand_off(&mut self, executable: Artifact) -> Result<Infallible, RespawnError> {
        use std::os::unix::process::CommandExt;
        use std::process::Command;

        let argv = successor_argv(&executable);
        tracing::info!(executable = %executable.path().display(), "replacing process image");
        let err = Command::new(executable.path())
            .arg0(&argv[0])
            .env_clear()
            .envs(std::env::vars_os())
            .exec();
        // exec only returns on failure; the executable is dropped and removed.
        tracing::error!(error = %err, "process replacement failed");
        drop(executable);
        Err(RespawnError::ProcessReplaceFailure(err))
    }

    #[cfg(not(unix))]
    fn hand_off(&mut self, executable: Artifact) -> Result<Infallible, RespawnError> {
        drop(executable);
        Err(RespawnError::ProcessReplaceFailure(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "process image replacement requires a Unix platform",
        )))
    }
}

/// What a dry run would have exec'd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRecord {
    pub executable: PathBuf,
    pub argv: Vec<OsString>,
    /// Number of environment variables that would be forwarded.
    pub env_len: usize,
    /// Whether the executable existed when handed off.
    pub executable_existed: bool,
}

/// Records the handoff instead of performing it. The executable is kept on
/// disk so it can be inspected or run by hand.
#[derive(Debug, Default)]
pub struct DryRunHandoff {
    pub records: Vec<HandoffRecord>,
}

impl Handoff for DryRunHandoff {
    type Output = HandoffRecord;

    fn hand_off(&mut self, executable: Artifact) -> Result<HandoffRecord, RespawnError> {
        let argv = successor_argv(&executable);
        let executable_existed = executable.path().is_file();
        let path = executable.keep();
        let record = HandoffRecord {
            executable: path,
            argv,
            env_len: std::env::vars_os().count(),
            executable_existed,
        };
        tracing::info!(
            executable = %record.executable.display(),
            "dry run: would replace process image"
        );
        self.records.push(record.clone());
        Ok(record)
    }
}
