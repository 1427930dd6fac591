//! External compiler and linker invocation.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::config::RespawnConfig;
use crate::error::RespawnError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How one tool run ended.
#[derive(Debug)]
pub enum ToolOutcome {
    Success,
    /// Non-zero exit, spawn error, or timeout. Holds the combined output.
    Failed(String),
}

/// The compiler/linker pair and the library directories handed to both.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub compiler: PathBuf,
    pub linker: PathBuf,
    pub library_dirs: Vec<PathBuf>,
    pub timeout: Option<Duration>,
}

impl Toolchain {
    pub fn from_config(config: &RespawnConfig) -> Self {
        Self {
            compiler: config.compiler_path(),
            linker: config.linker_path(),
            library_dirs: config.library_dirs().to_vec(),
            timeout: config.tool_timeout(),
        }
    }

    /// `compiler -o <object> -I <lib>... <source>`
    pub fn compile_args(&self, source: &Path, object: &Path) -> Vec<OsString> {
        self.args("-I", source, object)
    }

    /// `linker -o <executable> -L <lib>... <object>`
    pub fn link_args(&self, object: &Path, executable: &Path) -> Vec<OsString> {
        self.args("-L", object, executable)
    }

    /// Compile `source` into `object`. A non-zero exit is an `Ok` failed
    /// outcome; only capture-file trouble is an `Err`.
    pub fn compile(&self, source: &Path, object: &Path) -> Result<ToolOutcome, RespawnError> {
        tracing::info!(
            compiler = %self.compiler.display(),
            source = %source.display(),
            "compiling"
        );
        run_tool(&self.compiler, &self.compile_args(source, object), self.timeout)
    }

    /// Link `object` into `executable` against the library directories.
    pub fn link(&self, object: &Path, executable: &Path) -> Result<ToolOutcome, RespawnError> {
        tracing::info!(linker = %self.linker.display(), object = %object.display(), "linking");
        run_tool(&self.linker, &self.link_args(object, executable), self.timeout)
    }

    fn args(&self, lib_flag: &str, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-o".into(), output.into()];
        for dir in &self.library_dirs {
            args.push(lib_flag.into());
            args.push(dir.into());
        }
        args.push(input.into());
        args
    }
}

/// Run `program` to completion, capturing stdout and stderr interleaved.
///
/// Output goes to an anonymous temp file, so a chatty tool cannot block on
/// a full pipe. With a `timeout` the child is killed once it elapses.
pub fn run_tool(
    program: &Path,
    args: &[OsString],
    timeout: Option<Duration>,
) -> Result<ToolOutcome, RespawnError> {
    let mut capture = tempfile::tempfile().map_err(RespawnError::temp_file("create"))?;
    let stdout = capture.try_clone().map_err(RespawnError::temp_file("create"))?;
    let stderr = capture.try_clone().map_err(RespawnError::temp_file("create"))?;

    let spawned = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            return Ok(ToolOutcome::Failed(format!(
                "failed to run {}: {}",
                program.display(),
                err
            )))
        }
    };

    let status = match wait_for(&mut child, timeout) {
        Ok(status) => status,
        Err(err) => {
            let mut message = format!("failed waiting for {}: {}", program.display(), err);
            if let Err(reap) = stop(&mut child) {
                tracing::warn!(program = %program.display(), error = %reap, "could not reap tool");
                let _ = write!(message, "\n{} may still be running: {}", program.display(), reap);
            }
            return Ok(ToolOutcome::Failed(message));
        }
    };

    let mut output = read_capture(&mut capture)?;
    match status {
        Some(status) if status.success() => Ok(ToolOutcome::Success),
        Some(status) => {
            tracing::error!(program = %program.display(), %status, "tool failed");
            if output.is_empty() {
                output = format!("{} exited with {}", program.display(), status);
            }
            Ok(ToolOutcome::Failed(output))
        }
        None => {
            let limit = timeout.unwrap_or_default();
            tracing::error!(program = %program.display(), ?limit, "tool timed out");
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&format!(
                "{} killed after {}s without finishing",
                program.display(),
                limit.as_secs()
            ));
            Ok(ToolOutcome::Failed(output))
        }
    }
}

/// `None` when the timeout elapsed and the child was killed.
fn wait_for(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.wait().map(Some);
    };
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= limit {
            stop(child)?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Kill `child` and reap it. A child that already exited only needs the wait.
fn stop(child: &mut Child) -> std::io::Result<()> {
    let killed = child.kill();
    let reaped = child.wait();
    killed.and(reaped.map(drop))
}

fn read_capture(capture: &mut File) -> Result<String, RespawnError> {
    let mut bytes = Vec::new();
    capture
        .seek(SeekFrom::Start(0))
        .and_then(|_| capture.read_to_end(&mut bytes))
        .map_err(RespawnError::temp_file("read"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
