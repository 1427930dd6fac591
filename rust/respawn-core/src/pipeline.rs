//! The regenerate-build-replace pipeline.
//!
//! Stages run strictly in order and fail fast:
//!
//! 1. plan: resolve imports, check package names, serialize the environment
//! 2. render the plan and write the source artifact
//! 3. compile; the source is deleted only after success
//! 4. link; the object is deleted only after success
//! 5. hand off the executable
//!
//! Nothing follows the handoff on the success path.

use std::path::PathBuf;

use crate::artifacts::{Artifact, ArtifactFactory, ArtifactKind};
use crate::backend::{GoBackend, SourceBackend};
use crate::config::RespawnConfig;
use crate::env::EnvironmentSerializer;
use crate::error::RespawnError;
use crate::handoff::Handoff;
use crate::plan::{Session, TransferPlan};
use crate::resolver::ImportResolver;
use crate::toolchain::{ToolOutcome, Toolchain};

/// Synthesized program text with the plan it encodes.
#[derive(Debug, Clone)]
pub struct GeneratedProgram {
    pub plan: TransferPlan,
    pub source: String,
}

pub struct Pipeline<'a> {
    config: &'a RespawnConfig,
    resolver: ImportResolver,
    toolchain: Toolchain,
    artifacts: ArtifactFactory,
    backend: Box<dyn SourceBackend + 'a>,
    serializer: &'a dyn EnvironmentSerializer,
}

impl<'a> Pipeline<'a> {
    /// A pipeline using the default [`GoBackend`] configured from `config`.
    pub fn new(config: &'a RespawnConfig, serializer: &'a dyn EnvironmentSerializer) -> Self {
        Self {
            config,
            resolver: ImportResolver::from_config(config),
            toolchain: Toolchain::from_config(config),
            artifacts: ArtifactFactory::new(&config.temp_dir, &config.temp_prefix),
            backend: Box::new(GoBackend::new(config.backend.clone())),
            serializer,
        }
    }

    pub fn with_backend(mut self, backend: impl SourceBackend + 'a) -> Self {
        self.backend = Box::new(backend);
        self
    }

    pub fn resolver(&self) -> &ImportResolver {
        &self.resolver
    }

    /// Build the program text for `session` without touching the filesystem
    /// beyond package lookup.
    pub fn synthesize(&self, session: &Session) -> Result<GeneratedProgram, RespawnError> {
        self.config.require_roots()?;
        let plan = TransferPlan::build(
            session,
            &self.resolver,
            &self.config.backend.required_imports,
            self.serializer,
        )?;
        let source = self.backend.render(&plan);
        tracing::debug!(
            imports = plan.imports.len(),
            history = plan.history.len(),
            bytes = source.len(),
            "synthesized program"
        );
        Ok(GeneratedProgram { plan, source })
    }

    /// Write `program` to disk, compile and link it.
    ///
    /// On success the source and object artifacts are already deleted and
    /// the executable is returned. On compile failure the source is kept; on
    /// link failure the object is kept.
    pub fn build(&self, program: &GeneratedProgram) -> Result<Artifact, RespawnError> {
        let source = self.artifacts.create_with(
            ArtifactKind::Source,
            self.backend.source_suffix(),
            &program.source,
        )?;
        let object = self.artifacts.create(ArtifactKind::Object, ".o")?;

        match self.toolchain.compile(source.path(), object.path())? {
            ToolOutcome::Success => {}
            ToolOutcome::Failed(output) => {
                let source_path = source.keep();
                return Err(RespawnError::CompileFailure {
                    output,
                    source_path,
                });
            }
        }
        source.remove()?;

        let executable = self.artifacts.create(ArtifactKind::Executable, "")?;
        match self.toolchain.link(object.path(), executable.path())? {
            ToolOutcome::Success => {}
            ToolOutcome::Failed(output) => {
                let object_path = object.keep();
                return Err(RespawnError::LinkFailure {
                    output,
                    object_path,
                });
            }
        }
        make_executable(&executable)?;
        object.remove()?;
        Ok(executable)
    }

    /// Regenerate `session` and hand the new executable to `handoff`.
    ///
    /// With [`crate::handoff::ExecHandoff`] this only returns on failure.
    pub fn respawn<H: Handoff>(
        &self,
        session: &Session,
        handoff: &mut H,
    ) -> Result<H::Output, RespawnError> {
        let program = self.synthesize(session)?;
        let executable = self.build(&program)?;
        handoff.hand_off(executable)
    }
}

/// The placeholder file is created 0600; the linker may keep that mode.
#[cfg(unix)]
fn make_executable(executable: &Artifact) -> Result<(), RespawnError> {
    use std::os::unix::fs::PermissionsExt;

    let path = executable.path();
    let mut perms = std::fs::metadata(path)
        .map_err(RespawnError::temp_file("inspect"))?
        .permissions();
    perms.set_mode(perms.mode() | 0o700);
    std::fs::set_permissions(path, perms).map_err(RespawnError::temp_file("chmod"))
}

#[cfg(not(unix))]
fn make_executable(_executable: &Artifact) -> Result<(), RespawnError> {
    Ok(())
}

/// Path of the running executable, as recorded for self-deletion.
pub fn current_executable() -> Result<PathBuf, RespawnError> {
    std::env::current_exe().map_err(|e| {
        RespawnError::Config(format!("cannot locate running executable: {}", e))
    })
}
