//! Seam to the environment serializer.
//!
//! The live variable environment is owned by the interactive runtime. The
//! pipeline only asks it for a block of statements that rebuilds the
//! environment in the generated program and declares the environment
//! binding named by `BackendConfig::env_binding`.

use crate::error::RespawnError;
use crate::resolver::ResolvedImport;

/// Produces the statement block that reconstructs the live environment.
pub trait EnvironmentSerializer {
    /// Emit the reconstruction statements. `imports` are the explicitly
    /// requested packages, so the serializer can reference their members.
    fn serialize(&self, imports: &[ResolvedImport]) -> Result<String, RespawnError>;
}

/// A block that was serialized ahead of time.
#[derive(Debug, Clone, Default)]
pub struct StatementBlock(pub String);

impl StatementBlock {
    pub fn new(block: impl Into<String>) -> Self {
        Self(block.into())
    }
}

impl EnvironmentSerializer for StatementBlock {
    fn serialize(&self, _imports: &[ResolvedImport]) -> Result<String, RespawnError> {
        Ok(self.0.clone())
    }
}

impl<F> EnvironmentSerializer for F
where
    F: Fn(&[ResolvedImport]) -> Result<String, RespawnError>,
{
    fn serialize(&self, imports: &[ResolvedImport]) -> Result<String, RespawnError> {
        self(imports)
    }
}
