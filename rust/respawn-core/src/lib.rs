//! Regenerate an interactive session as a standalone program, build it, and
//! replace the running process with the result.
//!
//! The usual entry point is [`Pipeline`]:
//!
//! ```no_run
//! use respawn_core::{ExecHandoff, Pipeline, RespawnConfig, Session, StatementBlock};
//!
//! let config = RespawnConfig::load()?;
//! let env = StatementBlock::new("\troot := eval.MakeSimpleEnv()\n");
//! let session = Session::new(respawn_core::pipeline::current_executable()?)
//!     .with_imports(["fmt"])
//!     .with_history(["\"x := 1\""]);
//! // Only returns if something went wrong.
//! let err = Pipeline::new(&config, &env).respawn(&session, &mut ExecHandoff);
//! # let _ = err;
//! # Ok::<(), respawn_core::RespawnError>(())
//! ```

pub mod artifacts;
pub mod backend;
pub mod config;
pub mod env;
pub mod error;
pub mod handoff;
pub mod pipeline;
pub mod plan;
pub mod resolver;
pub mod toolchain;

pub use backend::{GoBackend, SourceBackend};
pub use config::{BackendConfig, RespawnConfig};
pub use env::{EnvironmentSerializer, StatementBlock};
pub use error::RespawnError;
pub use handoff::{DryRunHandoff, ExecHandoff, Handoff, HandoffRecord};
pub use pipeline::{GeneratedProgram, Pipeline};
pub use plan::{Session, TransferPlan};
pub use resolver::{ImportResolver, ResolvedImport};
