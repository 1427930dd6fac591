//! Respawn CLI library.
//!
//! Shared pieces of the `respawn` binary: input loading, error reports and
//! terminal colors.

pub mod colors;
pub mod input;
pub mod report;
