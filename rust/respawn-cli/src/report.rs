//! Human-readable rendering of pipeline errors.
//!
//! A [`Report`] holds a one-line headline, the `caused by:` chain collected
//! from [`std::error::Error::source`], optional hints, and an optional
//! verbatim detail block (captured compiler or linker output).

use std::fmt;

use respawn_core::RespawnError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub headline: String,
    pub causes: Vec<String>,
    pub hints: Vec<String>,
    /// Shown verbatim after the headline, indented.
    pub detail: Option<String>,
}

impl Report {
    pub fn new(headline: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            causes: Vec::new(),
            hints: Vec::new(),
            detail: None,
        }
    }

    pub fn caused_by(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if !detail.trim().is_empty() {
            self.detail = Some(detail);
        }
        self
    }

    /// Build a report from any error, walking its source chain.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        let mut report = Self::new(err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            report = report.caused_by(cause.to_string());
            source = cause.source();
        }
        report
    }

    /// Pipeline errors get a short headline, with tool output moved into
    /// the detail block.
    pub fn from_respawn(err: &RespawnError) -> Self {
        match err {
            RespawnError::CompileFailure {
                output,
                source_path,
            } => Self::new("generated source failed to compile")
                .hint(format!(
                    "please file a bug report with {} attached",
                    source_path.display()
                ))
                .detail(output.as_str()),
            RespawnError::LinkFailure {
                output,
                object_path,
            } => Self::new("generated object failed to link")
                .hint(format!("object file kept at {}", object_path.display()))
                .detail(output.as_str()),
            RespawnError::ImportNotFound { .. } => {
                Self::from_error(err).hint("check GOPATH and GOROOT, or the roots in respawn.toml")
            }
            other => Self::from_error(other),
        }
    }

    /// Colored multi-line rendering for a terminal.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} {}",
            crate::colors::red("error:"),
            crate::colors::bold(&self.headline)
        );
        for cause in &self.causes {
            out.push_str(&format!("\n  {} {}", crate::colors::gray("caused by:"), cause));
        }
        if let Some(detail) = &self.detail {
            for line in detail.trim_end().lines() {
                out.push_str("\n    ");
                out.push_str(line);
            }
        }
        for hint in &self.hints {
            out.push_str(&format!("\n  {} {}", crate::colors::cyan("hint:"), hint));
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        if let Some(detail) = &self.detail {
            for line in detail.trim_end().lines() {
                write!(f, "\n    {}", line)?;
            }
        }
        for hint in &self.hints {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for Report {}

impl From<&RespawnError> for Report {
    fn from(err: &RespawnError) -> Self {
        Self::from_respawn(err)
    }
}
