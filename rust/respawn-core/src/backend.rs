//! Source backends: render a [`TransferPlan`] as program text.

use std::fmt::Write as _;

use crate::config::BackendConfig;
use crate::plan::TransferPlan;

/// Encodes a transfer plan in a concrete target syntax.
pub trait SourceBackend {
    /// Complete program text for `plan`.
    fn render(&self, plan: &TransferPlan) -> String;

    /// File suffix for the generated source artifact.
    fn source_suffix(&self) -> &str;
}

/// Emits a `package main` program for the 6g/8g toolchain family.
///
/// The program rebuilds the environment, replays every history entry
/// through the runtime's evaluator while rebuilding the history list,
/// deletes its predecessor executable, and re-enters the REPL.
#[derive(Debug, Clone)]
pub struct GoBackend {
    config: BackendConfig,
}

impl GoBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

impl Default for GoBackend {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

impl SourceBackend for GoBackend {
    fn render(&self, plan: &TransferPlan) -> String {
        let cfg = &self.config;
        let mut out = String::from("package main\n\nimport (\n");
        for import in &plan.imports {
            let _ = writeln!(out, "\t{}", quote(&import.clean_path));
        }
        out.push_str(")\n\nfunc main() {\n");

        out.push_str(&plan.environment);
        if !plan.environment.is_empty() && !plan.environment.ends_with('\n') {
            out.push('\n');
        }

        let _ = writeln!(out, "\t{} := []string{{}}", cfg.history_binding);
        for step in plan.replay_steps() {
            let _ = writeln!(out, "\t{}({}, {})", cfg.eval_call, step, cfg.env_binding);
            let _ = writeln!(out, "\t{h} = append({h}, {})", step, h = cfg.history_binding);
        }

        let _ = writeln!(
            out,
            "\tos.Remove({})",
            quote(&plan.predecessor.to_string_lossy())
        );
        let _ = writeln!(
            out,
            "\t{}({}, {})",
            cfg.reentry_call, cfg.env_binding, cfg.history_binding
        );
        out.push_str("}\n");
        out
    }

    fn source_suffix(&self) -> &str {
        ".go"
    }
}

/// Interpreted string literal with the escapes the target accepts.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
