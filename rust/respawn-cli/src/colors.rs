//! ANSI color helpers for CLI output.
//!
//! Colors are dropped when `NO_COLOR` is set.

use std::sync::OnceLock;

fn enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("NO_COLOR").is_none())
}

/// Wrap `s` in the SGR escape `code`, or return it unchanged.
fn paint(code: &str, s: &str) -> String {
    if enabled() {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    } else {
        s.to_string()
    }
}

/// Green text, for success and resolved paths.
pub fn green(s: &str) -> String {
    paint("32", s)
}

/// Red text, for the `error:` prefix.
pub fn red(s: &str) -> String {
    paint("31", s)
}

/// Yellow text, for warnings and dry-run notes.
pub fn yellow(s: &str) -> String {
    paint("33", s)
}

/// Cyan text, for hints and file paths.
pub fn cyan(s: &str) -> String {
    paint("36", s)
}

/// Bold text, for headlines and package names.
pub fn bold(s: &str) -> String {
    paint("1", s)
}

/// Dim gray text, for secondary detail.
pub fn gray(s: &str) -> String {
    paint("90", s)
}

/// Right-aligned, green, bold stage label (`   Compiling`).
pub fn status_label(label: &str) -> String {
    paint("1;32", &format!("{:>12}", label))
}
