//! Session inputs read from files: history entries and the serialized
//! environment block.

use std::path::{Path, PathBuf};

use respawn_core::StatementBlock;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("cannot read {kind} file '{}'", .path.display())]
    Read {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One literal history entry per non-empty line, in file order.
pub fn parse_history(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_history(path: &Path) -> Result<Vec<String>, InputError> {
    read(path, "history").map(|text| parse_history(&text))
}

/// The environment block is used as-is; a missing `--env` means an empty
/// block.
pub fn load_environment(path: Option<&Path>) -> Result<StatementBlock, InputError> {
    match path {
        Some(path) => read(path, "environment").map(StatementBlock::new),
        None => Ok(StatementBlock::default()),
    }
}

fn read(path: &Path, kind: &'static str) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use respawn_core::EnvironmentSerializer;

    #[test]
    fn history_skips_blank_lines_and_keeps_order() {
        let entries = parse_history("\"x := 1\"\n\n  \r\n\"x + 1\"\r\n\"fmt.Println(x)\"");
        assert_eq!(entries, ["\"x := 1\"", "\"x + 1\"", "\"fmt.Println(x)\""]);
    }

    #[test]
    fn history_text_is_not_trimmed() {
        let entries = parse_history("  \"indented\"  \n");
        assert_eq!(entries, ["  \"indented\"  "]);
    }

    #[test]
    fn load_history_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        std::fs::write(&path, "\"a\"\n\"b\"\n").unwrap();
        assert_eq!(load_history(&path).unwrap(), ["\"a\"", "\"b\""]);
    }

    #[test]
    fn missing_file_names_the_kind() {
        let err = load_history(Path::new("/no/such/history")).unwrap_err();
        assert_eq!(err.to_string(), "cannot read history file '/no/such/history'");
    }

    #[test]
    fn environment_defaults_to_empty_block() {
        let block = load_environment(None).unwrap();
        assert_eq!(block.serialize(&[]).unwrap(), "");
    }
}
