//! Drives the `respawn` binary against throwaway package roots.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn write_package(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("doc.go"), format!("// Package {name}.\npackage {name}\n")).unwrap();
}

/// Workspace and system roots holding every package the generated program
/// imports by default, plus `acme/widget`.
fn roots() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let ws = root.path().join("ws/src");
    let sys = root.path().join("sys/src/pkg");
    write_package(&sys.join("reflect"), "reflect");
    write_package(&sys.join("os"), "os");
    write_package(&ws.join("github.com/0xfaded/eval"), "eval");
    write_package(&ws.join("github.com/0xfaded/gack"), "gack");
    write_package(&ws.join("acme/widget"), "widget");
    root
}

fn respawn(root: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_respawn"))
        .args(args)
        .current_dir(root.path())
        .env("HOME", root.path())
        .env("GOPATH", root.path().join("ws"))
        .env("GOROOT", root.path().join("sys"))
        .env("NO_COLOR", "1")
        .env_remove("RESPAWN_TOOL_TIMEOUT")
        .env_remove("RESPAWN_TOOL_DIR")
        .output()
        .expect("run respawn")
}

#[test]
fn resolve_json_reports_package_name() {
    let root = roots();
    let out = respawn(&root, &["resolve", "--json", "acme//widget/"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let first = &value[0];
    assert_eq!(first["clean_path"], "acme/widget");
    assert_eq!(first["package_name"], "widget");
}

#[test]
fn resolve_missing_package_fails() {
    let root = roots();
    let out = respawn(&root, &["resolve", "acme/nothing"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("cannot find package \"acme/nothing\""), "{stderr}");
    assert!(stderr.contains("hint:"), "{stderr}");
}

#[test]
fn synth_prints_program_with_history_and_predecessor() {
    let root = roots();
    let history = root.path().join("history");
    fs::write(&history, "\"x := 1\"\n\n\"x + 1\"\n").unwrap();

    let out = respawn(
        &root,
        &[
            "synth",
            "--import",
            "acme/widget",
            "--history",
            history.to_str().unwrap(),
            "--predecessor",
            "/tmp/old-session",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let source = String::from_utf8(out.stdout).unwrap();
    assert!(source.starts_with("package main\n"));
    assert!(source.contains("\t\"acme/widget\"\n"));
    assert_eq!(source.matches("eval.EvalEnv(").count(), 2);
    assert!(source.contains("os.Remove(\"/tmp/old-session\")"));
    assert!(source.trim_end().ends_with("}"));
}

#[test]
fn synth_requires_predecessor() {
    let root = roots();
    let out = respawn(&root, &["synth", "-i", "acme/widget"]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("--predecessor"), "{stderr}");
}

#[test]
fn generated_program_never_deletes_the_cli() {
    let root = roots();
    let out = respawn(
        &root,
        &["synth", "-i", "acme/widget", "--predecessor", "/tmp/old-session"],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let source = String::from_utf8(out.stdout).unwrap();
    assert!(!source.contains(env!("CARGO_BIN_EXE_respawn")));
    assert_eq!(source.matches("os.Remove(").count(), 1);
}

#[test]
fn synth_rejects_name_collision() {
    let root = roots();
    write_package(&root.path().join("ws/src/other/widget"), "widget");
    let out = respawn(
        &root,
        &[
            "synth",
            "-i",
            "acme/widget",
            "-i",
            "other/widget",
            "--predecessor",
            "/tmp/old-session",
        ],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("widget redeclared as imported package name"), "{stderr}");
}

#[test]
fn config_prints_effective_roots() {
    let root = roots();
    let out = respawn(&root, &["config"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("workspace-root"), "{text}");
    assert!(text.contains("# compiler:"), "{text}");
}
