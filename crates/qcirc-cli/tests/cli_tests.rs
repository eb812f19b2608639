//! End-to-end tests of the `qcirc` binary.
//!
//! Each test writes a program into a temporary directory, runs the built
//! binary on it and checks the output and exit status.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const BELL: &str = "qubit[2] q
bit[2] c
gate Bell(a, b) {
    H(a)
    CNot(a, b)
}
Bell(q[0], q[1])
measure_all(q, c)
";

fn qcirc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qcirc"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("QCIRC_MAX_OPERATIONS")
        .env_remove("QCIRC_MAX_INLINE_DEPTH")
        .env_remove("QCIRC_MAX_LOOP_ITERATIONS")
        .env_remove("QCIRC_MAX_TOTAL_ITERATIONS")
        .output()
        .expect("failed to run qcirc")
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// Success paths
// ============================================================================

#[test]
fn test_compile_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bell.qc", BELL);

    let out = qcirc(&["compile", arg(&input)]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("OPENQASM 3;\ninclude \"stdgates.inc\";\n"));
    assert!(stdout.contains("h q[0];\ncx q[0], q[1];\n"));
}

#[test]
fn test_compile_to_file() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bell.qc", BELL);
    let output = dir.path().join("bell.qasm");

    let out = qcirc(&["compile", arg(&input), "-o", arg(&output)]);
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
    let qasm = fs::read_to_string(&output).unwrap();
    assert!(qasm.ends_with("measure q[0] -> c[0];\nmeasure q[1] -> c[1];\n"));
}

#[test]
fn test_emit_ir_json() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bell.qc", BELL);

    let out = qcirc(&["compile", arg(&input), "--emit", "ir"]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("\"registers\""));
    assert!(stdout.contains("\"instructions\""));
}

#[test]
fn test_config_file_applies_output_settings() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bell.qc", BELL);
    let config = write(&dir, "qcirc.yaml", "output:\n  measure_spacing: false\n");

    let out = qcirc(&["compile", arg(&input), "--config", arg(&config)]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("cx q[0], q[1];\nmeasure q[0] -> c[0];"));
}

#[test]
fn test_check_reports_summary() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bell.qc", BELL);

    let out = qcirc(&["check", arg(&input)]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("is valid"));
    assert!(stdout.contains("Callables:  1"));
}

#[test]
fn test_version() {
    let out = qcirc(&["version"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8(out.stdout).unwrap().contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Exit codes
// ============================================================================

#[test]
fn test_parse_error_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bad.qc", "qubit[2 q\n");

    let out = qcirc(&["compile", arg(&input)]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn test_semantic_error_exits_2_with_location() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "oob.qc", "qubit[2] q\nH(q[2])\n");

    let out = qcirc(&["compile", arg(&input)]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("oob.qc:2:"), "{stderr}");

    let out = qcirc(&["check", arg(&input)]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_limit_exits_3() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "big.qc", "qubit q\nfor i in [0:100] { X(q) }\n");
    let config = write(&dir, "qcirc.yaml", "limits:\n  max_operations: 10\n");

    let out = qcirc(&["compile", arg(&input), "--config", arg(&config)]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn test_missing_file_exits_4() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.qc");

    let out = qcirc(&["compile", arg(&missing)]);
    assert_eq!(out.status.code(), Some(4));
    assert!(String::from_utf8(out.stderr).unwrap().contains("File not found"));
}

#[test]
fn test_invalid_config_exits_4() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bell.qc", BELL);
    let config = write(&dir, "qcirc.yaml", "limits:\n  max_operations: 0\n");

    let out = qcirc(&["compile", arg(&input), "--config", arg(&config)]);
    assert_eq!(out.status.code(), Some(4));
}
