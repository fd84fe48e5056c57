//! End-to-end integration tests that invoke the compiled `ndiff` binary
//! via `std::process::Command`.

use std::io::Write as _;
use std::process::{Command, Stdio};

/// Invoke the ndiff binary with the given arguments, feeding `stdin` to it.
/// Returns `(stdout, stderr, exit_code)`.
fn run_ndiff(args: &[&str], stdin: &str) -> (String, String, i32) {
    let binary = env!("CARGO_BIN_EXE_ndiff");

    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn ndiff binary");

    child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();

    let output = child.wait_with_output().expect("failed to wait on child");
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("ndiff-itest-{}-{}", std::process::id(), name));
    std::fs::write(&dir, content).expect("write temp fixture");
    dir
}

#[test]
fn raw_mode_merges_three_files_with_column_prefixes() {
    let a = write_temp("raw-a", "shared\nonly_a\n");
    let b = write_temp("raw-b", "shared\n");
    let c = write_temp("raw-c", "shared\n");

    let (stdout, _stderr, code) = run_ndiff(
        &[a.to_str().unwrap(), b.to_str().unwrap(), c.to_str().unwrap()],
        "",
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("abcshared\n"));
    assert!(stdout.contains("a  only_a\n"));

    for p in [a, b, c] {
        std::fs::remove_file(p).ok();
    }
}

#[test]
fn unified_mode_produces_gnu_style_hunk() {
    let a = write_temp("uni-a", "one\ntwo\nthree\n");
    let b = write_temp("uni-b", "one\nTWO\nthree\n");

    let (stdout, _stderr, code) = run_ndiff(&["-u", a.to_str().unwrap(), b.to_str().unwrap()], "");
    assert_eq!(code, 0);
    assert!(stdout.starts_with("---"));
    assert!(stdout.contains("@@"));
    assert!(stdout.contains("-two"));
    assert!(stdout.contains("+TWO"));

    std::fs::remove_file(a).ok();
    std::fs::remove_file(b).ok();
}

#[test]
fn ifdef_mode_reconstructs_guarded_source() {
    let a = write_temp("if-a", "head\nonly_a\ntail\n");
    let b = write_temp("if-b", "head\ntail\n");

    let (stdout, _stderr, code) =
        run_ndiff(&["-D", "V_A", "-D", "V_B", a.to_str().unwrap(), b.to_str().unwrap()], "");
    assert_eq!(code, 0);
    assert!(stdout.contains("#ifdef V_A"));
    assert!(stdout.contains("only_a"));
    assert!(stdout.contains("#endif"));

    std::fs::remove_file(a).ok();
    std::fs::remove_file(b).ok();
}

#[test]
fn stdin_dash_is_accepted_as_one_input() {
    let a = write_temp("stdin-a", "one\ntwo\n");
    let (stdout, _stderr, code) = run_ndiff(&[a.to_str().unwrap(), "-"], "one\ntwo\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("abone\n"));

    std::fs::remove_file(a).ok();
}

#[test]
fn unified_and_ifdef_are_mutually_exclusive() {
    let a = write_temp("excl-a", "x\n");
    let b = write_temp("excl-b", "x\n");
    let (_stdout, stderr, code) = run_ndiff(
        &["-u", "-D", "V0", a.to_str().unwrap(), b.to_str().unwrap()],
        "",
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("mutually exclusive"));

    std::fs::remove_file(a).ok();
    std::fs::remove_file(b).ok();
}

#[test]
fn unified_mode_with_three_files_is_an_input_range_error() {
    let a = write_temp("range-a", "x\n");
    let b = write_temp("range-b", "x\n");
    let c = write_temp("range-c", "x\n");
    let (_stdout, stderr, code) = run_ndiff(
        &["-u", a.to_str().unwrap(), b.to_str().unwrap(), c.to_str().unwrap()],
        "",
    );
    assert_eq!(code, 2, "input-range errors exit with code 2");
    assert!(stderr.contains("exactly two files"));

    for p in [a, b, c] {
        std::fs::remove_file(p).ok();
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let (_stdout, stderr, code) = run_ndiff(&["/no/such/file/ndiff-test"], "");
    assert_eq!(code, 1, "I/O errors exit with code 1");
    assert!(stderr.starts_with("ERROR:"));
}

#[test]
fn binary_input_is_rejected() {
    let path = write_temp("binary", "");
    std::fs::write(&path, [b'a', b'b', 0u8, b'c']).unwrap();
    let other = write_temp("binary-b", "abc\n");

    let (_stdout, stderr, code) = run_ndiff(&[path.to_str().unwrap(), other.to_str().unwrap()], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("binary"));

    std::fs::remove_file(path).ok();
    std::fs::remove_file(other).ok();
}

#[test]
fn output_flag_writes_to_file_instead_of_stdout() {
    let a = write_temp("out-a", "x\ny\n");
    let b = write_temp("out-b", "x\ny\n");
    let outfile = std::env::temp_dir().join(format!("ndiff-itest-out-{}", std::process::id()));

    let (stdout, _stderr, code) = run_ndiff(
        &["-o", outfile.to_str().unwrap(), a.to_str().unwrap(), b.to_str().unwrap()],
        "",
    );
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    let written = std::fs::read_to_string(&outfile).unwrap();
    assert_eq!(written, "abx\naby\n");

    std::fs::remove_file(a).ok();
    std::fs::remove_file(b).ok();
    std::fs::remove_file(outfile).ok();
}
