//! # UI Tests for Running Scripts
#![cfg(not(miri))]

use assert_cmd::Command;
use std::{env, fs};

fn axol(args: &[&str]) -> (String, String) {
  let output = Command::cargo_bin(env!("CARGO_PKG_NAME"))
    .unwrap()
    .args(args)
    .output()
    .unwrap();

  assert!(output.status.success(), "{output:?}");
  (
    String::from_utf8(output.stdout).unwrap(),
    String::from_utf8(output.stderr).unwrap(),
  )
}

#[test]
fn fibonacci_example() {
  let (stdout, stderr) = axol(&["run", "tests/scripts/fibonacci.ax"]);

  assert!(stderr.is_empty());
  assert_eq!(stdout, "6765\n");
}

#[test]
fn loops_and_branches() {
  let (stdout, _) = axol(&["run", "tests/scripts/countdown.ax"]);
  assert_eq!(stdout, "odd 3\neven 2\nodd 1\nlift off\n");
}

#[test]
fn imports_from_same_directory() {
  let (stdout, stderr) = axol(&["run", "tests/scripts/shapes.ax"]);

  assert!(stderr.is_empty());
  assert_eq!(stdout, "Rectangle(2, 3) 6\n16\n");
}

#[test]
fn imports_from_import_path() {
  let output = Command::cargo_bin(env!("CARGO_PKG_NAME"))
    .unwrap()
    .args(["run", "-", "--import-path", "tests/scripts"])
    .write_stdin("import 'geometry'; print(geometry.square(3).area());")
    .output()
    .unwrap();

  assert!(output.status.success());
  assert_eq!(String::from_utf8(output.stdout).unwrap(), "9\n");
}

#[test]
fn run_named_function() {
  let (stdout, _) = axol(&["run", "tests/scripts/answer.ax", "--function", "answer"]);
  assert_eq!(stdout, "42\n");
}

#[test]
fn run_from_stdin() {
  let output = Command::cargo_bin(env!("CARGO_PKG_NAME"))
    .unwrap()
    .args(["run", "-"])
    .write_stdin("x = 'a' * 3; print(x, 1 + 2.5);")
    .output()
    .unwrap();

  assert!(output.status.success());
  assert_eq!(String::from_utf8(output.stdout).unwrap(), "aaa 3.5\n");
}

#[test]
fn compile_then_exec() {
  let blob = env::temp_dir().join(format!("axol-fibonacci-{}.axb", std::process::id()));
  let blob_path = blob.to_str().unwrap();

  let (stdout, _) = axol(&["compile", "tests/scripts/fibonacci.ax", "-o", blob_path]);
  assert!(stdout.is_empty());
  assert!(fs::read(&blob).unwrap().starts_with(b"AXOL"));

  let (stdout, _) = axol(&["exec", blob_path]);
  assert_eq!(stdout, "6765\n");

  let (stdout, _) = axol(&["disasm", blob_path]);
  assert!(stdout.contains("╭─[Module: fibonacci]"));
  assert!(stdout.contains("global fn fib"));

  fs::remove_file(&blob).unwrap();
}

#[test]
fn exec_rejects_source() {
  let output = Command::cargo_bin(env!("CARGO_PKG_NAME"))
    .unwrap()
    .args(["exec", "tests/scripts/fibonacci.ax"])
    .output()
    .unwrap();

  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8(output.stderr).unwrap();
  assert!(stderr.starts_with("✕ Error: Malformed Blob\n"));
  assert!(stderr.contains("is not a valid blob"));
  assert!(stderr.contains("blobs are created with `axol compile`"));
}

#[test]
fn missing_file() {
  let output = Command::cargo_bin(env!("CARGO_PKG_NAME"))
    .unwrap()
    .args(["run", "tests/scripts/does-not-exist.ax"])
    .output()
    .unwrap();

  assert_eq!(output.status.code(), Some(2));
  assert_eq!(
    String::from_utf8(output.stderr).unwrap(),
    "✕ Error: File not found `tests/scripts/does-not-exist.ax`\n\n"
  );
}
