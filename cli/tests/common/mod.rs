//! Helpers for driving the `bia` binary.

#![allow(dead_code)]

use std::io::Write;
use std::process::Output;

use assert_cmd::Command;
use expect_test::Expect;

pub fn bia() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bia"))
}

/// A script on disk, removed when dropped.
pub struct Script {
    file: tempfile::NamedTempFile,
}

impl Script {
    pub fn new(source: impl AsRef<[u8]>) -> Self {
        let mut file = tempfile::Builder::new()
            .prefix("script-")
            .suffix(".bia")
            .tempfile()
            .unwrap();
        file.write_all(source.as_ref()).unwrap();
        Self { file }
    }

    pub fn path(&self) -> &str {
        self.file.path().to_str().unwrap()
    }

    /// `bia run [flags] <script> [-- args]`.
    pub fn run(&self, flags: &[&str], args: &[&str]) -> Output {
        let mut cmd = bia();
        cmd.arg("run").args(flags).arg(self.path());
        if !args.is_empty() {
            cmd.arg("--").args(args);
        }
        cmd.output().unwrap()
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// The run succeeded with `expected` on stdout and nothing on stderr.
pub fn check_success(output: &Output, expected: Expect) {
    assert!(output.status.success(), "stderr: {}", text(&output.stderr));
    assert_eq!(text(&output.stderr), "");
    expected.assert_eq(&text(&output.stdout));
}

/// The run failed; `expected` is the `error: ...` line on stderr.
///
/// Log lines the subscriber emits before it are ignored.
pub fn check_failure(output: &Output, expected: Expect) {
    assert!(!output.status.success(), "stdout: {}", text(&output.stdout));
    let stderr = text(&output.stderr);
    let line = stderr
        .lines()
        .find(|line| line.starts_with("error: "))
        .unwrap_or_else(|| panic!("no error line in {:?}", stderr));
    expected.assert_eq(line);
}
