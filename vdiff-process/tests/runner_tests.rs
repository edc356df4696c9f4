//! Integration tests for `SystemProcess`.
//!
//! The success/exit tests rely on a POSIX `sh` and are skipped elsewhere.

use vdiff_process::{ProcessError, ProcessRunner, SystemProcess};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn missing_program_is_a_launch_error() {
    let err = SystemProcess
        .run("/nonexistent/vdiff-test-program", &[])
        .expect_err("should fail to launch");
    assert!(matches!(err, ProcessError::Launch { .. }));
    assert!(err.to_string().contains("/nonexistent/vdiff-test-program"));
}

#[cfg(unix)]
#[test]
fn combines_stdout_and_stderr() {
    let out = SystemProcess
        .run("sh", &args(&["-c", "echo rendered; echo success >&2"]))
        .expect("sh should run");
    assert!(out.contains("rendered"));
    assert!(out.contains("success"));
    assert!(out.find("rendered") < out.find("success"));
}

#[cfg(unix)]
#[test]
fn non_zero_exit_is_an_exit_error_with_output() {
    let err = SystemProcess
        .run("sh", &args(&["-c", "echo boom >&2; exit 3"]))
        .expect_err("should fail");
    match err {
        ProcessError::Exit { output, .. } => assert_eq!(output, "boom"),
        other => panic!("unexpected error: {other:?}"),
    }
}
