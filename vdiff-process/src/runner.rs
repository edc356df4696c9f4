//! Blocking program execution with captured output.

use std::process::{Command, Stdio};

use crate::error::ProcessError;

/// Runs an external program to completion.
///
/// Implementations block the calling thread until the program exits. There is
/// no timeout: a program that never exits blocks its caller forever.
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` and return its combined stdout and stderr
    /// text (stdout first).
    ///
    /// # Errors
    /// Returns [`ProcessError::Launch`] if the program cannot be started and
    /// [`ProcessError::Exit`] if it exits with a non-zero status.
    fn run(&self, program: &str, args: &[String]) -> Result<String, ProcessError>;
}

/// [`ProcessRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl ProcessRunner for SystemProcess {
    fn run(&self, program: &str, args: &[String]) -> Result<String, ProcessError> {
        log::debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ProcessError::Launch {
                program: program.to_string(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        if !output.status.success() {
            return Err(ProcessError::Exit {
                program: program.to_string(),
                status: output.status.to_string(),
                output: text.trim_end().to_string(),
            });
        }

        Ok(text)
    }
}
