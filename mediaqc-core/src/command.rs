//! Subprocess execution helpers for the external media engine.
//!
//! Every engine invocation is a one-shot blocking call: spawn, drain
//! stdout/stderr, wait, return the captured `Output`. Output is collected
//! as raw bytes because the audio decode path pipes PCM through stdout.

use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use log::{debug, error, warn};

use crate::error::{QcError, Result};
use crate::logging;

/// Execute a command and capture its output, optionally killing it after
/// `timeout`.
///
/// A non-zero exit status is not an error here: ffmpeg filter runs report
/// their findings on stderr and some containers make it exit non-zero even
/// when the diagnostics are complete. Callers that need a successful exit
/// use [`run_checked`].
pub fn run(cmd: &mut Command, timeout: Option<Duration>) -> Result<Output> {
    logging::log_command(cmd);

    let program = cmd.get_program().to_string_lossy().into_owned();

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            error!("Failed to spawn '{}': {}", program, e);
            QcError::CommandStart(program.clone(), e)
        })?;

    // Drain both pipes on their own threads so a chatty process cannot
    // deadlock against a full pipe buffer.
    let mut stdout_pipe = child.stdout.take();
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });

    let mut stderr_pipe = child.stderr.take();
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });

    let status = if let Some(timeout) = timeout {
        let start = std::time::Instant::now();
        let mut status = None;

        while start.elapsed() < timeout {
            match child.try_wait() {
                Ok(Some(s)) => {
                    status = Some(s);
                    break;
                }
                Ok(None) => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(QcError::CommandExecution(format!(
                        "Error waiting for '{}': {}",
                        program, e
                    )));
                }
            }
        }

        match status {
            Some(s) => s,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                warn!(
                    "'{}' exceeded the {}s timeout and was killed",
                    program,
                    timeout.as_secs()
                );
                return Err(QcError::CommandTimeout(timeout.as_secs()));
            }
        }
    } else {
        child.wait().map_err(|e| {
            QcError::CommandExecution(format!("Error waiting for '{}': {}", program, e))
        })?
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();

    if !status.success() {
        debug!(
            "'{}' exited with {} ({} bytes of diagnostics captured)",
            program,
            status.code().unwrap_or(-1),
            stderr.len()
        );
    }

    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

/// Execute a command and fail on a non-zero exit status.
pub fn run_checked(cmd: &mut Command, timeout: Option<Duration>) -> Result<Output> {
    let output = run(cmd, timeout)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            "Command failed with exit code {}: {}",
            output.status.code().unwrap_or(-1),
            stderr
        );

        return Err(QcError::CommandExecution(format!(
            "Command failed with exit code {}: {}",
            output.status.code().unwrap_or(-1),
            stderr
        )));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let mut cmd = Command::new("echo");
        cmd.arg("test");
        let output = run(&mut cmd, None).unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "test");
    }

    #[test]
    fn test_run_checked_rejects_failure() {
        let mut cmd = Command::new("false");
        let result = run_checked(&mut cmd, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_tolerates_failure() {
        let mut cmd = Command::new("false");
        let output = run(&mut cmd, None).unwrap();
        assert!(!output.status.success());
    }

    #[test]
    fn test_missing_binary_is_command_start() {
        let mut cmd = Command::new("definitely-not-a-real-binary-qc");
        match run(&mut cmd, None) {
            Err(QcError::CommandStart(name, _)) => {
                assert_eq!(name, "definitely-not-a-real-binary-qc");
            }
            other => panic!("expected CommandStart error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_timeout_kills_runaway_process() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        match run(&mut cmd, Some(Duration::from_millis(200))) {
            Err(QcError::CommandTimeout(_)) => {}
            other => panic!("expected CommandTimeout, got {:?}", other.map(|_| ())),
        }
    }
}
