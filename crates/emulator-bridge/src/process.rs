//! Process launching
//!
//! The two ways avd-runner starts SDK tools: run to completion capturing
//! stdout, or fire and forget.

use std::path::Path;
use std::process::Stdio;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::emulator::EmulatorError;

/// Starts external programs
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` to completion and return its stdout
    ///
    /// A non-zero exit status is an error carrying the program's stderr.
    async fn output(&self, program: &Path, args: &[&str]) -> Result<String, EmulatorError>;

    /// Start `program` in `cwd` with inherited stdio without waiting for it
    ///
    /// The child is not owned by the caller and keeps running after this
    /// process exits.
    async fn spawn_detached(&self, program: &Path, args: &[String], cwd: &Path) -> Result<(), EmulatorError>;
}

/// [`ProcessRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn output(&self, program: &Path, args: &[&str]) -> Result<String, EmulatorError> {
        debug!("{} {:?}", program.display(), args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EmulatorError::CommandFailed {
                command: format!("{} {}", program.display(), args.join(" ")),
                message: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn spawn_detached(&self, program: &Path, args: &[String], cwd: &Path) -> Result<(), EmulatorError> {
        debug!("Spawning {} {:?} in {:?}", program.display(), args, cwd);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);

        // Keep terminal signals aimed at us away from the emulator.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| EmulatorError::StartFailed(format!("{}: {}", program.display(), e)))?;
        debug!("Emulator process started, pid {:?}", child.id());

        // Dropping the handle leaves the child running; tokio reaps it if it exits first.
        drop(child);
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_output_captures_stdout() {
        let out = SystemProcessRunner
            .output(Path::new("/bin/sh"), &["-c", "echo hello"])
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_output_non_zero_exit_is_an_error() {
        let err = SystemProcessRunner
            .output(Path::new("/bin/sh"), &["-c", "echo boom >&2; exit 3"])
            .await
            .unwrap_err();
        match err {
            EmulatorError::CommandFailed { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let err = SystemProcessRunner
            .spawn_detached(Path::new("/nonexistent/emulator"), &[], Path::new("/"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmulatorError::StartFailed(_)));
    }
}
