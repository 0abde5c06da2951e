//! Commit creation by shelling out to the system `git` binary.
//!
//! Uses `std::process::Command` so the user's git config, hooks and signing
//! setup apply exactly as with a manual `git commit`.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::CommitError;

/// Result of running `git commit`, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Exit code, or `None` if git was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommitOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into an error.
    pub fn into_result(self) -> Result<CommitOutcome, CommitError> {
        if self.success() {
            Ok(self)
        } else {
            Err(CommitError::NonZeroExit {
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Run `git commit -m <message>` in the current directory.
pub fn commit(message: &str) -> Result<CommitOutcome, CommitError> {
    commit_in(None, message)
}

/// Run `git commit -m <message>`, optionally inside `dir`.
///
/// Only failing to start git is an error here; the exit status is reported
/// in the returned [`CommitOutcome`].
pub fn commit_in(dir: Option<&Path>, message: &str) -> Result<CommitOutcome, CommitError> {
    let git = which::which("git").map_err(|_| CommitError::GitNotInstalled)?;

    let mut cmd = Command::new(git);
    cmd.args(["commit", "-m", message]);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(CommitError::SpawnFailed)?;

    let outcome = CommitOutcome {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };
    debug!("git commit exited with {:?}", outcome.code);

    Ok(outcome)
}
