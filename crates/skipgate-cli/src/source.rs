//! Collectors for the commit text handed to the evaluator.
//!
//! Everything here does I/O; the evaluator itself never does. Git runs under
//! the configured timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::config::GitConfig;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("failed to run {bin}: {source}. Is it installed?")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("command output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Reads commit text from a local git checkout.
pub struct GitCollector {
    bin: String,
    repo: Option<PathBuf>,
    timeout: Duration,
}

impl GitCollector {
    pub fn new(config: &GitConfig, repo: Option<PathBuf>) -> Self {
        Self {
            bin: config.bin.clone(),
            repo,
            timeout: config.timeout(),
        }
    }

    /// Full, untruncated message of the most recent commit, trimmed.
    pub async fn head_message(&self) -> Result<String, SourceError> {
        let output = self.run(&["log", "-1", "--format=%B"]).await?;
        Ok(output.trim().to_string())
    }

    /// First lines of the last `count` commits, newest first.
    ///
    /// This is the truncated view many CI change-log facilities expose.
    pub async fn recent_subjects(&self, count: usize) -> Result<Vec<String>, SourceError> {
        let count = format!("-n{count}");
        let output = self.run(&["log", &count, "--format=%s"]).await?;
        Ok(parse_change_log(&output))
    }

    async fn run(&self, args: &[&str]) -> Result<String, SourceError> {
        let mut cmd = tokio::process::Command::new(&self.bin);
        if let Some(repo) = &self.repo {
            cmd.arg("-C").arg(repo);
        }
        cmd.args(args).kill_on_drop(true);

        let command = format!("{} {}", self.bin, args.join(" "));
        tracing::debug!(command = %command, "Running");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| SourceError::Timeout {
                command: command.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| SourceError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Read a commit message from a file, trimmed.
pub async fn read_message_file(path: &Path) -> Result<String, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(content.trim().to_string())
}

/// Read a commit message from stdin, trimmed.
pub async fn read_stdin() -> Result<String, SourceError> {
    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .map_err(SourceError::Stdin)?;
    Ok(content.trim().to_string())
}

/// Read change-log entries from a file, one entry per non-empty line.
pub async fn read_change_log_file(path: &Path) -> Result<Vec<String>, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_change_log(&content))
}

pub fn parse_change_log(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
