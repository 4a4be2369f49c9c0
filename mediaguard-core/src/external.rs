//! Helpers for plugins that shell out to media tools.
//!
//! Tools work on files, so content is staged into a per-call scratch
//! directory that is removed when the [`Scratch`] is dropped. Child
//! processes are killed if the awaiting future is dropped.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub(crate) enum ToolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Scratch directory holding staged inputs and tool outputs.
pub(crate) struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub(crate) fn new() -> Result<Self, ToolError> {
        let dir = tempfile::Builder::new().prefix("mediaguard-").tempdir()?;
        Ok(Self { dir })
    }

    /// Path of a file inside the scratch directory.
    pub(crate) fn path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    /// Write `content` to `file_name` and return its path.
    pub(crate) async fn stage(
        &self,
        file_name: &str,
        content: &[u8],
    ) -> Result<PathBuf, ToolError> {
        let path = self.path(file_name);
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    pub(crate) async fn read(&self, path: &Path) -> Result<Vec<u8>, ToolError> {
        Ok(tokio::fs::read(path).await?)
    }
}

/// Run `program` to completion and return its stdout.
pub(crate) async fn run_tool<I, S>(program: &str, args: I) -> Result<Vec<u8>, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    tracing::debug!(program, "Running external tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ToolError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr,
        });
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scratch_stage_and_read() {
        let scratch = Scratch::new().unwrap();
        let path = scratch.stage("input.bin", b"payload").await.unwrap();
        assert_eq!(scratch.read(&path).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_scratch_removed_on_drop() {
        let scratch = Scratch::new().unwrap();
        let path = scratch.stage("input.bin", b"x").await.unwrap();
        drop(scratch);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = run_tool("mediaguard-no-such-tool", ["--version"]).await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
