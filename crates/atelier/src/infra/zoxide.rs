//! Frequency-ranked directory index backed by the `zoxide` binary.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::warn;

use crate::domain::errors::ProviderError;

/// Run `zoxide query -l` and return the ranked directories.
///
/// Returns `Ok(None)` when zoxide is unavailable: either the binary is missing or its
/// database has no entries yet (exit status 1 with no output). The child process is killed
/// if the returned future is dropped.
pub async fn query(program: &str) -> Result<Option<Vec<PathBuf>>, ProviderError> {
    let output = Command::new(program)
        .args(["query", "-l"])
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(program, "zoxide not found; skipping frequent directories");
            return Ok(None);
        }
        Err(source) => {
            return Err(ProviderError::Spawn {
                tool: program.to_string(),
                source,
            });
        }
    };

    if !output.status.success() {
        if output.status.code() == Some(1) && output.stdout.is_empty() {
            return Ok(None);
        }
        return Err(ProviderError::ToolFailed {
            tool: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(Some(parse_paths(&String::from_utf8_lossy(&output.stdout))))
}

/// Parse newline-delimited paths, skipping blank lines.
pub fn parse_paths(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}
