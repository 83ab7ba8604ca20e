//! Git state of the project being deployed.

use crate::BuildError;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Paths with uncommitted changes, relative to the repository root.
///
/// Untracked files count as changes; ignored files do not.
pub fn dirty_paths(git_root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let output = git(git_root, &["status", "--porcelain"])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().filter_map(porcelain_path).collect())
}

/// Stage and commit everything. Returns `false` when there was nothing to
/// commit.
pub fn commit_all(git_root: &Path, message: &str) -> Result<bool, BuildError> {
    if dirty_paths(git_root)?.is_empty() {
        tracing::info!("  No changes to commit.");
        return Ok(false);
    }

    tracing::info!("Committing changes...");
    git(git_root, &["add", "."])?;
    git(git_root, &["commit", "-m", message])?;
    tracing::info!("  Committed changes.");
    Ok(true)
}

fn git(dir: &Path, args: &[&str]) -> Result<Output, BuildError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| BuildError::GitCommand {
            detail: format!("failed to execute git {}", args.join(" ")),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BuildError::GitFailed {
            detail: format!(
                "git {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            ),
        });
    }

    tracing::debug!(stdout = %String::from_utf8_lossy(&output.stdout), "git {}", args.join(" "));
    Ok(output)
}

/// Path from one `git status --porcelain` line (`XY path` or
/// `XY old -> new`).
fn porcelain_path(line: &str) -> Option<PathBuf> {
    let path = line.get(3..)?;
    let path = match path.rsplit_once(" -> ") {
        Some((_, renamed)) => renamed,
        None => path,
    };
    let path = path.trim_matches('"');
    (!path.is_empty()).then(|| PathBuf::from(path))
}
