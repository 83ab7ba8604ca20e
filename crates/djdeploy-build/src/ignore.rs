//! `.gcloudignore` generation and the `.gitignore` entry for deploy logs.

use crate::{BuildError, FileChange, files};
use std::path::Path;

pub const GCLOUDIGNORE: &str = ".gcloudignore";
pub const GITIGNORE: &str = ".gitignore";

/// Write `.gcloudignore` at the git root unless one exists.
///
/// `venv` is the active virtualenv (`VIRTUAL_ENV`); its directory name is
/// ignored so local environments are never uploaded.
pub fn ensure_gcloudignore(git_root: &Path, venv: Option<&Path>) -> Result<FileChange, BuildError> {
    tracing::info!("Configuring {GCLOUDIGNORE}...");
    let path = git_root.join(GCLOUDIGNORE);
    if path.exists() {
        tracing::info!("  Found existing {GCLOUDIGNORE} file. Not overwriting this file.");
        return Ok(FileChange::Kept);
    }

    files::write(&path, &gcloudignore_content(venv, cfg!(target_os = "macos")))?;
    tracing::info!("  Wrote {GCLOUDIGNORE} file.");
    Ok(FileChange::Created)
}

fn gcloudignore_content(venv: Option<&Path>, macos: bool) -> String {
    let mut sections = vec![".git/".to_owned()];
    if let Some(name) = venv.and_then(Path::file_name) {
        sections.push(format!("{}/", name.to_string_lossy()));
    }
    sections.push("__pycache__/\n*.pyc".to_owned());
    sections.push("*.sqlite3".to_owned());
    if macos {
        sections.push(".DS_Store".to_owned());
    }

    let mut content = sections.join("\n\n");
    content.push('\n');
    content
}

/// Add `entry` to the git root's `.gitignore`, creating the file if needed.
pub fn ensure_gitignore_entry(git_root: &Path, entry: &str) -> Result<FileChange, BuildError> {
    let path = git_root.join(GITIGNORE);
    if !path.exists() {
        files::write(&path, &format!("{entry}\n"))?;
        tracing::info!("  Created {GITIGNORE} ignoring {entry}.");
        return Ok(FileChange::Created);
    }

    let content = files::read(&path)?;
    let bare = entry.trim_end_matches('/');
    if content
        .lines()
        .map(|line| line.trim().trim_start_matches('/').trim_end_matches('/'))
        .any(|line| line == bare)
    {
        return Ok(FileChange::Kept);
    }

    files::append_lines(&path, &content, &[entry.to_owned()])?;
    tracing::info!("  Added {entry} to {GITIGNORE}.");
    Ok(FileChange::Updated)
}
