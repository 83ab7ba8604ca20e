//! Python package requirements for running on Cloud Run.

use crate::{BuildError, FileChange, files};
use djdeploy_core::DependencyFile;
use std::path::Path;
use toml_edit::DocumentMut;

/// Packages the deployed project needs.
pub const REQUIRED_PACKAGES: &[&str] = &["gunicorn", "psycopg2-binary", "whitenoise", "dj-database-url"];

/// Add [`REQUIRED_PACKAGES`] to the project's dependency file, skipping
/// packages it already lists.
pub fn ensure_packages(dependency_file: &DependencyFile) -> Result<FileChange, BuildError> {
    tracing::info!("Adding packages to project dependencies...");
    match dependency_file {
        DependencyFile::Requirements(path) => add_to_requirements(path),
        DependencyFile::Pipfile(path) => add_to_pipfile(path),
        DependencyFile::None => {
            tracing::warn!(
                "  No requirements.txt or Pipfile found; add {} yourself.",
                REQUIRED_PACKAGES.join(", ")
            );
            Ok(FileChange::Kept)
        }
    }
}

fn add_to_requirements(path: &Path) -> Result<FileChange, BuildError> {
    let content = files::read(path)?;
    let listed: Vec<String> = content.lines().filter_map(requirement_name).collect();

    let missing = missing_packages(&listed);
    if missing.is_empty() {
        tracing::info!("  All required packages already listed.");
        return Ok(FileChange::Kept);
    }

    let lines: Vec<String> = missing.iter().map(|name| (*name).to_owned()).collect();
    files::append_lines(path, &content, &lines)?;
    tracing::info!("  Added {} to requirements.txt.", missing.join(", "));
    Ok(FileChange::Updated)
}

fn add_to_pipfile(path: &Path) -> Result<FileChange, BuildError> {
    let content = files::read(path)?;
    let mut doc: DocumentMut = content.parse().map_err(|e| BuildError::Pipfile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let packages = doc
        .entry("packages")
        .or_insert_with(toml_edit::table)
        .as_table_like_mut()
        .ok_or_else(|| BuildError::PipfilePackages {
            path: path.to_path_buf(),
        })?;

    let listed: Vec<String> = packages.iter().map(|(name, _)| normalize(name)).collect();
    let missing = missing_packages(&listed);
    if missing.is_empty() {
        tracing::info!("  All required packages already listed.");
        return Ok(FileChange::Kept);
    }

    for name in &missing {
        packages.insert(name, toml_edit::value("*"));
    }
    files::write(path, &doc.to_string())?;
    tracing::info!("  Added {} to Pipfile.", missing.join(", "));
    Ok(FileChange::Updated)
}

fn missing_packages(listed: &[String]) -> Vec<&'static str> {
    REQUIRED_PACKAGES
        .iter()
        .copied()
        .filter(|name| {
            let found = listed.contains(&normalize(name));
            tracing::info!("  Looking for {name}... {}", if found { "found" } else { "missing" });
            !found
        })
        .collect()
}

/// Name of the package a requirements line refers to, normalized.
/// Comments, blank lines and pip options yield `None`.
fn requirement_name(line: &str) -> Option<String> {
    let line = match line.split_once('#') {
        Some((before, _)) => before.trim(),
        None => line.trim(),
    };
    if line.is_empty() || line.starts_with('-') {
        return None;
    }
    let is_name_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    let name = match line.find(|c: char| !is_name_char(c)) {
        Some(end) => &line[..end],
        None => line,
    };
    (!name.is_empty()).then(|| normalize(name))
}

/// Normalized project name: lowercase, runs of `-`, `_` and `.` collapsed
/// to a single `-`.
fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    out
}
