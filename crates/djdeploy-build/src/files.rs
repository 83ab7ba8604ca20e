use crate::BuildError;
use std::path::Path;

pub(crate) fn read(path: &Path) -> Result<String, BuildError> {
    std::fs::read_to_string(path).map_err(|e| BuildError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn write(path: &Path, content: &str) -> Result<(), BuildError> {
    std::fs::write(path, content).map_err(|e| BuildError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Append `lines` to `existing`, starting on a fresh line.
pub(crate) fn append_lines(path: &Path, existing: &str, lines: &[String]) -> Result<(), BuildError> {
    let mut content = existing.to_owned();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    write(path, &content)
}
