use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render template {name}")]
    Template {
        name: &'static str,
        source: tera::Error,
    },
    #[error("failed to parse {path}")]
    Pipfile {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
    #[error("{path} has a [packages] entry that is not a table")]
    PipfilePackages { path: PathBuf },
    #[error("git command failed: {detail}")]
    GitCommand {
        detail: String,
        source: std::io::Error,
    },
    #[error("git failed: {detail}")]
    GitFailed { detail: String },
}
