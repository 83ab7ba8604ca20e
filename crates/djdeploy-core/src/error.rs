use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Django project discovery ──
    #[error("failed to resolve project directory {path}")]
    ProjectDirResolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "manage.py not found in {dir} or its immediate subdirectories; run djdeploy from the root of your Django project's git repository"
    )]
    ManagePyNotFound { dir: PathBuf },

    #[error(
        "manage.py files found in several subdirectories: {}; run djdeploy from the directory holding the one to deploy",
        format_dirs(candidates)
    )]
    MultipleManagePy { candidates: Vec<PathBuf> },

    #[error("failed to read {path}")]
    ManagePyRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("DJANGO_SETTINGS_MODULE is not set in {path}")]
    SettingsModuleNotFound { path: PathBuf },

    #[error("settings module {module} does not exist at {path}")]
    SettingsFileMissing { module: String, path: PathBuf },
}

fn format_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
