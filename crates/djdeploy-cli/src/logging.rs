use anyhow::Context;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Directory under the project root that holds deploy logs.
pub const LOG_DIR: &str = "djdeploy_logs";

/// Console output filtered by `RUST_LOG` (default `info`), plus a full
/// `debug` record in `log_file` when given.
pub fn init(log_file: Option<File>) {
    let console = fmt::layer().with_target(false).with_filter(
        // arch-lint: allow(no-silent-result-drop) reason="an unset or unparsable RUST_LOG falls back to info"
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );

    let file = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::DEBUG)
    });

    tracing_subscriber::registry().with(console).with(file).init();
}

/// Create `djdeploy_logs/deploy_{timestamp}.log` under `root`.
pub fn create_log_file(root: &Path) -> anyhow::Result<(PathBuf, File)> {
    let dir = root.join(LOG_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H%M%S");
    let path = dir.join(format!("deploy_{timestamp}.log"));
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    Ok((path, file))
}
