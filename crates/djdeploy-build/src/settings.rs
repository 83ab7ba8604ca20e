use crate::render::{self, render};
use crate::{BuildError, FileChange, files};
use std::path::Path;
use tera::Context;

/// Line that opens the Cloud Run block in `settings.py`.
pub const SETTINGS_MARKER: &str = r#"if os.environ.get("ON_CLOUDRUN"):"#;

/// Append the Cloud Run settings block to the settings file, once.
///
/// `deployed_url` is the service URL; its host becomes an allowed host and
/// a trusted CSRF origin.
pub fn ensure_settings(settings_path: &Path, deployed_url: &str) -> Result<FileChange, BuildError> {
    tracing::info!("Checking if settings block for Cloud Run present in settings.py...");
    let current = files::read(settings_path)?;

    if current.contains(SETTINGS_MARKER) {
        tracing::info!("  Found Cloud Run settings block in settings.py.");
        return Ok(FileChange::Kept);
    }

    tracing::info!("  No Cloud Run settings found in settings.py; adding settings...");
    let host = deployed_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');

    let mut context = Context::new();
    context.insert("current_settings", &current);
    context.insert("deployed_host", host);

    files::write(settings_path, &render(render::SETTINGS, &context)?)?;
    tracing::info!("  Modified settings.py file: {}", settings_path.display());
    Ok(FileChange::Updated)
}
