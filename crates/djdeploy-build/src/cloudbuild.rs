use crate::render::{self, render};
use crate::{BuildError, FileChange, files};
use std::path::Path;
use tera::Context;

pub const FILE_NAME: &str = "cloudbuild.yaml";

/// Values substituted into `cloudbuild.yaml`.
#[derive(Debug, Clone)]
pub struct CloudBuildParams<'a> {
    pub service: &'a str,
    pub region: &'a str,
    pub image: &'a str,
    pub job: &'a str,
}

/// Write `cloudbuild.yaml` at the git root unless one exists.
///
/// The generated pipeline builds the image with buildpacks, pushes it, runs
/// the migration job against it and deploys the service.
pub fn ensure_cloudbuild(
    git_root: &Path,
    params: &CloudBuildParams<'_>,
) -> Result<FileChange, BuildError> {
    tracing::info!("Looking in {} for {FILE_NAME} file...", git_root.display());
    let path = git_root.join(FILE_NAME);
    if path.exists() {
        tracing::info!("  Found existing {FILE_NAME} file.");
        return Ok(FileChange::Kept);
    }

    let mut context = Context::new();
    context.insert("service", params.service);
    context.insert("region", params.region);
    context.insert("image", params.image);
    context.insert("job", params.job);

    files::write(&path, &render(render::CLOUDBUILD, &context)?)?;
    tracing::info!("  Generated {FILE_NAME}: {}", path.display());
    Ok(FileChange::Created)
}
