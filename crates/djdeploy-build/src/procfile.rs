use crate::{BuildError, FileChange, files};
use djdeploy_core::DjangoProject;

pub const FILE_NAME: &str = "Procfile";

const MIGRATE_PROCESS: &str =
    "migrate: python manage.py migrate && python manage.py collectstatic --noinput";

/// Make sure the Procfile at the git root declares a `web` process and the
/// `migrate` process the migration job runs.
///
/// An existing Procfile is only ever appended to.
pub fn ensure_procfile(project: &DjangoProject) -> Result<FileChange, BuildError> {
    let path = project.git_root.join(FILE_NAME);
    tracing::info!("Looking in {} for Procfile...", project.git_root.display());

    if path.exists() {
        tracing::info!("  Found existing Procfile.");
        let content = files::read(&path)?;
        if content.lines().any(|line| line.trim_start().starts_with("migrate:")) {
            tracing::info!("  Procfile already has a migrate process.");
            return Ok(FileChange::Kept);
        }

        files::append_lines(&path, &content, &[MIGRATE_PROCESS.to_owned()])?;
        tracing::info!("  Updated Procfile with following process:");
        tracing::info!("    {MIGRATE_PROCESS}");
        return Ok(FileChange::Updated);
    }

    tracing::info!("  No Procfile found. Generating Procfile...");
    let web = format!("web: gunicorn {} --log-file -", project.wsgi_module());
    files::write(&path, &format!("{web}\n{MIGRATE_PROCESS}\n"))?;
    tracing::info!("  Generated Procfile with following processes:");
    tracing::info!("    {web}");
    tracing::info!("    {MIGRATE_PROCESS}");
    Ok(FileChange::Created)
}
