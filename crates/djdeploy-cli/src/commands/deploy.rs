use super::confirm::InteractiveConfirmer;
use super::{deploy_pipeline, messages};
use crate::logging::LOG_DIR;
use djdeploy_build::{MANAGED_FILES, git, ignore};
use djdeploy_cloud::{GcloudClient, inspector_for};
use djdeploy_core::{DependencyFile, DeployConfig, DjangoProject};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, clap::Args)]
pub struct DeployOptions {
    /// Create the database without asking, commit the changes and run the
    /// deployment build
    #[arg(long)]
    pub automate_all: bool,
    /// Region to deploy to (default: gcloud's run/region, then us-central1)
    #[arg(long)]
    pub region: Option<String>,
    /// Cloud Run service name to use instead of the Django project name
    #[arg(long)]
    pub deployed_project_name: Option<String>,
    /// Allow deploying with uncommitted changes
    #[arg(long)]
    pub allow_dirty: bool,
    /// Keep a full log of this run in djdeploy_logs/
    #[arg(long)]
    pub log_output: bool,
}

/// Configure the Django project in the current directory for Cloud Run and
/// provision everything it needs.
pub async fn deploy(options: DeployOptions) -> anyhow::Result<()> {
    let git_root = PathBuf::from(".");

    let config = DeployConfig::load(&git_root)?;
    let project = DjangoProject::discover(&git_root)?;

    // Dirty check: the files djdeploy manages may be dirty from a previous run
    if !options.allow_dirty {
        let dirty = unmanaged_changes(&project, git::dirty_paths(&project.git_root)?);
        if !dirty.is_empty() {
            anyhow::bail!(messages::dirty_worktree(&dirty));
        }
    }

    if options.log_output {
        ignore::ensure_gitignore_entry(&project.git_root, &format!("{LOG_DIR}/"))?;
    }

    let client = GcloudClient::new().with_inspector(inspector_for(config.probe.format));

    let outcome =
        deploy_pipeline::run(&client, &InteractiveConfirmer, &project, &config, &options).await?;

    for (file, change) in &outcome.files {
        tracing::debug!(file = %file, ?change, "local file handled");
    }

    if options.automate_all {
        println!("{}", messages::success_automate_all(&outcome.context.service_url));
    } else {
        println!("{}", messages::success(options.log_output));
    }
    Ok(())
}

/// Dirty paths other than files a deploy run writes itself.
fn unmanaged_changes(project: &DjangoProject, dirty: Vec<PathBuf>) -> Vec<String> {
    let mut managed: Vec<PathBuf> = MANAGED_FILES.iter().map(PathBuf::from).collect();
    managed.push(PathBuf::from(LOG_DIR));
    managed.extend(
        [Some(&project.settings_path), dependency_path(&project.dependency_file)]
            .into_iter()
            .flatten()
            // arch-lint: allow(no-silent-result-drop) reason="files outside the git root never appear in git status"
            .filter_map(|path| path.strip_prefix(&project.git_root).ok())
            .map(Path::to_path_buf),
    );

    dirty
        .into_iter()
        .filter(|path| !managed.iter().any(|m| path.starts_with(m)))
        .map(|path| path.display().to_string())
        .collect()
}

fn dependency_path(file: &DependencyFile) -> Option<&PathBuf> {
    match file {
        DependencyFile::Requirements(path) | DependencyFile::Pipfile(path) => Some(path),
        DependencyFile::None => None,
    }
}
