use super::{DeployOptions, messages};
use djdeploy_build::cloudbuild::{self, CloudBuildParams};
use djdeploy_build::{FileChange, git, ignore, packages, procfile, settings};
use djdeploy_cloud::{AutoApprove, Confirmer, Declined, GcloudClient, GcloudExecutor};
use djdeploy_core::{
    DeployConfig, DeployTarget, DjangoProject, ResourceNames, SECRET_KEY_LENGTH, ServiceName,
    random_secret,
};
use std::path::PathBuf;

/// Region used when neither flags, `djdeploy.toml` nor gcloud name one.
const DEFAULT_REGION: &str = "us-central1";

/// Everything later steps need to know about the deployment.
#[derive(Debug, Clone)]
pub(crate) struct DeployContext {
    pub target: DeployTarget,
    pub names: ResourceNames,
    pub service_url: String,
}

/// Result of a successful deploy pipeline run.
pub(crate) struct DeployOutcome {
    pub context: DeployContext,
    /// Local files and what happened to each, in the order they were handled.
    pub files: Vec<(String, FileChange)>,
}

/// Run the full deploy pipeline:
/// setup → cloud resources → local files → image and job → automation.
///
/// Every step finds what a previous run created and reuses it, so the
/// pipeline can be re-run after any failure.
///
/// `confirmer` answers the preliminary and service name questions. With
/// `--automate-all` the database instance is created without asking.
pub(crate) async fn run<E: GcloudExecutor>(
    client: &GcloudClient<E>,
    confirmer: &dyn Confirmer,
    project: &DjangoProject,
    config: &DeployConfig,
    options: &DeployOptions,
) -> anyhow::Result<DeployOutcome> {
    tracing::info!("Configuring project for deployment to Cloud Run...");
    client.validate_cli().await?;
    confirm_or_decline(confirmer, messages::CONFIRM_PRELIMINARY, messages::CANCEL_CLOUDRUN)?;
    tracing::info!("  Continuing with Cloud Run deployment...");
    if options.automate_all {
        tracing::info!("{}", messages::AUTOMATE_ALL);
    }

    // Setup
    let target = resolve_target(client, config, options).await?;
    let service = resolve_service_name(confirmer, project, config, options)?;
    let names = ResourceNames::new(&service.name, config);

    // Resource creation
    client.enable_apis(&target).await?;
    client.update_iam(&target).await?;
    client.ensure_service(&target, &names).await?;
    let service_url = client.service_url(&target, &names).await?;
    let context = DeployContext {
        target,
        names,
        service_url,
    };
    let DeployContext { target, names, .. } = &context;

    client.ensure_env_flag(target, names).await?;
    client.ensure_registry(target, names).await?;
    tracing::info!("Generating a new secret key...");
    client
        .ensure_secret(
            target,
            names,
            &names.secret_key_secret,
            &random_secret(SECRET_KEY_LENGTH),
            "SECRET_KEY",
        )
        .await?;
    let instance_confirmer: &dyn Confirmer = if options.automate_all {
        &AutoApprove
    } else {
        confirmer
    };
    client.ensure_instance(target, names, instance_confirmer).await?;
    client.ensure_database(target, names).await?;
    client.ensure_user_and_secret(target, names).await?;
    client.attach_database(target, names).await?;

    // Configuration
    let files = configure_project(&context, project)?;

    // Generation
    client.ensure_image(target, names).await?;
    client.ensure_migrate_job(target, names).await?;

    if options.automate_all {
        git::commit_all(&project.git_root, messages::COMMIT_MESSAGE)?;
        tracing::info!("Deploying to Cloud Run...");
        client.submit_build(target).await?;
        tracing::info!("  Open the deployed app: {}", context.service_url);
    }

    Ok(DeployOutcome { context, files })
}

fn confirm_or_decline(
    confirmer: &dyn Confirmer,
    message: &str,
    cancel: &str,
) -> anyhow::Result<()> {
    if confirmer.confirm(message)? {
        Ok(())
    } else {
        Err(Declined::new(cancel).into())
    }
}

async fn resolve_target<E: GcloudExecutor>(
    client: &GcloudClient<E>,
    config: &DeployConfig,
    options: &DeployOptions,
) -> anyhow::Result<DeployTarget> {
    tracing::info!("Finding active Google Cloud project...");
    let project_id = match &config.project.gcp_project_id {
        Some(id) => id.clone(),
        None => client.active_project().await?,
    };
    let project_number = client.project_number(&project_id).await?;
    tracing::info!("  Found Google Cloud project: {project_id}, num: {project_number}");

    tracing::info!("Finding configured Cloud Run region...");
    let region = match options.region.as_ref().or(config.project.region.as_ref()) {
        Some(region) => region.clone(),
        None => match client.configured_region().await? {
            Some(region) => {
                tracing::info!("  Using gcloud configured region.");
                region
            }
            None => {
                tracing::info!("  No configuration found. Using '{DEFAULT_REGION}'.");
                DEFAULT_REGION.to_owned()
            }
        },
    };
    tracing::info!("  Using region: {region}");

    Ok(DeployTarget {
        project_id,
        project_number,
        region,
    })
}

fn resolve_service_name(
    confirmer: &dyn Confirmer,
    project: &DjangoProject,
    config: &DeployConfig,
    options: &DeployOptions,
) -> anyhow::Result<ServiceName> {
    tracing::info!("Using Django project name to determine Cloud Run service name...");
    let source = match (&options.deployed_project_name, &config.project.service_name) {
        (Some(name), _) | (None, Some(name)) => name.as_str(),
        (None, None) => project.name.as_str(),
    };

    let service = ServiceName::derive(source);
    if service.needs_confirmation() {
        confirm_or_decline(
            confirmer,
            &messages::confirm_service_name(&service.source, &service.name),
            messages::CANCEL_SERVICE_NAME,
        )?;
    }
    tracing::info!(
        "  Django project: {}. Cloud Run service: {}",
        service.source,
        service.name
    );
    Ok(service)
}

/// Write the files a buildpacks deployment reads.
fn configure_project(
    context: &DeployContext,
    project: &DjangoProject,
) -> anyhow::Result<Vec<(String, FileChange)>> {
    let DeployContext { target, names, .. } = context;
    let venv = std::env::var_os("VIRTUAL_ENV").map(PathBuf::from);
    let image = names.image(target);

    let files = vec![
        (
            procfile::FILE_NAME.to_owned(),
            procfile::ensure_procfile(project)?,
        ),
        (
            ignore::GCLOUDIGNORE.to_owned(),
            ignore::ensure_gcloudignore(&project.git_root, venv.as_deref())?,
        ),
        (
            cloudbuild::FILE_NAME.to_owned(),
            cloudbuild::ensure_cloudbuild(
                &project.git_root,
                &CloudBuildParams {
                    service: &names.service,
                    region: &target.region,
                    image: &image,
                    job: &names.job,
                },
            )?,
        ),
        (
            project.settings_path.display().to_string(),
            settings::ensure_settings(&project.settings_path, &context.service_url)?,
        ),
        (
            "dependencies".to_owned(),
            packages::ensure_packages(&project.dependency_file)?,
        ),
    ];
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use djdeploy_cloud::{CommandOutput, ConfirmError, GcloudError};
    use std::process::Command;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const MANAGE_PY: &str = r#"import os
if __name__ == "__main__":
    os.environ.setdefault("DJANGO_SETTINGS_MODULE", "blog.settings")
"#;

    const URL: &str = "https://blog-abc123-uc.a.run.app";

    /// gcloud stand-in that remembers what has been created.
    #[derive(Default)]
    struct FakeGcloud {
        created: Mutex<HashSet<String>>,
        commands: Mutex<Vec<Vec<String>>>,
    }

    impl FakeGcloud {
        fn has(&self, key: &str) -> bool {
            self.created.lock().unwrap().contains(key)
        }

        fn add(&self, key: String) {
            self.created.lock().unwrap().insert(key);
        }

        fn take_commands(&self) -> Vec<Vec<String>> {
            std::mem::take(&mut *self.commands.lock().unwrap())
        }

        /// Stdout of a list probe: the name when it exists, else gcloud's
        /// empty-list notice on stderr.
        fn list(&self, key: &str, name: &str) -> CommandOutput {
            if self.has(key) {
                CommandOutput::ok(name)
            } else {
                CommandOutput::new(0, "", "Listed 0 items.")
            }
        }

        fn respond(&self, args: &[String]) -> CommandOutput {
            let words: Vec<&str> = args.iter().map(String::as_str).collect();
            let flag = |name: &str| {
                words
                    .iter()
                    .position(|w| *w == name)
                    .and_then(|i| words.get(i + 1))
                    .copied()
                    .unwrap_or_default()
            };
            let filtered = flag("--filter").trim_start_matches("name:");

            match words.as_slice() {
                ["version", ..] => CommandOutput::ok("Google Cloud SDK 495.0.0"),
                ["config", "get-value", "project", ..] => CommandOutput::ok("my-proj"),
                ["config", "get-value", "run/region", ..] => CommandOutput::new(0, "", "(unset)"),
                ["projects", "describe", ..] => CommandOutput::ok("123456"),
                ["run", "services", "describe", name, ..] => {
                    let key = format!("service:{name}");
                    match flag("--format") {
                        _ if !self.has(&key) => CommandOutput::failed(1, "Cannot find service"),
                        "value(status.url)" => CommandOutput::ok(URL),
                        "value(spec.template.spec.containers[0].env)" => {
                            if self.has("env:ON_CLOUDRUN") {
                                CommandOutput::ok("{'name': 'ON_CLOUDRUN', 'value': '1'}")
                            } else {
                                CommandOutput::ok("")
                            }
                        }
                        _ => CommandOutput::ok(name),
                    }
                }
                ["run", "deploy", name, ..] => {
                    self.add(format!("service:{name}"));
                    CommandOutput::ok("")
                }
                ["run", "services", "update", ..] => {
                    if words.contains(&"--update-env-vars") {
                        self.add("env:ON_CLOUDRUN".to_owned());
                    }
                    CommandOutput::ok("")
                }
                ["artifacts", "repositories", "list", ..] => self.list("registry", "containers"),
                ["artifacts", "repositories", "create", ..] => {
                    self.add("registry".to_owned());
                    CommandOutput::ok("")
                }
                ["artifacts", "docker", "images", "list", ..] => self.list(
                    "image",
                    "us-central1-docker.pkg.dev/my-proj/containers/blog",
                ),
                ["secrets", "list", ..] => self.list(&format!("secret:{filtered}"), filtered),
                ["secrets", "create", name, ..] => {
                    self.add(format!("secret:{name}"));
                    CommandOutput::ok("")
                }
                ["sql", "instances", "list", ..] => self.list("instance", filtered),
                ["sql", "databases", "list", ..] => self.list("database", "dj-db"),
                ["sql", "databases", "create", ..] => {
                    self.add("database".to_owned());
                    CommandOutput::ok("")
                }
                ["sql", "users", "list", ..] => self.list("user", filtered),
                ["sql", "users", "create", ..] => {
                    self.add("user".to_owned());
                    CommandOutput::ok("")
                }
                ["run", "jobs", "describe", ..] => {
                    if self.has("job") {
                        CommandOutput::ok("migrate")
                    } else {
                        CommandOutput::failed(1, "Job not found")
                    }
                }
                ["run", "jobs", "create", ..] => {
                    self.add("job".to_owned());
                    CommandOutput::ok("")
                }
                _ => CommandOutput::ok(""),
            }
        }
    }

    impl GcloudExecutor for FakeGcloud {
        async fn exec(&self, args: &[String]) -> Result<CommandOutput, GcloudError> {
            self.commands.lock().unwrap().push(args.to_vec());
            Ok(self.respond(args))
        }

        async fn exec_streaming(&self, args: &[String]) -> Result<i32, GcloudError> {
            self.commands.lock().unwrap().push(args.to_vec());
            match args.first().map(String::as_str) {
                Some("sql") => self.add("instance".to_owned()),
                Some("builds") if args.iter().any(|a| a == "--pack") => {
                    self.add("image".to_owned())
                }
                _ => {}
            }
            Ok(0)
        }
    }

    struct Decline;

    impl Confirmer for Decline {
        fn confirm(&self, _message: &str) -> Result<bool, ConfirmError> {
            Ok(false)
        }
    }

    /// Approves everything and keeps each question.
    #[derive(Default)]
    struct Recording {
        asked: Mutex<Vec<String>>,
    }

    impl Confirmer for Recording {
        fn confirm(&self, message: &str) -> Result<bool, ConfirmError> {
            self.asked.lock().unwrap().push(message.to_owned());
            Ok(true)
        }
    }

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {args:?} failed");
        String::from_utf8_lossy(&output.stdout).trim().to_owned()
    }

    fn init_git(dir: &Path) {
        git(dir, &["init"]);
        git(dir, &["config", "user.email", "test@test.com"]);
        git(dir, &["config", "user.name", "Test"]);
        git(dir, &["add", "."]);
        git(dir, &["commit", "-m", "init"]);
    }

    fn django_project(root: &Path) -> DjangoProject {
        std::fs::create_dir_all(root.join("blog")).unwrap();
        std::fs::write(root.join("manage.py"), MANAGE_PY).unwrap();
        std::fs::write(root.join("blog/settings.py"), "DEBUG = True\n").unwrap();
        std::fs::write(root.join("requirements.txt"), "django\n").unwrap();
        DjangoProject::discover(root).unwrap()
    }

    fn is_create(args: &[String]) -> bool {
        args.iter().any(|a| a == "create")
            || args.starts_with(&["run".to_owned(), "deploy".to_owned()])
            || args.iter().any(|a| a == "--pack")
    }

    #[tokio::test]
    async fn second_run_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());
        let config = DeployConfig::default();
        let options = DeployOptions::default();

        let first = run(&client, &AutoApprove, &project, &config, &options)
            .await
            .unwrap();
        assert!(first.files.iter().all(|(_, change)| change.changed()));
        let commands = client_commands(&client);
        let creates = commands.iter().filter(|c| is_create(c)).count();
        // service, registry, secret key, instance, database, user, url secret, image, job
        assert_eq!(creates, 9);

        let settings_after_first = std::fs::read_to_string(&project.settings_path).unwrap();

        let second = run(&client, &AutoApprove, &project, &config, &options)
            .await
            .unwrap();
        let commands = client_commands(&client);
        let creates: Vec<_> = commands.iter().filter(|c| is_create(c)).collect();
        assert!(creates.is_empty(), "second run created: {creates:?}");
        assert!(second.files.iter().all(|(_, change)| *change == FileChange::Kept));
        assert_eq!(
            std::fs::read_to_string(&project.settings_path).unwrap(),
            settings_after_first
        );
    }

    #[tokio::test]
    async fn context_carries_resolved_target() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());

        let outcome = run(
            &client,
            &AutoApprove,
            &project,
            &DeployConfig::default(),
            &DeployOptions::default(),
        )
        .await
        .unwrap();

        let context = outcome.context;
        assert_eq!(context.target.project_id, "my-proj");
        assert_eq!(context.target.project_number, "123456");
        assert_eq!(context.target.region, DEFAULT_REGION);
        assert_eq!(context.names.service, "blog");
        assert_eq!(context.service_url, URL);

        let procfile = std::fs::read_to_string(tmp.path().join("Procfile")).unwrap();
        assert!(procfile.starts_with("web: gunicorn blog.wsgi"));
        let requirements = std::fs::read_to_string(tmp.path().join("requirements.txt")).unwrap();
        assert!(requirements.contains("dj-database-url"));
    }

    #[tokio::test]
    async fn flags_override_region_and_service_name() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());
        let options = DeployOptions {
            region: Some("europe-west1".to_owned()),
            deployed_project_name: Some("my_blog".to_owned()),
            ..Default::default()
        };

        let outcome = run(&client, &AutoApprove, &project, &DeployConfig::default(), &options)
            .await
            .unwrap();

        assert_eq!(outcome.context.target.region, "europe-west1");
        assert_eq!(outcome.context.names.service, "my-blog");
        let commands = client_commands(&client);
        assert!(
            !commands
                .iter()
                .any(|c| c.iter().any(|a| a == "run/region")),
            "region flag must skip the gcloud lookup"
        );
    }

    #[tokio::test]
    async fn declined_preliminary_stops_before_any_resource() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());

        let err = run(
            &client,
            &Decline,
            &project,
            &DeployConfig::default(),
            &DeployOptions::default(),
        )
        .await
        .err()
        .unwrap();

        let declined = err.downcast_ref::<Declined>().unwrap();
        assert_eq!(declined.message, messages::CANCEL_CLOUDRUN);
        assert_eq!(client_commands(&client), vec![vec!["version".to_owned()]]);
        assert!(!tmp.path().join("Procfile").exists());
    }

    #[tokio::test]
    async fn transliterated_name_declined_asks_for_override() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());
        let options = DeployOptions {
            deployed_project_name: Some("mon_projét".to_owned()),
            ..Default::default()
        };

        /// Approves everything except the service name.
        struct NameDecline;
        impl Confirmer for NameDecline {
            fn confirm(&self, message: &str) -> Result<bool, ConfirmError> {
                Ok(!message.contains("mon-projet"))
            }
        }

        let err = run(&client, &NameDecline, &project, &DeployConfig::default(), &options)
            .await
            .err()
            .unwrap();

        let declined = err.downcast_ref::<Declined>().unwrap();
        assert!(declined.message.contains("--deployed-project-name"));
    }

    #[tokio::test]
    async fn automate_all_commits_and_submits_build() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        init_git(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());
        let confirmer = Recording::default();
        let options = DeployOptions {
            automate_all: true,
            ..Default::default()
        };

        let outcome = run(&client, &confirmer, &project, &DeployConfig::default(), &options)
            .await
            .unwrap();

        assert_eq!(git(tmp.path(), &["log", "-1", "--format=%s"]), messages::COMMIT_MESSAGE);
        assert_eq!(git(tmp.path(), &["status", "--porcelain"]), "");

        let commands = client_commands(&client);
        let submits: Vec<_> = commands
            .iter()
            .filter(|c| c.starts_with(&["builds".to_owned(), "submit".to_owned()]))
            .collect();
        assert_eq!(submits.len(), 2, "image build and deploy build: {submits:?}");
        let deploy_build = submits.last().unwrap();
        assert!(!deploy_build.iter().any(|a| a == "--pack"));
        assert!(deploy_build.iter().any(|a| a == "my-proj"));

        assert_eq!(outcome.context.service_url, URL);
        assert!(messages::success_automate_all(&outcome.context.service_url).contains(URL));
    }

    #[tokio::test]
    async fn automate_all_still_asks_before_deploying() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        init_git(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());
        let confirmer = Recording::default();
        let options = DeployOptions {
            automate_all: true,
            deployed_project_name: Some("mon_projét".to_owned()),
            ..Default::default()
        };

        run(&client, &confirmer, &project, &DeployConfig::default(), &options)
            .await
            .unwrap();

        let asked = confirmer.asked.lock().unwrap();
        assert_eq!(asked.len(), 2, "{asked:?}");
        assert_eq!(asked[0], messages::CONFIRM_PRELIMINARY);
        assert!(asked[1].contains("mon-projet"));
        assert!(!asked.iter().any(|m| m.contains("Postgres instance")));
    }

    #[tokio::test]
    async fn instance_creation_asks_without_automate_all() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());
        let confirmer = Recording::default();

        run(
            &client,
            &confirmer,
            &project,
            &DeployConfig::default(),
            &DeployOptions::default(),
        )
        .await
        .unwrap();

        let asked = confirmer.asked.lock().unwrap();
        assert_eq!(asked.len(), 2, "{asked:?}");
        assert!(asked[1].contains("Postgres instance"));
        assert!(asked[1].contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn automate_all_declined_name_stops_deploy() {
        let tmp = TempDir::new().unwrap();
        let project = django_project(tmp.path());
        let client = GcloudClient::with_executor(FakeGcloud::default());
        let options = DeployOptions {
            automate_all: true,
            deployed_project_name: Some("mon_projét".to_owned()),
            ..Default::default()
        };

        struct NameDecline;
        impl Confirmer for NameDecline {
            fn confirm(&self, message: &str) -> Result<bool, ConfirmError> {
                Ok(!message.contains("mon-projet"))
            }
        }

        let err = run(&client, &NameDecline, &project, &DeployConfig::default(), &options)
            .await
            .err()
            .unwrap();

        assert!(err.downcast_ref::<Declined>().is_some());
        assert!(!client_commands(&client).iter().any(|c| is_create(c)));
    }

    fn client_commands(client: &GcloudClient<FakeGcloud>) -> Vec<Vec<String>> {
        client.executor().take_commands()
    }
}
