use crate::command::GcloudCommand;
use crate::confirm::{ConfirmError, Confirmer, Declined};
use crate::executor::{CommandOutput, GcloudExecutor, RealExecutor};
use crate::gcloud::GcloudError;
use crate::inspector::{Presence, Resource, ResourceInspector, TextInspector};
use djdeploy_core::{
    DeployTarget, PASSWORD_LENGTH, POSTGRES_MAX_NAME_LENGTH, ResourceNames, random_secret,
};
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;

/// Env var that marks the deployed environment for the project's settings.
pub const DEPLOYED_ENV_VAR: &str = "ON_CLOUDRUN";

/// Image used for the first revision, so the service exists before the
/// project's own image is built.
pub const PLACEHOLDER_IMAGE: &str = "gcr.io/cloudrun/hello";

/// APIs enabled before any resource is created.
pub const REQUIRED_APIS: &[(&str, &str)] = &[
    ("Cloud Run", "run.googleapis.com"),
    ("IAM", "iam.googleapis.com"),
    ("Compute Engine", "compute.googleapis.com"),
    ("Cloud SQL", "sql-component.googleapis.com"),
    ("Cloud SQL Admin", "sqladmin.googleapis.com"),
    ("Cloud Build", "cloudbuild.googleapis.com"),
    ("Artifact Registry", "artifactregistry.googleapis.com"),
    ("Cloud Resource Manager", "cloudresourcemanager.googleapis.com"),
    ("Secret Manager", "secretmanager.googleapis.com"),
];

const CANCEL_NO_INSTANCE: &str = "A database instance is required for deployment. You may be able to create a database instance
manually, and configure it to work with this app.";

/// Whether a provisioner found the resource or made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Existing,
    Created,
}

/// GCP operations client, parameterized over the executor for testability.
pub struct GcloudClient<E: GcloudExecutor = RealExecutor> {
    executor: E,
    inspector: Box<dyn ResourceInspector>,
}

impl GcloudClient<RealExecutor> {
    pub fn new() -> Self {
        Self::with_executor(RealExecutor)
    }
}

impl Default for GcloudClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: GcloudExecutor> GcloudClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            inspector: Box::new(TextInspector),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Replace the probe output parser.
    pub fn with_inspector(mut self, inspector: Box<dyn ResourceInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    // ── Command runner ──

    /// Run a buffered command. A non-zero exit is returned, not raised.
    pub async fn run(&self, cmd: &GcloudCommand) -> Result<CommandOutput, GcloudError> {
        log_command(cmd);
        let output = self.executor.exec(cmd.as_args()).await?;

        if output.success() {
            tracing::debug!(
                code = output.code,
                stdout = %output.stdout,
                stderr = %output.stderr,
                "command succeeded"
            );
        } else {
            tracing::debug!(
                code = output.code,
                stdout = %output.stdout,
                stderr = %output.stderr,
                "command failed"
            );
        }
        Ok(output)
    }

    /// Run a buffered command that must succeed.
    pub async fn run_checked(&self, cmd: &GcloudCommand) -> Result<CommandOutput, GcloudError> {
        let output = self.run(cmd).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(GcloudError::CommandFailed {
                command: cmd.to_string(),
                code: output.code,
                stderr: output.stderr,
            })
        }
    }

    /// Run a long command with live output. It must succeed.
    pub async fn run_streaming(&self, cmd: &GcloudCommand) -> Result<(), GcloudError> {
        log_command(cmd);
        let code = self.executor.exec_streaming(cmd.as_args()).await?;
        tracing::debug!(code, "streamed command finished");

        if code == 0 {
            Ok(())
        } else {
            Err(GcloudError::CommandFailed {
                command: cmd.to_string(),
                code,
                stderr: "see output above".to_owned(),
            })
        }
    }

    // ── Probes ──

    /// Check whether `resource` exists in the target project.
    ///
    /// Only a failure to run gcloud at all is an error; every command outcome
    /// is classified.
    pub async fn probe(
        &self,
        target: &DeployTarget,
        resource: &Resource,
    ) -> Result<Presence, GcloudError> {
        let cmd = self
            .inspector
            .probe_command(resource)
            .flag("--project", &target.project_id);
        let output = self.run(&cmd).await?;
        let presence = self.inspector.classify(resource, &output);

        match presence {
            Presence::Present => tracing::info!("  Found {resource}."),
            Presence::Absent => tracing::info!("  No {resource} found."),
            Presence::Unexpected => tracing::info!(
                "  Found a {kind}, but not {id}.",
                kind = resource.kind(),
                id = resource.identifier()
            ),
        }

        Ok(presence)
    }

    // ── Setup ──

    /// Make sure the gcloud CLI can run.
    pub async fn validate_cli(&self) -> Result<(), PreflightError> {
        match self.run(&GcloudCommand::new(["version"])).await {
            Ok(out) if out.success() => Ok(()),
            _ => Err(PreflightError::GcloudNotInstalled),
        }
    }

    /// Active project from the gcloud configuration.
    pub async fn active_project(&self) -> Result<String, PreflightError> {
        let out = self
            .run(&GcloudCommand::new(["config", "get-value", "project"]))
            .await?;
        config_value(&out).ok_or(PreflightError::NoProjectId)
    }

    pub async fn project_number(&self, project_id: &str) -> Result<String, PreflightError> {
        let out = self
            .run(
                &GcloudCommand::new(["projects", "describe", project_id])
                    .flag("--format", "value(projectNumber)"),
            )
            .await?;
        match config_value(&out) {
            Some(number) => Ok(number),
            None => Err(PreflightError::ProjectNotAccessible(project_id.to_owned())),
        }
    }

    /// Region from `gcloud config get-value run/region`, if one is set.
    pub async fn configured_region(&self) -> Result<Option<String>, GcloudError> {
        let out = self
            .run(&GcloudCommand::new(["config", "get-value", "run/region"]))
            .await?;
        Ok(config_value(&out))
    }

    // ── Project-level setup ──

    pub async fn enable_apis(&self, target: &DeployTarget) -> Result<(), ProvisionError> {
        tracing::info!("Enabling Google Cloud APIs...");
        let cmd = REQUIRED_APIS
            .iter()
            .fold(GcloudCommand::new(["services", "enable"]), |cmd, (_, api)| {
                cmd.arg(*api)
            })
            .flag("--project", &target.project_id);
        self.run_checked(&cmd).await?;
        tracing::info!("  APIs enabled.");
        Ok(())
    }

    /// Let Cloud Build act as the runtime service account and deploy to Cloud Run.
    pub async fn update_iam(&self, target: &DeployTarget) -> Result<(), ProvisionError> {
        tracing::info!("Configuring IAM...");
        let cloudbuild_member = format!("serviceAccount:{}", target.cloudbuild_service_account());

        self.run_checked(
            &GcloudCommand::new(["iam", "service-accounts", "add-iam-policy-binding"])
                .arg(target.compute_service_account())
                .flag("--member", &cloudbuild_member)
                .flag("--role", "roles/iam.serviceAccountUser")
                .flag("--project", &target.project_id),
        )
        .await?;

        self.run_checked(
            &GcloudCommand::new(["projects", "add-iam-policy-binding", target.project_id.as_str()])
                .flag("--member", &cloudbuild_member)
                .flag("--role", "roles/run.developer"),
        )
        .await?;

        tracing::info!("  Updated IAM.");
        Ok(())
    }

    // ── Cloud Run service ──

    /// Create the service with a placeholder revision if it does not exist,
    /// so later steps can configure it.
    pub async fn ensure_service(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("Creating placeholder service...");
        let service = Resource::Service {
            name: names.service.clone(),
            region: target.region.clone(),
        };
        if self.probe(target, &service).await?.exists() {
            return Ok(Provisioned::Existing);
        }

        let out = self
            .run_checked(
                &GcloudCommand::new(["run", "deploy", names.service.as_str()])
                    .flag("--region", &target.region)
                    .flag("--image", PLACEHOLDER_IMAGE)
                    .arg("--allow-unauthenticated")
                    .flag("--project", &target.project_id),
            )
            .await?;
        tracing::info!("{}", out.stdout);
        tracing::info!("  Placeholder service created.");
        Ok(Provisioned::Created)
    }

    pub async fn service_url(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<String, ProvisionError> {
        tracing::info!("Getting Cloud Run service URL...");
        let out = self
            .run_checked(
                &GcloudCommand::new(["run", "services", "describe", names.service.as_str()])
                    .flag("--region", &target.region)
                    .flag("--format", "value(status.url)")
                    .flag("--project", &target.project_id),
            )
            .await?;

        if out.stdout.is_empty() {
            return Err(ProvisionError::ServiceUrlMissing {
                service: names.service.clone(),
            });
        }
        tracing::info!("  {}", out.stdout);
        Ok(out.stdout)
    }

    /// Set [`DEPLOYED_ENV_VAR`] on the service.
    pub async fn ensure_env_flag(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("Setting {DEPLOYED_ENV_VAR} envvar...");
        let env = Resource::ServiceEnv {
            service: names.service.clone(),
            region: target.region.clone(),
            var: DEPLOYED_ENV_VAR.to_owned(),
        };
        if self.probe(target, &env).await?.exists() {
            return Ok(Provisioned::Existing);
        }

        self.run_checked(
            &GcloudCommand::new(["run", "services", "update", names.service.as_str()])
                .flag("--region", &target.region)
                .flag("--update-env-vars", format!("{DEPLOYED_ENV_VAR}=1"))
                .flag("--project", &target.project_id),
        )
        .await?;
        tracing::info!("  Set {DEPLOYED_ENV_VAR} envvar.");
        Ok(Provisioned::Created)
    }

    // ── Artifact Registry ──

    pub async fn ensure_registry(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("Creating an Artifact Registry...");
        let repo = Resource::ArtifactRepo {
            name: names.registry.clone(),
            region: target.region.clone(),
        };
        if self.probe(target, &repo).await?.exists() {
            return Ok(Provisioned::Existing);
        }

        self.run_checked(
            &GcloudCommand::new(["artifacts", "repositories", "create", names.registry.as_str()])
                .flag("--repository-format", "docker")
                .flag("--location", &target.region)
                .flag("--project", &target.project_id),
        )
        .await?;
        tracing::info!("  Created Artifact Registry.");
        Ok(Provisioned::Created)
    }

    // ── Secret Manager ──

    /// Create the secret if missing, let the runtime service account read it,
    /// and mount it on the service as `env_var`.
    ///
    /// The payload goes through an owner-only temporary file that is removed
    /// as soon as gcloud has read it.
    pub async fn ensure_secret(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
        secret_name: &str,
        value: &SecretString,
        env_var: &str,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("Creating secret {secret_name} as {env_var}...");
        let secret = Resource::Secret {
            name: secret_name.to_owned(),
        };

        let provisioned = if self.probe(target, &secret).await?.exists() {
            Provisioned::Existing
        } else {
            let mut payload = tempfile::NamedTempFile::new()
                .map_err(|e| ProvisionError::SecretFile { source: e })?;
            payload
                .write_all(value.expose_secret().as_bytes())
                .map_err(|e| ProvisionError::SecretFile { source: e })?;
            payload
                .flush()
                .map_err(|e| ProvisionError::SecretFile { source: e })?;

            let result = self
                .run_checked(
                    &GcloudCommand::new(["secrets", "create", secret_name])
                        .flag("--data-file", payload.path().to_string_lossy())
                        .flag("--replication-policy", "automatic")
                        .flag("--project", &target.project_id),
                )
                .await;
            payload
                .close()
                .map_err(|e| ProvisionError::SecretFile { source: e })?;
            result?;

            tracing::info!("  Secret {secret_name} created.");
            Provisioned::Created
        };

        self.run_checked(
            &GcloudCommand::new(["secrets", "add-iam-policy-binding", secret_name])
                .flag(
                    "--member",
                    format!("serviceAccount:{}", target.compute_service_account()),
                )
                .flag("--role", "roles/secretmanager.secretAccessor")
                .flag("--project", &target.project_id),
        )
        .await?;
        tracing::info!("  Permissions updated.");

        self.run_checked(
            &GcloudCommand::new(["run", "services", "update", names.service.as_str()])
                .flag("--region", &target.region)
                .flag("--update-secrets", format!("{env_var}={secret_name}:latest"))
                .flag("--project", &target.project_id),
        )
        .await?;
        tracing::info!("  Assigned secret to service as {env_var}.");

        Ok(provisioned)
    }

    // ── Cloud SQL ──

    /// Create the Postgres instance, asking first. Instance creation takes
    /// minutes, so its output is streamed.
    pub async fn ensure_instance(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
        confirmer: &dyn Confirmer,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("Running database setup...");

        let socket_path = names.socket_path(target);
        if socket_path.len() > POSTGRES_MAX_NAME_LENGTH {
            return Err(ProvisionError::SocketPathTooLong {
                path: socket_path,
                max: POSTGRES_MAX_NAME_LENGTH,
            });
        }

        tracing::info!("  Looking for a Postgres instance...");
        let instance = Resource::SqlInstance {
            name: names.instance.clone(),
        };
        if self.probe(target, &instance).await?.exists() {
            return Ok(Provisioned::Existing);
        }

        let root_password = random_secret(PASSWORD_LENGTH);
        let cmd = GcloudCommand::new(["sql", "instances", "create", names.instance.as_str()])
            .flag("--database-version", &names.database_version)
            .flag("--cpu", names.instance_cpu.to_string())
            .flag("--memory", &names.instance_memory)
            .flag("--region", &target.region)
            .flag("--project", &target.project_id)
            .secret_flag("--root-password", &root_password);

        let message = format!(
            "A Postgres instance is required to continue with deployment. If you confirm this,\n\
             the following command will be run, to create a new instance on your account:\n\
             $ {cmd}"
        );
        if !confirmer.confirm(&message)? {
            return Err(Declined::new(CANCEL_NO_INSTANCE).into());
        }

        tracing::info!("  Creating a new Postgres instance (this may take a while)...");
        self.run_streaming(&cmd).await?;
        tracing::info!("  Created Postgres instance.");
        Ok(Provisioned::Created)
    }

    pub async fn ensure_database(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("  Looking for a database in the instance...");
        let database = Resource::Database {
            name: names.database.clone(),
            instance: names.instance.clone(),
        };
        if self.probe(target, &database).await?.exists() {
            return Ok(Provisioned::Existing);
        }

        self.run_checked(
            &GcloudCommand::new(["sql", "databases", "create", names.database.as_str()])
                .flag("--instance", &names.instance)
                .flag("--project", &target.project_id),
        )
        .await?;
        tracing::info!("  Created Postgres database.");
        Ok(Provisioned::Created)
    }

    /// Create the database user and the secret holding its `DATABASE_URL`
    /// as one step.
    ///
    /// A user without its secret cannot be repaired automatically: the
    /// password is gone, and resetting it could lock out whoever else uses it.
    pub async fn ensure_user_and_secret(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("  Looking for a database username and secret...");
        let user = Resource::DatabaseUser {
            name: names.database_user.clone(),
            instance: names.instance.clone(),
        };
        let secret = Resource::Secret {
            name: names.database_url_secret.clone(),
        };

        let user_exists = self.probe(target, &user).await?.exists();
        let secret_exists = self.probe(target, &secret).await?.exists();

        match (user_exists, secret_exists) {
            (true, true) => {
                tracing::info!("  Database user and secret exist.");
                Ok(Provisioned::Existing)
            }
            (true, false) => Err(ProvisionError::UserWithoutSecret {
                user: names.database_user.clone(),
                instance: names.instance.clone(),
                project: target.project_id.clone(),
            }),
            (false, true) => Err(ProvisionError::SecretWithoutUser {
                secret: names.database_url_secret.clone(),
                user: names.database_user.clone(),
                instance: names.instance.clone(),
                project: target.project_id.clone(),
            }),
            (false, false) => {
                tracing::info!("  Creating new user...");
                let password = random_secret(PASSWORD_LENGTH);
                self.run_checked(
                    &GcloudCommand::new(["sql", "users", "create", names.database_user.as_str()])
                        .flag("--instance", &names.instance)
                        .flag("--project", &target.project_id)
                        .secret_flag("--password", &password),
                )
                .await?;
                tracing::info!("  Created database user.");

                let url =
                    SecretString::from(names.database_url(target, password.expose_secret()));
                self.ensure_secret(
                    target,
                    names,
                    &names.database_url_secret,
                    &url,
                    "DATABASE_URL",
                )
                .await?;
                Ok(Provisioned::Created)
            }
        }
    }

    /// Mount the Cloud SQL socket in the service.
    pub async fn attach_database(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<(), ProvisionError> {
        tracing::info!("  Associating database to service...");
        self.run_checked(
            &GcloudCommand::new(["run", "services", "update", names.service.as_str()])
                .flag("--region", &target.region)
                .flag(
                    "--set-cloudsql-instances",
                    names.instance_connection_name(target),
                )
                .flag("--project", &target.project_id),
        )
        .await?;
        tracing::info!("  Associated database.");
        Ok(())
    }

    // ── Build & jobs ──

    /// Build the project image with buildpacks unless the registry has it.
    pub async fn ensure_image(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("Creating container image...");
        let image = names.image(target);
        let resource = Resource::Image {
            registry: names.registry_path(target),
            image: image.clone(),
        };
        if self.probe(target, &resource).await?.exists() {
            return Ok(Provisioned::Existing);
        }

        self.run_streaming(
            &GcloudCommand::new(["builds", "submit"])
                .flag("--pack", format!("image={image}"))
                .flag("--project", &target.project_id),
        )
        .await?;
        tracing::info!("  Built container image.");
        Ok(Provisioned::Created)
    }

    /// Define the Cloud Run job that runs migrations.
    pub async fn ensure_migrate_job(
        &self,
        target: &DeployTarget,
        names: &ResourceNames,
    ) -> Result<Provisioned, ProvisionError> {
        tracing::info!("Creating migration job definition...");
        let job = Resource::Job {
            name: names.job.clone(),
            region: target.region.clone(),
        };
        if self.probe(target, &job).await?.exists() {
            return Ok(Provisioned::Existing);
        }

        let secrets = format!(
            "DATABASE_URL={}:latest,SECRET_KEY={}:latest",
            names.database_url_secret, names.secret_key_secret
        );
        self.run_checked(
            &GcloudCommand::new(["run", "jobs", "create", names.job.as_str()])
                .flag("--image", names.image(target))
                .flag("--region", &target.region)
                .flag("--set-secrets", secrets)
                .flag(
                    "--set-cloudsql-instances",
                    names.instance_connection_name(target),
                )
                .flag("--set-env-vars", format!("{DEPLOYED_ENV_VAR}=1"))
                .flag("--command", "migrate")
                .flag("--project", &target.project_id),
        )
        .await?;
        tracing::info!("  Created Cloud Run job.");
        Ok(Provisioned::Created)
    }

    /// Run `cloudbuild.yaml` in the current directory.
    pub async fn submit_build(&self, target: &DeployTarget) -> Result<(), ProvisionError> {
        self.run_streaming(
            &GcloudCommand::new(["builds", "submit"]).flag("--project", &target.project_id),
        )
        .await?;
        Ok(())
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    /// Returns a report with pass/fail for each check item.
    pub async fn doctor(&self, project_id: Option<&str>) -> DoctorReport {
        let mut report = DoctorReport::default();

        // 1. gcloud CLI
        match self.run(&GcloudCommand::new(["version"])).await {
            Ok(v) if v.success() => {
                // Parse "Google Cloud SDK X.Y.Z" from first line
                let version = v
                    .stdout
                    .lines()
                    .next()
                    .and_then(|line| line.strip_prefix("Google Cloud SDK "))
                    // arch-lint: allow(no-silent-result-drop) reason="unrecognized version output is shown as-is"
                    .unwrap_or(v.stdout.as_str());
                report.gcloud = CheckResult::ok(version.trim());
            }
            Ok(v) => report.gcloud = CheckResult::fail(&v.stderr),
            Err(e) => report.gcloud = CheckResult::fail(&e.to_string()),
        }

        // 2. Active account
        match self
            .run(&GcloudCommand::new(["config", "get-value", "account"]))
            .await
        {
            Ok(out) => match config_value(&out) {
                Some(account) => report.account = CheckResult::ok(&account),
                None => report.account = CheckResult::fail("no active account"),
            },
            Err(e) => report.account = CheckResult::fail(&e.to_string()),
        }

        // 3. Project
        let pid = match project_id {
            Some(pid) => Some(pid.to_owned()),
            None => match self.active_project().await {
                Ok(pid) => Some(pid),
                Err(e) => {
                    report.project = CheckResult::fail(&e.to_string());
                    None
                }
            },
        };
        let Some(pid) = pid else {
            return report;
        };

        match self
            .run(&GcloudCommand::new(["projects", "describe", pid.as_str()]).flag("--format", "value(name)"))
            .await
        {
            Ok(out) if out.success() => {
                report.project = CheckResult::ok(&format!("{pid} ({})", out.stdout))
            }
            _ => {
                report.project = CheckResult::fail(&format!("{pid} is not accessible"));
                return report;
            }
        }

        // 4. Billing
        match self
            .run(
                &GcloudCommand::new(["billing", "projects", "describe", pid.as_str()])
                    .flag("--format", "value(billingEnabled)"),
            )
            .await
        {
            Ok(out) if out.stdout.eq_ignore_ascii_case("true") => {
                report.billing = CheckResult::ok("Enabled");
            }
            _ => report.billing = CheckResult::fail("Billing not enabled"),
        }

        // 5. Required APIs
        for (label, api) in REQUIRED_APIS {
            let enabled = match self
                .run(
                    &GcloudCommand::new(["services", "list"])
                        .flag("--project", &pid)
                        .flag("--filter", format!("config.name={api}"))
                        .flag("--format", "value(config.name)"),
                )
                .await
            {
                Ok(out) => out.success() && !out.stdout.is_empty(),
                Err(e) => {
                    tracing::debug!(error = %e, api, "api check failed");
                    false
                }
            };

            report.apis.push(ApiCheck {
                name: (*label).to_owned(),
                result: if enabled {
                    CheckResult::ok("Enabled")
                } else {
                    CheckResult::fail("Not enabled (djdeploy deploy enables it)")
                },
            });
        }

        report
    }
}

fn log_command(cmd: &GcloudCommand) {
    tracing::info!("$ {cmd}");
    if cmd.has_secrets() {
        tracing::debug!("secret arguments withheld from the log");
    }
}

/// Value printed by `gcloud config get-value` and similar, if any.
/// gcloud prints `(unset)` on stderr and nothing on stdout for unset keys.
fn config_value(out: &CommandOutput) -> Option<String> {
    if !out.success() || out.stdout.is_empty() || out.stdout == "(unset)" {
        None
    } else {
        Some(out.stdout.clone())
    }
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error(
        "In order to deploy to Cloud Run, you need to install the Google Cloud CLI.
  See here: https://cloud.google.com/sdk/docs/install
After installing the CLI, you can run djdeploy again."
    )]
    GcloudNotInstalled,

    #[error(
        "A Google Cloud project could not be found.

djdeploy expects that you've already created a project to deploy a Cloud Run
service in. If you haven't done so, create a new project with billing enabled:

    https://console.cloud.google.com/projectcreate

Then, configure your gcloud CLI for this project:

    $ gcloud config set project PROJECT_ID

Then run djdeploy again."
    )]
    NoProjectId,

    #[error("GCP project '{0}' is not accessible; check the project ID and your permissions")]
    ProjectNotAccessible(String),

    #[error(transparent)]
    Gcloud(#[from] GcloudError),
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Gcloud(#[from] GcloudError),

    #[error("failed to stage secret payload in a temporary file")]
    SecretFile { source: std::io::Error },

    #[error(transparent)]
    Confirm(#[from] ConfirmError),

    #[error("{0}")]
    Declined(#[from] Declined),

    #[error("Cloud Run service '{service}' has no URL yet")]
    ServiceUrlMissing { service: String },

    #[error(
        "Database user '{user}' exists on instance '{instance}', but no secret stores its password.
djdeploy can't continue without it. Delete the user, then run djdeploy again:

    $ gcloud sql users delete {user} --instance {instance} --project {project}"
    )]
    UserWithoutSecret {
        user: String,
        instance: String,
        project: String,
    },

    #[error(
        "Secret '{secret}' exists, but database user '{user}' does not exist on instance '{instance}'.
Delete the secret, then run djdeploy again:

    $ gcloud secrets delete {secret} --project {project}"
    )]
    SecretWithoutUser {
        secret: String,
        user: String,
        instance: String,
        project: String,
    },

    #[error(
        "The database socket path {path} is longer than {max} characters, which Postgres does not allow.
Choose shorter names in the [database] section of djdeploy.toml."
    )]
    SocketPathTooLong { path: String, max: usize },
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub gcloud: CheckResult,
    pub account: CheckResult,
    pub project: CheckResult,
    pub billing: CheckResult,
    pub apis: Vec<ApiCheck>,
    pub config_file: CheckResult,
    pub django: CheckResult,
}

impl DoctorReport {
    /// API checks are informational: deploy enables missing APIs itself.
    pub fn all_passed(&self) -> bool {
        self.gcloud.passed
            && self.account.passed
            && self.project.passed
            && self.billing.passed
            && self.config_file.passed
            && self.django.passed
    }
}

impl std::fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn row(f: &mut std::fmt::Formatter<'_>, label: &str, check: &CheckResult) -> std::fmt::Result {
            writeln!(f, "  [{}] {label:<24} {}", check.icon(), check.detail)
        }

        writeln!(f, "djdeploy doctor")?;
        writeln!(f)?;
        row(f, "gcloud CLI", &self.gcloud)?;
        row(f, "Active account", &self.account)?;
        row(f, "Project", &self.project)?;
        row(f, "Billing", &self.billing)?;
        for api in &self.apis {
            row(f, &api.name, &api.result)?;
        }
        row(f, "djdeploy.toml", &self.config_file)?;
        row(f, "Django project", &self.django)
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

#[derive(Debug, Clone)]
pub struct ApiCheck {
    pub name: String,
    pub result: CheckResult,
}
