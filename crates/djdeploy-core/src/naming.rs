//! Resource naming for a deployment.
//!
//! Every remote resource is identified by a name derived from the service
//! name and `djdeploy.toml`. [`DeployTarget`] holds what `gcloud` reports
//! about the active project; [`ResourceNames`] holds the names derived from it.

use crate::config::DeployConfig;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Postgres caps identifiers at 63 bytes; the Cloud SQL socket path counts.
pub const POSTGRES_MAX_NAME_LENGTH: usize = 63;

/// Everything except unreserved characters is encoded, including `/` and `:`.
const SOCKET_HOST: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A Cloud Run service name derived from a Django project name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceName {
    /// The name the user gave (Django project name or override)
    pub source: String,
    /// The name used for the Cloud Run service
    pub name: String,
    hyphenated: String,
}

impl ServiceName {
    /// Cloud Run service names must be valid Kubernetes object names, while
    /// Django project names are Python identifiers. Underscores become hyphens,
    /// non-ASCII characters are transliterated and the result is lowercased.
    pub fn derive(project_name: &str) -> Self {
        let hyphenated = project_name.replace('_', "-");
        let name = deunicode::deunicode(&hyphenated).to_ascii_lowercase();
        Self {
            source: project_name.to_owned(),
            name,
            hyphenated,
        }
    }

    /// Transliteration or lowercasing changed the name beyond the underscore
    /// swap, so the user has to approve it.
    pub fn needs_confirmation(&self) -> bool {
        self.name != self.hyphenated
    }
}

/// The GCP project and region a deployment goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    pub project_id: String,
    pub project_number: String,
    pub region: String,
}

impl DeployTarget {
    /// Default compute service account that Cloud Run revisions run as.
    pub fn compute_service_account(&self) -> String {
        format!("{}-compute@developer.gserviceaccount.com", self.project_number)
    }

    /// Cloud Build service account.
    pub fn cloudbuild_service_account(&self) -> String {
        format!("{}@cloudbuild.gserviceaccount.com", self.project_number)
    }
}

/// Names of every resource a deployment creates or reuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub service: String,
    pub registry: String,
    pub instance: String,
    pub database: String,
    pub database_user: String,
    pub database_version: String,
    pub instance_cpu: u32,
    pub instance_memory: String,
    pub secret_key_secret: String,
    pub database_url_secret: String,
    pub job: String,
}

impl ResourceNames {
    pub fn new(service: &str, config: &DeployConfig) -> Self {
        Self {
            service: service.to_owned(),
            registry: config.artifacts.registry.clone(),
            instance: config.database.instance.clone(),
            database: config.database.name.clone(),
            database_user: config.database.user.clone(),
            database_version: config.database.version.clone(),
            instance_cpu: config.database.cpu,
            instance_memory: config.database.memory.clone(),
            secret_key_secret: format!("cloud-run-{service}-secret-key"),
            database_url_secret: format!("cloud-run-{service}-database-url"),
            job: config.job.name.clone(),
        }
    }

    /// `project:region:instance`, as accepted by `--set-cloudsql-instances`.
    pub fn instance_connection_name(&self, target: &DeployTarget) -> String {
        format!(
            "{}:{}:{}",
            target.project_id, target.region, self.instance
        )
    }

    /// Unix socket path Cloud Run mounts for the instance.
    pub fn socket_dir(&self, target: &DeployTarget) -> String {
        format!("/cloudsql/{}", self.instance_connection_name(target))
    }

    /// Full socket path including the database, which Postgres limits to
    /// [`POSTGRES_MAX_NAME_LENGTH`].
    pub fn socket_path(&self, target: &DeployTarget) -> String {
        format!("{}/{}", self.socket_dir(target), self.database)
    }

    /// Artifact Registry path, e.g. `us-central1-docker.pkg.dev/proj/containers`.
    pub fn registry_path(&self, target: &DeployTarget) -> String {
        format!(
            "{}-docker.pkg.dev/{}/{}",
            target.region, target.project_id, self.registry
        )
    }

    /// Container image reference for the service.
    pub fn image(&self, target: &DeployTarget) -> String {
        format!("{}/{}", self.registry_path(target), self.service)
    }

    /// `DATABASE_URL` for connecting over the Cloud SQL socket.
    ///
    /// dj-database-url needs the socket host percent-encoded, slashes included.
    pub fn database_url(&self, target: &DeployTarget, password: &str) -> String {
        let dir = self.socket_dir(target);
        let host = utf8_percent_encode(&dir, SOCKET_HOST);
        format!(
            "postgres://{user}:{password}@{host}/{database}",
            user = self.database_user,
            database = self.database,
        )
    }
}
