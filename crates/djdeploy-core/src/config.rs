use serde::{Deserialize, Serialize};

/// File name of the optional configuration file, looked up in the git root.
pub const CONFIG_FILE_NAME: &str = "djdeploy.toml";

/// djdeploy.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub job: JobConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Cloud Run service name (defaults to the Django project name)
    pub service_name: Option<String>,
    /// Cloud Run region (falls back to `gcloud config get-value run/region`)
    pub region: Option<String>,
    /// GCP project ID (falls back to `gcloud config get-value project`)
    pub gcp_project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Cloud SQL instance name
    #[serde(default = "default_instance")]
    pub instance: String,
    /// Database name inside the instance
    #[serde(default = "default_database")]
    pub name: String,
    /// Database user created for the app
    #[serde(default = "default_user")]
    pub user: String,
    /// Cloud SQL database version
    #[serde(default = "default_database_version")]
    pub version: String,
    /// Instance CPU count
    #[serde(default = "default_cpu")]
    pub cpu: u32,
    /// Instance memory
    #[serde(default = "default_memory")]
    pub memory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Artifact Registry docker repository name
    #[serde(default = "default_registry")]
    pub registry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Cloud Run job that runs migrations
    #[serde(default = "default_job")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Output format used to detect existing resources
    #[serde(default)]
    pub format: ProbeFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeFormat {
    #[default]
    Text,
    Json,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            name: default_database(),
            user: default_user(),
            version: default_database_version(),
            cpu: default_cpu(),
            memory: default_memory(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            registry: default_registry(),
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self { name: default_job() }
    }
}

impl DeployConfig {
    /// Load from djdeploy.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            Ok(Self::default())
        }
    }
}

fn default_instance() -> String {
    "dj-inst".to_owned()
}

fn default_database() -> String {
    "dj-db".to_owned()
}

fn default_user() -> String {
    "django".to_owned()
}

fn default_database_version() -> String {
    "POSTGRES_14".to_owned()
}

fn default_cpu() -> u32 {
    2
}

fn default_memory() -> String {
    "4GB".to_owned()
}

fn default_registry() -> String {
    "containers".to_owned()
}

fn default_job() -> String {
    "migrate".to_owned()
}
