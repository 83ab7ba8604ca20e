use djdeploy_core::{DeployConfig, ProbeFormat};
use tempfile::TempDir;

#[test]
fn load_returns_defaults_when_no_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = DeployConfig::load(tmp.path()).unwrap();

    assert!(config.project.service_name.is_none());
    assert!(config.project.region.is_none());
    assert!(config.project.gcp_project_id.is_none());
    assert_eq!(config.database.instance, "dj-inst");
    assert_eq!(config.database.name, "dj-db");
    assert_eq!(config.database.user, "django");
    assert_eq!(config.database.version, "POSTGRES_14");
    assert_eq!(config.database.cpu, 2);
    assert_eq!(config.database.memory, "4GB");
    assert_eq!(config.artifacts.registry, "containers");
    assert_eq!(config.job.name, "migrate");
    assert_eq!(config.probe.format, ProbeFormat::Text);
}

#[test]
fn load_parses_full_config() {
    let tmp = TempDir::new().unwrap();
    let toml = r#"
[project]
service_name = "my-blog"
region = "asia-northeast1"
gcp_project_id = "my-gcp-project"

[database]
instance = "blog-inst"
name = "blog-db"
user = "blogger"
version = "POSTGRES_16"
cpu = 1
memory = "3840MiB"

[artifacts]
registry = "images"

[job]
name = "blog-migrate"

[probe]
format = "json"
"#;
    std::fs::write(tmp.path().join("djdeploy.toml"), toml).unwrap();

    let config = DeployConfig::load(tmp.path()).unwrap();

    assert_eq!(config.project.service_name.as_deref(), Some("my-blog"));
    assert_eq!(config.project.region.as_deref(), Some("asia-northeast1"));
    assert_eq!(
        config.project.gcp_project_id.as_deref(),
        Some("my-gcp-project")
    );
    assert_eq!(config.database.instance, "blog-inst");
    assert_eq!(config.database.name, "blog-db");
    assert_eq!(config.database.user, "blogger");
    assert_eq!(config.database.version, "POSTGRES_16");
    assert_eq!(config.database.cpu, 1);
    assert_eq!(config.database.memory, "3840MiB");
    assert_eq!(config.artifacts.registry, "images");
    assert_eq!(config.job.name, "blog-migrate");
    assert_eq!(config.probe.format, ProbeFormat::Json);
}

#[test]
fn load_partial_config_fills_defaults() {
    let tmp = TempDir::new().unwrap();
    let toml = r#"
[database]
instance = "shared-inst"
"#;
    std::fs::write(tmp.path().join("djdeploy.toml"), toml).unwrap();

    let config = DeployConfig::load(tmp.path()).unwrap();

    assert_eq!(config.database.instance, "shared-inst");
    // Defaults preserved
    assert_eq!(config.database.name, "dj-db");
    assert_eq!(config.database.user, "django");
    assert_eq!(config.artifacts.registry, "containers");
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("djdeploy.toml"), "not valid {{{{ toml").unwrap();

    let result = DeployConfig::load(tmp.path());
    assert!(result.is_err());

    let err = result.unwrap_err().to_string();
    assert!(err.contains("parse"));
}

#[test]
fn load_unknown_probe_format_is_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("djdeploy.toml"),
        "[probe]\nformat = \"xml\"\n",
    )
    .unwrap();

    assert!(DeployConfig::load(tmp.path()).is_err());
}

#[test]
fn load_empty_config_returns_defaults() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("djdeploy.toml"), "").unwrap();

    let config = DeployConfig::load(tmp.path()).unwrap();
    assert_eq!(config.job.name, "migrate");
}
