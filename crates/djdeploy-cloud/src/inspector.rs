//! Resource existence probes.
//!
//! A probe runs one read-only gcloud command and classifies its output.
//! All knowledge of gcloud's output format lives behind
//! [`ResourceInspector`], so the text rules can be swapped for
//! structured output without touching the provisioners.
//!
//! Classification is conservative: anything ambiguous resolves to
//! "does not exist", which leads to a create attempt rather than a skipped
//! resource.

use crate::command::GcloudCommand;
use crate::executor::CommandOutput;
use djdeploy_core::ProbeFormat;
use std::fmt;

/// Marker gcloud prints (to stderr) when a list command matches nothing.
pub const EMPTY_LIST_MARKER: &str = "Listed 0 items";

/// A remote resource that can be probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Service { name: String, region: String },
    ServiceEnv {
        service: String,
        region: String,
        var: String,
    },
    ArtifactRepo { name: String, region: String },
    SqlInstance { name: String },
    Database { name: String, instance: String },
    DatabaseUser { name: String, instance: String },
    Secret { name: String },
    Image { registry: String, image: String },
    Job { name: String, region: String },
}

impl Resource {
    /// The string a probe looks for in the command output.
    pub fn identifier(&self) -> &str {
        match self {
            Self::Service { name, .. }
            | Self::ArtifactRepo { name, .. }
            | Self::SqlInstance { name }
            | Self::Database { name, .. }
            | Self::DatabaseUser { name, .. }
            | Self::Secret { name }
            | Self::Job { name, .. } => name,
            Self::ServiceEnv { var, .. } => var,
            Self::Image { image, .. } => image,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Service { .. } => "Cloud Run service",
            Self::ServiceEnv { .. } => "service env var",
            Self::ArtifactRepo { .. } => "Artifact Registry repository",
            Self::SqlInstance { .. } => "Cloud SQL instance",
            Self::Database { .. } => "database",
            Self::DatabaseUser { .. } => "database user",
            Self::Secret { .. } => "secret",
            Self::Image { .. } => "container image",
            Self::Job { .. } => "Cloud Run job",
        }
    }

    /// Resources whose describe command fails when they are missing.
    fn is_described(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::Job { .. })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.identifier())
    }
}

/// Outcome of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Nothing was listed, or the lookup failed.
    Absent,
    /// The output names the resource.
    Present,
    /// Something was listed, but not the resource we expected.
    Unexpected,
}

impl Presence {
    pub fn exists(self) -> bool {
        self == Self::Present
    }
}

/// Turns a [`Resource`] into a probe command and reads the answer.
pub trait ResourceInspector: Send + Sync {
    fn probe_command(&self, resource: &Resource) -> GcloudCommand;

    fn classify(&self, resource: &Resource, output: &CommandOutput) -> Presence;
}

/// Text-matching inspector over gcloud's `value(...)` output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextInspector;

impl ResourceInspector for TextInspector {
    fn probe_command(&self, resource: &Resource) -> GcloudCommand {
        probe_base(resource).flag("--format", text_format(resource))
    }

    fn classify(&self, resource: &Resource, output: &CommandOutput) -> Presence {
        if resource.is_described() {
            return if output.success() {
                Presence::Present
            } else {
                Presence::Absent
            };
        }

        if !output.success()
            || output.stdout.contains(EMPTY_LIST_MARKER)
            || output.stderr.contains(EMPTY_LIST_MARKER)
            || output.stdout.is_empty()
        {
            return Presence::Absent;
        }

        if output.stdout.contains(resource.identifier()) {
            Presence::Present
        } else {
            Presence::Unexpected
        }
    }
}

/// Inspector over gcloud's `--format json` output.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonInspector;

impl ResourceInspector for JsonInspector {
    fn probe_command(&self, resource: &Resource) -> GcloudCommand {
        probe_base(resource).flag("--format", "json")
    }

    fn classify(&self, resource: &Resource, output: &CommandOutput) -> Presence {
        if resource.is_described() {
            return if output.success() {
                Presence::Present
            } else {
                Presence::Absent
            };
        }

        if !output.success() || output.stdout.is_empty() {
            return Presence::Absent;
        }

        let Ok(value) = serde_json::from_str::<serde_json::Value>(&output.stdout) else {
            return Presence::Unexpected;
        };

        let id = resource.identifier();
        let entries = match resource {
            Resource::ServiceEnv { .. } => {
                match value
                    .pointer("/spec/template/spec/containers/0/env")
                    .and_then(|env| env.as_array())
                {
                    Some(env) => env.clone(),
                    None => return Presence::Absent,
                }
            }
            _ => match value.as_array() {
                Some(items) => items.clone(),
                None => return Presence::Unexpected,
            },
        };

        if entries.is_empty() {
            return Presence::Absent;
        }

        let field = match resource {
            Resource::Image { .. } => "package",
            _ => "name",
        };

        let found = entries.iter().any(|entry| {
            entry
                .get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|name| name == id || name.ends_with(&format!("/{id}")))
        });

        if found {
            Presence::Present
        } else {
            Presence::Unexpected
        }
    }
}

/// Inspector for the configured probe output format.
pub fn inspector_for(format: ProbeFormat) -> Box<dyn ResourceInspector> {
    match format {
        ProbeFormat::Text => Box::new(TextInspector),
        ProbeFormat::Json => Box::new(JsonInspector),
    }
}

fn probe_base(resource: &Resource) -> GcloudCommand {
    match resource {
        Resource::Service { name, region } => {
            GcloudCommand::new(["run", "services", "describe"])
                .arg(name)
                .flag("--region", region)
        }
        Resource::ServiceEnv {
            service, region, ..
        } => GcloudCommand::new(["run", "services", "describe"])
            .arg(service)
            .flag("--region", region),
        Resource::ArtifactRepo { region, .. } => {
            GcloudCommand::new(["artifacts", "repositories", "list"]).flag("--location", region)
        }
        Resource::SqlInstance { name } => {
            GcloudCommand::new(["sql", "instances", "list"]).flag("--filter", format!("name:{name}"))
        }
        Resource::Database { instance, .. } => {
            GcloudCommand::new(["sql", "databases", "list"]).flag("--instance", instance)
        }
        Resource::DatabaseUser { name, instance } => GcloudCommand::new(["sql", "users", "list"])
            .flag("--instance", instance)
            .flag("--filter", format!("name:{name}")),
        Resource::Secret { name } => {
            GcloudCommand::new(["secrets", "list"]).flag("--filter", format!("name:{name}"))
        }
        Resource::Image { registry, .. } => {
            GcloudCommand::new(["artifacts", "docker", "images", "list"]).arg(registry)
        }
        Resource::Job { name, region } => GcloudCommand::new(["run", "jobs", "describe"])
            .arg(name)
            .flag("--region", region),
    }
}

fn text_format(resource: &Resource) -> &'static str {
    match resource {
        Resource::Service { .. } | Resource::Job { .. } => "value(metadata.name)",
        Resource::ServiceEnv { .. } => "value(spec.template.spec.containers[0].env)",
        Resource::Image { .. } => "value(package)",
        _ => "value(name)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Resource {
        Resource::SqlInstance {
            name: "dj-inst".to_owned(),
        }
    }

    // ── Text ──

    #[test]
    fn text_empty_marker_is_absent() {
        let out = CommandOutput::new(0, "", "Listed 0 items.");
        assert_eq!(TextInspector.classify(&instance(), &out), Presence::Absent);

        let out = CommandOutput::ok("Listed 0 items.");
        assert_eq!(TextInspector.classify(&instance(), &out), Presence::Absent);
    }

    #[test]
    fn text_identifier_is_present() {
        let out = CommandOutput::ok("dj-inst");
        assert_eq!(TextInspector.classify(&instance(), &out), Presence::Present);
    }

    #[test]
    fn text_other_output_is_unexpected_and_not_existing() {
        let out = CommandOutput::ok("someone-elses-instance");
        let presence = TextInspector.classify(&instance(), &out);
        assert_eq!(presence, Presence::Unexpected);
        assert!(!presence.exists());
    }

    #[test]
    fn text_failed_list_is_absent() {
        let out = CommandOutput::failed(1, "ERROR: (gcloud.sql.instances.list) permission denied");
        assert_eq!(TextInspector.classify(&instance(), &out), Presence::Absent);
    }

    #[test]
    fn text_service_uses_exit_code() {
        let service = Resource::Service {
            name: "blog".to_owned(),
            region: "us-central1".to_owned(),
        };
        assert_eq!(
            TextInspector.classify(&service, &CommandOutput::ok("blog")),
            Presence::Present
        );
        assert_eq!(
            TextInspector.classify(&service, &CommandOutput::failed(1, "Cannot find service")),
            Presence::Absent
        );
    }

    #[test]
    fn text_probe_commands_are_scoped() {
        let cmd = TextInspector.probe_command(&instance());
        assert_eq!(
            cmd.to_string(),
            "gcloud sql instances list --filter name:dj-inst --format value(name)"
        );

        let user = Resource::DatabaseUser {
            name: "django".to_owned(),
            instance: "dj-inst".to_owned(),
        };
        assert_eq!(
            TextInspector.probe_command(&user).to_string(),
            "gcloud sql users list --instance dj-inst --filter name:django --format value(name)"
        );
    }

    // ── JSON ──

    #[test]
    fn json_matches_resource_path_suffix() {
        let secret = Resource::Secret {
            name: "cloud-run-blog-secret-key".to_owned(),
        };
        let out = CommandOutput::ok(
            r#"[{"name": "projects/123/secrets/cloud-run-blog-secret-key"}]"#,
        );
        assert_eq!(JsonInspector.classify(&secret, &out), Presence::Present);
    }

    #[test]
    fn json_empty_array_is_absent() {
        assert_eq!(
            JsonInspector.classify(&instance(), &CommandOutput::ok("[]")),
            Presence::Absent
        );
    }

    #[test]
    fn json_unparseable_is_unexpected() {
        assert_eq!(
            JsonInspector.classify(&instance(), &CommandOutput::ok("NAME  REGION")),
            Presence::Unexpected
        );
    }

    #[test]
    fn json_reads_service_env() {
        let env = Resource::ServiceEnv {
            service: "blog".to_owned(),
            region: "us-central1".to_owned(),
            var: "ON_CLOUDRUN".to_owned(),
        };
        let out = CommandOutput::ok(
            r#"{"spec": {"template": {"spec": {"containers": [{"env": [{"name": "ON_CLOUDRUN", "value": "1"}]}]}}}}"#,
        );
        assert_eq!(JsonInspector.classify(&env, &out), Presence::Present);

        let out = CommandOutput::ok(r#"{"spec": {"template": {"spec": {"containers": [{}]}}}}"#);
        assert_eq!(JsonInspector.classify(&env, &out), Presence::Absent);
    }

    #[test]
    fn json_probe_requests_json() {
        let cmd = JsonInspector.probe_command(&instance());
        assert!(cmd.to_string().ends_with("--format json"));
    }
}
