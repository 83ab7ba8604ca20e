use djdeploy_cloud::{CheckResult, GcloudClient};
use djdeploy_core::{CONFIG_FILE_NAME, DeployConfig, DjangoProject};
use std::path::Path;

pub async fn doctor() -> anyhow::Result<()> {
    let config = DeployConfig::load(Path::new("."));
    let project_id = config
        .as_ref()
        // arch-lint: allow(no-silent-result-drop) reason="doctor must report diagnostics even when djdeploy.toml is invalid"
        .ok()
        .and_then(|c| c.project.gcp_project_id.as_deref());

    let client = GcloudClient::new();
    let mut report = client.doctor(project_id).await;

    report.config_file = match (&config, Path::new(CONFIG_FILE_NAME).exists()) {
        (Err(e), _) => CheckResult::fail(&e.to_string()),
        (Ok(_), true) => CheckResult::ok("Found"),
        (Ok(_), false) => CheckResult::ok("Not found (defaults apply)"),
    };

    report.django = match DjangoProject::discover(Path::new(".")) {
        Ok(project) => CheckResult::ok(&format!(
            "{} ({})",
            project.name, project.settings_module
        )),
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed; see above for details");
    }

    Ok(())
}
