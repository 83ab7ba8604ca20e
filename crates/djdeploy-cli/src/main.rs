mod commands;
mod logging;

use clap::{Parser, Subcommand};
use djdeploy_cloud::Declined;
use std::path::Path;

#[derive(Parser)]
#[command(name = "djdeploy", about = "Deploy Django projects to Google Cloud Run")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the project and provision Cloud Run, Cloud SQL and secrets
    Deploy(commands::DeployOptions),
    /// Check gcloud setup and project readiness
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Deploy(options) if options.log_output => {
            Some(logging::create_log_file(Path::new("."))?)
        }
        _ => None,
    };
    let log_path = log_file.as_ref().map(|(path, _)| path.clone());
    logging::init(log_file.map(|(_, file)| file));
    if let Some(path) = log_path {
        tracing::info!("Logging to {}", path.display());
    }

    let result = match cli.command {
        Commands::Deploy(options) => commands::deploy(options).await,
        Commands::Doctor => commands::doctor().await,
    };

    // A declined confirmation is the user's choice, not a failure.
    if let Err(err) = &result
        && let Some(declined) = err.chain().find_map(|e| e.downcast_ref::<Declined>())
    {
        println!("{declined}");
        return Ok(());
    }

    result
}
