use clap::Parser;
use gallery_ingest::cli::{exit_code, run, Cli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!(config = ?cli.config, environment = %cli.environment, "CLI arguments parsed, invoking run");
    match run(cli).await {
        Ok(_) => {
            tracing::info!("CLI completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("[ERROR] {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
