use clap::Parser;
use tracing_subscriber::EnvFilter;
use worklog_sheets_api::cli::{self, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up GOOGLE_SHEET_ID, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = worklog_sheets_api::config::config();
    tracing::info!("Starting worklog API in {:?} mode", config.environment);

    cli::run(cli, config).await
}
