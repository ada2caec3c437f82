use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::app::app;
use crate::config::AppConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "worklog-sheets-api")]
#[command(about = "Overtime worklog API backed by Google Sheets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Listen port, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Write the header row of every table, then exit")]
    Init,
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(config.sheets.clone(), &config.security)
        .context("invalid token settings")?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Init => {
            state
                .initialize_tables()
                .await
                .context("table initialization failed")?;
            info!("All tables initialized");
            Ok(())
        }
        Commands::Serve { port } => {
            serve(state, port.unwrap_or(config.api.port), config.api.enable_request_logging).await
        }
    }
}

async fn serve(state: AppState, port: u16, request_logging: bool) -> anyhow::Result<()> {
    // A store that is down at boot only degrades requests
    if let Err(e) = state.initialize_tables().await {
        error!("Starting without initialized tables: {}", e);
    }

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Worklog API listening on http://{}", bind_addr);

    axum::serve(listener, app(state, request_logging))
        .await
        .context("server error")?;
    Ok(())
}
