use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use adminpanel_api::app::{build_app, services::build_services};
use adminpanel_infra::{LogMailer, PanelConfig, Seeder};

#[derive(Debug, Parser)]
#[command(name = "adminpanel-api", about = "Admin panel server")]
struct Cli {
    /// Human-readable logs instead of JSON.
    #[arg(long, global = true, env = "ADMINPANEL_PRETTY_LOGS")]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Create the initial super admin before serving.
        #[arg(long)]
        seed: bool,
    },
    /// Create the initial super admin and exit.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.pretty {
        adminpanel_observability::init_pretty();
    } else {
        adminpanel_observability::init();
    }

    let config = PanelConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr.clone();
    let services = Arc::new(build_services(config, Arc::new(LogMailer)).await?);

    let (seed, serve) = match cli.command.unwrap_or(Command::Serve { seed: false }) {
        Command::Seed => (true, false),
        Command::Serve { seed } => (seed, true),
    };

    if seed {
        Seeder::new(Arc::clone(&services.users)).run().await?;
    }
    if !serve {
        return Ok(());
    }

    let app = build_app(services);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
