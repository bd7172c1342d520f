use anyhow::Result;
use clap::Parser;
use fitflick::models::Config;
use fitflick::server::{self, AppState};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fitflick")]
#[command(about = "Serve the FitFlick virtual try-on backend")]
struct CliArgs {
    /// Port to listen on (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// Skip the image model and always answer with the placeholder image.
    #[arg(long)]
    mock_ai: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitflick=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.mock_ai {
        config.use_mock_ai = true;
    }

    info!("Starting fitflick backend");

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    if let Err(e) = server::serve(listener, state).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
