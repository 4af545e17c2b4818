use anyhow::Result;
use banana_studio::ai::{GeminiClient, GenerationAdapter};
use banana_studio::config::Config;
use banana_studio::server;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "banana-studio")]
#[command(about = "Serve the Gemini image generation endpoint")]
struct CliArgs {
    /// Address to listen on; overrides BIND_ADDR.
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Gemini model name; overrides GEMINI_MODEL.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banana_studio=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(model) = args.model {
        config.gemini_model = model;
    }

    info!(
        "Starting banana-studio ({:?}, model {})",
        config.environment, config.gemini_model
    );

    let backend = GeminiClient::new(config.gemini_model.clone())
        .with_base_url(config.gemini_base_url.clone());
    let app = server::router(
        GenerationAdapter::new(Arc::new(backend)),
        config.environment.exposes_error_details(),
    );

    let listener = TcpListener::bind(config.bind_addr).await?;
    if let Err(e) = server::serve(listener, app).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
