use anyhow::{Context, Result};
use banana_studio::client::{
    ConsoleNotifier, Feedback, FileSettingsStore, GenerationWorkflow, HttpTransport, TerminalBell,
    WorkflowServices, WorkflowState,
};
use banana_studio::config::DEFAULT_BIND_ADDR;
use banana_studio::share::LocalPlatform;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "studio")]
#[command(about = "Generate images from a prompt through a banana-studio server")]
struct CliArgs {
    /// What to generate.
    prompt: Option<String>,

    /// Reference images; only the first is sent.
    #[arg(short, long = "image", value_name = "PATH")]
    images: Vec<PathBuf>,

    /// Gemini API key. Stored for later runs once a request is sent.
    #[arg(long, env = "GEMINI_API_KEY")]
    api_key: Option<String>,

    #[arg(long, default_value_t = format!("http://{}", DEFAULT_BIND_ADDR))]
    server: String,

    /// Where downloads are written. Defaults to the user's downloads folder.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Save the generated image.
    #[arg(long)]
    download: bool,

    /// Share the generated image with the best available method.
    #[arg(long)]
    share: bool,

    /// Copy the generated text to the clipboard.
    #[arg(long)]
    copy: bool,

    /// Turn sound cues on or off and remember the choice.
    #[arg(long, value_name = "on|off", value_parser = parse_switch)]
    sound: Option<bool>,

    /// Settings file; defaults to the user configuration directory.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
}

fn parse_switch(input: &str) -> std::result::Result<bool, String> {
    match input {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(format!("Expected 'on' or 'off', got '{}'", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banana_studio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    let settings = match args.settings {
        Some(path) => FileSettingsStore::new(path),
        None => FileSettingsStore::default_location()?,
    };
    info!("Using settings at {}", settings.path().display());

    let mut workflow = GenerationWorkflow::new(WorkflowServices {
        transport: Arc::new(HttpTransport::new(&args.server)),
        settings: Arc::new(settings),
        feedback: Arc::new(Feedback::new(Box::new(TerminalBell))),
        notifier: Arc::new(ConsoleNotifier),
    })
    .context("Failed to load stored settings")?;

    if let Some(enabled) = args.sound {
        workflow.set_sound_enabled(enabled)?;
        info!("Sound {}", if enabled { "enabled" } else { "disabled" });
    }

    let Some(prompt) = args.prompt else {
        return Ok(());
    };
    workflow.set_prompt(prompt);
    if let Some(api_key) = args.api_key {
        workflow.set_api_key(api_key);
    }

    if !args.images.is_empty() {
        let report = workflow.add_files(&args.images).await;
        info!(
            "{} image(s) attached, {} rejected",
            report.accepted.len(),
            report.rejected.len()
        );
    }

    let result = match workflow.generate().await {
        Ok(result) => result.clone(),
        Err(_) => std::process::exit(2),
    };

    if workflow.state() == WorkflowState::Failed {
        error!(
            "Generation failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
        if result.code.is_some_and(|code| code.is_retryable_later()) {
            eprintln!("The service is busy; try the same request again later.");
        }
        std::process::exit(1);
    }

    if let Some(message) = &result.message {
        println!("{}", message);
    }
    if let Some(text) = result.text.as_deref().filter(|t| !t.is_empty()) {
        println!("{}", text);
    }

    let platform = match args.out_dir {
        Some(dir) => LocalPlatform::new(dir),
        None => LocalPlatform::with_default_downloads(),
    };

    if args.download {
        let path = workflow.download_result(&platform).await?;
        println!("Saved {}", path.display());
    }
    if args.share {
        let outcome = workflow.share_result(&platform).await?;
        println!("Shared: {:?}", outcome);
    }
    if args.copy {
        match result.text.as_deref().filter(|t| !t.is_empty()) {
            Some(text) => {
                workflow.copy_text(&platform, text).await?;
                println!("Text copied to clipboard");
            }
            None => eprintln!("No text to copy"),
        }
    }

    Ok(())
}
