//! ShieldGate - Content sanitization, provenance watermarking, and
//! security telemetry core
//!
//! The binary runs the engine as a long-lived service, sanitizes one-shot
//! input, or prints configuration.

use anyhow::Result;
use clap::{Parser, Subcommand};
use shieldgate::sanitize::ForensicExport;
use shieldgate::{SanitizationRequest, SecurityEngine, ShieldGateConfig};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shieldgate")]
#[command(author = "ShieldGate Team")]
#[command(version)]
#[command(about = "Content sanitization and security telemetry core")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SHIELDGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine with liveness monitoring until interrupted
    Run,

    /// Sanitize text and print the result as JSON
    Scrub {
        /// Text to sanitize (reads stdin when omitted)
        text: Option<String>,

        /// Submitter identity recorded in the audit trail
        #[arg(short, long)]
        submitter: Option<String>,

        /// Source tag recorded in the audit trail
        #[arg(long)]
        source: Option<String>,

        /// Print the forensic export instead of the raw result
        #[arg(long)]
        forensic: bool,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("shieldgate={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = if let Some(config_path) = cli.config {
        let content = std::fs::read_to_string(&config_path)?;
        toml::from_str(&content)?
    } else {
        ShieldGateConfig::default()
    };

    match cli.command {
        Commands::Run => run_engine(config).await?,
        Commands::Scrub {
            text,
            submitter,
            source,
            forensic,
        } => run_scrub(config, text, submitter, source, forensic).await?,
        Commands::Config { default } => {
            let shown = if default {
                ShieldGateConfig::default()
            } else {
                config
            };
            println!("{}", toml::to_string_pretty(&shown)?);
        }
    }

    Ok(())
}

async fn run_engine(config: ShieldGateConfig) -> Result<()> {
    tracing::info!("Starting ShieldGate engine");

    let engine = SecurityEngine::new(config).await?;
    engine.start();

    // Mirror broadcast frames into the log until shutdown
    let mut observer = engine.subscribe().await;
    let watcher = tokio::spawn(async move {
        while let Some(frame) = observer.recv().await {
            tracing::info!(topic = %frame.topic, payload = %frame.payload, "frame");
        }
    });

    tracing::info!("ShieldGate engine is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");
    watcher.abort();
    Ok(())
}

async fn run_scrub(
    config: ShieldGateConfig,
    text: Option<String>,
    submitter: Option<String>,
    source: Option<String>,
    forensic: bool,
) -> Result<()> {
    let raw_text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let engine = SecurityEngine::new(config).await?;

    let mut request = SanitizationRequest::new(raw_text);
    if let Some(submitter) = submitter {
        request = request.submitter(submitter);
    }
    if let Some(source) = source {
        request = request.source(source);
    }

    let result = engine.submit(request).await;

    if forensic {
        let export = ForensicExport::from_result(&result, &chrono::Utc::now().to_rfc3339());
        println!("{}", serde_json::to_string_pretty(&export)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
