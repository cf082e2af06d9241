//! HomeShield API CLI
//!
//! Starts the HTTP server, or rebuilds the policy index and exits.

use anyhow::Context;
use homeshield_api::{build_assistant, config::AppConfig, start_server};
use std::env;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let mut config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args.get(i + 1).context("--config requires a file path")?;
            AppConfig::from_file(path).with_context(|| format!("loading {}", path))?
        }
        None => {
            eprintln!("Warning: No config file specified, using defaults and environment");
            eprintln!("Usage: homeshield-api --config <path-to-config.toml>");
            eprintln!();
            AppConfig::default()
        }
    };
    config.apply_env();
    config.validate()?;

    if args.iter().any(|a| a == "--reindex") {
        let assistant = build_assistant(&config)?;
        let report = assistant.reindex().await?;
        info!(
            "Reindex complete: {} chunks in '{}' (cleared existing: {})",
            report.chunks, report.namespace, report.cleared
        );
        return Ok(());
    }

    start_server(config).await?;
    Ok(())
}

fn print_help() {
    println!("HomeShield API - Home Warranty Coverage Assistant");
    println!();
    println!("USAGE:");
    println!("    homeshield-api [--config <path-to-config.toml>] [--reindex]");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --reindex          Rebuild the policy index and exit");
    println!("    --help             Print this help message");
    println!();
    println!("ENDPOINTS:");
    println!("    GET  /health       Liveness and namespace");
    println!("    POST /qa           Answer a coverage question");
    println!("    POST /claim        Submit a claim");
    println!("    POST /coverage     Decide coverage for an issue");
    println!("    POST /upgrades     Suggest alternative plans");
    println!("    POST /reindex      Rebuild the policy index");
    println!();
    println!("ENVIRONMENT:");
    println!("    AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY, AZURE_OPENAI_API_VERSION,");
    println!("    AZURE_OPENAI_CHAT_DEPLOYMENT, AZURE_OPENAI_EMBEDDING_DEPLOYMENT,");
    println!("    PINECONE_API_KEY, PINECONE_INDEX_HOST, PINECONE_NAMESPACE,");
    println!("    POLICY_DIR, CUSTOMERS_CSV, RUST_LOG");
    println!();
}
