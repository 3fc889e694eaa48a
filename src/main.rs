//! CLI entry point for the stream relay tool.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use stream_relay::{Relay, ReqwestTransport, TransferParams};
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::{RuntimeSettings, load_config};
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let loaded_config = load_config(cli.config.as_deref())?;
    let settings = RuntimeSettings::resolve(&cli, loaded_config.config.as_ref());

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(
        config_path = ?loaded_config.path,
        config_loaded = loaded_config.config.is_some(),
        ?settings,
        "settings resolved"
    );

    let transport = ReqwestTransport::with_options(settings.transport)
        .context("failed to initialize HTTP transport")?;
    let relay = Relay::with_defaults(transport, settings.defaults);

    match cli.command {
        Command::Transfer(args) => {
            let result = relay.relay_params(args.into_params()).await?;
            print_json(&result)?;
        }
        Command::Batch(args) => {
            let items = read_batch(args.input.as_deref())?;
            info!(items = items.len(), "relaying batch");
            let results = relay.relay_items(items).await?;
            print_json(&results)?;
        }
    }

    Ok(())
}

/// Reads batch items from `path`, or stdin when no path is given.
///
/// Accepts a JSON array of items or a single item object.
fn read_batch(path: Option<&Path>) -> Result<Vec<TransferParams>> {
    let raw = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file '{}'", path.display()))?,
        None => {
            if io::stdin().is_terminal() {
                bail!("No batch input: pass a JSON file or pipe a JSON array via stdin");
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    parse_batch(&raw)
}

fn parse_batch(raw: &str) -> Result<Vec<TransferParams>> {
    let value: Value = serde_json::from_str(raw).context("Batch input is not valid JSON")?;
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => bail!("Batch input must be a JSON array of transfer items"),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .with_context(|| format!("Invalid transfer item at index {index}"))
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{text}");
    Ok(())
}
