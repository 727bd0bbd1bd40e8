use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::Config;
use oanda::{InstrumentCatalog, OandaClient};
use report::{export_report, Summary};
use screener::{Screener, ScreenerFileConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-timeframe EMA trend screener", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan configured instruments for trends confirmed on both timeframes of a pairing
    Scan {
        /// Only scan these classes (repeatable). Scans every class when omitted.
        #[arg(long = "class")]
        classes: Vec<String>,
        /// Print the summary without writing CSV files
        #[arg(long, default_value_t = false)]
        no_export: bool,
    },
    /// List the account's instruments grouped by class
    Discover {
        /// Save the raw instrument list as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(environment = %cfg.oanda_environment, "Trend screener starting");

    let client = OandaClient::new(&cfg.oanda_api_token, cfg.oanda_environment)?;

    match cli.command {
        Command::Scan { classes, no_export } => scan(&cfg, client, &classes, no_export).await,
        Command::Discover { save } => discover(&cfg, &client, save).await,
    }
}

async fn scan(
    cfg: &Config,
    client: OandaClient,
    classes: &[String],
    no_export: bool,
) -> anyhow::Result<()> {
    let screener_cfg = ScreenerFileConfig::load(&cfg.screener_config_path)?;
    let screener = Screener::new(Arc::new(client), screener_cfg);

    let report = screener.run(classes).await?;
    println!("{}", Summary::new(&report));

    if !no_export {
        let paths = export_report(&report, &screener.config().ema, &cfg.output_dir)
            .with_context(|| format!("failed to export results to {}", cfg.output_dir.display()))?;
        for path in paths {
            println!("Results saved to {}", path.display());
        }
    }

    info!(
        scanned = report.instruments_scanned(),
        signals = report.signals().count(),
        failures = report.failures().count(),
        "Analysis completed"
    );
    Ok(())
}

async fn discover(cfg: &Config, client: &OandaClient, save: Option<PathBuf>) -> anyhow::Result<()> {
    let account_id = cfg.require_account_id()?;
    let instruments = client.list_instruments(account_id).await?;
    let catalog = InstrumentCatalog::from_listing(&instruments);
    println!("{catalog}");

    if let Some(path) = save {
        let json = serde_json::to_string_pretty(&instruments)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("\nFull instrument list saved to '{}'", path.display());
    }
    Ok(())
}
