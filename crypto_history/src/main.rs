use std::io;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crypto_history::{
    cli::{
        commands::{Cli, Commands, HistoryArgs},
        params::{rank_range, series_request_from_args},
    },
    config::IngestorConfig,
    fetch_and_store,
    io::backtest_csv::{CsvSink, OutputTarget},
    models::bar::Coverage,
    providers::cryptocompare::CryptoCompareProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for output paths and CSV.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => IngestorConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => IngestorConfig::default(),
    };

    let provider = CryptoCompareProvider::new(&config)?;

    match cli.command {
        Commands::History(args) => run_history(&provider, &config, args).await,
        Commands::Toplist {
            quote,
            rank_from,
            rank_to,
        } => {
            let ranks = rank_range(rank_from, rank_to).map_err(|e| anyhow!(e))?;
            let entries = provider.fetch_top_by_market_cap(&quote, ranks).await?;

            let mut writer = csv::Writer::from_writer(io::stdout());
            for entry in &entries {
                writer.serialize(entry)?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

async fn run_history(
    provider: &CryptoCompareProvider,
    config: &IngestorConfig,
    args: HistoryArgs,
) -> Result<()> {
    let request = series_request_from_args(&args).map_err(|e| anyhow!(e))?;

    let sink = match (args.output, &config.output_dir) {
        (Some(file), _) => CsvSink::new(OutputTarget::File(file)),
        (None, Some(dir)) => CsvSink::new(OutputTarget::Directory(dir.clone())),
        (None, None) => CsvSink::temp(),
    };

    let (series, path) = fetch_and_store(provider, &sink, request).await?;

    if let Coverage::Truncated {
        requested_start,
        available_from,
    } = series.coverage
    {
        warn!(
            requested_start,
            available_from,
            "History is shorter than requested; the file starts at the earliest available bar"
        );
    }

    println!("{}", path.display());
    Ok(())
}
