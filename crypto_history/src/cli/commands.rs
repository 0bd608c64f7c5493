use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Historical crypto OHLCV downloader")]
pub struct Cli {
    /// Path to the config file (crypto_history.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a bar series and write it as a backtest CSV
    History(HistoryArgs),

    /// Print coins ranked by market cap as CSV on stdout
    Toplist {
        /// Currency the ranking is priced in (e.g. "USD")
        #[arg(long, default_value = "USD")]
        quote: String,

        /// First rank to print (1-based, inclusive)
        #[arg(long)]
        rank_from: Option<u32>,

        /// Last rank to print (inclusive)
        #[arg(long)]
        rank_to: Option<u32>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Base (from) symbol, e.g. "BTC"
    #[arg(long)]
    pub base: String,

    /// Quote (to) symbol, e.g. "USDT"
    #[arg(long)]
    pub quote: String,

    /// Bar frequency: {amount}{m|h|d}, e.g. "15m", "1h", "1d"
    #[arg(long, default_value = "1h")]
    pub freq: String,

    /// Exchange code; defaults to the configured aggregate (CCCAGG)
    #[arg(short, long)]
    pub exchange: Option<String>,

    /// Start datetime, UTC (e.g. "2020-01-01" or "2020-01-01T00:00:00Z")
    #[arg(long)]
    pub start: Option<String>,

    /// End datetime, UTC
    #[arg(long)]
    pub end: Option<String>,

    /// Number of most recent bars (with --end, or alone for "up to now")
    #[arg(long)]
    pub limit: Option<u32>,

    /// Output CSV file. Defaults to a generated name in the configured
    /// output directory, or the system temp directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
