#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod io;
pub mod models;
pub mod providers;
pub mod retry;
pub mod utils;

use crate::{
    errors::Error,
    io::sink::DataSink,
    models::{bar::BarSeries, request_params::SeriesRequest},
    providers::DataProvider,
};

/// Fetches `request` from `provider` and hands the series to `sink`.
///
/// Returns the series alongside whatever the sink reports, so callers can
/// still inspect coverage after the data is written.
pub async fn fetch_and_store<P, S>(
    provider: &P,
    sink: &S,
    request: SeriesRequest,
) -> Result<(BarSeries, S::Output), Error>
where
    P: DataProvider + ?Sized,
    S: DataSink + Sync + ?Sized,
{
    let series = provider.fetch_bars(request).await?;
    let output = sink.write(&series).await?;
    Ok((series, output))
}
