use async_trait::async_trait;
use tracing::{info, instrument};

use crate::{
    config::IngestorConfig,
    models::{
        bar::{BarSeries, Coverage},
        request_params::{RequestShapeError, Selection, SeriesRequest},
        toplist::{MarketCapEntry, RankRange},
    },
    providers::{
        DataProvider, ProviderError, ProviderInitError,
        cryptocompare::{
            paginator::{fetch_latest, fetch_window},
            params::PageQuery,
            toplist::fetch_top_by_market_cap,
            transport::{HttpTransport, PageSource},
        },
    },
};

/// Historical series fetcher for CryptoCompare.
///
/// Holds no per-request state: one instance can serve concurrent fetches.
pub struct CryptoCompareProvider<S = HttpTransport> {
    source: S,
    page_limit: u32,
    default_exchange: String,
}

impl CryptoCompareProvider<HttpTransport> {
    /// Creates a provider talking to the API described by `config`.
    ///
    /// The API key, if any, is read from `CRYPTOCOMPARE_API_KEY` or the config.
    pub fn new(config: &IngestorConfig) -> Result<Self, ProviderInitError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_source(
            transport,
            config.page_limit,
            config.default_exchange.clone(),
        ))
    }

    /// Coins ranked by market cap, priced in `quote`.
    pub async fn fetch_top_by_market_cap(
        &self,
        quote: &str,
        ranks: RankRange,
    ) -> Result<Vec<MarketCapEntry>, ProviderError> {
        fetch_top_by_market_cap(&self.source, quote, ranks).await
    }
}

impl<S: PageSource> CryptoCompareProvider<S> {
    pub fn with_source(source: S, page_limit: u32, default_exchange: impl Into<String>) -> Self {
        Self {
            source,
            page_limit: page_limit.max(1),
            default_exchange: default_exchange.into(),
        }
    }

    /// Fetches the bars selected by `request`, ascending and de-duplicated.
    #[instrument(skip(self), fields(pair = %request.pair, timeframe = %request.timeframe))]
    pub async fn fetch(&self, request: SeriesRequest) -> Result<BarSeries, ProviderError> {
        let exchange = request
            .exchange
            .clone()
            .unwrap_or_else(|| self.default_exchange.clone());

        let (bars, coverage) = match request.selection {
            Selection::Window { start, end } => {
                // Also guards requests that were deserialized rather than built.
                if start > end {
                    return Err(RequestShapeError {
                        message: format!("start {start} is after end {end}"),
                    }
                    .into());
                }
                let template =
                    PageQuery::new(&request.pair, &request.timeframe, &exchange, self.page_limit);
                fetch_window(&self.source, &template, start.timestamp(), end.timestamp()).await?
            }
            Selection::EndingAt { end, limit } => {
                let query = PageQuery::new(&request.pair, &request.timeframe, &exchange, limit.get())
                    .ending_at(end.timestamp());
                let bars = fetch_latest(&self.source, &query, limit.get() as usize).await?;
                (bars, Coverage::Complete)
            }
            Selection::Latest { limit } => {
                let query =
                    PageQuery::new(&request.pair, &request.timeframe, &exchange, limit.get());
                let bars = fetch_latest(&self.source, &query, limit.get() as usize).await?;
                (bars, Coverage::Complete)
            }
        };

        info!(bars = bars.len(), ?coverage, "Fetched series");

        Ok(BarSeries {
            pair: request.pair,
            timeframe: request.timeframe,
            exchange,
            bars,
            coverage,
        })
    }
}

#[async_trait]
impl<S: PageSource> DataProvider for CryptoCompareProvider<S> {
    async fn fetch_bars(&self, request: SeriesRequest) -> Result<BarSeries, ProviderError> {
        self.fetch(request).await
    }
}
