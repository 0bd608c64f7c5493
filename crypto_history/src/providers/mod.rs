//! Provider abstraction for historical market data sources.
//!
//! This module defines the [`DataProvider`] trait, the interface every
//! concrete data vendor implements to turn a [`SeriesRequest`] into a
//! complete [`BarSeries`], together with the shared error taxonomy.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn DataProvider`) for runtime selection of providers.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use crypto_history::models::{bar::BarSeries, request_params::SeriesRequest};
//! use crypto_history::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(&self, _request: SeriesRequest) -> Result<BarSeries, ProviderError> {
//!         unimplemented!()
//!     }
//! }
//! ```

pub mod cryptocompare;

use async_trait::async_trait;
use snafu::{Backtrace, IntoError, Snafu};

use crate::{
    config::ConfigError,
    models::{
        bar::BarSeries,
        request_params::{RequestShapeError, SeriesRequest},
        timeframe::TimeFrameError,
    },
};

/// Trait for fetching a historical bar series from a market data provider.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches the bars selected by `request`.
    ///
    /// # Returns
    ///
    /// * `Ok(BarSeries)` - ascending, de-duplicated bars; possibly flagged as
    ///   truncated when the source's history starts after the requested start.
    /// * `Err(ProviderError)` - validation, remote or transport failure.
    async fn fetch_bars(&self, request: SeriesRequest) -> Result<BarSeries, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// Configuration failed validation.
    #[snafu(display("Invalid provider configuration: {source}"))]
    Config {
        source: ConfigError,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// The frequency string is not digits followed by m, h or d.
    #[snafu(display("Invalid frequency: {source}"))]
    InvalidFrequency {
        source: TimeFrameError,
        backtrace: Backtrace,
    },

    /// The start/end/limit combination matches none of the supported modes.
    #[snafu(display("Invalid request: {source}"))]
    InvalidRequestShape {
        source: RequestShapeError,
        backtrace: Backtrace,
    },

    /// The very first page came back empty.
    #[snafu(display("No data fetched with {url}"))]
    NoDataAvailable { url: String, backtrace: Backtrace },

    /// The provider's API answered with a non-success status or an error envelope.
    #[snafu(display("API error (status {status}): {body}"))]
    RemoteApi {
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// A request failed for a reason other than a transient transport error.
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// A bounded retry policy ran out of attempts on transport failures.
    #[snafu(display("Connection failed after {attempts} attempts: {source}"))]
    TransportExhausted {
        attempts: u32,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The response body could not be decoded.
    #[snafu(display("Failed to decode response from {url}: {message}"))]
    Decode {
        url: String,
        message: String,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

impl From<TimeFrameError> for ProviderError {
    fn from(source: TimeFrameError) -> Self {
        InvalidFrequencySnafu.into_error(source)
    }
}

impl From<RequestShapeError> for ProviderError {
    fn from(source: RequestShapeError) -> Self {
        InvalidRequestShapeSnafu.into_error(source)
    }
}

impl From<ProviderInitError> for ProviderError {
    fn from(source: ProviderInitError) -> Self {
        InitSnafu.into_error(source)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::models::{
        bar::Coverage,
        pair::CurrencyPair,
        request_params::Selection,
    };

    use super::*;

    struct CannedProvider;
    struct EmptyProvider;

    #[async_trait]
    impl DataProvider for CannedProvider {
        async fn fetch_bars(&self, request: SeriesRequest) -> Result<BarSeries, ProviderError> {
            Ok(BarSeries {
                pair: request.pair,
                timeframe: request.timeframe,
                exchange: request.exchange.unwrap_or_default(),
                bars: vec![],
                coverage: Coverage::Complete,
            })
        }
    }

    #[async_trait]
    impl DataProvider for EmptyProvider {
        async fn fetch_bars(&self, _request: SeriesRequest) -> Result<BarSeries, ProviderError> {
            NoDataAvailableSnafu { url: "mock://" }.fail()
        }
    }

    // Decided at runtime, hence the `Box<dyn DataProvider>`.
    fn get_provider(name: &str) -> Box<dyn DataProvider> {
        if name == "canned" {
            Box::new(CannedProvider)
        } else {
            Box::new(EmptyProvider)
        }
    }

    fn request() -> SeriesRequest {
        SeriesRequest::new(
            CurrencyPair::new("eth", "btc"),
            "1d".parse().unwrap(),
            Selection::ending_at(Utc::now(), 5).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_dynamic_provider() {
        let provider = get_provider("canned");
        let series = provider.fetch_bars(request()).await.unwrap();
        assert_eq!(series.pair.to_string(), "ETH/BTC");

        let provider = get_provider("empty");
        let err = provider.fetch_bars(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoDataAvailable { .. }));
    }

    #[test]
    fn validation_errors_convert_into_provider_errors() {
        let err: ProviderError = "1w".parse::<crate::models::timeframe::TimeFrame>().unwrap_err().into();
        assert!(matches!(err, ProviderError::InvalidFrequency { .. }));
        assert!(err.to_string().starts_with("Invalid frequency"));

        let err: ProviderError = Selection::from_bounds(None, None, None).unwrap_err().into();
        assert!(matches!(err, ProviderError::InvalidRequestShape { .. }));
        assert!(err.to_string().starts_with("Invalid request"));
    }
}
