//! HTTP plumbing for the CryptoCompare API.
//!
//! [`PageSource`] is the seam between pagination and the network: the
//! paginator only ever asks for "bars ending at or before `toTs`", so tests
//! can substitute an in-memory source for [`HttpTransport`].

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode, header};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use snafu::{IntoError, ResultExt};
use std::num::NonZeroU32;
use tracing::debug;

use crate::{
    config::IngestorConfig,
    models::bar::Bar,
    providers::{
        ClientBuildSnafu, ConfigSnafu, DecodeSnafu, InvalidApiKeySnafu, ProviderError,
        ProviderInitError, RemoteApiSnafu, ReqwestSnafu, TransportExhaustedSnafu,
        cryptocompare::{
            params::PageQuery,
            response::{Envelope, HistoData},
        },
    },
    retry::{Failure, RetryError, RetryPolicy},
};

/// A source of histo pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the bars the source holds for `query`, in the order it sends them.
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Bar>, ProviderError>;

    /// Human-readable location of `query`, used in logs and errors.
    fn describe(&self, query: &PageQuery) -> String;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    limiter: DefaultDirectRateLimiter,
}

impl HttpTransport {
    pub fn new(config: &IngestorConfig) -> Result<Self, ProviderInitError> {
        config.validate().context(ConfigSnafu)?;

        let mut headers = header::HeaderMap::new();
        if let Some(key) = config.api_key() {
            let mut value =
                header::HeaderValue::from_str(&format!("Apikey {}", key.expose_secret()))
                    .context(InvalidApiKeySnafu)?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(10u32));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            limiter: RateLimiter::direct(Quota::per_second(rps)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GETs `{base_url}/{path}` and unwraps the `Data` field of the envelope.
    ///
    /// Transport failures are retried according to the configured policy. Any
    /// non-success status, or a success status whose envelope says
    /// `"Response": "Error"`, fails with [`ProviderError::RemoteApi`].
    pub async fn get_data<T>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Option<T>, ProviderError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let this = self;
        let target = url.as_str();

        let (status, body) = self
            .retry
            .run(move || async move {
                this.limiter.until_ready().await;
                let response = this
                    .client
                    .get(target)
                    .query(query)
                    .send()
                    .await
                    .map_err(classify)?;
                let status = response.status();
                let body = response.text().await.map_err(classify)?;
                Ok::<_, Failure<reqwest::Error>>((status, body))
            })
            .await
            .map_err(|e| match e {
                RetryError::Fatal(source) => ReqwestSnafu.into_error(source),
                RetryError::Exhausted { attempts, last } => {
                    TransportExhaustedSnafu { attempts }.into_error(last)
                }
            })?;

        if !status.is_success() {
            return RemoteApiSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            DecodeSnafu {
                url: url.clone(),
                message: e.to_string(),
            }
            .build()
        })?;

        if let Some(message) = envelope.error_message() {
            return RemoteApiSnafu {
                status: StatusCode::OK.as_u16(),
                body: message,
            }
            .fail();
        }

        Ok(envelope.data)
    }
}

/// Connection-level failures are worth retrying; builder and redirect errors are not.
fn classify(e: reqwest::Error) -> Failure<reqwest::Error> {
    if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
        Failure::Transient(e)
    } else {
        Failure::Fatal(e)
    }
}

#[async_trait]
impl PageSource for HttpTransport {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Bar>, ProviderError> {
        let bars = self
            .get_data::<HistoData>(query.endpoint.path(), &query.query_pairs())
            .await?
            .map(HistoData::into_bars)
            .unwrap_or_default();
        debug!(url = %self.describe(query), bars = bars.len(), "Fetched page");
        Ok(bars)
    }

    fn describe(&self, query: &PageQuery) -> String {
        query.url(&self.base_url)
    }
}
