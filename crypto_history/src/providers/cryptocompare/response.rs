use std::collections::HashMap;

use serde::Deserialize;

use crate::models::bar::Bar;

/// The JSON envelope every CryptoCompare endpoint answers with.
///
/// Failures are sometimes reported with HTTP 200 and `"Response": "Error"`,
/// so the envelope has to be checked as well as the status code.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    #[serde(rename = "Response")]
    pub response: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
    #[serde(rename = "Data")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// The error message if the envelope reports a failure.
    pub fn error_message(&self) -> Option<String> {
        match self.response.as_deref() {
            Some(r) if r.eq_ignore_ascii_case("error") => Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "Unknown API error".to_string()),
            ),
            _ => None,
        }
    }
}

/// `Data` of the histo endpoints: a bare array on `/data/histo*`, or an
/// object with a nested `Data` array on `/data/v2/histo*`. Error responses
/// carry an empty object.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum HistoData {
    Flat(Vec<Bar>),
    Nested {
        #[serde(rename = "Data", default)]
        data: Vec<Bar>,
    },
}

impl HistoData {
    pub fn into_bars(self) -> Vec<Bar> {
        match self {
            HistoData::Flat(bars) => bars,
            HistoData::Nested { data } => data,
        }
    }
}

/// One row of `/top/mktcapfull`.
#[derive(Deserialize, Debug)]
pub struct ToplistRow {
    #[serde(rename = "RAW")]
    pub raw: Option<HashMap<String, RawQuote>>,
}

/// Raw numeric market data for a coin in one quote currency.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct RawQuote {
    pub fromsymbol: String,
    pub tosymbol: String,
    pub mktcap: f64,
    pub price: f64,
    #[serde(rename = "VOLUME24HOURTO")]
    pub volume_24h_to: f64,
    pub supply: f64,
    #[serde(rename = "CHANGEPCT24HOUR")]
    pub change_pct_24h: f64,
}
