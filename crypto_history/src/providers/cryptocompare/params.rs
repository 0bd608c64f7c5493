use crate::models::{
    pair::CurrencyPair,
    timeframe::{TimeFrame, TimeFrameUnit},
};

/// The histo endpoint serving a given bar unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoEndpoint {
    Minute,
    Hour,
    Day,
}

impl HistoEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            HistoEndpoint::Minute => "histominute",
            HistoEndpoint::Hour => "histohour",
            HistoEndpoint::Day => "histoday",
        }
    }
}

impl From<TimeFrameUnit> for HistoEndpoint {
    fn from(unit: TimeFrameUnit) -> Self {
        match unit {
            TimeFrameUnit::Minute => HistoEndpoint::Minute,
            TimeFrameUnit::Hour => HistoEndpoint::Hour,
            TimeFrameUnit::Day => HistoEndpoint::Day,
        }
    }
}

/// One page query: "up to `limit` bars ending at or before `to_ts`".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub endpoint: HistoEndpoint,
    pub fsym: String,
    pub tsym: String,
    pub aggregate: u32,
    pub exchange: String,
    pub limit: u32,
    /// Upper time bound in epoch seconds. `None` means "through now".
    pub to_ts: Option<i64>,
}

impl PageQuery {
    pub fn new(pair: &CurrencyPair, timeframe: &TimeFrame, exchange: &str, limit: u32) -> Self {
        Self {
            endpoint: timeframe.unit.into(),
            fsym: pair.base.clone(),
            tsym: pair.quote.clone(),
            aggregate: timeframe.amount.get(),
            exchange: exchange.to_string(),
            limit,
            to_ts: None,
        }
    }

    /// Same query, bounded above by `to_ts`.
    pub fn ending_at(&self, to_ts: i64) -> Self {
        Self {
            to_ts: Some(to_ts),
            ..self.clone()
        }
    }

    /// Query string pairs in the order the API documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("fsym", self.fsym.clone()),
            ("tsym", self.tsym.clone()),
            ("aggregate", self.aggregate.to_string()),
            ("e", self.exchange.clone()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(ts) = self.to_ts {
            pairs.push(("toTs", ts.to_string()));
        }
        pairs
    }

    /// Full URL against `base_url`, used for logging and error messages.
    pub fn url(&self, base_url: &str) -> String {
        let query = self
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!(
            "{}/{}?{}",
            base_url.trim_end_matches('/'),
            self.endpoint.path(),
            query
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(freq: &str) -> PageQuery {
        PageQuery::new(
            &CurrencyPair::new("btc", "usdt"),
            &freq.parse().unwrap(),
            "binance",
            2000,
        )
    }

    #[test]
    fn endpoint_follows_timeframe_unit() {
        assert_eq!(query("15m").endpoint.path(), "histominute");
        assert_eq!(query("1h").endpoint.path(), "histohour");
        assert_eq!(query("3d").endpoint.path(), "histoday");
        assert_eq!(query("15m").aggregate, 15);
    }

    #[test]
    fn url_omits_to_ts_until_bounded() {
        let q = query("2h");
        assert_eq!(
            q.url("https://min-api.cryptocompare.com/data/"),
            "https://min-api.cryptocompare.com/data/histohour?fsym=BTC&tsym=USDT&aggregate=2&e=binance&limit=2000"
        );
        assert_eq!(
            q.ending_at(1_577_836_800).url("https://min-api.cryptocompare.com/data"),
            "https://min-api.cryptocompare.com/data/histohour?fsym=BTC&tsym=USDT&aggregate=2&e=binance&limit=2000&toTs=1577836800"
        );
    }
}
