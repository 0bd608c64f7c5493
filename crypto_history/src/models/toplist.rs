use serde::{Deserialize, Serialize};

use crate::models::request_params::RequestShapeError;

/// One coin in a market-cap ranking, priced in the requested quote currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCapEntry {
    /// 1-based position in the ranking.
    pub rank: u32,
    pub from_symbol: String,
    pub to_symbol: String,
    pub market_cap: f64,
    pub price: f64,
    pub volume_24h_to: f64,
    pub supply: f64,
    pub change_pct_24h: f64,
}

/// An inclusive, 1-based slice of a market-cap ranking. Either bound may be
/// left open: `from` defaults to the top, `to` to the end of the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRange {
    from: Option<u32>,
    to: Option<u32>,
}

impl RankRange {
    pub fn new(from: Option<u32>, to: Option<u32>) -> Result<Self, RequestShapeError> {
        if from == Some(0) || to == Some(0) {
            return Err(RequestShapeError {
                message: "ranks start at 1".into(),
            });
        }
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(RequestShapeError {
                    message: format!("rank_from {f} is after rank_to {t}"),
                });
            }
        }
        Ok(Self { from, to })
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn from(&self) -> u32 {
        self.from.unwrap_or(1)
    }

    pub fn to(&self) -> Option<u32> {
        self.to
    }

    pub fn contains(&self, rank: u32) -> bool {
        rank >= self.from() && self.to.is_none_or(|t| rank <= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_range_contains_everything() {
        let r = RankRange::all();
        assert!(r.contains(1));
        assert!(r.contains(10_000));
    }

    #[test]
    fn bounded_range_is_inclusive() {
        let r = RankRange::new(Some(20), Some(30)).unwrap();
        assert!(!r.contains(19));
        assert!(r.contains(20));
        assert!(r.contains(30));
        assert!(!r.contains(31));
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(RankRange::new(Some(0), None).is_err());
        assert!(RankRange::new(None, Some(0)).is_err());
        assert!(RankRange::new(Some(40), Some(30)).is_err());
    }
}
