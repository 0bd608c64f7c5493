use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{pair::CurrencyPair, timeframe::TimeFrame};

/// The start/end/limit combination supplied for a series request does not
/// describe one of the supported [`Selection`] modes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unsupported request shape: {message}")]
pub struct RequestShapeError {
    pub message: String,
}

impl RequestShapeError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Which bars a [`SeriesRequest`] selects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Selection {
    /// Every bar with `start <= time <= end`. Paginates backward from `end`.
    Window {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// The most recent `limit` bars ending at or before `end`.
    EndingAt {
        end: DateTime<Utc>,
        limit: NonZeroU32,
    },
    /// The most recent `limit` bars up to now.
    Latest { limit: NonZeroU32 },
}

impl Selection {
    pub fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, RequestShapeError> {
        if start > end {
            return Err(RequestShapeError::new(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self::Window { start, end })
    }

    pub fn ending_at(end: DateTime<Utc>, limit: u32) -> Result<Self, RequestShapeError> {
        Ok(Self::EndingAt {
            end,
            limit: positive_limit(limit)?,
        })
    }

    pub fn latest(limit: u32) -> Result<Self, RequestShapeError> {
        Ok(Self::Latest {
            limit: positive_limit(limit)?,
        })
    }

    /// Maps optional `start`/`end`/`limit` arguments, as accepted by the CLI,
    /// onto a selection mode. Any combination other than `start + end`,
    /// `end + limit` or `limit` alone is rejected.
    pub fn from_bounds(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: Option<u32>,
    ) -> Result<Self, RequestShapeError> {
        match (start, end, limit) {
            (Some(start), Some(end), None) => Self::window(start, end),
            (None, Some(end), Some(limit)) => Self::ending_at(end, limit),
            (None, None, Some(limit)) => Self::latest(limit),
            (start, end, limit) => Err(RequestShapeError::new(format!(
                "can't do start={start:?}, end={end:?}, limit={limit:?}"
            ))),
        }
    }
}

fn positive_limit(limit: u32) -> Result<NonZeroU32, RequestShapeError> {
    NonZeroU32::new(limit).ok_or_else(|| RequestShapeError::new("limit must be > 0"))
}

/// Parameters for one historical series fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub pair: CurrencyPair,

    /// Bar interval, sent to the API as `aggregate` over the unit's endpoint.
    pub timeframe: TimeFrame,

    /// Exchange code (`e` query parameter). `None` uses the provider's
    /// configured default, normally the `CCCAGG` aggregate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    pub selection: Selection,
}

impl SeriesRequest {
    pub fn new(pair: CurrencyPair, timeframe: TimeFrame, selection: Selection) -> Self {
        Self {
            pair,
            timeframe,
            exchange: None,
            selection,
        }
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }
}
