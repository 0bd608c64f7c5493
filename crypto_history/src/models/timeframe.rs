//! Bar frequency: a positive multiplier over a minute, hour or day unit.
//!
//! Frequencies are written the way the CLI and config accept them,
//! `{digits}{unit}` with unit one of `m`, `h`, `d` (e.g. `"15m"`, `"1h"`,
//! `"3d"`).
//!
//! ```
//! use crypto_history::models::timeframe::{TimeFrame, TimeFrameUnit};
//!
//! let tf: TimeFrame = "4h".parse().unwrap();
//! assert_eq!(tf.amount.get(), 4);
//! assert_eq!(tf.unit, TimeFrameUnit::Hour);
//! assert_eq!(tf.to_string(), "4h");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("Invalid amount in frequency {input:?}: {message}")]
    InvalidAmount { input: String, message: String },

    #[error("Unsupported frequency unit {unit:?} in {input:?} (expected m, h or d)")]
    InvalidUnit { input: String, unit: String },

    #[error("Invalid frequency: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
}

impl TimeFrameUnit {
    const fn suffix(&self) -> char {
        match self {
            TimeFrameUnit::Minute => 'm',
            TimeFrameUnit::Hour => 'h',
            TimeFrameUnit::Day => 'd',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeFrame {
    pub amount: NonZeroU32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub const fn new(amount: NonZeroU32, unit: TimeFrameUnit) -> Self {
        Self { amount, unit }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    /// Whitespace is not stripped: `" 1h"` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeFrameError::InvalidInput {
                message: format!("{s:?} has no unit"),
            })?;
        let (digits, unit) = s.split_at(split);
        if digits.is_empty() {
            return Err(TimeFrameError::InvalidInput {
                message: format!("{s:?} has no amount"),
            });
        }

        let unit = match unit {
            "m" => TimeFrameUnit::Minute,
            "h" => TimeFrameUnit::Hour,
            "d" => TimeFrameUnit::Day,
            other => {
                return Err(TimeFrameError::InvalidUnit {
                    input: s.to_string(),
                    unit: other.to_string(),
                });
            }
        };

        let amount: u32 = digits.parse().map_err(|e| TimeFrameError::InvalidAmount {
            input: s.to_string(),
            message: format!("{e}"),
        })?;
        let amount = NonZeroU32::new(amount).ok_or_else(|| TimeFrameError::InvalidAmount {
            input: s.to_string(),
            message: "amount must be > 0".into(),
        })?;

        Ok(Self::new(amount, unit))
    }
}

impl TryFrom<String> for TimeFrame {
    type Error = TimeFrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFrame> for String {
    fn from(value: TimeFrame) -> Self {
        value.to_string()
    }
}
