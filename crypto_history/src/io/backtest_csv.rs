//! CSV output in the layout backtesting data-feed loaders expect:
//! `datetime,open,high,low,close,volume,baseVolume`, one row per bar.
//!
//! `volume` is the base-currency volume (`volumefrom`) and `baseVolume` the
//! quote-currency volume (`volumeto`).

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use snafu::ResultExt;
use tracing::info;
use uuid::Uuid;

use crate::{
    io::sink::{ConversionSnafu, DataSink, IoSnafu, SinkError, WriteSnafu},
    models::bar::{Bar, BarSeries},
    utils::time::unix_to_datetime_string,
};

#[derive(Debug, Serialize, PartialEq)]
pub struct BacktestRow {
    pub datetime: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(rename = "baseVolume")]
    pub base_volume: f64,
}

impl TryFrom<&Bar> for BacktestRow {
    type Error = SinkError;

    fn try_from(bar: &Bar) -> Result<Self, Self::Error> {
        let datetime = unix_to_datetime_string(bar.time).map_err(|e| {
            ConversionSnafu {
                message: e.to_string(),
            }
            .build()
        })?;
        Ok(Self {
            datetime,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volumefrom,
            base_volume: bar.volumeto,
        })
    }
}

/// Where a [`CsvSink`] puts its file.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    /// Exactly this file, overwritten if present.
    File(PathBuf),
    /// A uniquely named file inside this directory.
    Directory(PathBuf),
}

pub struct CsvSink {
    target: OutputTarget,
}

impl CsvSink {
    pub fn new(target: OutputTarget) -> Self {
        Self { target }
    }

    /// Writes uniquely named files under `<tmp>/crypto_history`.
    pub fn temp() -> Self {
        Self::new(OutputTarget::Directory(env::temp_dir().join("crypto_history")))
    }

    fn output_path(&self, series: &BarSeries) -> Result<PathBuf, SinkError> {
        match &self.target {
            OutputTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).context(IoSnafu)?;
                }
                Ok(path.clone())
            }
            OutputTarget::Directory(dir) => {
                fs::create_dir_all(dir).context(IoSnafu)?;
                Ok(dir.join(generated_file_name(series)))
            }
        }
    }
}

/// `{BASE}_{QUOTE}_{timeframe}_{timestamp}_{uuid}.csv`
fn generated_file_name(series: &BarSeries) -> String {
    format!(
        "{}_{}_{}_{}_{}.csv",
        series.pair.base,
        series.pair.quote,
        series.timeframe,
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4()
    )
}

pub fn write_csv(path: &Path, bars: &[Bar]) -> Result<(), SinkError> {
    let mut writer = csv::Writer::from_path(path).context(WriteSnafu)?;
    for bar in bars {
        writer
            .serialize(BacktestRow::try_from(bar)?)
            .context(WriteSnafu)?;
    }
    writer.flush().context(IoSnafu)?;
    Ok(())
}

#[async_trait]
impl DataSink for CsvSink {
    type Output = PathBuf;

    async fn write(&self, series: &BarSeries) -> Result<PathBuf, SinkError> {
        let path = self.output_path(series)?;
        write_csv(&path, &series.bars)?;
        info!(path = %path.display(), rows = series.bars.len(), "Wrote series");
        Ok(path)
    }
}
