use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::bar::BarSeries;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// An error occurred while trying to write the data (e.g., file I/O error).
    #[snafu(display("Failed to write data: {source}"))]
    Write {
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// An error occurred while converting a `BarSeries` into the destination format.
    #[snafu(display("Data conversion error: {message}"))]
    Conversion {
        message: String,
        backtrace: Backtrace,
    },

    /// A generic I/O error.
    #[snafu(display("I/O error: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

#[async_trait]
pub trait DataSink {
    /// The type of output returned after a successful write operation.
    ///
    /// A file sink returns the path it wrote to; a database sink might return
    /// the number of rows inserted.
    type Output;

    /// Writes one series to the destination.
    async fn write(&self, series: &BarSeries) -> Result<Self::Output, SinkError>;
}
