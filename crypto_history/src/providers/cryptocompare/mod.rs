//! CryptoCompare (`min-api.cryptocompare.com`) historical data provider.

pub mod paginator;
pub mod params;
pub mod provider;
pub mod response;
pub mod toplist;
pub mod transport;

pub use provider::CryptoCompareProvider;
