pub mod backtest_csv;
pub mod sink;
