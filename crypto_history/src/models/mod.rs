pub mod bar;
pub mod pair;
pub mod request_params;
pub mod timeframe;
pub mod toplist;
