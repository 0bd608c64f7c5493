use std::error::Error;

use crate::{
    models::{
        pair::CurrencyPair,
        request_params::{Selection, SeriesRequest},
        timeframe::TimeFrame,
        toplist::RankRange,
    },
    utils::time::parse_utc_datetime,
};

use super::commands::HistoryArgs;

pub fn parse_timeframe(freq: &str) -> Result<TimeFrame, Box<dyn Error + Send + Sync>> {
    Ok(freq.trim().parse::<TimeFrame>()?)
}

/// Builds a [`SeriesRequest`] from `history` arguments.
///
/// Fails on an unparsable frequency or datetime, or on a start/end/limit
/// combination that is not one of the three supported modes.
pub fn series_request_from_args(
    args: &HistoryArgs,
) -> Result<SeriesRequest, Box<dyn Error + Send + Sync>> {
    let timeframe = parse_timeframe(&args.freq)?;
    let start = args.start.as_deref().map(parse_utc_datetime).transpose()?;
    let end = args.end.as_deref().map(parse_utc_datetime).transpose()?;
    let selection = Selection::from_bounds(start, end, args.limit)?;

    let mut request = SeriesRequest::new(
        CurrencyPair::new(&args.base, &args.quote),
        timeframe,
        selection,
    );
    if let Some(exchange) = &args.exchange {
        request = request.with_exchange(exchange.trim());
    }
    Ok(request)
}

pub fn rank_range(
    rank_from: Option<u32>,
    rank_to: Option<u32>,
) -> Result<RankRange, Box<dyn Error + Send + Sync>> {
    Ok(RankRange::new(rank_from, rank_to)?)
}
