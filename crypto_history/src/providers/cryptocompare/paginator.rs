//! Backward pagination over a [`PageSource`].
//!
//! The histo endpoints only answer "the `limit` bars ending at or before
//! `toTs`", so covering `[start, end]` means walking backward from `end`,
//! re-anchoring each request on the earliest bar seen so far. Two outcomes
//! end the walk and must stay distinct:
//!
//! * the earliest bar reaches `start`: the window is covered;
//! * a page brings nothing earlier than what we hold: the source's history
//!   begins after `start`, and the series is returned as
//!   [`Coverage::Truncated`].

use chrono::DateTime;
use tracing::{debug, warn};

use crate::{
    models::bar::{Bar, Coverage, sort_dedup},
    providers::{
        NoDataAvailableSnafu, ProviderError,
        cryptocompare::{params::PageQuery, transport::PageSource},
    },
};

/// Fetches every available bar with `start <= time <= end`.
///
/// `template` supplies everything but `toTs`; its `limit` is the page size.
pub async fn fetch_window<S>(
    source: &S,
    template: &PageQuery,
    start: i64,
    end: i64,
) -> Result<(Vec<Bar>, Coverage), ProviderError>
where
    S: PageSource + ?Sized,
{
    let first_query = template.ending_at(end);
    let mut first = source.fetch_page(&first_query).await?;
    sort_dedup(&mut first);
    if first.is_empty() {
        return NoDataAvailableSnafu {
            url: source.describe(&first_query),
        }
        .fail();
    }

    // Newest page first; flattened in reverse once the walk is over.
    let mut earliest = first[0].time;
    let mut pages = vec![first];
    let mut coverage = Coverage::Complete;

    while earliest > start {
        let query = template.ending_at(earliest);
        let mut page = source.fetch_page(&query).await?;
        sort_dedup(&mut page);
        // The anchor bar itself usually comes back again.
        page.retain(|b| b.time < earliest);

        match page.first() {
            Some(bar) => {
                debug!(to_ts = earliest, earliest = bar.time, bars = page.len(), "Prepending page");
                earliest = bar.time;
                pages.push(page);
            }
            None => {
                warn!(
                    requested = %format_ts(start),
                    available = %format_ts(earliest),
                    "Requested start predates available history"
                );
                coverage = Coverage::Truncated {
                    requested_start: start,
                    available_from: earliest,
                };
                break;
            }
        }
    }

    let mut bars: Vec<Bar> = pages.into_iter().rev().flatten().collect();
    bars.retain(|b| (start..=end).contains(&b.time));
    Ok((bars, coverage))
}

/// Fetches a single page and keeps at most the `keep` most recent bars.
/// An empty page is an empty result, not an error.
///
/// The API returns one bar more than `limit` asks for, hence the trim.
pub async fn fetch_latest<S>(
    source: &S,
    query: &PageQuery,
    keep: usize,
) -> Result<Vec<Bar>, ProviderError>
where
    S: PageSource + ?Sized,
{
    let mut bars = source.fetch_page(query).await?;
    sort_dedup(&mut bars);
    if bars.len() > keep {
        bars.drain(..bars.len() - keep);
    }
    Ok(bars)
}

fn format_ts(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::pair::CurrencyPair;

    const HOUR: i64 = 3_600;

    /// Serves hourly bars from a fixed range, `limit + 1` per page like the
    /// live API, and records every `toTs` it is asked for.
    struct HourlySource {
        first: i64,
        last: i64,
        calls: Mutex<Vec<Option<i64>>>,
    }

    impl HourlySource {
        fn new(first: i64, last: i64) -> Self {
            Self {
                first,
                last,
                calls: Mutex::new(vec![]),
            }
        }

        fn calls(&self) -> Vec<Option<i64>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for HourlySource {
        async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Bar>, ProviderError> {
            self.calls.lock().unwrap().push(query.to_ts);
            let to = query.to_ts.unwrap_or(self.last).min(self.last);
            let to = to - to.rem_euclid(HOUR);
            let from = (to - i64::from(query.limit) * HOUR).max(self.first);
            Ok((from..=to)
                .step_by(HOUR as usize)
                .map(|t| Bar {
                    time: t,
                    open: 1.0,
                    high: 2.0,
                    low: 0.5,
                    close: 1.5,
                    volumefrom: 10.0,
                    volumeto: 15.0,
                })
                .collect())
        }

        fn describe(&self, query: &PageQuery) -> String {
            query.url("mock://")
        }
    }

    fn template(limit: u32) -> PageQuery {
        PageQuery::new(
            &CurrencyPair::new("BTC", "USDT"),
            &"1h".parse().unwrap(),
            "binance",
            limit,
        )
    }

    fn assert_strictly_ascending(bars: &[Bar]) {
        assert!(bars.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[tokio::test]
    async fn single_page_covers_short_window() {
        let end = 1_577_923_200; // 2020-01-02T00:00:00Z
        let start = end - 24 * HOUR;
        let source = HourlySource::new(start - 10_000 * HOUR, end + 100 * HOUR);

        let (bars, coverage) = fetch_window(&source, &template(2000), start, end).await.unwrap();

        assert_eq!(bars.len(), 25);
        assert_eq!(bars.first().unwrap().time, start);
        assert_eq!(bars.last().unwrap().time, end);
        assert_eq!(coverage, Coverage::Complete);
        assert_eq!(source.calls(), vec![Some(end)]);
    }

    #[tokio::test]
    async fn long_window_walks_back_three_pages() {
        let end = 1_600_000_000 - 1_600_000_000 % HOUR;
        let start = end - 6000 * HOUR;
        let source = HourlySource::new(start - 50_000 * HOUR, end);

        let (bars, coverage) = fetch_window(&source, &template(2000), start, end).await.unwrap();

        assert_eq!(source.calls().len(), 3);
        assert_eq!(bars.len(), 6001);
        assert_strictly_ascending(&bars);
        assert_eq!(coverage, Coverage::Complete);
    }

    #[tokio::test]
    async fn boundary_bar_shared_by_pages_is_kept_once() {
        let end = 1_600_000_000 - 1_600_000_000 % HOUR;
        let start = end - 30 * HOUR;
        let source = HourlySource::new(start - 1000 * HOUR, end);

        let (bars, _) = fetch_window(&source, &template(10), start, end).await.unwrap();

        assert_eq!(bars.len(), 31);
        assert_strictly_ascending(&bars);
        // every re-anchored request was on a bar we already held
        for to_ts in source.calls().into_iter().skip(1).flatten() {
            assert_eq!(bars.iter().filter(|b| b.time == to_ts).count(), 1);
        }
    }

    #[tokio::test]
    async fn start_before_history_truncates_instead_of_failing() {
        let end = 1_600_000_000 - 1_600_000_000 % HOUR;
        let listed = end - 45 * HOUR;
        let start = end - 500 * HOUR;
        let source = HourlySource::new(listed, end);

        let (bars, coverage) = fetch_window(&source, &template(20), start, end).await.unwrap();

        assert_eq!(bars.first().unwrap().time, listed);
        assert_eq!(bars.len(), 46);
        assert_eq!(
            coverage,
            Coverage::Truncated {
                requested_start: start,
                available_from: listed
            }
        );
    }

    #[tokio::test]
    async fn empty_first_page_is_no_data() {
        struct Nothing;

        #[async_trait]
        impl PageSource for Nothing {
            async fn fetch_page(&self, _query: &PageQuery) -> Result<Vec<Bar>, ProviderError> {
                Ok(vec![])
            }

            fn describe(&self, query: &PageQuery) -> String {
                query.url("mock://")
            }
        }

        let err = fetch_window(&Nothing, &template(2000), 0, 100).await.unwrap_err();
        match err {
            ProviderError::NoDataAvailable { url, .. } => assert!(url.contains("toTs=100")),
            other => panic!("expected NoDataAvailable, got {other:?}"),
        }

    }

    #[tokio::test]
    async fn repeated_window_fetch_is_identical() {
        let end = 1_600_000_000 - 1_600_000_000 % HOUR;
        let start = end - 777 * HOUR;
        let source = HourlySource::new(0, end);

        let (a, _) = fetch_window(&source, &template(100), start, end).await.unwrap();
        let (b, _) = fetch_window(&source, &template(100), start, end).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_single_page_is_an_empty_result() {
        let source = HourlySource::new(10 * HOUR, 20 * HOUR);
        let query = template(10).ending_at(5 * HOUR);

        let bars = fetch_latest(&source, &query, 10).await.unwrap();

        assert!(bars.is_empty());
        assert_eq!(source.calls(), vec![Some(5 * HOUR)]);
    }

    #[tokio::test]
    async fn latest_keeps_at_most_limit_bars() {
        let end = 1_600_000_000 - 1_600_000_000 % HOUR;
        let source = HourlySource::new(0, end);

        let bars = fetch_latest(&source, &template(10), 10).await.unwrap();

        assert_eq!(source.calls(), vec![None]);
        assert_eq!(bars.len(), 10);
        assert_eq!(bars.last().unwrap().time, end);
        assert_strictly_ascending(&bars);
    }
}
