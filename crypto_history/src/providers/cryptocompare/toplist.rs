//! Market-cap ranking from `/top/mktcapfull`.
//!
//! Unlike the histo endpoints this one paginates forward with a page number.
//! Pages are requested from 0 until one comes back empty or enough ranks have
//! been collected for the requested [`RankRange`].

use tracing::debug;

use crate::{
    models::toplist::{MarketCapEntry, RankRange},
    providers::{
        NoDataAvailableSnafu, ProviderError,
        cryptocompare::{response::ToplistRow, transport::HttpTransport},
    },
};

const TOPLIST_PATH: &str = "top/mktcapfull";

/// The endpoint serves at most this many coins per page.
pub const TOPLIST_PAGE_SIZE: u32 = 50;

pub async fn fetch_top_by_market_cap(
    transport: &HttpTransport,
    quote: &str,
    ranks: RankRange,
) -> Result<Vec<MarketCapEntry>, ProviderError> {
    let quote = quote.trim().to_uppercase();
    let mut entries: Vec<MarketCapEntry> = Vec::new();
    let mut page = 0u32;

    loop {
        let query = vec![
            ("tsym", quote.clone()),
            ("limit", TOPLIST_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        let rows: Vec<ToplistRow> = transport
            .get_data(TOPLIST_PATH, &query)
            .await?
            .unwrap_or_default();

        if rows.is_empty() {
            if page == 0 {
                return NoDataAvailableSnafu {
                    url: format!(
                        "{}/{TOPLIST_PATH}?tsym={quote}&limit={TOPLIST_PAGE_SIZE}&page=0",
                        transport.base_url()
                    ),
                }
                .fail();
            }
            break;
        }

        // Coins without pricing in `quote` are dropped, as if never listed.
        let priced = rows
            .into_iter()
            .filter_map(|row| row.raw.and_then(|mut raw| raw.remove(&quote)));
        for quote_data in priced {
            let rank = entries.len() as u32 + 1;
            entries.push(MarketCapEntry {
                rank,
                from_symbol: quote_data.fromsymbol,
                to_symbol: quote_data.tosymbol,
                market_cap: quote_data.mktcap,
                price: quote_data.price,
                volume_24h_to: quote_data.volume_24h_to,
                supply: quote_data.supply,
                change_pct_24h: quote_data.change_pct_24h,
            });
        }
        debug!(page, collected = entries.len(), "Fetched toplist page");

        if ranks.to().is_some_and(|to| entries.len() as u32 >= to) {
            break;
        }
        page += 1;
    }

    entries.retain(|e| ranks.contains(e.rank));
    Ok(entries)
}
