//! Google News RSS search backend.
//!
//! Auxiliary keyword search against the Google News RSS endpoint, locale-pinned
//! to Indonesia. One request is issued per keyword; results are feed-shaped
//! and flow through the same normalization, dedup, and ranking stages as
//! catalog feeds. Strictly best-effort: network failure yields zero entries.
//!
//! Entry links point at `news.google.com` redirect articles; the extraction
//! cascade resolves those to publisher URLs later.

use crate::rss::{parse_feed, RawEntry};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, instrument, warn};

const SEARCH_CONCURRENCY: usize = 4;

fn search_url(keyword: &str) -> String {
    format!(
        "https://news.google.com/rss/search?q={}&hl=id&gl=ID&ceid=ID:id",
        urlencoding::encode(keyword.trim())
    )
}

/// Query Google News RSS for each keyword and pool the raw entries.
#[instrument(level = "info", skip_all, fields(keywords = keywords.len()))]
pub async fn google_news_entries(client: &Client, keywords: &[String]) -> Vec<RawEntry> {
    stream::iter(keywords.iter().filter(|k| !k.trim().is_empty()))
        .map(|keyword| {
            let url = search_url(keyword);
            async move {
                match client.get(&url).send().await {
                    Ok(response) => match response.text().await {
                        Ok(body) => {
                            let entries = parse_feed(&body);
                            debug!(keyword, count = entries.len(), "Google News search parsed");
                            entries
                        }
                        Err(e) => {
                            warn!(keyword, error = %e, "Google News body unreadable");
                            Vec::new()
                        }
                    },
                    Err(e) => {
                        warn!(keyword, error = %e, "Google News search unreachable");
                        Vec::new()
                    }
                }
            }
        })
        .buffer_unordered(SEARCH_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query_and_pins_locale() {
        let url = search_url("suku bunga BI");
        assert!(url.starts_with("https://news.google.com/rss/search?q=suku%20bunga%20BI"));
        assert!(url.contains("hl=id"));
        assert!(url.contains("gl=ID"));
        assert!(url.contains("ceid=ID:id"));
    }

    #[test]
    fn test_search_url_trims_keyword() {
        assert_eq!(search_url("  inflasi "), search_url("inflasi"));
    }
}
