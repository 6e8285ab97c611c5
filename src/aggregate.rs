//! Candidate aggregation: concurrent feed fan-out, filtering, deduplication,
//! and ordering.
//!
//! [`aggregate`] is the primary control component of the pipeline. It fans one
//! retrieval task out per (source, feed-url) pair, normalizes and filters each
//! entry, deduplicates by canonical URL, orders by publish date (or BM25
//! relevance when requested), and truncates to the result budget. Individual
//! feed failures degrade to zero entries; the call errors only on invalid
//! input.

use crate::cache::{arg_key, MemoCache};
use crate::feeds::all_feeds;
use crate::models::CandidateRecord;
use crate::rank;
use crate::rss::{parse_feed, RawEntry};
use crate::search;
use crate::utils::{canonicalize, in_date_range, is_west_java_hit, match_keywords, parse_entry_date};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use reqwest::Client;
use std::collections::HashSet;
use std::error::Error;
use tracing::{debug, info, instrument, warn};

/// Concurrent feed retrieval tasks.
const FEED_CONCURRENCY: usize = 24;

static AGGREGATE_CACHE: Lazy<MemoCache<Vec<CandidateRecord>>> = Lazy::new(MemoCache::new);

/// Aggregation parameters; doubles as the memoization key.
#[derive(Debug, Clone, Hash)]
pub struct AggregateRequest {
    pub keywords: Vec<String>,
    pub max_results: usize,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// Merge Google News RSS search results into the candidate set.
    pub use_google_news: bool,
    /// Order by BM25 relevance instead of publish date.
    pub rerank: bool,
    /// Restrict to West-Java-related items.
    pub west_java_only: bool,
}

/// Drop the process-lifetime aggregation cache.
pub fn clear_cache() {
    AGGREGATE_CACHE.clear();
}

/// Collect, filter, dedup, and order candidate records for a keyword query.
///
/// Errors only when the keyword set is empty after trimming; feed and backend
/// failures are recovered locally as zero entries.
#[instrument(level = "info", skip_all, fields(keywords = ?request.keywords, max = request.max_results))]
pub async fn aggregate(
    client: &Client,
    request: &AggregateRequest,
) -> Result<Vec<CandidateRecord>, Box<dyn Error>> {
    if request.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err("keyword set is empty".into());
    }

    let cache_key = arg_key(request);
    if let Some(cached) = AGGREGATE_CACHE.get(cache_key) {
        debug!(count = cached.len(), "Aggregation served from cache");
        return Ok(cached);
    }

    // Fan out one task per feed endpoint; a failed feed yields zero entries.
    let mut raw: Vec<(String, RawEntry)> = stream::iter(all_feeds())
        .map(|(source, url)| async move {
            let entries = fetch_feed(client, source, url).await;
            entries
                .into_iter()
                .map(|e| (source.to_string(), e))
                .collect::<Vec<_>>()
        })
        .buffer_unordered(FEED_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    if request.use_google_news {
        let extra = search::google_news_entries(client, &request.keywords).await;
        info!(count = extra.len(), "Google News backend entries");
        raw.extend(extra.into_iter().map(|e| ("Google News".to_string(), e)));
    }

    let scanned = raw.len();

    let mut records: Vec<CandidateRecord> = raw
        .into_iter()
        .filter_map(|(source, entry)| {
            normalize_entry(
                &source,
                entry,
                &request.keywords,
                request.date_start,
                request.date_end,
            )
        })
        .filter(|r| {
            !request.west_java_only
                || is_west_java_hit(
                    r.title.as_deref().unwrap_or(""),
                    r.description.as_deref().unwrap_or(""),
                    &r.url,
                )
        })
        .collect();

    // Feed tasks complete in scheduler order; sorting by (source, url) before
    // the dedup pass makes the first-seen winner deterministic.
    records.sort_by(|a, b| (&a.source, &a.url).cmp(&(&b.source, &b.url)));
    let mut seen: HashSet<String> = HashSet::new();
    records.retain(|r| seen.insert(r.canonical_url.clone()));

    // Newest first; undated records sort to the end.
    records.sort_by(|a, b| b.published.cmp(&a.published));

    if request.rerank {
        records = rank::rerank(records, &request.keywords);
    }

    records.truncate(request.max_results);
    info!(
        scanned,
        kept = records.len(),
        rerank = request.rerank,
        "Aggregation complete"
    );

    AGGREGATE_CACHE.insert(cache_key, records.clone());
    Ok(records)
}

/// Fetch and parse one feed endpoint. Any failure degrades to zero entries.
async fn fetch_feed(client: &Client, source: &str, url: &str) -> Vec<RawEntry> {
    match client.get(url).send().await {
        Ok(response) => match response.text().await {
            Ok(body) => {
                let entries = parse_feed(&body);
                debug!(source, url, count = entries.len(), "Parsed feed");
                entries
            }
            Err(e) => {
                warn!(source, url, error = %e, "Feed body unreadable");
                Vec::new()
            }
        },
        Err(e) => {
            warn!(source, url, error = %e, "Feed unreachable");
            Vec::new()
        }
    }
}

/// Turn one raw entry into a candidate record, or reject it.
///
/// Rejection reasons: missing link, no keyword hit, or, once a date bound is
/// active, a publish date that is absent, unparseable, or out of range.
pub fn normalize_entry(
    source: &str,
    entry: RawEntry,
    keywords: &[String],
    date_start: Option<NaiveDate>,
    date_end: Option<NaiveDate>,
) -> Option<CandidateRecord> {
    let url = entry.link?;
    let title = entry.title.unwrap_or_default();
    let description = entry.description.unwrap_or_default();

    let matched = match_keywords(&title, &description, keywords);
    if matched.is_empty() {
        return None;
    }

    let published = entry.published.as_deref().and_then(parse_entry_date);
    if !in_date_range(published.as_ref(), date_start, date_end) {
        return None;
    }

    Some(CandidateRecord {
        canonical_url: canonicalize(&url),
        title: (!title.is_empty()).then_some(title),
        url,
        source: source.to_string(),
        published,
        description: (!description.is_empty()).then_some(description),
        matched_keywords: matched,
    })
}
