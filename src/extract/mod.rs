//! The per-URL extraction cascade and the concurrent fetch orchestrator.
//!
//! Strategies are tried in strict priority order, each attempt independent
//! and side-effect-free on failure:
//!
//! 1. Aggregator redirect resolution (non-fatal; see [`resolve`])
//! 2. Primary fetch + structured extraction
//! 3. Structured extraction over a browser-headered GET's raw markup
//! 4. AMP-variant fallback
//! 5. Readability heuristic
//! 6. Text-density boilerplate removal
//! 7. Stopword-density block classification
//!
//! The first strategy whose output clears its length floor wins; later
//! strategies are never consulted once an earlier one succeeds. HTTP 429/503
//! get bounded retry with exponential backoff plus jitter; all other failures
//! move the cascade along instead.

pub mod content;
pub mod meta;
pub mod resolve;

use crate::cache::{arg_key, MemoCache};
use crate::models::{ArticleContent, Strategy};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use rand::{rng, Rng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Minimum body length for the structured strategies (steps 2–3).
pub const FLOOR_STRUCTURED: usize = 120;
/// Minimum body length for the fallback strategies (steps 4–7).
pub const FLOOR_FALLBACK: usize = 100;

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_RETRIES: u32 = 3;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

static FETCH_CACHE: Lazy<MemoCache<Vec<ArticleContent>>> = Lazy::new(MemoCache::new);

/// Drop the process-lifetime article-fetch cache.
pub fn clear_cache() {
    FETCH_CACHE.clear();
}

/// HTTP clients and settings shared by all extraction tasks.
///
/// Two clients: `plain` carries only the user agent (the primary-fetch step),
/// `session` adds browser-like headers and a referer (the raw-HTML step and
/// everything after it, where looking like a browser matters).
#[derive(Clone)]
pub struct ExtractPipeline {
    plain: Client,
    session: Client,
    user_agent: String,
}

impl ExtractPipeline {
    pub fn new(user_agent: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let ua = user_agent.unwrap_or(DEFAULT_USER_AGENT).to_string();

        let plain = Client::builder()
            .user_agent(ua.clone())
            .timeout(HTTP_TIMEOUT)
            .build()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://news.google.com/"));
        let session = Client::builder()
            .user_agent(ua.clone())
            .default_headers(headers)
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(ExtractPipeline {
            plain,
            session,
            user_agent: ua,
        })
    }

    /// The session client, for feed retrieval and search backends too.
    pub fn session(&self) -> &Client {
        &self.session
    }
}

/// GET with bounded retry on 429/503; every other failure is immediate.
async fn get_with_backoff(client: &Client, url: &str) -> Result<(String, String), String> {
    for attempt in 0..MAX_RETRIES {
        let response = match client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Err(format!("request: {e}")),
        };
        let status = response.status();
        if status.as_u16() == 429 || status.as_u16() == 503 {
            let jitter_ms: u64 = rng().random_range(0..1000);
            let delay = Duration::from_secs(1 << attempt) + Duration::from_millis(jitter_ms);
            warn!(%url, %status, attempt, ?delay, "Rate limited; backing off");
            sleep(delay).await;
            continue;
        }
        if !status.is_success() {
            return Err(format!("status: {status}"));
        }
        let final_url = response.url().to_string();
        return match response.text().await {
            Ok(body) => Ok((final_url, body)),
            Err(e) => Err(format!("body: {e}")),
        };
    }
    Err("status: retries exhausted".to_string())
}

/// The markup-level fallback chain (cascade steps 3–7), pure and ordered.
///
/// `amp_html` is the fetched AMP variant when the page declared one; passing
/// `None` simply skips that step. The first strategy to clear its floor wins;
/// later outputs are never compared against an earlier success.
pub fn markup_cascade(html: &str, amp_html: Option<&str>) -> Option<(String, Strategy)> {
    if let Some(text) = content::structured_extract(html) {
        if text.len() >= FLOOR_STRUCTURED {
            return Some((text, Strategy::RawHtmlExtract));
        }
    }
    if let Some(amp) = amp_html {
        if let Some(text) = content::structured_extract(amp) {
            if text.len() >= FLOOR_FALLBACK {
                return Some((text, Strategy::AmpFallback));
            }
        }
    }
    if let Some(text) = content::readability_extract(html) {
        if text.len() >= FLOOR_FALLBACK {
            return Some((text, Strategy::Readability));
        }
    }
    if let Some(text) = content::density_extract(html) {
        if text.len() >= FLOOR_FALLBACK {
            return Some((text, Strategy::BoilerplateRemoval));
        }
    }
    if let Some(text) = content::stopword_extract(html) {
        if text.len() >= FLOOR_FALLBACK {
            return Some((text, Strategy::StatisticalBoilerplate));
        }
    }
    None
}

fn apply_meta(article: &mut ArticleContent, html: &str) {
    let meta = meta::page_metadata(html);
    if article.extracted_title.is_none() {
        article.extracted_title = meta.title;
    }
    if article.publish_date.is_none() {
        article.publish_date = meta.date;
    }
    if article.meta_description.is_none() {
        article.meta_description = meta.description;
    }
}

/// Run the full extraction cascade for one URL.
#[instrument(level = "info", skip(pipeline), fields(%url))]
pub async fn extract(pipeline: &ExtractPipeline, url: &str) -> ArticleContent {
    let mut article = ArticleContent::empty(url);

    // Step 0: resolve the aggregator indirection layer.
    let mut resolved = url.to_string();
    let mut landing_html: Option<String> = None;
    if resolve::is_aggregator_url(url) {
        let (target, html) = resolve::resolve_aggregator(&pipeline.session, url).await;
        if resolve::is_aggregator_url(&target) {
            debug!(%url, "Aggregator URL unresolved; continuing with it anyway");
        }
        resolved = target;
        landing_html = html;
    }
    article.final_url = Some(resolved.clone());

    // Step 1: primary fetch.
    if let Ok((final_url, html)) = get_with_backoff(&pipeline.plain, &resolved).await {
        if let Some(text) = content::structured_extract(&html) {
            if text.len() >= FLOOR_STRUCTURED {
                article.final_url = Some(final_url);
                article.body_text = Some(text);
                article.strategy_used = Some(Strategy::PrimaryFetch);
                apply_meta(&mut article, &html);
                return article;
            }
        }
        debug!(%resolved, "Primary fetch below floor; cascading");
    }

    // Steps 2–7 need raw markup: reuse the resolver's landing page if we have
    // one, otherwise GET with the browser-headered session.
    let (current_url, html) = match landing_html {
        Some(html) => (resolved.clone(), html),
        None => match get_with_backoff(&pipeline.session, &resolved).await {
            Ok(pair) => pair,
            Err(reason) => {
                debug!(%resolved, reason, "Raw fetch failed; cascade exhausted");
                article.failure_reason = Some("no_content_extracted".to_string());
                return article;
            }
        },
    };

    let (amp_link, canonical) = meta::find_amp_and_canonical(&html);

    // The AMP variant only merits a request once structured extraction over
    // the raw markup has come up short; it can never outrank that step.
    let amp_html = match content::structured_extract(&html) {
        Some(text) if text.len() >= FLOOR_STRUCTURED => None,
        _ => match &amp_link {
            Some(link) => get_with_backoff(&pipeline.session, link)
                .await
                .ok()
                .map(|(_, body)| body),
            None => None,
        },
    };

    match markup_cascade(&html, amp_html.as_deref()) {
        Some((text, strategy)) => {
            debug!(%current_url, strategy = strategy.as_str(), "Cascade strategy succeeded");
            article.body_text = Some(text);
            article.strategy_used = Some(strategy);
            article.final_url = Some(match (&canonical, strategy) {
                (Some(canon), _) => canon.clone(),
                (None, Strategy::AmpFallback) => amp_link.unwrap_or(current_url),
                _ => current_url,
            });
            if strategy == Strategy::AmpFallback {
                if let Some(amp) = &amp_html {
                    apply_meta(&mut article, amp);
                }
            }
            apply_meta(&mut article, &html);
        }
        None => {
            article.failure_reason = Some("no_content_extracted".to_string());
        }
    }
    article
}

/// Fan the cascade out over a candidate URL set with bounded parallelism.
///
/// One output per input URL, in completion order; callers join by `url`. Each
/// task sleeps a short random interval first, a politeness throttle against
/// bursts of same-host requests. A panicking task degrades to a failure
/// record, never aborting its siblings.
#[instrument(level = "info", skip_all, fields(urls = urls.len(), concurrency))]
pub async fn fetch_all(
    pipeline: &ExtractPipeline,
    urls: &[String],
    concurrency: usize,
) -> Vec<ArticleContent> {
    let cache_key = arg_key(&(urls.to_vec(), pipeline.user_agent.clone(), concurrency));
    if let Some(cached) = FETCH_CACHE.get(cache_key) {
        debug!(count = cached.len(), "Article fetch served from cache");
        return cached;
    }

    let task_pipeline = pipeline.clone();
    let results = run_tasks(urls, concurrency, move |url| {
        let pipeline = task_pipeline.clone();
        async move {
            let delay_ms: u64 = rng().random_range(350..=1100);
            sleep(Duration::from_millis(delay_ms)).await;
            extract(&pipeline, &url).await
        }
    })
    .await;

    let failed = results.iter().filter(|a| a.failure_reason.is_some()).count();
    info!(
        total = results.len(),
        extracted = results.len() - failed,
        failed,
        "Article fetching complete"
    );

    FETCH_CACHE.insert(cache_key, results.clone());
    results
}

/// Spawn one task per URL with bounded parallelism, one output per input.
///
/// Tasks are spawned lazily as the stream polls them, so at most
/// `concurrency` run at once. A panicking task is caught at join time and
/// converted into a failure record for its URL.
async fn run_tasks<F, Fut>(urls: &[String], concurrency: usize, task: F) -> Vec<ArticleContent>
where
    F: Fn(String) -> Fut,
    Fut: std::future::Future<Output = ArticleContent> + Send + 'static,
{
    let task = &task;
    stream::iter(urls.iter().cloned())
        .map(|url| {
            let task_url = url.clone();
            async move {
                let handle = tokio::spawn(task(url));
                match handle.await {
                    Ok(article) => article,
                    Err(e) => {
                        warn!(url = %task_url, error = %e, "Fetch task panicked");
                        ArticleContent::failed(&task_url, &format!("task: {e}"))
                    }
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}
