//! # Kabar Sentimen
//!
//! A news aggregation and sentiment pipeline over Indonesian media: scans a
//! catalog of RSS/Atom feeds (optionally plus the Google News RSS search
//! backend) for keyword matches, extracts article bodies through a multi-step
//! fallback cascade, classifies each article's sentiment through an external
//! inference endpoint, and writes a CSV (and optionally JSON) report.
//!
//! ## Usage
//!
//! ```sh
//! kabar_sentimen -k "inflasi, suku bunga" --date-start 2024-03-01
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Aggregation**: Fan out over the feed catalog, filter by keyword and
//!    date, dedup by canonical URL, order by recency or BM25 relevance
//! 2. **Extraction**: Fetch each candidate (8 at a time) and run the
//!    content-extraction cascade
//! 3. **Assembly**: Join extraction output back onto the candidates and drop
//!    unusable bodies
//! 4. **Classification**: Batch the bodies through the sentiment endpoint
//! 5. **Output**: Write the CSV/JSON report

use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod aggregate;
mod cache;
mod cli;
mod extract;
mod feeds;
mod models;
mod rank;
mod report;
mod rss;
mod search;
mod sentiment;
mod utils;

use aggregate::AggregateRequest;
use cli::Cli;
use extract::ExtractPipeline;
use sentiment::{batch_sentiment, HttpClassifier, RetryClassify};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("kabar_sentimen starting up");

    // Parse CLI
    let args = Cli::parse();
    if let Err(e) = args.validate() {
        return Err(e.into());
    }
    let keywords = args.keyword_list();
    debug!(?keywords, max = args.max_results, "Parsed CLI arguments");

    let pipeline = ExtractPipeline::new(args.user_agent.as_deref())?;

    // ---- Aggregate candidates across the feed catalog ----
    let request = AggregateRequest {
        keywords: keywords.clone(),
        max_results: args.max_results,
        date_start: args.date_start,
        date_end: args.date_end,
        use_google_news: args.google_news,
        rerank: args.rerank,
        west_java_only: args.jabar,
    };
    let candidates = aggregate::aggregate(pipeline.session(), &request).await?;
    info!(count = candidates.len(), "Candidates after filtering and dedup");

    if candidates.is_empty() {
        info!("No articles matched; nothing to report");
        return Ok(());
    }

    // ---- Fetch and extract article bodies ----
    let urls: Vec<String> = candidates.iter().map(|c| c.url.clone()).collect();
    let contents = extract::fetch_all(&pipeline, &urls, args.concurrency).await;

    let extracted = contents.iter().filter(|c| c.body_text.is_some()).count();
    info!(
        total = contents.len(),
        extracted,
        failed = contents.len() - extracted,
        "Extraction complete"
    );

    // ---- Assemble rows ----
    let articles = report::assemble(&candidates, &contents, args.min_len);
    if articles.is_empty() {
        info!("No article passed the minimum body length; nothing to report");
        return Ok(());
    }

    // ---- Classify sentiment ----
    let classifier_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let classifier = RetryClassify::new(
        HttpClassifier::new(classifier_client, &args.sentiment_endpoint),
        2,
        Duration::from_secs(1),
    );

    let texts: Vec<String> = articles.iter().map(|a| a.body_text.clone()).collect();
    let verdicts = batch_sentiment(&classifier, &texts, args.batch_size).await;

    let rows: Vec<models::ReportRow> = articles
        .into_iter()
        .zip(verdicts)
        .map(|(article, (label, confidence))| article.into_row(label, confidence))
        .collect();

    let label_counts = rows.iter().counts_by(|r| r.sentiment.as_str());
    info!(
        rows = rows.len(),
        positif = label_counts.get("positif").copied().unwrap_or(0),
        netral = label_counts.get("netral").copied().unwrap_or(0),
        negatif = label_counts.get("negatif").copied().unwrap_or(0),
        "Sentiment distribution"
    );

    // ---- Write reports ----
    let out_dir = Path::new(&args.output_dir);
    let csv_path = out_dir.join(report::report_filename(&keywords, "csv"));
    report::write_csv(&rows, &csv_path)?;

    if args.json {
        let json_path = out_dir.join(report::report_filename(&keywords, "json"));
        report::write_json(&rows, &json_path)?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
