//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets and machine-specific values can also come from environment
//! variables.

use crate::report::MIN_BODY_CHARS;
use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the news sentiment pipeline.
///
/// # Examples
///
/// ```sh
/// # Basic usage
/// kabar_sentimen -k "inflasi, suku bunga"
///
/// # Date-bounded, with the Google News backend and BM25 ordering
/// kabar_sentimen -k inflasi --date-start 2024-03-01 --date-end 2024-03-31 \
///     --google-news --rerank
///
/// # West Java items only, JSON alongside the CSV
/// kabar_sentimen -k banjir --jabar --json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Keywords to search for, separated by commas or semicolons
    #[arg(short, long)]
    pub keywords: String,

    /// Maximum number of articles in the result set
    #[arg(short = 'n', long, default_value_t = 60)]
    pub max_results: usize,

    /// Earliest publish date to keep (YYYY-MM-DD, WIB)
    #[arg(long)]
    pub date_start: Option<NaiveDate>,

    /// Latest publish date to keep (YYYY-MM-DD, WIB)
    #[arg(long)]
    pub date_end: Option<NaiveDate>,

    /// Also query the Google News RSS search backend
    #[arg(long)]
    pub google_news: bool,

    /// Order results by BM25 keyword relevance instead of publish date
    #[arg(long)]
    pub rerank: bool,

    /// Keep only West-Java-related items
    #[arg(long)]
    pub jabar: bool,

    /// Concurrent article fetches
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    /// Minimum extracted body length, in characters
    #[arg(long, default_value_t = MIN_BODY_CHARS)]
    pub min_len: usize,

    /// User-Agent header for article fetches
    #[arg(long, env = "KABAR_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Sentiment inference endpoint URL
    #[arg(long, env = "SENTIMENT_ENDPOINT")]
    pub sentiment_endpoint: String,

    /// Texts per classifier request
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Output directory for the CSV report
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Also write a JSON report next to the CSV
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Split the keywords argument on commas and semicolons, dropping blanks.
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .split([',', ';'])
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }

    /// Reject argument combinations that cannot produce a result.
    pub fn validate(&self) -> Result<(), String> {
        if self.keyword_list().is_empty() {
            return Err("no keywords given (use --keywords \"kata1, kata2\")".to_string());
        }
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if end < start {
                return Err(format!("--date-end {end} is before --date-start {start}"));
            }
        }
        Ok(())
    }
}
