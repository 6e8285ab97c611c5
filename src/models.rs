//! Data models for discovered candidates, extraction results, and report rows.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`CandidateRecord`]: An article reference discovered in a feed, before extraction
//! - [`ArticleContent`]: The outcome of running the extraction cascade on one URL
//! - [`Strategy`]: Which cascade step produced the body text
//! - [`Sentiment`]: The three-way sentiment label
//! - [`ReportRow`]: The final joined row handed to presentation/export
//!
//! `CandidateRecord` and `ArticleContent` are immutable once constructed; the
//! assembler joins them by `url` into `ReportRow`s.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// An article reference discovered during feed/backend scanning.
///
/// Records are only materialized for entries that matched at least one
/// keyword, so `matched_keywords` is non-empty by construction. Within one
/// aggregation result `canonical_url` is unique (first-seen wins).
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRecord {
    /// Entry title as reported by the feed.
    pub title: Option<String>,
    /// The link exactly as it appeared in the feed.
    pub url: String,
    /// Tracking-parameter-stripped, AMP-normalized URL used for dedup.
    pub canonical_url: String,
    /// Name of the feed source (catalog key) or search backend.
    pub source: String,
    /// Publication timestamp normalized to WIB, if parseable.
    pub published: Option<DateTime<FixedOffset>>,
    /// Entry summary/description as reported by the feed.
    pub description: Option<String>,
    /// The subset of query keywords found in title/description.
    pub matched_keywords: Vec<String>,
}

/// Which cascade strategy produced the extracted body text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Direct fetch of the resolved URL plus structured extraction.
    PrimaryFetch,
    /// Structured extraction re-run on a plain GET's raw markup.
    RawHtmlExtract,
    /// Extraction from the page's AMP variant.
    AmpFallback,
    /// Largest-text-block readability heuristic.
    Readability,
    /// Text-density boilerplate removal.
    BoilerplateRemoval,
    /// Stopword-density paragraph classification.
    StatisticalBoilerplate,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::PrimaryFetch => "primary_fetch",
            Strategy::RawHtmlExtract => "raw_html_extract",
            Strategy::AmpFallback => "amp_fallback",
            Strategy::Readability => "readability",
            Strategy::BoilerplateRemoval => "boilerplate_removal",
            Strategy::StatisticalBoilerplate => "statistical_boilerplate",
        }
    }
}

/// Extraction output for one candidate URL.
///
/// Exactly one of `body_text` / `failure_reason` is set on a completed record.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleContent {
    /// The input URL (join key back to the candidate).
    pub url: String,
    /// URL after redirect resolution; may differ from `url`.
    pub final_url: Option<String>,
    /// Title recovered from page metadata.
    pub extracted_title: Option<String>,
    /// Whitespace-normalized article body.
    pub body_text: Option<String>,
    /// Publication date recovered from page metadata.
    pub publish_date: Option<String>,
    /// Meta description recovered from page metadata.
    pub meta_description: Option<String>,
    /// The cascade step that produced `body_text`.
    pub strategy_used: Option<Strategy>,
    /// Terminal condition when no strategy yielded usable text.
    pub failure_reason: Option<String>,
}

impl ArticleContent {
    /// An empty result for `url` with no body and no failure recorded yet.
    pub fn empty(url: &str) -> Self {
        ArticleContent {
            url: url.to_string(),
            final_url: None,
            extracted_title: None,
            body_text: None,
            publish_date: None,
            meta_description: None,
            strategy_used: None,
            failure_reason: None,
        }
    }

    /// A terminal failure record for `url`.
    pub fn failed(url: &str, reason: &str) -> Self {
        let mut content = ArticleContent::empty(url);
        content.failure_reason = Some(reason.to_string());
        content
    }
}

/// Three-way sentiment label over Indonesian news text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positif,
    Netral,
    Negatif,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positif => "positif",
            Sentiment::Netral => "netral",
            Sentiment::Negatif => "negatif",
        }
    }
}

/// A fully assembled result row: candidate metadata joined with extraction
/// output and the classifier's verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    /// Extracted title if present, else the feed title.
    pub title: String,
    /// Feed source name.
    pub source: String,
    /// Extracted publish date if present, else the feed timestamp (WIB).
    pub published: String,
    /// Sentiment label from the classifier.
    pub sentiment: Sentiment,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    /// The candidate URL.
    pub url: String,
    /// Feed description.
    pub description: String,
    /// The extracted body text (survives the MIN_LEN filter).
    pub body_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_serializes_snake_case() {
        let json = serde_json::to_string(&Strategy::RawHtmlExtract).unwrap();
        assert_eq!(json, "\"raw_html_extract\"");
        assert_eq!(Strategy::AmpFallback.as_str(), "amp_fallback");
    }

    #[test]
    fn test_sentiment_serializes_lowercase() {
        let json = serde_json::to_string(&Sentiment::Positif).unwrap();
        assert_eq!(json, "\"positif\"");
        let parsed: Sentiment = serde_json::from_str("\"negatif\"").unwrap();
        assert_eq!(parsed, Sentiment::Negatif);
    }

    #[test]
    fn test_candidate_record_serializes_with_timestamp() {
        let record = CandidateRecord {
            title: Some("BI soal inflasi".to_string()),
            url: "https://contoh.co.id/read/1".to_string(),
            canonical_url: "https://contoh.co.id/read/1".to_string(),
            source: "Kompas".to_string(),
            published: DateTime::parse_from_rfc3339("2024-03-12T09:00:00+07:00").ok(),
            description: None,
            matched_keywords: vec!["inflasi".to_string()],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("2024-03-12T09:00:00+07:00"));
        assert!(json.contains("\"source\":\"Kompas\""));
    }

    #[test]
    fn test_article_content_failed_sets_reason_only() {
        let content = ArticleContent::failed("https://example.com/a", "no_content_extracted");
        assert!(content.body_text.is_none());
        assert_eq!(
            content.failure_reason.as_deref(),
            Some("no_content_extracted")
        );
    }

    #[test]
    fn test_article_content_terminal_state_is_exclusive() {
        let mut content = ArticleContent::empty("https://example.com/a");
        content.body_text = Some("isi artikel".to_string());
        assert!(content.body_text.is_some() ^ content.failure_reason.is_some());

        let failed = ArticleContent::failed("https://example.com/b", "timeout");
        assert!(failed.body_text.is_some() ^ failed.failure_reason.is_some());
    }
}
