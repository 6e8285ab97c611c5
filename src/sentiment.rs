//! External sentiment-classifier client with retry and batch fallback.
//!
//! The classifier itself is an external collaborator reached over HTTP (an
//! inference server hosting an Indonesian sentiment model). This module owns
//! only the boundary:
//! - [`Classify`]: the `classify_batch` contract over {positif, netral, negatif}
//! - [`HttpClassifier`]: reqwest-based implementation against an inference endpoint
//! - [`RetryClassify`]: decorator adding exponential backoff with jitter
//! - [`batch_sentiment`]: chunked classification with per-item fallback
//!
//! Classifier-native labels vary by model (`positive`, `LABEL_2`, star
//! ratings); [`map_label`] folds them all into the three-way domain.

use crate::models::Sentiment;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use rand::{rng, Rng};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Classifier input is trimmed and capped to this many characters.
const MAX_INPUT_CHARS: usize = 6000;

/// Contract for a three-way sentiment classifier.
pub trait Classify {
    /// Classify a batch of texts, one `(label, confidence)` per input.
    async fn classify_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<(Sentiment, f64)>, Box<dyn Error>>;
}

/// One prediction as reported by the inference server.
#[derive(Debug, Deserialize)]
struct RawPrediction {
    label: String,
    score: f64,
}

static STAR_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)").unwrap());

/// Fold a classifier-native label into the three-way domain.
///
/// Handles three conventions: word labels (`positive`/`neutral`/`negative`),
/// index labels (`LABEL_0`..`LABEL_2`), and star ratings (`1 star`..`5 stars`).
/// Unrecognized labels land on netral.
pub fn map_label(label: &str, score: f64) -> (Sentiment, f64) {
    let lab = label.to_lowercase();
    if lab.contains("pos") {
        return (Sentiment::Positif, score);
    }
    if lab.contains("neu") {
        return (Sentiment::Netral, score);
    }
    if lab.contains("neg") {
        return (Sentiment::Negatif, score);
    }
    if let Some(c) = STAR_DIGIT.captures(&lab) {
        let value: u32 = c[1].parse().unwrap_or(3);
        if lab.starts_with("label_") {
            return match value {
                2 => (Sentiment::Positif, score),
                1 => (Sentiment::Netral, score),
                _ => (Sentiment::Negatif, score),
            };
        }
        return match value {
            0..=2 => (Sentiment::Negatif, score),
            3 => (Sentiment::Netral, score),
            _ => (Sentiment::Positif, score),
        };
    }
    (Sentiment::Netral, score)
}

/// Trim and cap one classifier input.
fn safe_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_INPUT_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(MAX_INPUT_CHARS).collect()
    }
}

/// reqwest-backed classifier against an HTTP inference endpoint.
///
/// The endpoint accepts `{"inputs": [...]}` and answers one prediction list
/// per input (the hosted-inference convention).
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(client: Client, endpoint: &str) -> Self {
        HttpClassifier {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

impl Classify for HttpClassifier {
    #[instrument(level = "info", skip_all, fields(batch = texts.len()))]
    async fn classify_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<(Sentiment, f64)>, Box<dyn Error>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "inputs": texts }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!(
                "classifier endpoint {status}: {}",
                truncate_for_log(&body, 200)
            )
            .into());
        }

        // Either one prediction list per input, or one flat list for a
        // single-input call.
        let value: serde_json::Value = response.json().await?;
        let per_input: Vec<Vec<RawPrediction>> =
            match serde_json::from_value::<Vec<Vec<RawPrediction>>>(value.clone()) {
                Ok(nested) => nested,
                Err(_) => vec![serde_json::from_value::<Vec<RawPrediction>>(value)?],
            };

        if per_input.len() != texts.len() {
            return Err(format!(
                "classifier returned {} results for {} inputs",
                per_input.len(),
                texts.len()
            )
            .into());
        }

        Ok(per_input
            .into_iter()
            .map(|predictions| {
                predictions
                    .into_iter()
                    .max_by(|a, b| a.score.total_cmp(&b.score))
                    .map(|p| map_label(&p.label, p.score))
                    .unwrap_or((Sentiment::Netral, 0.0))
            })
            .collect())
    }
}

/// Decorator adding exponential backoff with jitter to any [`Classify`].
pub struct RetryClassify<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T: Classify> RetryClassify<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        RetryClassify {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<T: Classify> Classify for RetryClassify<T> {
    async fn classify_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<(Sentiment, f64)>, Box<dyn Error>> {
        let mut attempt = 0usize;
        loop {
            match self.inner.classify_batch(texts).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(attempt, error = %e, "classify_batch exhausted retries");
                        return Err(e);
                    }
                    let mut delay = self.base_delay.saturating_mul(1u32 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);
                    warn!(attempt, max = self.max_retries, ?delay, error = %e, "classify_batch failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Classify `texts` in chunks of `batch_size`.
///
/// A failing chunk is retried item by item; an item that still fails yields
/// `(netral, 0.0)` rather than aborting the run. Output order matches input.
#[instrument(level = "info", skip_all, fields(texts = texts.len(), batch_size))]
pub async fn batch_sentiment<C: Classify>(
    classifier: &C,
    texts: &[String],
    batch_size: usize,
) -> Vec<(Sentiment, f64)> {
    let mut results = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(batch_size.max(1)) {
        let safe: Vec<String> = chunk.iter().map(|t| safe_text(t)).collect();
        match classifier.classify_batch(&safe).await {
            Ok(mut scored) => results.append(&mut scored),
            Err(e) => {
                warn!(error = %e, chunk = safe.len(), "Batch failed; retrying item by item");
                for text in &safe {
                    match classifier.classify_batch(std::slice::from_ref(text)).await {
                        Ok(mut single) if !single.is_empty() => results.push(single.remove(0)),
                        Ok(_) => results.push((Sentiment::Netral, 0.0)),
                        Err(e) => {
                            warn!(error = %e, "Single-item classify failed; defaulting to netral");
                            results.push((Sentiment::Netral, 0.0));
                        }
                    }
                }
            }
        }
    }
    info!(classified = results.len(), "Sentiment classification complete");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_map_label_word_labels() {
        assert_eq!(map_label("positive", 0.9).0, Sentiment::Positif);
        assert_eq!(map_label("Neutral", 0.5).0, Sentiment::Netral);
        assert_eq!(map_label("NEGATIVE", 0.8).0, Sentiment::Negatif);
    }

    #[test]
    fn test_map_label_index_labels() {
        assert_eq!(map_label("LABEL_2", 0.9).0, Sentiment::Positif);
        assert_eq!(map_label("LABEL_1", 0.9).0, Sentiment::Netral);
        assert_eq!(map_label("LABEL_0", 0.9).0, Sentiment::Negatif);
    }

    #[test]
    fn test_map_label_star_ratings() {
        assert_eq!(map_label("1 star", 0.7).0, Sentiment::Negatif);
        assert_eq!(map_label("3 stars", 0.7).0, Sentiment::Netral);
        assert_eq!(map_label("5 stars", 0.7).0, Sentiment::Positif);
    }

    #[test]
    fn test_map_label_unknown_defaults_netral() {
        let (label, score) = map_label("entah", 0.42);
        assert_eq!(label, Sentiment::Netral);
        assert_eq!(score, 0.42);
    }

    #[test]
    fn test_safe_text_trims_and_caps() {
        assert_eq!(safe_text("  halo  "), "halo");
        let long = "a".repeat(MAX_INPUT_CHARS + 500);
        assert_eq!(safe_text(&long).chars().count(), MAX_INPUT_CHARS);
    }

    /// Fails every multi-item batch; succeeds on single items.
    struct FlakyClassifier {
        calls: AtomicUsize,
    }

    impl Classify for FlakyClassifier {
        async fn classify_batch(
            &self,
            texts: &[String],
        ) -> Result<Vec<(Sentiment, f64)>, Box<dyn Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if texts.len() > 1 {
                return Err("batch too large".into());
            }
            if texts[0].contains("rusak") {
                return Err("unclassifiable".into());
            }
            Ok(vec![(Sentiment::Positif, 0.9)])
        }
    }

    #[tokio::test]
    async fn test_batch_falls_back_to_items_and_defaults() {
        let classifier = FlakyClassifier {
            calls: AtomicUsize::new(0),
        };
        let texts = vec![
            "berita baik".to_string(),
            "berita rusak".to_string(),
            "berita baik lagi".to_string(),
        ];
        let results = batch_sentiment(&classifier, &texts, 8).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, Sentiment::Positif);
        assert_eq!(results[1], (Sentiment::Netral, 0.0));
        assert_eq!(results[2].0, Sentiment::Positif);
        // One failed batch call plus three single-item calls.
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 4);
    }

    struct CountingClassifier;

    impl Classify for CountingClassifier {
        async fn classify_batch(
            &self,
            texts: &[String],
        ) -> Result<Vec<(Sentiment, f64)>, Box<dyn Error>> {
            Ok(texts.iter().map(|_| (Sentiment::Negatif, 0.6)).collect())
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_count() {
        let texts: Vec<String> = (0..20).map(|i| format!("teks {i}")).collect();
        let results = batch_sentiment(&CountingClassifier, &texts, 8).await;
        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|(s, _)| *s == Sentiment::Negatif));
    }
}
