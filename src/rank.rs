//! Okapi BM25 lexical reranking of candidate records.
//!
//! Aggregated feeds interleave marginally-relevant matches (a keyword buried
//! in a long description scores the same as a headline hit under plain
//! substring matching). When reranking is enabled, each candidate's
//! title+description is treated as a document, the candidate set as the
//! corpus, and the keyword tokens as the query; candidates are stable-sorted
//! by descending score.

use crate::models::CandidateRecord;
use std::collections::HashMap;
use tracing::debug;

const K1: f64 = 1.5;
const B: f64 = 0.75;

/// Lowercased alphanumeric tokens of a text.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn record_tokens(record: &CandidateRecord) -> Vec<String> {
    let mut text = record.title.clone().unwrap_or_default();
    if let Some(desc) = &record.description {
        text.push(' ');
        text.push_str(desc);
    }
    tokenize(&text)
}

/// Score every record against the keyword tokens and return the set sorted by
/// descending relevance. The sort is stable, so equal scores keep their
/// pre-rank (date) order.
pub fn rerank(records: Vec<CandidateRecord>, keywords: &[String]) -> Vec<CandidateRecord> {
    if records.is_empty() || keywords.is_empty() {
        return records;
    }

    let docs: Vec<Vec<String>> = records.iter().map(record_tokens).collect();
    let doc_count = docs.len() as f64;
    let avg_len = docs.iter().map(|d| d.len() as f64).sum::<f64>() / doc_count;

    // Document frequency per query term.
    let query: Vec<String> = keywords.iter().flat_map(|k| tokenize(k)).collect();
    let mut doc_freq: HashMap<&str, f64> = HashMap::new();
    for term in &query {
        let df = docs.iter().filter(|d| d.iter().any(|t| t == term)).count() as f64;
        doc_freq.insert(term.as_str(), df);
    }

    let scores: Vec<f64> = docs
        .iter()
        .map(|doc| {
            let len = doc.len() as f64;
            let mut tf: HashMap<&str, f64> = HashMap::new();
            for token in doc {
                *tf.entry(token.as_str()).or_insert(0.0) += 1.0;
            }
            query
                .iter()
                .map(|term| {
                    let df = doc_freq[term.as_str()];
                    let f = tf.get(term.as_str()).copied().unwrap_or(0.0);
                    if f == 0.0 {
                        return 0.0;
                    }
                    let idf = ((doc_count - df + 0.5) / (df + 0.5) + 1.0).ln();
                    idf * (f * (K1 + 1.0)) / (f + K1 * (1.0 - B + B * len / avg_len.max(1.0)))
                })
                .sum()
        })
        .collect();

    let mut indexed: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    debug!(
        top_score = indexed.first().map(|(_, s)| *s).unwrap_or(0.0),
        count = records.len(),
        "Reranked candidates"
    );

    let mut slots: Vec<Option<CandidateRecord>> = records.into_iter().map(Some).collect();
    indexed
        .into_iter()
        .filter_map(|(i, _)| slots[i].take())
        .collect()
}
