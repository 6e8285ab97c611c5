//! Result assembly and report export.
//!
//! [`assemble`] joins extraction output back onto the discovered candidates by
//! `url`, resolves title and timestamp preferences, and applies the minimum
//! body length filter. The surviving articles are classified elsewhere and
//! folded into [`ReportRow`]s, which [`write_csv`] / [`write_json`] persist.

use crate::models::{ArticleContent, CandidateRecord, ReportRow, Sentiment};
use crate::utils::{collapse_whitespace, keywords_slug, parse_entry_date, wib};
use chrono::Utc;
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Articles shorter than this many characters are discarded as extraction noise.
pub const MIN_BODY_CHARS: usize = 80;

/// A candidate joined with its extracted body, before classification.
#[derive(Debug, Clone)]
pub struct AssembledArticle {
    pub title: String,
    pub source: String,
    pub published: String,
    pub url: String,
    pub description: String,
    pub body_text: String,
}

impl AssembledArticle {
    /// Fold in the classifier's verdict to produce the final row.
    pub fn into_row(self, sentiment: Sentiment, confidence: f64) -> ReportRow {
        ReportRow {
            title: self.title,
            source: self.source,
            published: self.published,
            sentiment,
            confidence,
            url: self.url,
            description: self.description,
            body_text: self.body_text,
        }
    }
}

/// Pick the display timestamp: the page's own publish date when it parses,
/// else the feed timestamp, else blank. Rendered in WIB.
fn resolve_published(candidate: &CandidateRecord, content: &ArticleContent) -> String {
    if let Some(raw) = content.publish_date.as_deref() {
        if let Some(dt) = parse_entry_date(raw) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    candidate
        .published
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Join extraction results onto candidates and filter out unusable bodies.
///
/// Candidate order is preserved. A candidate is dropped when its fetch failed,
/// produced no body, or the body (whitespace-collapsed) is shorter than
/// `min_len` characters. When everything is dropped the rejects are logged so
/// an empty report can be diagnosed.
#[instrument(level = "info", skip_all, fields(candidates = candidates.len(), min_len))]
pub fn assemble(
    candidates: &[CandidateRecord],
    contents: &[ArticleContent],
    min_len: usize,
) -> Vec<AssembledArticle> {
    let by_url: HashMap<&str, &ArticleContent> =
        contents.iter().map(|c| (c.url.as_str(), c)).collect();

    let mut articles = Vec::new();
    let mut rejected: Vec<(String, String)> = Vec::new();

    for candidate in candidates {
        let Some(content) = by_url.get(candidate.url.as_str()) else {
            rejected.push((candidate.url.clone(), "not_fetched".to_string()));
            continue;
        };
        if let Some(reason) = content.failure_reason.as_deref() {
            rejected.push((candidate.url.clone(), reason.to_string()));
            continue;
        }
        let body = content
            .body_text
            .as_deref()
            .map(collapse_whitespace)
            .unwrap_or_default();
        if body.chars().count() < min_len {
            rejected.push((
                candidate.url.clone(),
                format!("body_too_short:{}", body.chars().count()),
            ));
            continue;
        }

        let title = content
            .extracted_title
            .clone()
            .or_else(|| candidate.title.clone())
            .unwrap_or_else(|| "(tanpa judul)".to_string());

        articles.push(AssembledArticle {
            title,
            source: candidate.source.clone(),
            published: resolve_published(candidate, content),
            url: candidate.url.clone(),
            description: candidate.description.clone().unwrap_or_default(),
            body_text: body,
        });
    }

    if articles.is_empty() && !rejected.is_empty() {
        for (url, reason) in &rejected {
            debug!(%url, %reason, "Candidate rejected");
        }
    }
    info!(
        assembled = articles.len(),
        rejected = rejected.len(),
        "Assembly complete"
    );
    articles
}

/// Default report filename: keyword slug plus the run date in WIB.
pub fn report_filename(keywords: &[String], extension: &str) -> String {
    let slug = keywords_slug(keywords);
    let slug = if slug.is_empty() { "semua".to_string() } else { slug };
    let stamp = Utc::now().with_timezone(&wib()).format("%Y%m%d");
    format!("berita_{slug}_{stamp}.{extension}")
}

/// Quote one CSV field per RFC 4180.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_document(rows: &[ReportRow]) -> String {
    let mut out =
        String::from("title,source,published,sentiment,confidence,url,description,body_text\n");
    for row in rows {
        let fields = [
            csv_field(&row.title),
            csv_field(&row.source),
            csv_field(&row.published),
            row.sentiment.as_str().to_string(),
            format!("{:.4}", row.confidence),
            csv_field(&row.url),
            csv_field(&row.description),
            csv_field(&row.body_text),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Write the report as UTF-8 CSV.
#[instrument(level = "info", skip(rows))]
pub fn write_csv(rows: &[ReportRow], path: &Path) -> Result<(), Box<dyn Error>> {
    fs::write(path, csv_document(rows))?;
    info!(rows = rows.len(), path = %path.display(), "Wrote CSV report");
    Ok(())
}

/// Write the report as pretty-printed JSON.
#[instrument(level = "info", skip(rows))]
pub fn write_json(rows: &[ReportRow], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json)?;
    info!(rows = rows.len(), path = %path.display(), "Wrote JSON report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strategy;
    use crate::utils::parse_entry_date;

    fn candidate(url: &str, title: &str) -> CandidateRecord {
        CandidateRecord {
            title: Some(title.to_string()),
            url: url.to_string(),
            canonical_url: url.to_string(),
            source: "Kompas".to_string(),
            published: parse_entry_date("2024-03-12T09:00:00+07:00"),
            description: Some("ringkasan".to_string()),
            matched_keywords: vec!["inflasi".to_string()],
        }
    }

    fn content_with_body(url: &str, body: &str) -> ArticleContent {
        let mut content = ArticleContent::empty(url);
        content.body_text = Some(body.to_string());
        content.strategy_used = Some(Strategy::PrimaryFetch);
        content
    }

    #[test]
    fn test_assemble_joins_by_url() {
        let body = "Bank Indonesia menahan suku bunga acuan karena inflasi dinilai masih terkendali hingga akhir tahun.";
        let candidates = vec![candidate("https://k.com/1", "Judul Feed")];
        let contents = vec![content_with_body("https://k.com/1", body)];
        let articles = assemble(&candidates, &contents, MIN_BODY_CHARS);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Judul Feed");
        assert_eq!(articles[0].published, "2024-03-12 09:00");
    }

    #[test]
    fn test_assemble_prefers_extracted_title_and_date() {
        let body = "a ".repeat(60);
        let candidates = vec![candidate("https://k.com/1", "Judul Feed")];
        let mut content = content_with_body("https://k.com/1", &body);
        content.extracted_title = Some("Judul Halaman".to_string());
        content.publish_date = Some("2024-03-13T10:30:00+07:00".to_string());
        let articles = assemble(&candidates, &[content], MIN_BODY_CHARS);
        assert_eq!(articles[0].title, "Judul Halaman");
        assert_eq!(articles[0].published, "2024-03-13 10:30");
    }

    #[test]
    fn test_assemble_unparseable_page_date_falls_back_to_feed() {
        let body = "b ".repeat(60);
        let candidates = vec![candidate("https://k.com/1", "Judul")];
        let mut content = content_with_body("https://k.com/1", &body);
        content.publish_date = Some("kemarin".to_string());
        let articles = assemble(&candidates, &[content], MIN_BODY_CHARS);
        assert_eq!(articles[0].published, "2024-03-12 09:00");
    }

    #[test]
    fn test_assemble_drops_short_and_failed() {
        let candidates = vec![
            candidate("https://k.com/1", "Pendek"),
            candidate("https://k.com/2", "Gagal"),
            candidate("https://k.com/3", "Hilang"),
        ];
        let contents = vec![
            content_with_body("https://k.com/1", "terlalu pendek"),
            ArticleContent::failed("https://k.com/2", "no_content_extracted"),
        ];
        assert!(assemble(&candidates, &contents, MIN_BODY_CHARS).is_empty());
    }

    #[test]
    fn test_assemble_collapses_body_whitespace() {
        let body = format!("awal  paragraf\n\nlanjutan{}", " isi".repeat(40));
        let candidates = vec![candidate("https://k.com/1", "Judul")];
        let contents = vec![content_with_body("https://k.com/1", &body)];
        let articles = assemble(&candidates, &contents, MIN_BODY_CHARS);
        assert!(articles[0].body_text.starts_with("awal paragraf lanjutan"));
    }

    fn sample_row() -> ReportRow {
        AssembledArticle {
            title: "Judul, dengan \"kutipan\"".to_string(),
            source: "Kompas".to_string(),
            published: "2024-03-12 09:00".to_string(),
            url: "https://k.com/1".to_string(),
            description: "baris\nbaru".to_string(),
            body_text: "Isi artikel.".to_string(),
        }
        .into_row(Sentiment::Positif, 0.9132)
    }

    #[test]
    fn test_csv_escaping() {
        let doc = csv_document(&[sample_row()]);
        let mut lines = doc.lines();
        assert!(lines.next().unwrap().starts_with("title,source,published"));
        let row = doc[doc.find('\n').unwrap() + 1..].to_string();
        assert!(row.contains("\"Judul, dengan \"\"kutipan\"\"\""));
        assert!(row.contains("positif,0.9132"));
        assert!(row.contains("\"baris\nbaru\""));
    }

    #[test]
    fn test_csv_plain_fields_unquoted() {
        let doc = csv_document(&[sample_row()]);
        assert!(doc.contains(",Kompas,"));
        assert!(doc.contains(",https://k.com/1,"));
    }

    #[test]
    fn test_report_filename_slug() {
        let kws = vec!["BI rate".to_string(), "inflasi".to_string()];
        let name = report_filename(&kws, "csv");
        assert!(name.starts_with("berita_BIrate_inflasi_"));
        assert!(name.ends_with(".csv"));

        let empty = report_filename(&[], "json");
        assert!(empty.starts_with("berita_semua_"));
    }
}
