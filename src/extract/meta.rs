//! Page-metadata recovery: title, publish date, description, and the AMP and
//! canonical link variants.
//!
//! Publishers disagree on where metadata lives, so each accessor walks a
//! preference ladder (Open Graph, then JSON-LD, then plain tags) and settles
//! for the first non-empty value.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Metadata recovered from one page.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .filter_map(|e| e.value().attr("content"))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn jsonld_date(document: &Html) -> Option<String> {
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for script in document.select(&sel) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        // Either a single object or a @graph array.
        let objects: Vec<&serde_json::Value> = match value.as_array() {
            Some(arr) => arr.iter().collect(),
            None => value
                .get("@graph")
                .and_then(|g| g.as_array())
                .map(|arr| arr.iter().collect())
                .unwrap_or_else(|| vec![&value]),
        };
        for obj in objects {
            if let Some(date) = obj.get("datePublished").and_then(|d| d.as_str()) {
                if !date.is_empty() {
                    return Some(date.to_string());
                }
            }
        }
    }
    None
}

/// Recover title/date/description from page markup.
pub fn page_metadata(html: &str) -> PageMeta {
    let document = Html::parse_document(html);

    let title = meta_content(&document, r#"meta[property="og:title"]"#).or_else(|| {
        let sel = Selector::parse("title").ok()?;
        document
            .select(&sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let date = meta_content(&document, r#"meta[property="article:published_time"]"#)
        .or_else(|| meta_content(&document, r#"meta[name="publish-date"]"#))
        .or_else(|| meta_content(&document, r#"meta[name="date"]"#))
        .or_else(|| jsonld_date(&document))
        .or_else(|| {
            let sel = Selector::parse("time[datetime]").ok()?;
            document
                .select(&sel)
                .filter_map(|e| e.value().attr("datetime"))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        });

    let description = meta_content(&document, r#"meta[property="og:description"]"#)
        .or_else(|| meta_content(&document, r#"meta[name="description"]"#));

    PageMeta {
        title,
        date,
        description,
    }
}

static AMP_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link[^>]+rel=["']amphtml["'][^>]+href=["']([^"']+)["']"#).unwrap()
});
static CANONICAL_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link[^>]+rel=["']canonical["'][^>]+href=["']([^"']+)["']"#).unwrap()
});

/// Find the AMP variant and canonical link of a page, if declared.
///
/// Regex scan instead of DOM parse: these links sit in `<head>` and must be
/// findable even in markup too broken for the parser.
pub fn find_amp_and_canonical(html: &str) -> (Option<String>, Option<String>) {
    let amp = AMP_LINK
        .captures(html)
        .map(|c| c[1].replace("&amp;", "&"));
    let canonical = CANONICAL_LINK
        .captures(html)
        .map(|c| c[1].replace("&amp;", "&"));
    (amp, canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_og_title_preferred_over_title_tag() {
        let html = r#"<html><head>
            <title>Judul Tag</title>
            <meta property="og:title" content="Judul OG"/>
        </head><body></body></html>"#;
        assert_eq!(page_metadata(html).title.as_deref(), Some("Judul OG"));
    }

    #[test]
    fn test_title_tag_fallback() {
        let html = "<html><head><title>Hanya Title</title></head><body></body></html>";
        assert_eq!(page_metadata(html).title.as_deref(), Some("Hanya Title"));
    }

    #[test]
    fn test_published_time_meta() {
        let html = r#"<head><meta property="article:published_time" content="2024-03-12T09:00:00+07:00"/></head>"#;
        assert_eq!(
            page_metadata(html).date.as_deref(),
            Some("2024-03-12T09:00:00+07:00")
        );
    }

    #[test]
    fn test_jsonld_date_fallback() {
        let html = r#"<head><script type="application/ld+json">
            {"@type":"NewsArticle","datePublished":"2024-03-12","headline":"x"}
        </script></head>"#;
        assert_eq!(page_metadata(html).date.as_deref(), Some("2024-03-12"));
    }

    #[test]
    fn test_jsonld_graph_date() {
        let html = r#"<head><script type="application/ld+json">
            {"@graph":[{"@type":"WebPage"},{"@type":"NewsArticle","datePublished":"2024-05-01"}]}
        </script></head>"#;
        assert_eq!(page_metadata(html).date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_description_ladder() {
        let html = r#"<head><meta name="description" content="Deskripsi biasa"/></head>"#;
        assert_eq!(
            page_metadata(html).description.as_deref(),
            Some("Deskripsi biasa")
        );
    }

    #[test]
    fn test_find_amp_and_canonical() {
        let html = r#"<head>
            <link rel="amphtml" href="https://contoh.co.id/amp/1?a=1&amp;b=2"/>
            <link rel="canonical" href="https://contoh.co.id/read/1"/>
        </head>"#;
        let (amp, canonical) = find_amp_and_canonical(html);
        assert_eq!(amp.as_deref(), Some("https://contoh.co.id/amp/1?a=1&b=2"));
        assert_eq!(canonical.as_deref(), Some("https://contoh.co.id/read/1"));
    }

    #[test]
    fn test_missing_metadata_is_none() {
        let meta = page_metadata("<html><body><p>teks</p></body></html>");
        assert_eq!(meta, PageMeta::default());
        let (amp, canonical) = find_amp_and_canonical("<p>tanpa link</p>");
        assert!(amp.is_none() && canonical.is_none());
    }
}
