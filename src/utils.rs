//! Shared helpers: timestamp normalization, URL canonicalization, keyword
//! matching, and small string utilities.
//!
//! Everything here is pure and synchronous. Date handling follows one rule
//! throughout the pipeline: parse best-effort into WIB (UTC+7), and treat an
//! unparseable date as `None` rather than an error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Western Indonesia Time, the reference timezone for all published dates.
pub fn wib() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap()
}

/// Parse a feed timestamp in whatever format the source emits, normalized to WIB.
///
/// Tries RFC 2822 (the RSS standard), then RFC 3339 (Atom), then a handful of
/// formats seen in Indonesian feeds. Returns `None` when nothing matches.
pub fn parse_entry_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&wib()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&wib()));
    }

    // Zone-less formats are taken as already being WIB.
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return wib().from_local_datetime(&naive).single();
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return wib().from_local_datetime(&naive).single();
        }
    }

    None
}

/// Check whether a WIB timestamp's date falls inside the inclusive range.
///
/// With neither bound set every timestamp passes, including `None`. Once a
/// bound is active an absent timestamp fails (conservative exclusion).
pub fn in_date_range(
    published: Option<&DateTime<FixedOffset>>,
    date_start: Option<NaiveDate>,
    date_end: Option<NaiveDate>,
) -> bool {
    if date_start.is_none() && date_end.is_none() {
        return true;
    }
    let Some(dt) = published else {
        return false;
    };
    let day = dt.date_naive();
    if let Some(start) = date_start {
        if day < start {
            return false;
        }
    }
    if let Some(end) = date_end {
        if day > end {
            return false;
        }
    }
    true
}

/// Return the subset of `keywords` present as case-insensitive substrings of
/// the entry's title or description. Blank keywords are ignored.
///
/// Deliberate substring semantics: no stemming, no word boundaries. False
/// positives are cheap and acceptable given downstream human review.
pub fn match_keywords(title: &str, description: &str, keywords: &[String]) -> Vec<String> {
    let title = title.to_lowercase();
    let description = description.to_lowercase();
    let mut hits = Vec::new();
    for kw in keywords {
        let needle = kw.trim().to_lowercase();
        if !needle.is_empty() && (title.contains(&needle) || description.contains(&needle)) {
            hits.push(kw.clone());
        }
    }
    hits
}

/// Strip tracking query parameters and AMP path segments from a URL.
///
/// The result is the deduplication key for candidates, so this function is
/// idempotent: canonicalizing a canonical URL is a no-op. Unparseable input
/// is returned unchanged.
pub fn canonicalize(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            !key.starts_with("utm_") && key != "gclid" && key != "fbclid"
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let mut query = String::new();
        for (i, (k, v)) in kept.iter().enumerate() {
            if i > 0 {
                query.push('&');
            }
            query.push_str(&urlencoding::encode(k));
            if !v.is_empty() {
                query.push('=');
                query.push_str(&urlencoding::encode(v));
            }
        }
        parsed.set_query(Some(&query));
    }
    parsed.set_fragment(None);

    // A single replace pass leaves one segment behind on "/amp/amp/", so
    // iterate to a fixpoint to keep canonicalization idempotent.
    let mut path = parsed.path().to_string();
    while path.contains("/amp/") {
        path = path.replace("/amp/", "/");
    }
    let path = path.strip_suffix("/amp").unwrap_or(&path).to_string();
    parsed.set_path(&path);

    parsed.to_string()
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    WS.replace_all(text.trim(), " ").into_owned()
}

static JABAR_KEYWORDS: &[&str] = &[
    "jawa barat",
    "jabar",
    "bandung",
    "kota bandung",
    "kabupaten bandung",
    "bandung barat",
    "cimahi",
    "sumedang",
    "garut",
    "tasikmalaya",
    "cianjur",
    "sukabumi",
    "bogor",
    "depok",
    "bekasi",
    "karawang",
    "purwakarta",
    "subang",
    "indramayu",
    "majalengka",
    "kuningan",
    "cirebon",
    "pangandaran",
    "banjar",
    "gedung sate",
    "bandung raya",
    "lembang",
    "ciwidey",
    "parahyangan",
];

static JABAR_URL_HINTS: &[&str] = &[
    "jabar",
    "jawabarat",
    "bandung",
    "cirebon",
    "bogor",
    "bekasi",
    "tasik",
    "garut",
    "cianjur",
    "sukabumi",
    "depok",
];

/// West Java regional filter: keyword hit in title/description, or a region
/// slug in the URL.
pub fn is_west_java_hit(title: &str, description: &str, url: &str) -> bool {
    let title = title.to_lowercase();
    let description = description.to_lowercase();
    if JABAR_KEYWORDS
        .iter()
        .any(|k| title.contains(k) || description.contains(k))
    {
        return true;
    }
    let url = url.to_lowercase();
    JABAR_URL_HINTS.iter().any(|h| url.contains(h))
}

/// Reduce a keyword list to a filename-safe slug: `["BI rate", "inflasi"]`
/// becomes `"BIrate_inflasi"`.
pub fn keywords_slug(keywords: &[String]) -> String {
    static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\-]").unwrap());
    NON_WORD.replace_all(&keywords.join("_"), "").into_owned()
}

/// Truncate a string for logging, appending the elided byte count.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_date_rfc2822() {
        let dt = parse_entry_date("Tue, 12 Mar 2024 04:30:00 +0000").unwrap();
        // 04:30 UTC is 11:30 WIB.
        assert_eq!(dt.offset().local_minus_utc(), 7 * 3600);
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-03-12 11:30");
    }

    #[test]
    fn test_parse_entry_date_rfc3339() {
        let dt = parse_entry_date("2024-03-12T00:30:00+07:00").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "00:30");
    }

    #[test]
    fn test_parse_entry_date_bare_date() {
        let dt = parse_entry_date("2024-03-12").unwrap();
        assert_eq!(dt.date_naive().to_string(), "2024-03-12");
    }

    #[test]
    fn test_parse_entry_date_garbage() {
        assert!(parse_entry_date("kemarin sore").is_none());
        assert!(parse_entry_date("").is_none());
    }

    #[test]
    fn test_in_date_range_no_filter_passes_undated() {
        assert!(in_date_range(None, None, None));
    }

    #[test]
    fn test_in_date_range_filter_rejects_undated() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(!in_date_range(None, start, None));
    }

    #[test]
    fn test_in_date_range_bounds_inclusive() {
        let dt = parse_entry_date("2024-01-31T10:00:00+07:00").unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        let end = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert!(in_date_range(Some(&dt), start, end));

        let feb = parse_entry_date("2024-02-01T10:00:00+07:00").unwrap();
        assert!(!in_date_range(Some(&feb), start, end));
    }

    #[test]
    fn test_match_keywords_subset_and_case() {
        let keywords = vec!["Inflasi".to_string(), "suku bunga".to_string()];
        let hits = match_keywords("BI soal inflasi Maret", "Bank Indonesia menahan", &keywords);
        assert_eq!(hits, vec!["Inflasi".to_string()]);
    }

    #[test]
    fn test_match_keywords_empty_inputs() {
        assert!(match_keywords("judul", "isi", &[]).is_empty());
        let blank = vec!["   ".to_string()];
        assert!(match_keywords("judul", "isi", &blank).is_empty());
    }

    #[test]
    fn test_match_keywords_description_hit() {
        let keywords = vec!["rupiah".to_string()];
        let hits = match_keywords("Pasar saham", "Nilai tukar rupiah menguat", &keywords);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_canonicalize_strips_tracking_params() {
        let canon = canonicalize("https://www.kompas.com/read/1?utm_source=rss&id=7&fbclid=x");
        assert_eq!(canon, "https://www.kompas.com/read/1?id=7");
    }

    #[test]
    fn test_canonicalize_strips_amp_segment() {
        let canon = canonicalize("https://m.detik.com/news/amp/d-123/judul-berita");
        assert!(!canon.contains("/amp/"));
        let tail = canonicalize("https://m.detik.com/news/d-123/amp");
        assert!(!tail.ends_with("/amp"));
    }

    #[test]
    fn test_canonicalize_collapses_repeated_amp_segments() {
        let canon = canonicalize("https://m.detik.com/news/amp/amp/d-123/judul");
        assert_eq!(canon, "https://m.detik.com/news/d-123/judul");
        assert_eq!(canonicalize(&canon), canon);
    }

    #[test]
    fn test_canonicalize_idempotent() {
        let urls = [
            "https://www.kompas.com/read/1?utm_source=rss&id=7",
            "https://m.detik.com/news/amp/d-123/judul",
            "https://m.detik.com/news/amp/amp/d-123/judul",
            "bukan url sama sekali",
            "https://tirto.id/artikel?gclid=abc",
        ];
        for u in urls {
            let once = canonicalize(u);
            assert_eq!(canonicalize(&once), once, "not idempotent for {u}");
        }
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\n b\tc  "), "a b c");
    }

    #[test]
    fn test_is_west_java_hit() {
        assert!(is_west_java_hit("Banjir di Bandung", "", ""));
        assert!(is_west_java_hit("", "", "https://jabar.tribunnews.com/x"));
        assert!(!is_west_java_hit("Banjir di Surabaya", "Jawa Timur", "https://surabaya.tribunnews.com/x"));
    }

    #[test]
    fn test_keywords_slug() {
        let kws = vec!["BI rate".to_string(), "inflasi!".to_string()];
        assert_eq!(keywords_slug(&kws), "BIrate_inflasi");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("pendek", 100), "pendek");
        let long = "a".repeat(500);
        let result = truncate_for_log(&long, 100);
        assert!(result.contains("…(+400 bytes)"));
    }
}
