//! Pure content-extraction strategies over fetched markup.
//!
//! Each strategy is an independent function `&str -> Option<String>` returning
//! whitespace-normalized body text, or `None` when it finds nothing. The
//! cascade in [`crate::extract`] applies the length floors and the priority
//! order; nothing here decides between strategies.

use crate::utils::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};

/// Containers that usually hold the article body, most specific first.
const ARTICLE_CONTAINERS: &[&str] = &[
    "div[itemprop=\"articleBody\"]",
    "div.detail__body-text",
    "div.read__content",
    "div.article-content",
    "div.post-content",
    "article",
    "main",
];

fn paragraphs_text(root: ElementRef<'_>) -> String {
    let p = Selector::parse("p").unwrap();
    let mut parts = Vec::new();
    for para in root.select(&p) {
        let text = collapse_whitespace(&para.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join(" ")
}

/// Structured extraction favoring recall: paragraphs inside the first known
/// article container, else every paragraph on the page.
pub fn structured_extract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for container in ARTICLE_CONTAINERS {
        let sel = Selector::parse(container).unwrap();
        if let Some(root) = document.select(&sel).next() {
            let text = paragraphs_text(root);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    let body = Selector::parse("body").unwrap();
    let text = document.select(&body).next().map(paragraphs_text)?;
    (!text.is_empty()).then_some(text)
}

fn own_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn link_text_len(element: ElementRef<'_>) -> usize {
    let a = Selector::parse("a").unwrap();
    element
        .select(&a)
        .map(|link| own_text(link).chars().count())
        .sum()
}

/// Readability-style heuristic: the block element with the largest contiguous
/// text mass after discounting link text wins, tags stripped.
pub fn readability_extract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let blocks = Selector::parse("article, section, div, td").unwrap();

    let mut best: Option<(i64, String)> = None;
    for block in document.select(&blocks) {
        let text = own_text(block);
        let total = text.chars().count() as i64;
        if total == 0 {
            continue;
        }
        let linked = link_text_len(block) as i64;
        // Navigation lists are text-heavy but almost entirely links.
        let score = total - 3 * linked;
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
            best = Some((score, text));
        }
    }

    best.filter(|(score, _)| *score > 0).map(|(_, text)| text)
}

/// Text-density boilerplate removal: keep block elements whose character count
/// per contained tag is high (dense prose), drop the markup-heavy chrome.
pub fn density_extract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let blocks = Selector::parse("p, div, section").unwrap();
    let any = Selector::parse("*").unwrap();

    let mut parts = Vec::new();
    for block in document.select(&blocks) {
        // Leaf-ish blocks only; a wrapper div repeats its children's text.
        let child_blocks = block
            .select(&blocks)
            .filter(|e| e.id() != block.id())
            .count();
        if child_blocks > 0 {
            continue;
        }
        let text = own_text(block);
        let chars = text.chars().count();
        if chars == 0 {
            continue;
        }
        let tags = block.select(&any).filter(|e| e.id() != block.id()).count() + 1;
        let density = chars as f64 / tags as f64;
        if density >= 40.0 && chars >= 40 {
            parts.push(text);
        }
    }

    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Frequent Indonesian function words, used as a prose signal.
const STOPWORDS_ID: &[&str] = &[
    "yang", "dan", "di", "ke", "dari", "untuk", "pada", "dengan", "ini", "itu", "dalam", "tidak",
    "akan", "ada", "juga", "karena", "atau", "bisa", "sudah", "saat", "oleh", "sebagai", "para",
    "kata", "tersebut", "namun", "masih", "lebih", "tahun", "telah", "bahwa", "mereka", "kami",
    "kita", "saya", "jadi", "menjadi", "secara", "hingga", "serta", "agar", "yakni", "yaitu",
    "adalah", "merupakan", "terhadap", "sehingga", "seperti", "antara", "ujar",
];

fn stopword_density(text: &str) -> f64 {
    let words: Vec<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return 0.0;
    }
    let hits = words
        .iter()
        .filter(|w| STOPWORDS_ID.contains(&w.as_str()))
        .count();
    hits as f64 / words.len() as f64
}

/// Paragraph-level language-aware classification: paragraphs with a healthy
/// Indonesian stopword density are prose, the rest is boilerplate.
pub fn stopword_extract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let p = Selector::parse("p").unwrap();

    let mut parts = Vec::new();
    for para in document.select(&p) {
        let text = own_text(para);
        if text.chars().count() >= 40 && stopword_density(&text) >= 0.15 {
            parts.push(text);
        }
    }

    (!parts.is_empty()).then(|| parts.join(" "))
}
