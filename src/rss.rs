//! Minimal RSS 2.0 / Atom entry parser built on `quick-xml`.
//!
//! Feeds in the catalog are inconsistent: some serve RSS, some Atom, several
//! prepend whitespace or a BOM, and a few leak undeclared HTML entities into
//! the XML. [`parse_feed`] is tolerant of all of that and yields raw entries;
//! normalization into [`crate::models::CandidateRecord`] happens in the
//! aggregator.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

/// One feed entry as parsed, before normalization.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub published: Option<String>,
}

/// Repair common feed defects before handing the bytes to the XML parser.
fn cleanup_xml(xml: &str) -> String {
    let mut cleaned = xml.trim_start_matches('\u{FEFF}').trim().to_string();

    // Drop any junk before the document root.
    for marker in ["<?xml", "<rss", "<feed"] {
        if let Some(start) = cleaned.find(marker) {
            cleaned = cleaned[start..].to_string();
            break;
        }
    }

    // HTML entities that are undeclared in XML.
    cleaned
        .replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&rsquo;", "&#8217;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rdquo;", "&#8221;")
        .replace("&ldquo;", "&#8220;")
}

/// Parse an RSS 2.0 or Atom document into raw entries.
///
/// Malformed markup yields however many entries were readable before the
/// error; a hopeless document yields an empty list, never an `Err`, since feed
/// failures must degrade to zero entries.
pub fn parse_feed(xml: &str) -> Vec<RawEntry> {
    let cleaned = cleanup_xml(xml);
    let mut reader = Reader::from_str(&cleaned);

    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut field: Option<&'static str> = None;
    let mut buffer = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"item" | b"entry" => {
                        current = Some(RawEntry::default());
                    }
                    b"title" if current.is_some() => {
                        field = Some("title");
                        buffer.clear();
                    }
                    b"description" | b"summary" if current.is_some() => {
                        field = Some("description");
                        buffer.clear();
                    }
                    b"pubDate" | b"published" | b"updated" | b"date" if current.is_some() => {
                        field = Some("published");
                        buffer.clear();
                    }
                    b"link" if current.is_some() => {
                        // Atom: <link href="..."/>; RSS: <link>text</link>.
                        if let Some(href) = atom_href(&e) {
                            if let Some(entry) = current.as_mut() {
                                entry.link.get_or_insert(href);
                            }
                        } else {
                            field = Some("link");
                            buffer.clear();
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link" && current.is_some() {
                    if let Some(href) = atom_href(&e) {
                        if let Some(entry) = current.as_mut() {
                            entry.link.get_or_insert(href);
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if field.is_some() {
                    if let Ok(text) = t.xml_content() {
                        buffer.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if field.is_some() {
                    buffer.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"item" | b"entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                        field = None;
                    }
                    _ => {
                        if let (Some(kind), Some(entry)) = (field.take(), current.as_mut()) {
                            let value = buffer.trim().to_string();
                            if !value.is_empty() {
                                match kind {
                                    "title" => entry.title.get_or_insert(value),
                                    "link" => entry.link.get_or_insert(value),
                                    "description" => entry.description.get_or_insert(value),
                                    // pubDate beats updated because pubDate
                                    // elements come first in RSS items.
                                    "published" => entry.published.get_or_insert(value),
                                    _ => unreachable!(),
                                };
                            }
                            buffer.clear();
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, parsed = entries.len(), "Feed XML error; keeping entries parsed so far");
                break;
            }
        }
    }

    entries
}

/// Pull `href` out of an Atom `<link>` element, skipping non-alternate rels.
fn atom_href(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    let rel = e
        .try_get_attribute("rel")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    if let Some(rel) = rel {
        if rel != "alternate" {
            return None;
        }
    }
    e.try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
