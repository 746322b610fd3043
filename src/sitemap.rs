//! Sitemap `<loc>` extraction.
//!
//! Pulls the text of every `<loc>` element out of a sitemap or sitemap
//! index document. The primary pass is a streaming XML scan; when that
//! finds nothing and the content looks like HTML (Chromium re-renders XML
//! through its viewer DOM), a lenient HTML pass recovers the values.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Root element kind of a parsed sitemap document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<sitemapindex>` — the <loc> values point at further sitemaps.
    Index,
    /// `<urlset>` — the <loc> values are page URLs.
    UrlSet,
    /// Neither root was seen (fragment, HTML wrapper, or garbage).
    Unknown,
}

/// Result of scanning one sitemap document.
#[derive(Debug, Clone)]
pub struct ParsedSitemap {
    /// Every <loc> value in document order. Not deduplicated here; the
    /// global accumulator dedups across documents.
    pub urls: Vec<String>,
    pub kind: SitemapKind,
}

impl ParsedSitemap {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Extract all `<loc>` values from sitemap content.
///
/// Whitespace is trimmed, entities unescaped, CDATA supported, and
/// namespaced tags (`<ns:loc>`) match. Malformed XML terminates the scan
/// gracefully with whatever was collected up to that point.
pub fn parse(content: &str) -> ParsedSitemap {
    let mut parsed = parse_xml(content);

    // Chromium's XML viewer wraps the document in HTML; the loc elements
    // survive in the DOM but the stream is no longer well-formed XML.
    if parsed.urls.is_empty() && looks_like_html(content) {
        parsed.urls = parse_html(content);
    }

    parsed
}

fn parse_xml(content: &str) -> ParsedSitemap {
    let mut urls = Vec::new();
    let mut kind = SitemapKind::Unknown;
    let mut in_loc = false;
    let mut current = String::new();

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                let local = local.as_ref();
                if kind == SitemapKind::Unknown {
                    match local {
                        b"sitemapindex" => kind = SitemapKind::Index,
                        b"urlset" => kind = SitemapKind::UrlSet,
                        _ => {}
                    }
                }
                if local.eq_ignore_ascii_case(b"loc") {
                    in_loc = true;
                    current.clear();
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_loc {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if in_loc {
                    current.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref().eq_ignore_ascii_case(b"loc") && in_loc {
                    let trimmed = current.trim();
                    if !trimmed.is_empty() {
                        urls.push(trimmed.to_string());
                    }
                    in_loc = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    ParsedSitemap { urls, kind }
}

/// Heuristic: does the content look like an HTML wrapper rather than XML?
fn looks_like_html(content: &str) -> bool {
    let head: String = content.chars().take(512).collect::<String>().to_lowercase();
    head.contains("<html") || head.contains("<!doctype html") || head.contains("<body")
}

/// Lenient HTML pass selecting `loc` elements out of a rendered DOM.
fn parse_html(content: &str) -> Vec<String> {
    use scraper::{Html, Selector};

    let document = Html::parse_document(content);
    let mut urls = Vec::new();

    if let Ok(sel) = Selector::parse("loc") {
        for el in document.select(&sel) {
            let text: String = el.text().collect();
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                urls.push(trimmed.to_string());
            }
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap>
            <loc>https://octopart.com/sitemap-1.xml</loc>
            <lastmod>2026-01-01</lastmod>
          </sitemap>
          <sitemap>
            <loc>https://octopart.com/sitemap-2.xml</loc>
          </sitemap>
        </sitemapindex>"#;

        let parsed = parse(xml);
        assert_eq!(parsed.kind, SitemapKind::Index);
        assert_eq!(
            parsed.urls,
            vec![
                "https://octopart.com/sitemap-1.xml",
                "https://octopart.com/sitemap-2.xml"
            ]
        );
    }

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>https://octopart.com/part/1</loc></url>
          <url><loc>https://octopart.com/part/2</loc></url>
        </urlset>"#;

        let parsed = parse(xml);
        assert_eq!(parsed.kind, SitemapKind::UrlSet);
        assert_eq!(parsed.urls.len(), 2);
    }

    #[test]
    fn test_namespaced_loc() {
        let xml = r#"<sm:sitemapindex xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sm:sitemap><sm:loc>https://example.com/a.xml</sm:loc></sm:sitemap>
        </sm:sitemapindex>"#;

        let parsed = parse(xml);
        assert_eq!(parsed.urls, vec!["https://example.com/a.xml"]);
        assert_eq!(parsed.kind, SitemapKind::Index);
    }

    #[test]
    fn test_cdata_and_entities() {
        let xml = r#"<urlset>
          <url><loc><![CDATA[https://example.com/p?a=1&b=2]]></loc></url>
          <url><loc>https://example.com/p?x=1&amp;y=2</loc></url>
        </urlset>"#;

        let parsed = parse(xml);
        assert_eq!(
            parsed.urls,
            vec![
                "https://example.com/p?a=1&b=2",
                "https://example.com/p?x=1&y=2"
            ]
        );
    }

    #[test]
    fn test_whitespace_trimmed_and_empty_dropped() {
        let xml = r#"<urlset>
          <url><loc>
            https://example.com/padded
          </loc></url>
          <url><loc>   </loc></url>
        </urlset>"#;

        let parsed = parse(xml);
        assert_eq!(parsed.urls, vec!["https://example.com/padded"]);
    }

    #[test]
    fn test_malformed_xml_keeps_partial_results() {
        let xml = r#"<urlset>
          <url><loc>https://example.com/ok</loc></url>
          <url><loc>https://example.com/also-ok</loc></url>
          <url><loc>https://example.com/broken"#;

        let parsed = parse(xml);
        assert!(parsed.urls.contains(&"https://example.com/ok".to_string()));
        assert!(parsed
            .urls
            .contains(&"https://example.com/also-ok".to_string()));
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse("");
        assert!(parsed.is_empty());
        assert_eq!(parsed.kind, SitemapKind::Unknown);
    }

    #[test]
    fn test_html_fallback() {
        // What Chromium's XML viewer hands back for a sitemap page.
        let html = r#"<html><head><meta charset="utf-8"></head><body>
          <div id="webkit-xml-viewer-source-xml">
            <urlset><url><loc>https://example.com/p/1</loc></url>
            <url><loc>https://example.com/p/2</loc></url></urlset>
          </div>
        </body></html>"#;

        let parsed = parse(html);
        assert_eq!(
            parsed.urls,
            vec!["https://example.com/p/1", "https://example.com/p/2"]
        );
    }

    #[test]
    fn test_document_order_no_dedup() {
        let xml = r#"<urlset>
          <url><loc>https://example.com/dup</loc></url>
          <url><loc>https://example.com/dup</loc></url>
        </urlset>"#;

        let parsed = parse(xml);
        assert_eq!(parsed.urls.len(), 2);
    }
}
