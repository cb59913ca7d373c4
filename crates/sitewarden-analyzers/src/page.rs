//! Regex-based HTML extraction into `PageData`
//!
//! Deliberately heuristic: good enough for audit signals without a full
//! HTML parser dependency.

use std::sync::OnceLock;

use regex::Regex;

use sitewarden_core::{Heading, ImageRef, PageData};

macro_rules! static_regex {
    ($name:ident, $pattern:literal) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("static regex"))
        }
    };
}

static_regex!(title_re, r"(?is)<title[^>]*>(.*?)</title>");
static_regex!(
    description_re,
    r#"(?is)<meta[^>]*name=["']description["'][^>]*content=["']([^"']*)["']"#
);
static_regex!(
    canonical_re,
    r#"(?is)<link[^>]*rel=["']canonical["'][^>]*href=["']([^"']*)["']"#
);
static_regex!(heading_re, r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>");
static_regex!(link_re, r#"(?is)<a\s[^>]*href=["']([^"']*)["']"#);
static_regex!(img_re, r"(?is)<img\s[^>]*>");
static_regex!(img_src_re, r#"(?is)src=["']([^"']*)["']"#);
static_regex!(img_alt_re, r#"(?is)alt=["']([^"']*)["']"#);
static_regex!(
    json_ld_re,
    r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>(.*?)</script>"#
);
static_regex!(script_re, r"(?is)<script[^>]*>.*?</script>");
static_regex!(style_re, r"(?is)<style[^>]*>.*?</style>");
static_regex!(tag_re, r"(?s)<[^>]+>");
static_regex!(space_re, r"\s+");

/// Parse a fetched document into structured page data
pub fn parse_page(url: &str, status: u16, html: &str) -> PageData {
    let mut page = PageData::new(url, status);

    page.title = title_re()
        .captures(html)
        .map(|c| clean_text(&c[1]))
        .filter(|t| !t.is_empty());
    page.description = description_re()
        .captures(html)
        .map(|c| clean_text(&c[1]))
        .filter(|d| !d.is_empty());
    page.canonical = canonical_re()
        .captures(html)
        .map(|c| c[1].trim().to_string())
        .filter(|c| !c.is_empty());

    for captures in heading_re().captures_iter(html) {
        let level: u8 = captures[1].parse().unwrap_or(6);
        let text = clean_text(&captures[2]);
        if !text.is_empty() {
            page.headings.push(Heading { level, text });
        }
    }

    for captures in link_re().captures_iter(html) {
        page.links.push(captures[1].trim().to_string());
    }

    for tag in img_re().find_iter(html) {
        let tag = tag.as_str();
        let src = img_src_re()
            .captures(tag)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let alt = img_alt_re()
            .captures(tag)
            .map(|c| clean_text(&c[1]))
            .filter(|a| !a.is_empty());
        page.images.push(ImageRef { src, alt });
    }

    for captures in json_ld_re().captures_iter(html) {
        let block = captures[1].trim().to_string();
        if !block.is_empty() {
            page.json_ld.push(block);
        }
    }

    page.text = visible_text(html);
    page.word_count = page.text.split_whitespace().count();
    page
}

/// Strip markup and collapse whitespace from the full document
fn visible_text(html: &str) -> String {
    let without_scripts = script_re().replace_all(html, " ");
    let without_styles = style_re().replace_all(&without_scripts, " ");
    let without_tags = tag_re().replace_all(&without_styles, " ");
    let decoded = decode_entities(&without_tags);
    space_re().replace_all(&decoded, " ").trim().to_string()
}

/// Strip inner tags from a fragment and normalize it
fn clean_text(fragment: &str) -> String {
    let without_tags = tag_re().replace_all(fragment, " ");
    let decoded = decode_entities(&without_tags);
    space_re().replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <html><head>
        <title>Rust Audits &amp; More</title>
        <meta name="description" content="A page about auditing pages.">
        <link rel="canonical" href="https://example.com/page">
        <script type="application/ld+json">{"@type": "Article"}</script>
        <style>body { color: red; }</style>
        </head><body>
        <h1>Main <em>Heading</em></h1>
        <h2>Sub heading</h2>
        <p>Some visible body text here.</p>
        <a href="/about">About</a>
        <a href="">Broken</a>
        <img src="/a.png" alt="A picture">
        <img src="/b.png">
        <script>console.log("hidden");</script>
        </body></html>
    "#;

    #[test]
    fn test_parse_head_fields() {
        let page = parse_page("https://example.com/page", 200, DOC);
        assert_eq!(page.title.as_deref(), Some("Rust Audits & More"));
        assert_eq!(
            page.description.as_deref(),
            Some("A page about auditing pages.")
        );
        assert_eq!(page.canonical.as_deref(), Some("https://example.com/page"));
    }

    #[test]
    fn test_parse_headings_strip_inner_tags() {
        let page = parse_page("https://example.com", 200, DOC);
        assert_eq!(page.headings.len(), 2);
        assert_eq!(page.headings[0].level, 1);
        assert_eq!(page.headings[0].text, "Main Heading");
    }

    #[test]
    fn test_parse_links_and_images() {
        let page = parse_page("https://example.com", 200, DOC);
        assert_eq!(page.links, vec!["/about".to_string(), String::new()]);
        assert_eq!(page.images.len(), 2);
        assert_eq!(page.images[0].alt.as_deref(), Some("A picture"));
        assert!(page.images[1].alt.is_none());
    }

    #[test]
    fn test_parse_json_ld() {
        let page = parse_page("https://example.com", 200, DOC);
        assert_eq!(page.json_ld.len(), 1);
        assert!(page.json_ld[0].contains("Article"));
    }

    #[test]
    fn test_visible_text_excludes_scripts_and_styles() {
        let page = parse_page("https://example.com", 200, DOC);
        assert!(page.text.contains("Some visible body text"));
        assert!(!page.text.contains("console.log"));
        assert!(!page.text.contains("color: red"));
        assert!(page.word_count > 0);
    }
}
