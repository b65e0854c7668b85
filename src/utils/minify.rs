//! HTML and XML minification for generated files.

use std::borrow::Cow;

/// Content type for minification.
pub enum MinifyType<'a> {
    Html(&'a [u8]),
    /// Line-oriented XML without multi-line text nodes (sitemaps).
    Xml(&'a [u8]),
}

/// Minify `content` when `enabled`, otherwise borrow it unchanged.
pub fn minify(content: MinifyType<'_>, enabled: bool) -> Cow<'_, [u8]> {
    match (content, enabled) {
        (MinifyType::Html(html), false) | (MinifyType::Xml(html), false) => Cow::Borrowed(html),
        (MinifyType::Html(html), true) => Cow::Owned(minify_html_inner(html)),
        (MinifyType::Xml(xml), true) => Cow::Owned(minify_xml_inner(xml)),
    }
}

fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

fn minify_xml_inner(xml: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(xml)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<String>()
        .into_bytes()
}
