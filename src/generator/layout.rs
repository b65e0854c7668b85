//! The fixed HTML layout of the built-in generator.
//!
//! One stylesheet, one page shell. Everything interpolated into markup
//! goes through [`escape_html`].

use super::url::Urls;
use crate::{config::SiteConfig, content::Document, utils::date};
use std::{fmt::Write, path::Path};

const STYLE: &str = "body{max-width:46rem;margin:0 auto;padding:1rem;font:17px/1.6 system-ui,sans-serif;color:#222}\
header,footer{display:flex;gap:1rem;align-items:baseline;color:#666}\
header a.site{font-weight:bold;font-size:1.2rem;color:inherit;text-decoration:none}\
pre{overflow-x:auto;padding:.75rem;background:#f5f5f5}\
code{font-size:.9em}\
img{max-width:100%}\
.meta{color:#666;font-size:.9rem}\
.meta a{margin-right:.4rem}\
ul.listing{list-style:none;padding:0}\
ul.listing li{margin:.4rem 0}\
ul.listing time{display:inline-block;min-width:7rem;color:#666}";

/// A link in a listing: title, URL and optional date.
pub struct Entry {
    pub title: String,
    pub url: String,
    pub date: Option<String>,
}

pub struct Layout<'a> {
    config: &'a SiteConfig,
    urls: &'a Urls,
}

impl<'a> Layout<'a> {
    pub fn new(config: &'a SiteConfig, urls: &'a Urls) -> Self {
        Self { config, urls }
    }

    /// Article page for one document.
    pub fn document(
        &self,
        doc: &Document,
        body: &str,
        url: &str,
        description: Option<&str>,
        term_url: impl Fn(&str, &str) -> String,
    ) -> String {
        let mut meta = String::new();
        if let Some(dt) = &doc.date {
            let ymd = date::ymd(dt);
            let _ = write!(meta, r#"<time datetime="{ymd}">{ymd}</time> "#);
        }
        for name in &doc.categories {
            let _ = write!(
                meta,
                r#"<a href="{}">{}</a>"#,
                escape_html(&term_url("categories", name)),
                escape_html(name)
            );
        }
        for name in &doc.tags {
            let _ = write!(
                meta,
                r##"<a href="{}">#{}</a>"##,
                escape_html(&term_url("tags", name)),
                escape_html(name)
            );
        }

        let mut main = String::new();
        let _ = write!(main, "<article><h1>{}</h1>", escape_html(&doc.title));
        if !meta.is_empty() {
            let _ = write!(main, r#"<p class="meta">{}</p>"#, meta.trim_end());
        }
        main.push_str(body);
        main.push_str("</article>");

        self.shell(&doc.title, url, description, &main)
    }

    /// Page listing documents, optionally introduced by rendered HTML.
    pub fn listing(&self, title: &str, url: &str, intro: Option<&str>, entries: &[Entry]) -> String {
        let mut main = String::new();
        match intro {
            Some(intro) => main.push_str(intro),
            None => {
                let _ = write!(main, "<h1>{}</h1>", escape_html(title));
            }
        }
        main.push_str(r#"<ul class="listing">"#);
        for entry in entries {
            main.push_str("<li>");
            if let Some(ymd) = &entry.date {
                let _ = write!(main, r#"<time datetime="{ymd}">{ymd}</time>"#);
            }
            let _ = write!(
                main,
                r#"<a href="{}">{}</a></li>"#,
                escape_html(&entry.url),
                escape_html(&entry.title)
            );
        }
        main.push_str("</ul>");

        let description = Some(self.config.base.description.as_str()).filter(|d| !d.is_empty());
        self.shell(title, url, description, &main)
    }

    fn shell(&self, title: &str, url: &str, description: Option<&str>, main: &str) -> String {
        let base = &self.config.base;
        let root = self.urls.dir(Path::new(""));
        let page_title = if title == base.title || title.is_empty() {
            escape_html(&base.title)
        } else {
            format!("{} | {}", escape_html(title), escape_html(&base.title))
        };

        let mut head = String::new();
        if let Some(description) = description {
            let _ = write!(head, r#"<meta name="description" content="{}">"#, escape_html(description));
        }
        if let Some(canonical) = self.urls.absolute(url) {
            let _ = write!(head, r#"<link rel="canonical" href="{}">"#, escape_html(&canonical));
        }
        if self.config.build.feed.enable {
            let _ = write!(
                head,
                r#"<link rel="alternate" type="application/rss+xml" title="{}" href="{}">"#,
                escape_html(&base.title),
                escape_html(&self.urls.file(&self.config.build.feed.path))
            );
        }

        let footer = if base.copyright.is_empty() {
            escape_html(&base.author)
        } else {
            escape_html(&base.copyright)
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{page_title}</title>
{head}
<style>{STYLE}</style>
</head>
<body>
<header><a class="site" href="{root}">{site}</a><a href="{root}categories/">Categories</a><a href="{root}tags/">Tags</a></header>
<main>
{main}
</main>
<footer>{footer}</footer>
</body>
</html>
"#,
            lang = escape_html(&base.language),
            site = escape_html(&base.title),
            root = escape_html(&root),
        )
    }
}

/// Escape text for HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
