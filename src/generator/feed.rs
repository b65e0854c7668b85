//! RSS feed generation.
//!
//! Only dated documents appear in the feed, newest first. The channel has
//! no `lastBuildDate`, so an unchanged store produces an identical feed.

use super::url::Urls;
use crate::{config::SiteConfig, content::Document, utils::date};
use anyhow::{Context, Result, anyhow};
use regex::Regex;
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::{path::Path, sync::LazyLock};

/// A published page offered to the feed.
pub struct FeedItem<'a> {
    pub doc: &'a Document,
    /// Site-absolute URL path of the page.
    pub url: &'a str,
    pub description: Option<&'a str>,
}

/// Render the channel XML.
pub fn render(config: &SiteConfig, urls: &Urls, items: &[FeedItem<'_>]) -> Result<String> {
    let site_link = urls
        .absolute(&urls.dir(Path::new("")))
        .context("[base.url] is required for feed generation")?;
    let author = normalize_author(config);

    let mut dated: Vec<&FeedItem<'_>> = items.iter().filter(|item| item.doc.date.is_some()).collect();
    dated.sort_by(|a, b| a.doc.sort_key().cmp(&b.doc.sort_key()));

    let items: Vec<rss::Item> = dated
        .into_iter()
        .take(config.build.feed.limit)
        .filter_map(|item| to_rss_item(item, urls, &author))
        .collect();

    let channel = ChannelBuilder::default()
        .title(&config.base.title)
        .link(site_link)
        .description(&config.base.description)
        .language(config.base.language.clone())
        .generator(concat!("pressroom ", env!("CARGO_PKG_VERSION")).to_string())
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validation failed: {e}"))?;
    Ok(channel.to_string())
}

fn to_rss_item(item: &FeedItem<'_>, urls: &Urls, author: &str) -> Option<rss::Item> {
    let doc = item.doc;
    let pub_date = date::rfc2822(doc.date.as_ref()?);
    let link = urls.absolute(item.url)?;
    let categories = doc
        .categories
        .iter()
        .chain(&doc.tags)
        .map(|name| CategoryBuilder::default().name(name.as_str()).build())
        .collect::<Vec<_>>();

    Some(
        ItemBuilder::default()
            .title(doc.title.clone())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build())
            .description(item.description.map(str::to_owned))
            .pub_date(pub_date)
            .author(author.to_owned())
            .categories(categories)
            .build(),
    )
}

/// RSS wants `email (Name)`; an author already in that form is kept.
fn normalize_author(config: &SiteConfig) -> String {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$")
            .expect("valid author regex")
    });

    let author = &config.base.author;
    if RE_VALID_AUTHOR.is_match(author) {
        author.clone()
    } else {
        format!("{} ({})", config.base.email, author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.title = "Notes".into();
        config.base.author = "Alice".into();
        config.base.email = "alice@example.com".into();
        config.base.url = Some("https://example.com".into());
        config.build.feed.enable = true;
        config
    }

    fn doc(path: &str, front: &str) -> Document {
        Document::parse(Path::new(path), Path::new(path), &format!("---\n{front}\n---\n")).unwrap()
    }

    #[test]
    fn test_normalize_author() {
        let mut config = config();
        assert_eq!(normalize_author(&config), "alice@example.com (Alice)");

        config.base.author = "bob@example.com (Bob)".into();
        assert_eq!(normalize_author(&config), "bob@example.com (Bob)");
    }

    #[test]
    fn test_render_orders_and_limits() {
        let mut config = config();
        config.build.feed.limit = 2;
        let urls = Urls::new(&config);

        let old = doc("old.md", "title: Old\ndate: 2020-01-01");
        let new = doc("new.md", "title: New\ndate: 2024-05-01\ntags: [rust]");
        let mid = doc("mid.md", "title: Mid\ndate: 2022-01-01");
        let undated = doc("about.md", "title: About");
        let items = [
            FeedItem { doc: &old, url: "/old/", description: None },
            FeedItem { doc: &new, url: "/new/", description: Some("fresh") },
            FeedItem { doc: &mid, url: "/mid/", description: None },
            FeedItem { doc: &undated, url: "/about/", description: None },
        ];

        let xml = render(&config, &urls, &items).unwrap();

        let new_at = xml.find("<title>New</title>").unwrap();
        let mid_at = xml.find("<title>Mid</title>").unwrap();
        assert!(new_at < mid_at);
        assert!(!xml.contains("<title>Old</title>"));
        assert!(!xml.contains("About"));
        assert!(xml.contains("<link>https://example.com/new/</link>"));
        assert!(xml.contains("fresh"));
        assert!(xml.contains("<category>rust</category>"));
        assert!(!xml.contains("lastBuildDate"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = config();
        let urls = Urls::new(&config);
        let post = doc("a.md", "title: A\ndate: 2024-01-01");
        let items = [FeedItem { doc: &post, url: "/a/", description: None }];

        assert_eq!(
            render(&config, &urls, &items).unwrap(),
            render(&config, &urls, &items).unwrap()
        );
    }

    #[test]
    fn test_render_requires_base_url() {
        let mut config = config();
        config.base.url = None;
        let urls = Urls::new(&config);
        assert!(render(&config, &urls, &[]).is_err());
    }
}
