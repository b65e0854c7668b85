//! `[base]` section configuration.
//!
//! Site metadata used in page layout, feed and sitemap.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in pressroom.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "Notes"
/// description = "Emacs, C++ tooling and document pipelines"
/// author = "Alice"
/// url = "https://alice.github.io"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in browser tab and headers.
    pub title: String,

    /// Author name for feed and meta tags.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// Author email for the feed and publish commits.
    #[serde(default = "defaults::base::email")]
    #[educe(Default = defaults::base::email())]
    pub email: String,

    /// Site description for meta tags and the feed channel.
    #[serde(default)]
    pub description: String,

    /// Base URL for absolute links in feed/sitemap.
    /// Required when `[build.feed].enable` or `[build.sitemap].enable` is true.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// BCP 47 language code (e.g., "en", "zh-Hans").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Copyright notice for the page footer.
    #[serde(default)]
    pub copyright: String,
}

impl BaseConfig {
    /// Base URL without trailing slash.
    pub fn url_trimmed(&self) -> Option<&str> {
        self.url.as_deref().map(|u| u.trim_end_matches('/'))
    }
}
