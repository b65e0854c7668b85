//! Site URL construction.

use crate::config::SiteConfig;
use std::path::{Component, Path};

/// Builds site-absolute URL paths (`/prefix/posts/hello/`) and full URLs.
#[derive(Debug, Clone)]
pub struct Urls {
    prefix: String,
    base: Option<String>,
}

impl Urls {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            prefix: encode_segments(&config.build.path_prefix),
            base: config.base.url_trimmed().map(str::to_owned),
        }
    }

    /// URL path of a page directory, always ending with `/`.
    pub fn dir(&self, dir: &Path) -> String {
        let mut url = self.file(dir);
        if !url.ends_with('/') {
            url.push('/');
        }
        url
    }

    /// URL path of a file under the prefix.
    pub fn file(&self, file: &Path) -> String {
        let rest = encode_segments(file);
        match (self.prefix.is_empty(), rest.is_empty()) {
            (true, true) => "/".to_owned(),
            (true, false) => format!("/{rest}"),
            (false, true) => format!("/{}", self.prefix),
            (false, false) => format!("/{}/{rest}", self.prefix),
        }
    }

    /// Full URL when `[base] url` is set.
    pub fn absolute(&self, path: &str) -> Option<String> {
        self.base.as_ref().map(|base| format!("{base}{path}"))
    }
}

fn encode_segments(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(urlencoding::encode(&part.to_string_lossy()).into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
