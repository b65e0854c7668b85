//! A single Markdown document and its metadata.

use super::{
    ContentError,
    front_matter::{self, FrontMatterError},
};
use crate::{config::SlugMode, utils::date, utils::slug::slugify_path};
use chrono::{DateTime, Utc};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

/// A parsed document. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute path of the source file.
    pub source: PathBuf,
    /// Path relative to the content directory, unique within a store.
    pub path: PathBuf,
    pub title: String,
    pub date: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub summary: Option<String>,
    /// Replaces the file stem in the page path.
    pub slug: Option<String>,
    pub draft: bool,
    /// Markdown body without the front-matter block.
    pub body: String,
}

impl Document {
    /// Parse `text` read from `source`; `path` is its content-relative path.
    pub fn parse(source: &Path, path: &Path, text: &str) -> Result<Self, ContentError> {
        let named = |err: FrontMatterError| match err {
            FrontMatterError::Unterminated(fence) => ContentError::Unterminated {
                path: path.to_path_buf(),
                fence,
            },
            FrontMatterError::NotAMapping => ContentError::NotAMapping {
                path: path.to_path_buf(),
            },
            FrontMatterError::Malformed(message) => ContentError::Malformed {
                path: path.to_path_buf(),
                message,
            },
        };

        let split = front_matter::split(text).map_err(named)?;
        let meta = match split.meta {
            Some((format, block)) => front_matter::decode(format, block).map_err(named)?,
            None => front_matter::Meta::default(),
        };

        let date = parse_date(path, "date", meta.date)?;
        let updated = parse_date(path, "updated", meta.updated)?;
        let body = split.body.to_owned();
        let title = meta
            .title
            .or_else(|| first_heading(&body))
            .unwrap_or_else(|| file_stem(path));

        Ok(Self {
            source: source.to_path_buf(),
            path: path.to_path_buf(),
            title,
            date,
            updated,
            categories: meta.categories,
            tags: meta.tags,
            summary: meta.summary,
            slug: meta.slug,
            draft: meta.draft,
            body,
        })
    }

    /// Page directory relative to the site prefix, empty for the site root.
    ///
    /// `posts/hello.md` becomes `posts/hello`, `posts/index.md` becomes
    /// `posts`, and a `slug` key replaces the last segment.
    pub fn page_dir(&self, mode: &SlugMode) -> PathBuf {
        let parent = self.path.parent().unwrap_or(Path::new(""));
        let stem = file_stem(&self.path);

        let dir = match &self.slug {
            Some(slug) => parent.join(slug.trim()),
            None if stem == "index" => parent.to_path_buf(),
            None => parent.join(stem),
        };
        slugify_path(&dir, mode)
    }

    /// Listing order: newest first, undated last, ties broken by path.
    pub fn sort_key(&self) -> (std::cmp::Reverse<Option<DateTime<Utc>>>, &Path) {
        (std::cmp::Reverse(self.date), &self.path)
    }
}

fn parse_date(
    path: &Path,
    key: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, ContentError> {
    match value {
        None => Ok(None),
        Some(value) => match date::parse(&value) {
            Some(dt) => Ok(Some(dt)),
            None => Err(ContentError::InvalidDate {
                path: path.to_path_buf(),
                key,
                value,
            }),
        },
    }
}

/// Text of the first level-one heading, outside code blocks.
fn first_heading(body: &str) -> Option<String> {
    let mut title: Option<String> = None;
    for event in Parser::new_ext(body, Options::ENABLE_HEADING_ATTRIBUTES) {
        match event {
            Event::Start(Tag::Heading { level: HeadingLevel::H1, .. }) => title = Some(String::new()),
            Event::Text(t) | Event::Code(t) => {
                if let Some(text) = title.as_mut() {
                    text.push_str(&t);
                }
            }
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if let Some(text) = title.take()
                    && !text.trim().is_empty()
                {
                    return Some(text.trim().to_owned());
                }
            }
            _ => {}
        }
    }
    None
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn parse(path: &str, text: &str) -> Result<Document, ContentError> {
        Document::parse(&Path::new("/site/content").join(path), Path::new(path), text)
    }

    #[test]
    fn test_parse_full_front_matter() {
        let doc = parse(
            "posts/emacs.md",
            "---\ntitle: Emacs\ndate: 2021-11-20 14:03:09\ncategories: Tools\ntags: [emacs, ide]\n---\nBody\n",
        )
        .unwrap();

        assert_eq!(doc.title, "Emacs");
        let date = doc.date.unwrap();
        assert_eq!((date.year(), date.month(), date.day(), date.hour()), (2021, 11, 20, 14));
        assert!(doc.categories.contains("Tools"));
        assert_eq!(doc.tags.len(), 2);
        assert_eq!(doc.body, "Body\n");
        assert_eq!(doc.source, PathBuf::from("/site/content/posts/emacs.md"));
    }

    #[test]
    fn test_title_falls_back_to_heading_then_stem() {
        let doc = parse("notes.md", "intro\n\n# Real Title #\n\ntext").unwrap();
        assert_eq!(doc.title, "Real Title");

        let doc = parse("notes.md", "no heading").unwrap();
        assert_eq!(doc.title, "notes");
        assert!(doc.date.is_none());
    }

    #[test]
    fn test_title_ignores_comments_in_code_blocks() {
        let doc = parse("setup.md", "```bash\n# install deps\nmake\n```\n\n# Setting up `make`\n").unwrap();
        assert_eq!(doc.title, "Setting up make");

        let doc = parse("setup.md", "```bash\n# install deps\n```\n").unwrap();
        assert_eq!(doc.title, "setup");
    }

    #[test]
    fn test_invalid_date_names_key() {
        let err = parse("a.md", "---\ndate: yesterday\n---\n").unwrap_err();
        match err {
            ContentError::InvalidDate { path, key, value } => {
                assert_eq!(path, PathBuf::from("a.md"));
                assert_eq!(key, "date");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = parse("a.md", "+++\nupdated = \"soon\"\n+++\n").unwrap_err();
        assert!(matches!(err, ContentError::InvalidDate { key: "updated", .. }));
    }

    #[test]
    fn test_front_matter_errors_name_file() {
        let err = parse("drafts/x.md", "---\ntitle: x\n").unwrap_err();
        assert!(err.to_string().starts_with("drafts/x.md: unterminated"));

        let err = parse("y.md", "---\n- a\n---\n").unwrap_err();
        assert!(matches!(err, ContentError::NotAMapping { .. }));
    }

    #[test]
    fn test_page_dir() {
        let doc = parse("Posts/Hello World.md", "x").unwrap();
        assert_eq!(doc.page_dir(&SlugMode::On), PathBuf::from("posts/hello-world"));
        assert_eq!(doc.page_dir(&SlugMode::Safe), PathBuf::from("Posts/Hello-World"));

        let doc = parse("posts/index.md", "x").unwrap();
        assert_eq!(doc.page_dir(&SlugMode::Safe), PathBuf::from("posts"));

        let doc = parse("index.md", "x").unwrap();
        assert_eq!(doc.page_dir(&SlugMode::Safe), PathBuf::new());

        let doc = parse("posts/2021-11-20-emacs.md", "---\nslug: emacs-ide\n---\n").unwrap();
        assert_eq!(doc.page_dir(&SlugMode::Safe), PathBuf::from("posts/emacs-ide"));
    }

    #[test]
    fn test_sort_key_newest_first_undated_last() {
        let old = parse("b.md", "---\ndate: 2020-01-01\n---\n").unwrap();
        let new = parse("c.md", "---\ndate: 2024-01-01\n---\n").unwrap();
        let undated = parse("a.md", "").unwrap();

        let mut docs = [&old, &undated, &new];
        docs.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let order: Vec<_> = docs.iter().map(|d| d.path.to_str().unwrap()).collect();
        assert_eq!(order, ["c.md", "b.md", "a.md"]);
    }
}
