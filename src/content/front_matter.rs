//! Front-matter splitting and decoding.
//!
//! Two syntaxes are recognized when the opening fence is the first line:
//!
//! ```text
//! ---                       +++
//! title: Emacs as an IDE    title = "Emacs as an IDE"
//! date: 2021-11-20 14:03    date = 2021-11-20
//! ---                       +++
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;

/// Front-matter syntax, selected by the opening fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    pub const fn fence(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    fn from_fence(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A document split into its metadata block and body.
#[derive(Debug, PartialEq, Eq)]
pub struct Split<'a> {
    pub meta: Option<(Format, &'a str)>,
    pub body: &'a str,
}

/// Failure modes of [`decode`] and [`split`], mapped to `ContentError` by the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum FrontMatterError {
    Unterminated(&'static str),
    NotAMapping,
    Malformed(String),
}

/// Separate the front-matter block from the body.
///
/// A leading byte-order mark is skipped. Text that does not start with a
/// fence line has no front-matter.
pub fn split(text: &str) -> Result<Split<'_>, FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));

    let Some(format) = Format::from_fence(first) else {
        return Ok(Split { meta: None, body: text });
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == format.fence() {
            return Ok(Split {
                meta: Some((format, &rest[..offset])),
                body: &rest[offset + line.len()..],
            });
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated(format.fence()))
}

/// Decoded metadata, before dates are validated.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Meta {
    pub title: Option<String>,
    pub date: Option<String>,
    pub updated: Option<String>,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub summary: Option<String>,
    pub slug: Option<String>,
    pub draft: bool,
}

/// Decode a front-matter block. Unknown keys are ignored.
pub fn decode(format: Format, block: &str) -> Result<Meta, FrontMatterError> {
    let raw = match format {
        Format::Yaml => {
            let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(block)
                .map_err(|e| FrontMatterError::Malformed(e.to_string()))?;
            match value {
                serde_yaml_ng::Value::Null => RawMeta::default(),
                serde_yaml_ng::Value::Mapping(_) => serde_yaml_ng::from_value(value)
                    .map_err(|e| FrontMatterError::Malformed(e.to_string()))?,
                _ => return Err(FrontMatterError::NotAMapping),
            }
        }
        Format::Toml => toml::from_str::<RawMeta>(block)
            .map_err(|e| FrontMatterError::Malformed(e.message().to_owned()))?,
    };
    Ok(raw.into_meta())
}

// ============================================================================
// Raw deserialization shapes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    title: Option<String>,
    date: Option<DateValue>,
    updated: Option<DateValue>,
    #[serde(alias = "category")]
    categories: Option<Terms>,
    tags: Option<Terms>,
    #[serde(alias = "description")]
    summary: Option<String>,
    slug: Option<String>,
    #[serde(default)]
    draft: bool,
    /// Hexo marks unpublished posts with `published: false`.
    published: Option<bool>,
}

impl RawMeta {
    fn into_meta(self) -> Meta {
        let mut categories = BTreeSet::new();
        if let Some(terms) = self.categories {
            terms.flatten_into(&mut categories);
        }
        let mut tags = BTreeSet::new();
        if let Some(terms) = self.tags {
            terms.flatten_into(&mut tags);
        }

        Meta {
            title: self.title.filter(|t| !t.trim().is_empty()),
            date: self.date.map(DateValue::into_text),
            updated: self.updated.map(DateValue::into_text),
            categories,
            tags,
            summary: self.summary.filter(|s| !s.trim().is_empty()),
            slug: self.slug.filter(|s| !s.trim().is_empty()),
            draft: self.draft || self.published == Some(false),
        }
    }
}

/// YAML dates arrive as strings; TOML has a native datetime type.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DateValue {
    Text(String),
    Toml(toml::value::Datetime),
}

impl DateValue {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Toml(dt) => dt.to_string(),
        }
    }
}

/// A single term or an arbitrarily nested list of terms.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Terms {
    One(String),
    Many(Vec<Terms>),
}

impl Terms {
    fn flatten_into(self, set: &mut BTreeSet<String>) {
        match self {
            Self::One(term) => {
                let term = term.trim();
                if !term.is_empty() {
                    set.insert(term.to_owned());
                }
            }
            Self::Many(list) => list.into_iter().for_each(|t| t.flatten_into(set)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_without_front_matter() {
        let text = "# Hello\n\nBody";
        assert_eq!(split(text).unwrap(), Split { meta: None, body: text });
    }

    #[test]
    fn test_split_yaml() {
        let text = "---\ntitle: Hi\n---\n# Body\n";
        let split = split(text).unwrap();
        assert_eq!(split.meta, Some((Format::Yaml, "title: Hi\n")));
        assert_eq!(split.body, "# Body\n");
    }

    #[test]
    fn test_split_toml_crlf_and_bom() {
        let text = "\u{feff}+++\r\ntitle = \"Hi\"\r\n+++\r\nBody";
        let split = split(text).unwrap();
        assert_eq!(split.meta, Some((Format::Toml, "title = \"Hi\"\r\n")));
        assert_eq!(split.body, "Body");
    }

    #[test]
    fn test_split_empty_block() {
        let split = split("---\n---\n").unwrap();
        assert_eq!(split.meta, Some((Format::Yaml, "")));
        assert_eq!(split.body, "");
    }

    #[test]
    fn test_split_unterminated() {
        assert_eq!(
            split("---\ntitle: Hi\n\nbody"),
            Err(FrontMatterError::Unterminated("---"))
        );
        assert_eq!(split("+++"), Err(FrontMatterError::Unterminated("+++")));
    }

    #[test]
    fn test_decode_yaml_hexo_post() {
        let block = "title: Emacs as a C++ IDE\ndate: 2021-11-20 14:03:09\n\
                     categories:\n  - [Tools, Emacs]\n  - Programming\n\
                     tags: cpp\ndescription: setup notes\ncomments: true\n";
        let meta = decode(Format::Yaml, block).unwrap();

        assert_eq!(meta.title.as_deref(), Some("Emacs as a C++ IDE"));
        assert_eq!(meta.date.as_deref(), Some("2021-11-20 14:03:09"));
        assert_eq!(
            meta.categories.into_iter().collect::<Vec<_>>(),
            ["Emacs", "Programming", "Tools"]
        );
        assert_eq!(meta.tags.into_iter().collect::<Vec<_>>(), ["cpp"]);
        assert_eq!(meta.summary.as_deref(), Some("setup notes"));
        assert!(!meta.draft);
    }

    #[test]
    fn test_decode_toml_native_date() {
        let block = "title = \"Notes\"\ndate = 2023-04-05\ntags = [\"a\", \"b\"]\ndraft = true\n";
        let meta = decode(Format::Toml, block).unwrap();

        assert_eq!(meta.date.as_deref(), Some("2023-04-05"));
        assert_eq!(meta.tags.len(), 2);
        assert!(meta.draft);
    }

    #[test]
    fn test_decode_published_false_is_draft() {
        let meta = decode(Format::Yaml, "published: false\n").unwrap();
        assert!(meta.draft);
    }

    #[test]
    fn test_decode_empty_yaml() {
        assert_eq!(decode(Format::Yaml, "").unwrap(), Meta::default());
    }

    #[test]
    fn test_decode_not_a_mapping() {
        assert_eq!(
            decode(Format::Yaml, "- just\n- a list\n"),
            Err(FrontMatterError::NotAMapping)
        );
        assert_eq!(decode(Format::Yaml, "plain words"), Err(FrontMatterError::NotAMapping));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode(Format::Yaml, "title: [unclosed\n"),
            Err(FrontMatterError::Malformed(_))
        ));
        assert!(matches!(
            decode(Format::Toml, "title = \n"),
            Err(FrontMatterError::Malformed(_))
        ));
        assert!(matches!(
            decode(Format::Yaml, "title:\n  nested: map\n"),
            Err(FrontMatterError::Malformed(_))
        ));
    }
}
