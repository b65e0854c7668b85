//! `[build]` section configuration.
//!
//! Paths, generator selection, feed, sitemap and slug settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Enums
// ============================================================================

/// URL slug generation mode for paths and anchors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Always convert to a lowercase ASCII slug (e.g., "Café Notes" → "cafe-notes").
    On,
    /// Strip URL-hostile characters, keep the rest (default).
    #[default]
    Safe,
    /// No slugification; preserve original text.
    No,
}

/// Which generator produces the build artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Built-in Markdown renderer (default).
    #[default]
    Builtin,
    /// External static-site generator from `[build.command]`.
    Command,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in pressroom.toml.
///
/// # Example
/// ```toml
/// [build]
/// content = "source/_posts"
/// output = "public"
/// generator = "builtin"
///
/// [build.feed]
/// enable = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// URL path prefix for project-site deployment (e.g., "blog" → `/blog/...`).
    #[serde(default = "defaults::build::path_prefix")]
    #[educe(Default = defaults::build::path_prefix())]
    pub path_prefix: PathBuf,

    /// Markdown source directory, relative to the checked-out source tree.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory, relative to the project root.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Static assets copied verbatim (CSS, images), relative to the source tree.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Generator producing the artifact.
    #[serde(default)]
    pub generator: GeneratorKind,

    /// Minify generated HTML.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Publish documents marked `draft: true`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// External generator settings (`generator = "command"`).
    #[serde(default)]
    pub command: CommandConfig,

    /// RSS feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Sitemap settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// URL slugification settings.
    #[serde(default)]
    pub slug: SlugConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.command]` section - external static-site generator.
///
/// `{root}`, `{content}` and `{output}` in arguments are replaced with
/// absolute paths before the command runs.
///
/// ```toml
/// [build.command]
/// argv = ["hugo", "--source", "{root}", "--destination", "{output}"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    #[serde(default)]
    pub argv: Vec<String>,
}

/// `[build.feed]` section - RSS feed generation.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub enable: bool,

    /// Output path, relative to the output directory.
    #[serde(default = "defaults::build::feed::path")]
    #[educe(Default = defaults::build::feed::path())]
    pub path: PathBuf,

    /// Maximum number of items, newest first.
    #[serde(default = "defaults::build::feed::limit")]
    #[educe(Default = defaults::build::feed::limit())]
    pub limit: usize,
}

/// `[build.sitemap]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub enable: bool,

    /// Output path, relative to the output directory.
    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,
}

/// `[build.slug]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SlugConfig {
    /// Slugify page paths and category/tag segments
    #[serde(default = "defaults::build::slug::safe")]
    #[educe(Default = defaults::build::slug::safe())]
    pub path: SlugMode,

    /// Slugify heading anchors
    #[serde(default = "defaults::build::slug::on")]
    #[educe(Default = defaults::build::slug::on())]
    pub fragment: SlugMode,
}
