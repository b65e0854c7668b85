//! Built-in Markdown generator.
//!
//! Output layout under `<output>/<path_prefix>/`:
//!
//! | Path                          | Content                                  |
//! |-------------------------------|------------------------------------------|
//! | `index.html`                  | listing, newest first (root `index.md` as intro) |
//! | `<page dir>/index.html`       | one page per published document          |
//! | `categories/<name>/index.html`| documents in a category                  |
//! | `tags/<name>/index.html`      | documents with a tag                     |
//! | `data/documents.json`         | metadata of every published document     |
//! | feed, sitemap                 | when enabled                             |
//! | everything else               | content assets and the `assets` directory |

use super::{
    Input, feed,
    layout::{Entry, Layout},
    markdown,
    sitemap::{self, UrlEntry},
    url::Urls,
};
use crate::{
    config::SlugMode,
    content::{ContentError, Document},
    log,
    utils::{
        date,
        log::ProgressBars,
        minify::{MinifyType, minify},
        slug::slugify,
    },
};
use anyhow::{Context, Result};
use chrono::SecondsFormat;
use rayon::prelude::*;
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet, btree_map},
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

const INDEX: &str = "index.html";
const DATA_INDEX: &str = "data/documents.json";
const TERM_KINDS: [(&str, &str); 2] = [("categories", "Categories"), ("tags", "Tags")];

/// A rendered document page.
struct Page<'a> {
    doc: &'a Document,
    dir: PathBuf,
    url: String,
    description: Option<String>,
    html: Vec<u8>,
}

/// Generate the site into `out`. Returns the number of HTML pages written.
pub fn generate(input: &Input<'_>, out: &Path) -> Result<usize> {
    let config = input.config;
    let slug = &config.build.slug;
    let urls = Urls::new(config);
    let layout = Layout::new(config, &urls);
    let site_dir = out.join(&config.build.path_prefix);

    let mut claims = Claims::default();
    let mut intro = None;
    let mut planned = Vec::new();
    for doc in input.store.published() {
        let dir = doc.page_dir(&slug.path);
        claims.claim(dir.join(INDEX), &doc.path)?;
        if dir.as_os_str().is_empty() {
            intro = Some(doc);
        } else {
            planned.push((doc, dir));
        }
    }

    let groups = [input.store.categories(), input.store.tags()];
    let term_dirs: Vec<BTreeMap<&str, PathBuf>> = TERM_KINDS
        .iter()
        .zip(&groups)
        .map(|((kind, _), group)| assign_term_dirs(kind, group.keys().copied(), &slug.path))
        .collect();
    let term_url = |kind: &str, name: &str| {
        let found = TERM_KINDS
            .iter()
            .zip(&term_dirs)
            .find(|((k, _), _)| *k == kind)
            .and_then(|(_, dirs)| dirs.get(name));
        match found {
            Some(dir) => urls.dir(dir),
            None => urls.dir(&term_dir(kind, name, &slug.path)),
        }
    };

    let progress = ProgressBars::new(&[("pages", planned.len())]);
    let mut pages: Vec<Page<'_>> = planned
        .into_par_iter()
        .map(|(doc, dir)| {
            let rendered = markdown::render(&doc.body, &slug.fragment);
            let url = urls.dir(&dir);
            let description = doc.summary.clone().or(rendered.excerpt);
            let html = layout.document(doc, &rendered.html, &url, description.as_deref(), term_url);
            let html = minify(MinifyType::Html(html.as_bytes()), config.build.minify).into_owned();
            progress.inc(0);
            Page { doc, dir, url, description, html }
        })
        .collect();
    progress.finish();

    let mut files: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    let push_html = |files: &mut Vec<(PathBuf, Vec<u8>)>, path: PathBuf, text: String| {
        let bytes = minify(MinifyType::Html(text.as_bytes()), config.build.minify).into_owned();
        files.push((path, bytes));
    };

    // Site index
    pages.sort_by(|a, b| a.doc.sort_key().cmp(&b.doc.sort_key()));
    let entries: Vec<Entry> = pages.iter().map(|p| entry(p.doc, p.url.clone())).collect();
    let intro_html = intro.map(|doc| markdown::render(&doc.body, &slug.fragment).html);
    if intro.is_none() {
        claims.claim(PathBuf::from(INDEX), Path::new("(site index)"))?;
    }
    let root_url = urls.dir(Path::new(""));
    push_html(
        &mut files,
        PathBuf::from(INDEX),
        layout.listing(&config.base.title, &root_url, intro_html.as_deref(), &entries),
    );

    // Category and tag pages
    let mut term_urls = Vec::new();
    for (((kind, heading), group), dirs) in TERM_KINDS.into_iter().zip(&groups).zip(&term_dirs) {
        let overview_dir = PathBuf::from(kind);
        claims.claim(overview_dir.join(INDEX), Path::new(&format!("({kind} overview)")))?;
        let overview: Vec<Entry> = group
            .iter()
            .map(|(&name, docs)| Entry {
                title: format!("{name} ({})", docs.len()),
                url: term_url(kind, name),
                date: None,
            })
            .collect();
        let overview_url = urls.dir(&overview_dir);
        push_html(
            &mut files,
            overview_dir.join(INDEX),
            layout.listing(heading, &overview_url, None, &overview),
        );
        term_urls.push(overview_url);

        for (&name, docs) in group {
            let dir = dirs.get(name).cloned().unwrap_or_else(|| term_dir(kind, name, &slug.path));
            claims.claim(dir.join(INDEX), Path::new(&format!("({kind} `{name}`)")))?;
            let mut docs = docs.clone();
            docs.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            let entries: Vec<Entry> = docs
                .iter()
                .map(|doc| entry(doc, urls.dir(&doc.page_dir(&slug.path))))
                .collect();
            let url = urls.dir(&dir);
            push_html(&mut files, dir.join(INDEX), layout.listing(name, &url, None, &entries));
            term_urls.push(url);
        }
    }
    let page_count = pages.len() + 1 + term_urls.len();

    // Metadata index
    claims.claim(PathBuf::from(DATA_INDEX), Path::new("(documents index)"))?;
    files.push((PathBuf::from(DATA_INDEX), documents_json(input, &urls, &slug.path)?));

    if config.build.feed.enable {
        let path = config.build.feed.path.clone();
        claims.claim(path.clone(), Path::new("(feed)"))?;
        let items: Vec<feed::FeedItem<'_>> = pages
            .iter()
            .map(|p| feed::FeedItem {
                doc: p.doc,
                url: &p.url,
                description: p.description.as_deref(),
            })
            .collect();
        files.push((path, feed::render(config, &urls, &items)?.into_bytes()));
    }

    if config.build.sitemap.enable {
        let path = config.build.sitemap.path.clone();
        claims.claim(path.clone(), Path::new("(sitemap)"))?;
        let absolute = |url: &str| urls.absolute(url).context("[base.url] is required for sitemap generation");

        let mut by_path: Vec<&Page<'_>> = pages.iter().collect();
        by_path.sort_by(|a, b| a.dir.cmp(&b.dir));

        let mut entries = vec![UrlEntry {
            loc: absolute(&root_url)?,
            lastmod: intro.and_then(|doc| doc.updated.or(doc.date)).map(|dt| date::ymd(&dt)),
        }];
        for page in by_path {
            entries.push(UrlEntry {
                loc: absolute(&page.url)?,
                lastmod: page.doc.updated.or(page.doc.date).map(|dt| date::ymd(&dt)),
            });
        }
        for url in &term_urls {
            entries.push(UrlEntry { loc: absolute(url)?, lastmod: None });
        }
        let xml = sitemap::render(&entries);
        files.push((path, minify(MinifyType::Xml(xml.as_bytes()), config.build.minify).into_owned()));
    }

    // Assets: content-relative files first, then the site assets directory
    let mut copies = Vec::new();
    for relative in input.store.assets() {
        claims.claim(relative.clone(), relative)?;
        copies.push((input.store.root().join(relative), relative.clone()));
    }
    let assets_dir = input.source_root.join(&config.build.assets);
    for relative in scan_assets(&assets_dir)? {
        claims.claim(relative.clone(), &config.build.assets.join(&relative))?;
        copies.push((assets_dir.join(&relative), relative));
    }

    for page in &pages {
        files.push((page.dir.join(INDEX), page.html.clone()));
    }
    files.par_iter().try_for_each(|(relative, bytes)| write_file(&site_dir.join(relative), bytes))?;
    copies.par_iter().try_for_each(|(source, relative)| copy_file(source, &site_dir.join(relative)))?;

    log!("generate"; "{} pages, {} assets", page_count, copies.len());
    Ok(page_count)
}

/// Output directory of a category or tag page.
fn term_dir(kind: &str, name: &str, mode: &SlugMode) -> PathBuf {
    let segment = slugify(name, mode);
    let segment = if segment.is_empty() { name.trim().to_owned() } else { segment };
    Path::new(kind).join(segment)
}

/// Directories for every term of one kind, in name order.
///
/// Names that slugify to the same directory (`C` and `C#`, `Rust` and
/// `rust`) get `-1`, `-2`, ... suffixes in name order.
fn assign_term_dirs<'a>(
    kind: &str,
    names: impl Iterator<Item = &'a str>,
    mode: &SlugMode,
) -> BTreeMap<&'a str, PathBuf> {
    let mut taken = BTreeSet::new();
    let mut dirs = BTreeMap::new();
    for name in names {
        let base = term_dir(kind, name, mode);
        let mut dir = base.clone();
        let mut suffix = 1;
        while !taken.insert(dir.clone()) {
            dir = PathBuf::from(format!("{}-{suffix}", base.display()));
            suffix += 1;
        }
        dirs.insert(name, dir);
    }
    dirs
}

fn entry(doc: &Document, url: String) -> Entry {
    Entry {
        title: doc.title.clone(),
        url,
        date: doc.date.as_ref().map(date::ymd),
    }
}

/// Output paths already taken, mapped to what produced them.
#[derive(Default)]
struct Claims(BTreeMap<PathBuf, PathBuf>);

impl Claims {
    fn claim(&mut self, output: PathBuf, origin: &Path) -> Result<(), ContentError> {
        match self.0.entry(output) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(origin.to_path_buf());
                Ok(())
            }
            btree_map::Entry::Occupied(taken) => Err(ContentError::DuplicateOutput {
                first: taken.get().clone(),
                second: origin.to_path_buf(),
                output: taken.key().clone(),
            }),
        }
    }
}

#[derive(Serialize)]
struct Record<'a> {
    path: String,
    url: &'a str,
    title: &'a str,
    date: Option<String>,
    updated: Option<String>,
    categories: &'a BTreeSet<String>,
    tags: &'a BTreeSet<String>,
    summary: Option<&'a str>,
}

/// Metadata of every published document, in path order.
fn documents_json(input: &Input<'_>, urls: &Urls, mode: &SlugMode) -> Result<Vec<u8>> {
    let page_urls: Vec<String> = input
        .store
        .published()
        .map(|doc| urls.dir(&doc.page_dir(mode)))
        .collect();
    let rfc3339 = |dt: &chrono::DateTime<chrono::Utc>| dt.to_rfc3339_opts(SecondsFormat::Secs, true);

    let records: Vec<Record<'_>> = input
        .store
        .published()
        .zip(&page_urls)
        .map(|(doc, url)| Record {
            path: doc.path.to_string_lossy().replace('\\', "/"),
            url,
            title: &doc.title,
            date: doc.date.as_ref().map(rfc3339),
            updated: doc.updated.as_ref().map(rfc3339),
            categories: &doc.categories,
            tags: &doc.tags,
            summary: doc.summary.as_deref(),
        })
        .collect();

    let mut json = serde_json::to_vec_pretty(&records).context("Failed to serialize documents index")?;
    json.push(b'\n');
    Ok(json)
}

/// Files of the site assets directory, relative to it, in path order.
fn scan_assets(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if entry.file_type().is_file()
            && let Ok(relative) = entry.path().strip_prefix(dir)
        {
            files.push(relative.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest)
        .map(drop)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SiteConfig, content::ContentStore};

    struct Fixture {
        dir: tempfile::TempDir,
        config: SiteConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("content")).unwrap();
            let mut config = SiteConfig::default();
            config.base.title = "Notes".into();
            config.base.url = Some("https://example.com".into());
            config.build.minify = false;
            Self { dir, config }
        }

        fn write(&self, rel: &str, text: &str) {
            let path = self.dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }

        fn generate(&self) -> Result<(usize, PathBuf)> {
            let store = ContentStore::open(&self.dir.path().join("content"))?;
            let out = self.dir.path().join(format!("out-{}", next_suffix()));
            let input = Input {
                config: &self.config,
                source_root: self.dir.path(),
                store: &store,
            };
            let pages = generate(&input, &out)?;
            Ok((pages, out))
        }
    }

    fn next_suffix() -> usize {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        NEXT.fetch_add(1, Ordering::Relaxed)
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_generate_site_layout() {
        let fx = Fixture::new();
        fx.write("content/posts/emacs.md", "---\ntitle: Emacs\ndate: 2021-11-20\ncategories: Tools\ntags: [emacs]\n---\nHello\n");
        fx.write("content/posts/latex.md", "---\ntitle: LaTeX\ndate: 2023-01-01\ntags: [tex]\n---\n## Setup\n");
        fx.write("content/posts/img/cat.png", "png");
        fx.write("assets/CNAME", "example.com");

        let (pages, out) = fx.generate().unwrap();

        // 2 documents, index, 2 overviews, 1 category, 2 tags
        assert_eq!(pages, 8);
        assert!(read(out.join("posts/emacs/index.html")).contains("<p>Hello</p>"));
        assert!(read(out.join("posts/latex/index.html")).contains(r#"<h2 id="setup">Setup</h2>"#));
        assert!(read(out.join("categories/Tools/index.html")).contains("Emacs"));
        assert!(read(out.join("tags/index.html")).contains("emacs (1)"));
        assert_eq!(read(out.join("posts/img/cat.png")), "png");
        assert_eq!(read(out.join("CNAME")), "example.com");

        let index = read(out.join("index.html"));
        let latex = index.find("LaTeX").unwrap();
        let emacs = index.find(">Emacs<").unwrap();
        assert!(latex < emacs, "index lists newest first");

        let json: serde_json::Value = serde_json::from_str(&read(out.join(DATA_INDEX))).unwrap();
        assert_eq!(json[0]["path"], "posts/emacs.md");
        assert_eq!(json[0]["url"], "/posts/emacs/");
        assert_eq!(json[0]["date"], "2021-11-20T00:00:00Z");
    }

    #[test]
    fn test_generate_empty_store() {
        let fx = Fixture::new();
        let (pages, out) = fx.generate().unwrap();
        assert_eq!(pages, 3);
        assert!(out.join("index.html").is_file());
        assert_eq!(read(out.join(DATA_INDEX)), "[]\n");
    }

    #[test]
    fn test_generate_is_deterministic() {
        let mut fx = Fixture::new();
        fx.config.build.feed.enable = true;
        fx.config.build.sitemap.enable = true;
        fx.config.build.minify = true;
        for i in 0..20 {
            fx.write(&format!("content/p{i}.md"), &format!("---\ndate: 2024-01-{:02}\ntags: [t{}]\n---\n# Post {i}\n", i + 1, i % 3));
        }

        let (_, a) = fx.generate().unwrap();
        let (_, b) = fx.generate().unwrap();
        for name in ["index.html", "p7/index.html", "tags/t1/index.html", "feed.xml", "sitemap.xml", DATA_INDEX] {
            assert_eq!(fs::read(a.join(name)).unwrap(), fs::read(b.join(name)).unwrap(), "{name}");
        }
    }

    #[test]
    fn test_root_index_becomes_intro() {
        let fx = Fixture::new();
        fx.write("content/index.md", "Welcome to my notes.");
        fx.write("content/a.md", "# A");

        let (pages, out) = fx.generate().unwrap();
        assert_eq!(pages, 4);
        let index = read(out.join("index.html"));
        assert!(index.contains("<p>Welcome to my notes.</p>"));
        assert!(index.contains(r#"<a href="/a/">A</a>"#));
    }

    #[test]
    fn test_drafts_are_skipped() {
        let fx = Fixture::new();
        fx.write("content/wip.md", "---\ndraft: true\n---\n");
        let (_, out) = fx.generate().unwrap();
        assert!(!out.join("wip").exists());
    }

    #[test]
    fn test_path_prefix_and_sitemap() {
        let mut fx = Fixture::new();
        fx.config.build.path_prefix = PathBuf::from("blog");
        fx.config.build.sitemap.enable = true;
        fx.write("content/a.md", "---\nupdated: 2024-02-02\n---\n");

        let (_, out) = fx.generate().unwrap();
        assert!(out.join("blog/a/index.html").is_file());
        let xml = read(out.join("blog/sitemap.xml"));
        assert!(xml.contains("<loc>https://example.com/blog/a/</loc>"));
        assert!(xml.contains("<lastmod>2024-02-02</lastmod>"));
    }

    #[test]
    fn test_duplicate_output_is_content_error() {
        let fx = Fixture::new();
        fx.write("content/a.md", "x");
        fx.write("content/b.md", "---\nslug: a\n---\n");

        let err = fx.generate().unwrap_err();
        let err = err.downcast_ref::<ContentError>().unwrap();
        assert!(matches!(err, ContentError::DuplicateOutput { .. }));
        assert!(err.to_string().contains("`a.md` and `b.md`"));
    }

    #[test]
    fn test_asset_colliding_with_page() {
        let fx = Fixture::new();
        fx.write("content/about.md", "x");
        fx.write("content/about/index.html", "<p>raw</p>");
        let err = fx.generate().unwrap_err();
        assert!(err.downcast_ref::<ContentError>().is_some());
    }

    #[test]
    fn test_colliding_terms_get_distinct_pages() {
        let fx = Fixture::new();
        fx.write("content/a.md", "---\ntitle: A\ntags: [C, \"C#\"]\n---\nx\n");

        let (pages, out) = fx.generate().unwrap();
        // document, index, 2 overviews, 2 tags
        assert_eq!(pages, 6);
        assert!(read(out.join("tags/C/index.html")).contains("<h1>C</h1>"));
        assert!(read(out.join("tags/C-1/index.html")).contains("<h1>C#</h1>"));

        let page = read(out.join("a/index.html"));
        assert!(page.contains(r#"href="/tags/C/""#));
        assert!(page.contains(r#"href="/tags/C-1/""#));
    }

    #[test]
    fn test_assign_term_dirs_suffixes_in_name_order() {
        let dirs = assign_term_dirs("tags", ["Rust", "rust", "rust-1"].into_iter(), &SlugMode::On);
        assert_eq!(dirs["Rust"], PathBuf::from("tags/rust"));
        assert_eq!(dirs["rust"], PathBuf::from("tags/rust-1"));
        assert_eq!(dirs["rust-1"], PathBuf::from("tags/rust-1-1"));
    }

    #[test]
    fn test_term_dir_falls_back_to_name() {
        assert_eq!(term_dir("tags", "C++ Tips", &SlugMode::On), PathBuf::from("tags/c-tips"));
        assert_eq!(term_dir("tags", "!!!", &SlugMode::On), PathBuf::from("tags/!!!"));
    }
}
