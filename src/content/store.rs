//! Directory scanning into an ordered collection of documents.

use super::{ContentError, Document};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Files never treated as content or assets.
const IGNORED_FILE_NAMES: &[&str] = &["Thumbs.db", "desktop.ini"];

/// Documents and assets of one content directory, ordered by relative path.
#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
    documents: Vec<Document>,
    assets: Vec<PathBuf>,
    drafts: bool,
}

impl ContentStore {
    /// Scan `dir` and parse every Markdown file.
    ///
    /// Every file is parsed even after a failure so that all content errors
    /// of a scan are reported together.
    pub fn open(dir: &Path) -> Result<Self, ContentError> {
        if !dir.is_dir() {
            return Err(ContentError::MissingDirectory(dir.to_path_buf()));
        }

        let (markdown, mut assets) = scan(dir)?;

        let results: Vec<_> = markdown
            .par_iter()
            .map(|relative| {
                let source = dir.join(relative);
                let text = fs::read_to_string(&source).map_err(|source_err| ContentError::Io {
                    path: source.clone(),
                    source: source_err,
                })?;
                Document::parse(&source, relative, &text)
            })
            .collect();

        let mut documents = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(doc) => documents.push(doc),
                Err(err) => errors.push(err),
            }
        }
        if !errors.is_empty() {
            return Err(ContentError::from_many(errors));
        }

        documents.sort_by(|a, b| a.path.cmp(&b.path));
        assets.sort();

        Ok(Self {
            root: dir.to_path_buf(),
            documents,
            assets,
            drafts: false,
        })
    }

    /// Include draft documents in [`published`](Self::published).
    pub fn with_drafts(mut self, drafts: bool) -> Self {
        self.drafts = drafts;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every document, in path order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Documents to publish, in path order.
    pub fn published(&self) -> impl Iterator<Item = &Document> {
        let drafts = self.drafts;
        self.documents.iter().filter(move |d| drafts || !d.draft)
    }

    /// Category name to the published documents carrying it.
    pub fn categories(&self) -> BTreeMap<&str, Vec<&Document>> {
        self.group_by(|doc| doc.categories.iter())
    }

    /// Tag name to the published documents carrying it.
    pub fn tags(&self) -> BTreeMap<&str, Vec<&Document>> {
        self.group_by(|doc| doc.tags.iter())
    }

    /// Non-Markdown files, relative to the content directory.
    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    fn group_by<'a, F, I>(&'a self, terms: F) -> BTreeMap<&'a str, Vec<&'a Document>>
    where
        F: Fn(&'a Document) -> I,
        I: Iterator<Item = &'a String>,
    {
        let mut groups: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
        for doc in self.published() {
            for term in terms(doc) {
                groups.entry(term.as_str()).or_default().push(doc);
            }
        }
        groups
    }
}

/// Relative paths of Markdown files and of everything else.
fn scan(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), ContentError> {
    let mut markdown = Vec::new();
    let mut assets = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.map_err(|err| ContentError::Io {
            path: err.path().unwrap_or(dir).to_path_buf(),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if IGNORED_FILE_NAMES.contains(&name.as_ref()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        if is_markdown(&relative) {
            markdown.push(relative);
        } else {
            assets.push(relative);
        }
    }

    Ok((markdown, assets))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
