//! URL slugification.
//!
//! Converts document paths, categories and heading text to URL-safe forms.

use crate::config::SlugMode;
use std::path::{Component, Path, PathBuf};

/// Characters forbidden in file paths and fragments
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '"', '\'', '\t', '\r', '\n',
];

/// Convert text to a URL segment according to `mode`.
pub fn slugify(text: &str, mode: &SlugMode) -> String {
    match mode {
        SlugMode::Safe => sanitize_text(text),
        SlugMode::On => ascii_slug(text),
        SlugMode::No => text.to_owned(),
    }
}

/// Slugify every normal component of a relative path.
pub fn slugify_path(path: &Path, mode: &SlugMode) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(slugify(&part.to_string_lossy(), mode)),
            _ => None,
        })
        .filter(|part| !part.is_empty())
        .collect()
}

/// Remove forbidden characters and replace whitespace with dashes
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Transliterate to lowercase ASCII, collapsing everything else into single dashes.
fn ascii_slug(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_ascii_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
