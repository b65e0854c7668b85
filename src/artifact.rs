//! Build artifact: staging, content digest and wholesale replacement.
//!
//! A generator writes into a [`Staging`] directory next to the output
//! directory. Finishing the staging digests the tree and swaps it into
//! place; a failed generate drops the staging and leaves the output alone.

use anyhow::{Context, Result};
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Top-level entry owned by the git publish target, never replaced.
const GIT_DIR: &str = ".git";

/// Length of the digest prefix used in commit messages and logs.
const SHORT_DIGEST_LEN: usize = 12;

/// A fresh directory for one generate run, removed on drop.
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    /// Create a staging directory beside `output` so the final move is a rename.
    pub fn new(output: &Path) -> Result<Self> {
        let parent = output
            .parent()
            .with_context(|| format!("Output directory {} has no parent", output.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let dir = tempfile::Builder::new()
            .prefix(".pressroom-staging-")
            .tempdir_in(parent)
            .with_context(|| format!("Failed to create staging directory in {}", parent.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Digest the staged tree and make it the contents of `output`.
    pub fn finish(self, output: &Path) -> Result<Artifact> {
        let files = tree_files(self.path())?;
        let digest = digest_files(self.path(), &files)?;
        replace_contents(self.path(), output)?;

        Ok(Artifact {
            root: output.to_path_buf(),
            files,
            digest,
        })
    }
}

/// The generated site, installed in the output directory.
#[derive(Debug, Clone)]
pub struct Artifact {
    root: PathBuf,
    files: Vec<PathBuf>,
    digest: String,
}

impl Artifact {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths of every file, sorted.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Hex blake3 digest over sorted paths and file contents.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn short_digest(&self) -> &str {
        &self.digest[..SHORT_DIGEST_LEN.min(self.digest.len())]
    }
}

/// Digest of an existing directory, `None` when it does not exist.
pub fn digest_dir(dir: &Path) -> Result<Option<String>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let files = tree_files(dir)?;
    digest_files(dir, &files).map(Some)
}

/// Relative paths of all files under `root`, sorted, without a top-level `.git`.
pub fn tree_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_name() == GIT_DIR));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to scan {}", root.display()))?;
        if entry.file_type().is_file()
            && let Ok(relative) = entry.path().strip_prefix(root)
        {
            files.push(relative.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn digest_files(root: &Path, files: &[PathBuf]) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut buf = Vec::new();

    for relative in files {
        let path = root.join(relative);
        buf.clear();
        fs::File::open(&path)
            .and_then(|mut f| f.read_to_end(&mut buf))
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let name = relative.to_string_lossy().replace('\\', "/");
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        hasher.update(&(buf.len() as u64).to_le_bytes());
        hasher.update(&buf);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Empty `output` (keeping `.git`) and move every entry of `staging` into it.
fn replace_contents(staging: &Path, output: &Path) -> Result<()> {
    fs::create_dir_all(output).with_context(|| format!("Failed to create {}", output.display()))?;

    for entry in read_dir_sorted(output)? {
        if entry.file_name().is_some_and(|name| name == GIT_DIR) {
            continue;
        }
        remove_path(&entry)?;
    }

    for entry in read_dir_sorted(staging)? {
        let Some(name) = entry.file_name() else { continue };
        let dest = output.join(name);
        fs::rename(&entry, &dest)
            .with_context(|| format!("Failed to move {} to {}", entry.display(), dest.display()))?;
    }
    Ok(())
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    entries.sort();
    Ok(entries)
}

/// Remove a file, symlink or directory tree.
pub fn remove_path(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    let removed = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.with_context(|| format!("Failed to remove {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_digest_depends_on_paths_and_bytes() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for dir in [a.path(), b.path()] {
            write(dir, "index.html", "<p>hi</p>");
            write(dir, "posts/a/index.html", "a");
        }
        let digest_a = digest_dir(a.path()).unwrap().unwrap();
        assert_eq!(digest_a, digest_dir(b.path()).unwrap().unwrap());
        assert_eq!(digest_a.len(), 64);

        write(b.path(), "posts/a/index.html", "b");
        assert_ne!(digest_a, digest_dir(b.path()).unwrap().unwrap());

        fs::remove_file(b.path().join("posts/a/index.html")).unwrap();
        write(b.path(), "posts/b/index.html", "a");
        assert_ne!(digest_a, digest_dir(b.path()).unwrap().unwrap());
    }

    #[test]
    fn test_digest_ignores_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "x");
        let before = digest_dir(dir.path()).unwrap();
        write(dir.path(), ".git/HEAD", "ref: refs/heads/gh-pages");
        assert_eq!(before, digest_dir(dir.path()).unwrap());
    }

    #[test]
    fn test_digest_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(digest_dir(&dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn test_finish_replaces_output_but_keeps_git() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("public");
        write(&output, ".git/HEAD", "ref");
        write(&output, "stale/index.html", "old");
        write(&output, "index.html", "old");

        let staging = Staging::new(&output).unwrap();
        write(staging.path(), "index.html", "new");
        write(staging.path(), "posts/a/index.html", "a");
        let staging_path = staging.path().to_path_buf();

        let artifact = staging.finish(&output).unwrap();

        assert_eq!(fs::read_to_string(output.join("index.html")).unwrap(), "new");
        assert!(output.join("posts/a/index.html").is_file());
        assert!(!output.join("stale").exists());
        assert!(output.join(".git/HEAD").is_file());
        assert!(!staging_path.exists());
        assert_eq!(
            artifact.files(),
            [PathBuf::from("index.html"), PathBuf::from("posts/a/index.html")]
        );
        assert_eq!(Some(artifact.digest().to_owned()), digest_dir(&output).unwrap());
        assert_eq!(artifact.short_digest().len(), SHORT_DIGEST_LEN);
    }

    #[test]
    fn test_dropped_staging_leaves_output_untouched() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("public");
        write(&output, "index.html", "old");

        {
            let staging = Staging::new(&output).unwrap();
            write(staging.path(), "index.html", "half-written");
        }

        assert_eq!(fs::read_to_string(output.join("index.html")).unwrap(), "old");
        let leftovers = fs::read_dir(root.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
