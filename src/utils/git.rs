//! Git operations for checkout and publishing.
//!
//! Object and index writing go through `gix`; anything touching the network
//! (clone, ls-remote, fetch, push) and ref updates go through the `git` CLI.

use crate::{
    exec, log,
    utils::exec::{GIT_FILTER, SILENT_FILTER},
};
use anyhow::{Context, Result, anyhow, bail};
use gix::{
    Repository, ThreadSafeRepository,
    bstr::{BString, ByteSlice},
    index::{
        State,
        entry::{Flags, Mode, Stat},
        fs::Metadata,
    },
    objs::{Tree, tree},
};
use std::{fs, path::Path};

// ============================================================================
// Repository Operations
// ============================================================================

/// Create a new git repository at the given path
pub fn create_repo(root: &Path) -> Result<ThreadSafeRepository> {
    let repo = gix::init(root)?;
    Ok(repo.into_sync())
}

/// Open an existing git repository
pub fn open_repo(root: &Path) -> Result<ThreadSafeRepository> {
    let repo = gix::open(root)?;
    Ok(repo.into_sync())
}

/// Open the repository at `root`, initializing one if there is none.
pub fn ensure_repo(root: &Path) -> Result<ThreadSafeRepository> {
    if root.join(".git").exists() {
        open_repo(root)
    } else {
        log!("git"; "initializing repo in {}", root.display());
        fs::create_dir_all(root)?;
        create_repo(root)
    }
}

/// Identity used for publish commits.
pub struct Identity<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

/// Snapshot `root` (minus `.git`) as a tree, and write the matching index.
///
/// Returns the tree id. Identical directory contents always produce the same id.
pub fn write_tree(repo: &ThreadSafeRepository) -> Result<gix::ObjectId> {
    let repo_local = repo.to_thread_local();
    let root = get_repo_root(&repo_local)?;

    let mut index = State::new(repo_local.object_hash());
    let tree = TreeBuilder::new(&repo_local, root).build_from_dir(root, &mut index)?;
    index.sort_entries();

    let mut index_file = gix::index::File::from_state(index, repo_local.index_path());
    index_file.write(gix::index::write::Options::default())?;

    Ok(repo_local.write_object(&tree)?.detach())
}

/// Tree id of a commit.
pub fn tree_of_commit(repo: &ThreadSafeRepository, commit: gix::ObjectId) -> Result<gix::ObjectId> {
    let repo_local = repo.to_thread_local();
    let commit = repo_local
        .find_commit(commit)
        .with_context(|| format!("Commit {commit} not found"))?;
    Ok(commit.tree_id()?.detach())
}

/// Create a commit of `tree` on top of `parent` and point HEAD at it.
pub fn commit_tree(
    root: &Path,
    tree: gix::ObjectId,
    parent: Option<gix::ObjectId>,
    message: &str,
    identity: &Identity,
) -> Result<gix::ObjectId> {
    if message.trim().is_empty() {
        bail!("Commit message cannot be empty");
    }

    let user_name = format!("user.name={}", identity.name);
    let user_email = format!("user.email={}", identity.email);
    let tree_hex = tree.to_string();
    let parent_hex = parent.map(|p| p.to_string()).unwrap_or_default();
    let parent_flag = if parent.is_some() { "-p" } else { "" };

    let output = exec!(
        filter=&SILENT_FILTER; root; ["git"];
        "-c", &user_name, "-c", &user_email,
        "commit-tree", &tree_hex, parent_flag, &parent_hex, "-m", message
    )?;
    let commit = parse_object_id(&output.stdout)?;

    exec!(filter=&SILENT_FILTER; root; ["git"]; "update-ref", "HEAD", commit.to_string())?;
    log!("git"; "commit {commit}");
    Ok(commit)
}

// ============================================================================
// Remote Operations
// ============================================================================

/// Add `origin` or update its URL.
pub fn configure_origin_remote(root: &Path, repo: &Repository, url: &str) -> Result<()> {
    let action = if repo.find_remote("origin").is_ok() {
        "set-url"
    } else {
        "add"
    };
    exec!(filter=&SILENT_FILTER; root; ["git"]; "remote", action, "origin", url)?;
    Ok(())
}

/// Fetch the head commit of `branch` on origin, `None` if the branch does not exist.
pub fn fetch_branch_head(root: &Path, branch: &str) -> Result<Option<gix::ObjectId>> {
    let refname = format!("refs/heads/{branch}");
    let listing = exec!(filter=&GIT_FILTER; root; ["git"]; "ls-remote", "--heads", "origin", &refname)
        .context("Failed to query publish target")?;

    let Some(head) = parse_ls_remote(&listing.stdout, &refname)? else {
        return Ok(None);
    };

    exec!(filter=&GIT_FILTER; root; ["git"]; "fetch", "--depth", "1", "origin", &refname)
        .context("Failed to fetch published branch")?;
    Ok(Some(head))
}

/// Push HEAD to `refs/heads/<branch>` on origin.
pub fn push_head(root: &Path, branch: &str, force: bool) -> Result<()> {
    let refspec = format!("HEAD:refs/heads/{branch}");
    let force_flag = if force { "--force" } else { "" };
    exec!(filter=&GIT_FILTER; root; ["git"]; "push", force_flag, "origin", &refspec)?;
    Ok(())
}

/// Shallow-clone `branch` of `url` into `dest`.
pub fn clone(url: &str, branch: &str, dest: &Path, submodules: bool) -> Result<()> {
    let dest = dest.to_str().context("Checkout path is not valid UTF-8")?;
    let (recurse, shallow) = if submodules {
        ("--recurse-submodules", "--shallow-submodules")
    } else {
        ("", "")
    };
    exec!(filter=&GIT_FILTER; ["git"]; "clone", "--depth", "1", recurse, shallow, "--branch", branch, url, dest)?;
    Ok(())
}

/// Initialize and update nested repositories under `root`.
pub fn update_submodules(root: &Path) -> Result<()> {
    exec!(filter=&GIT_FILTER; root; ["git"]; "submodule", "update", "--init", "--recursive")?;
    Ok(())
}

/// Build an HTTPS URL carrying `token` as credentials.
///
/// SSH URLs are returned unchanged; they authenticate through the ssh agent.
/// So are local remotes (`file://` or an absolute path).
pub fn build_authenticated_url(url: &str, token: Option<&str>) -> Result<String> {
    if is_ssh_url(url) || is_local_url(url) {
        return Ok(url.to_owned());
    }

    let base_url = url
        .strip_prefix("https://")
        .context("Remote URL must start with https:// or be an ssh URL")?;

    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => Ok(format!("https://x-access-token:{token}@{base_url}")),
        None => Ok(format!("https://{base_url}")),
    }
}

/// `git@host:path` and `ssh://` remotes.
pub fn is_ssh_url(url: &str) -> bool {
    url.starts_with("ssh://") || (url.starts_with("git@") && url.contains(':'))
}

/// Remotes that need a token: everything reached over HTTPS.
pub fn needs_token(url: &str) -> bool {
    url.starts_with("https://")
}

fn is_local_url(url: &str) -> bool {
    url.starts_with("file://") || Path::new(url).is_absolute()
}

// ============================================================================
// Tree Building
// ============================================================================

/// Builds git trees from the filesystem, mirroring every file into the index.
struct TreeBuilder<'a> {
    repo: &'a Repository,
    root: &'a Path,
}

impl<'a> TreeBuilder<'a> {
    fn new(repo: &'a Repository, root: &'a Path) -> Self {
        Self { repo, root }
    }

    fn build_from_dir(&self, dir: &Path, index: &mut State) -> Result<Tree> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let filename: BString = entry
                .file_name()
                .into_string()
                .map(Into::into)
                .map_err(|_| anyhow!("Invalid UTF-8 in filename: {}", path.display()))?;

            if filename == ".git" {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                let sub_tree = self.build_from_dir(&path, index)?;
                let oid = self.repo.write_object(&sub_tree)?.detach();
                entries.push(tree::Entry {
                    mode: tree::EntryKind::Tree.into(),
                    oid,
                    filename,
                });
            } else if file_type.is_file() {
                let oid: gix::ObjectId = self.repo.write_blob(fs::read(&path)?)?.into();
                self.add_to_index(index, &path, oid)?;
                entries.push(tree::Entry {
                    mode: tree::EntryKind::Blob.into(),
                    oid,
                    filename,
                });
            }
        }

        sort_tree_entries(&mut entries);
        Ok(Tree { entries })
    }

    fn add_to_index(&self, index: &mut State, path: &Path, oid: gix::ObjectId) -> Result<()> {
        let relative = path
            .strip_prefix(self.root)?
            .to_str()
            .ok_or_else(|| anyhow!("Invalid UTF-8 in path: {}", path.display()))?
            .replace('\\', "/");
        let stat = Stat::from_fs(&Metadata::from_path_no_follow(path)?)?;
        index.dangerously_push_entry(stat, oid, Flags::empty(), Mode::FILE, relative.as_bytes().as_bstr());
        Ok(())
    }
}

/// Git tree order: names compare bytewise, directories as if suffixed with `/`.
///
/// "foo-bar" < "foo.rs" < "foo/"
fn sort_tree_entries(entries: &mut [tree::Entry]) {
    let tree_mode: tree::EntryMode = tree::EntryKind::Tree.into();
    let sort_key = |e: &tree::Entry| {
        let mut key = e.filename.as_slice().to_vec();
        if e.mode == tree_mode {
            key.push(b'/');
        }
        key
    };
    entries.sort_by_key(sort_key);
}

// ============================================================================
// Helper Functions
// ============================================================================

fn get_repo_root(repo: &Repository) -> Result<&Path> {
    repo.path()
        .parent()
        .ok_or_else(|| anyhow!("Invalid repository path"))
}

fn parse_object_id(stdout: &[u8]) -> Result<gix::ObjectId> {
    let hex = stdout.trim();
    gix::ObjectId::from_hex(hex).with_context(|| format!("Invalid object id `{}`", hex.as_bstr()))
}

/// Find the id advertised for `refname` in `git ls-remote` output.
fn parse_ls_remote(stdout: &[u8], refname: &str) -> Result<Option<gix::ObjectId>> {
    for line in stdout.lines() {
        let mut parts = line.split_str("\t");
        if let (Some(id), Some(name)) = (parts.next(), parts.next())
            && name.trim() == refname.as_bytes()
        {
            return parse_object_id(id).map(Some);
        }
    }
    Ok(None)
}
