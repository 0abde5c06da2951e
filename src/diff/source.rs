//! Raw diff text from a patch file or from the repository index.

use std::path::Path;

use git2::{DiffFindOptions, DiffFormat, ErrorCode, Repository, Tree};
use tracing::debug;

use crate::error::DiffError;

use super::parser::{FilePatch, parse_patches};

/// Read a diff previously saved to disk (e.g. `git diff --cached > x.diff`).
pub fn read_diff_file(path: &Path) -> Result<String, DiffError> {
    std::fs::read_to_string(path).map_err(|source| DiffError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Open the repository containing the current directory and collect its staged diff.
pub fn staged_diff_from_cwd() -> Result<String, DiffError> {
    let repo = Repository::open_from_env().map_err(DiffError::OpenRepository)?;
    staged_diff(&repo)
}

/// Read the diff from `file`, or the staged changes when no file is given,
/// and split it into file patches.
///
/// The whole diff is parsed up front so malformed input is reported before
/// any file is sent anywhere.
pub fn load_patches(file: Option<&Path>) -> Result<Vec<FilePatch>, DiffError> {
    let text = match file {
        Some(path) => read_diff_file(path)?,
        None => staged_diff_from_cwd()?,
    };
    Ok(parse_patches(&text)?)
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// so staged files are diffed against an empty tree.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, DiffError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e)
            if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound =>
        {
            return Ok(None);
        }
        Err(e) => return Err(DiffError::Staged(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(DiffError::Staged)?;
    Ok(Some(tree))
}

/// Staged changes (HEAD to index) as unified diff text, like `git diff --cached`.
pub fn staged_diff(repo: &Repository) -> Result<String, DiffError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(DiffError::Staged)?;

    // `git diff --cached` pairs renames by default (diff.renames)
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))
        .map_err(DiffError::Staged)?;

    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        // Body lines carry their origin separately; headers already include it
        let origin = line.origin();
        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(DiffError::Staged)?;

    debug!("Staged diff: {} deltas, {} bytes", diff.deltas().len(), text.len());

    Ok(text)
}
