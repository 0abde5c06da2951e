//! Per-file classification and inference dispatch.
//!
//! Each file patch is tokenized line by line and sent to exactly one
//! inference endpoint. Files are processed strictly in diff order, one
//! request at a time, and the first failure aborts the whole run.

use serde::Serialize;
use serde::ser::SerializeMap;
use tracing::{debug, warn};

use crate::diff::{ChangeKind, FilePatch};
use crate::error::ServiceError;
use crate::service::{InferenceRequest, InferenceService, PerFileMessage, Route};

/// Shape of a file patch's changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Additions and deletions, with a known new path.
    Mixed,
    AddOnly,
    DeleteOnly,
    /// Additions and deletions but no new path to key the result under.
    MixedWithoutPath,
}

impl Classification {
    /// Endpoint for this classification; only `Mixed` uses `/diff`.
    pub fn route(&self) -> Route {
        match self {
            Classification::Mixed => Route::Diff,
            _ => Route::Added,
        }
    }
}

/// Added and deleted tokens for one file, in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub has_added: bool,
    pub has_deleted: bool,
}

/// Classify a patch from its tokenized changes.
///
/// Precedence: mixed edits only go to `/diff` when the new path is known.
pub fn classify(tokens: &TokenSet, new_path: Option<&str>) -> Classification {
    match (tokens.has_added, tokens.has_deleted, new_path.is_some()) {
        (true, true, true) => Classification::Mixed,
        (true, true, false) => Classification::MixedWithoutPath,
        (true, false, _) => Classification::AddOnly,
        _ => Classification::DeleteOnly,
    }
}

/// Tokenize every added and removed line of a patch, skipping unchanged lines.
pub async fn tokenize_patch<S>(patch: &FilePatch, service: &S) -> Result<TokenSet, ServiceError>
where
    S: InferenceService + ?Sized,
{
    let mut tokens = TokenSet::default();

    for change in &patch.changes {
        match change.kind() {
            ChangeKind::Added => {
                tokens.added.extend(service.tokenize(&change.line).await?);
                tokens.has_added = true;
            }
            ChangeKind::Removed => {
                tokens.deleted.extend(service.tokenize(&change.line).await?);
                tokens.has_deleted = true;
            }
            ChangeKind::Unchanged => {}
        }
    }

    Ok(tokens)
}

/// One file's suggested message, keyed by its new path.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSuggestion {
    /// Empty when the patch had no new path (deleted files).
    pub path: String,
    pub index: usize,
    pub message: PerFileMessage,
}

/// Ordered mapping of path to suggested message.
///
/// Iteration order is insertion order. Inserting an existing path replaces
/// its message in place, keeping the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionSet {
    entries: Vec<FileSuggestion>,
}

impl SuggestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message, returning the index of the patch it replaced, if any.
    pub fn insert(&mut self, path: String, index: usize, message: PerFileMessage) -> Option<usize> {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == path) {
            let replaced = existing.index;
            existing.index = index;
            existing.message = message;
            return Some(replaced);
        }

        self.entries.push(FileSuggestion { path, index, message });
        None
    }

    pub fn get(&self, path: &str) -> Option<&PerFileMessage> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| &e.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileSuggestion> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON with keys sorted, for verbose output.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let sorted: std::collections::BTreeMap<&str, &PerFileMessage> = self
            .entries
            .iter()
            .map(|e| (e.path.as_str(), &e.message))
            .collect();
        let value = serde_json::to_value(sorted)?;

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

impl Serialize for SuggestionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.path, &entry.message)?;
        }
        map.end()
    }
}

/// Generate a message for every file patch, in order.
///
/// `on_message` is called as each file's message arrives so callers can show
/// progress. Any tokenizer or inference failure is returned immediately and
/// no further files are processed.
pub async fn suggest_messages<S, F>(
    patches: &[FilePatch],
    service: &S,
    mut on_message: F,
) -> Result<SuggestionSet, ServiceError>
where
    S: InferenceService + ?Sized,
    F: FnMut(&FileSuggestion),
{
    let mut suggestions = SuggestionSet::new();

    for patch in patches {
        if patch.changes.is_empty() {
            continue;
        }

        let tokens = tokenize_patch(patch, service).await?;
        let classification = classify(&tokens, patch.new_path.as_deref());
        let route = classification.route();

        debug!(
            "File {} ({}): {:?}, {} added / {} deleted tokens -> {}",
            patch.index,
            patch.display_path(),
            classification,
            tokens.added.len(),
            tokens.deleted.len(),
            route
        );

        let request = InferenceRequest {
            idx: patch.index,
            added: tokens.added,
            deleted: tokens.deleted,
        };
        let message = service.infer(route, &request).await?;

        let key = patch.new_path.clone().unwrap_or_default();
        if let Some(replaced) = suggestions.insert(key.clone(), patch.index, message) {
            warn!(
                "File {} overwrote the message of file {} under the same key '{}'",
                patch.index, replaced, key
            );
        }

        if let Some(entry) = suggestions.iter().find(|e| e.path == key) {
            on_message(entry);
        }
    }

    Ok(suggestions)
}
