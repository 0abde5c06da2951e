//! Unified diff interpretation.
//!
//! Splits raw diff text into per-file [`FilePatch`] records. Both `git diff`
//! output (with `diff --git` headers) and plain unified diffs are accepted.
//! Hunk bodies are consumed by the line counts declared in their headers, so
//! a removed line that happens to start with `--` is never mistaken for a
//! file header.

use std::fmt;
use std::iter::{Enumerate, Peekable};
use std::str::Lines;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::ParseError;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("Invalid regex")
});

/// Marker git uses for the missing side of an added or deleted file.
const DEV_NULL: &str = "/dev/null";

/// Which side(s) of the diff a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Unchanged,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "Added"),
            ChangeKind::Removed => write!(f, "Removed"),
            ChangeKind::Unchanged => write!(f, "Unchanged"),
        }
    }
}

/// One line inside a hunk.
///
/// `old` and `new` are the 1-based line numbers on each side. A line present
/// only on the new side is an addition, only on the old side a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    pub old: Option<u32>,
    pub new: Option<u32>,
    pub line: String,
}

impl LineChange {
    pub fn added(new: u32, line: impl Into<String>) -> Self {
        Self { old: None, new: Some(new), line: line.into() }
    }

    pub fn removed(old: u32, line: impl Into<String>) -> Self {
        Self { old: Some(old), new: None, line: line.into() }
    }

    pub fn unchanged(old: u32, new: u32, line: impl Into<String>) -> Self {
        Self { old: Some(old), new: Some(new), line: line.into() }
    }

    pub fn kind(&self) -> ChangeKind {
        match (self.old, self.new) {
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            _ => ChangeKind::Unchanged,
        }
    }
}

/// All changes to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    /// Position of this file in the diff, counting files that had no changes.
    pub index: usize,
    pub old_path: Option<String>,
    /// None for deleted files.
    pub new_path: Option<String>,
    pub changes: Vec<LineChange>,
}

impl FilePatch {
    /// Best path for display: the new path, or the old one for deletions.
    pub fn display_path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or("<unknown>")
    }
}

/// Parse diff text into a lazy sequence of file patches.
///
/// Files without any changes (binary files, pure mode changes, bare renames)
/// are skipped but still consume an index. After the first error the
/// iterator is exhausted.
pub fn parse_patch(text: &str) -> PatchParser<'_> {
    PatchParser {
        lines: text.lines().enumerate().peekable(),
        next_index: 0,
        failed: false,
    }
}

/// Parse all file patches, failing if any hunk is malformed.
pub fn parse_patches(text: &str) -> Result<Vec<FilePatch>, ParseError> {
    parse_patch(text).collect()
}

/// Iterator over the file sections of a diff.
pub struct PatchParser<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
    next_index: usize,
    failed: bool,
}

impl Iterator for PatchParser<'_> {
    type Item = Result<FilePatch, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            match self.next_section()? {
                Ok(patch) if patch.changes.is_empty() => continue,
                Ok(patch) => return Some(Ok(patch)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl PatchParser<'_> {
    /// Read the next file section, or `None` at end of input.
    fn next_section(&mut self) -> Option<Result<FilePatch, ParseError>> {
        // Skip preamble (commit headers, stray text) up to a section start
        while let Some((_, line)) = self.lines.peek() {
            if is_section_start(line) {
                break;
            }
            self.lines.next();
        }
        self.lines.peek()?;

        let index = self.next_index;
        self.next_index += 1;

        let mut patch = FilePatch {
            index,
            old_path: None,
            new_path: None,
            changes: Vec::new(),
        };

        self.read_header(&mut patch);

        while let Some((_, line)) = self.lines.peek() {
            if line.starts_with("@@") {
                if let Err(e) = self.read_hunk(&mut patch) {
                    return Some(Err(e));
                }
            } else if line.starts_with("diff --git ") || line.starts_with("--- ") {
                break;
            } else {
                self.lines.next();
            }
        }

        Some(Ok(patch))
    }

    /// Consume file-level header lines up to the first hunk.
    fn read_header(&mut self, patch: &mut FilePatch) {
        let mut seen_git_header = false;
        let mut seen_old_marker = false;

        while let Some(&(_, line)) = self.lines.peek() {
            if line.starts_with("@@") {
                return;
            }

            if let Some(rest) = line.strip_prefix("diff --git ") {
                if seen_git_header || seen_old_marker {
                    return;
                }
                seen_git_header = true;
                let (old, new) = split_git_paths(rest);
                patch.old_path = old;
                patch.new_path = new;
            } else if let Some(rest) = line.strip_prefix("--- ") {
                if seen_old_marker {
                    return;
                }
                seen_old_marker = true;
                patch.old_path = parse_marker_path(rest);
            } else if let Some(rest) = line.strip_prefix("+++ ") {
                patch.new_path = parse_marker_path(rest);
            } else if line.starts_with("deleted file mode") {
                patch.new_path = None;
            } else if line.starts_with("new file mode") {
                patch.old_path = None;
            } else if let Some(rest) = line.strip_prefix("rename from ") {
                patch.old_path = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("rename to ") {
                patch.new_path = Some(rest.to_string());
            }

            self.lines.next();
        }
    }

    /// Consume one hunk (header plus body) into `patch.changes`.
    fn read_hunk(&mut self, patch: &mut FilePatch) -> Result<(), ParseError> {
        let Some((header_idx, header)) = self.lines.next() else {
            return Ok(());
        };
        let header_line = header_idx + 1;

        let caps = HUNK_HEADER
            .captures(header)
            .ok_or_else(|| ParseError::MalformedHunkHeader {
                line: header_line,
                text: header.to_string(),
            })?;

        let number = |i: usize, default: u32| -> Result<u32, ParseError> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().map_err(|_| ParseError::MalformedHunkHeader {
                    line: header_line,
                    text: header.to_string(),
                }),
                None => Ok(default),
            }
        };

        let mut old_no = number(1, 0)?;
        let mut old_remaining = number(2, 1)?;
        let mut new_no = number(3, 0)?;
        let mut new_remaining = number(4, 1)?;

        // Every body line advances the counters, so the hunk must end within u32
        if old_no.checked_add(old_remaining).is_none() || new_no.checked_add(new_remaining).is_none()
        {
            return Err(ParseError::MalformedHunkHeader {
                line: header_line,
                text: header.to_string(),
            });
        }

        while old_remaining > 0 || new_remaining > 0 {
            let Some((idx, line)) = self.lines.next() else {
                return Err(ParseError::TruncatedHunk {
                    line: header_line,
                    old_remaining,
                    new_remaining,
                });
            };

            let unexpected = || ParseError::UnexpectedLine {
                line: idx + 1,
                text: line.to_string(),
            };

            match line.chars().next() {
                Some('+') if new_remaining > 0 => {
                    patch.changes.push(LineChange::added(new_no, &line[1..]));
                    new_no += 1;
                    new_remaining -= 1;
                }
                Some('-') if old_remaining > 0 => {
                    patch.changes.push(LineChange::removed(old_no, &line[1..]));
                    old_no += 1;
                    old_remaining -= 1;
                }
                Some(' ') | None if old_remaining > 0 && new_remaining > 0 => {
                    let text = line.get(1..).unwrap_or("");
                    patch.changes.push(LineChange::unchanged(old_no, new_no, text));
                    old_no += 1;
                    new_no += 1;
                    old_remaining -= 1;
                    new_remaining -= 1;
                }
                Some('\\') => {}
                _ => return Err(unexpected()),
            }
        }

        // Trailing "\ No newline at end of file" after the last body line
        while let Some((_, line)) = self.lines.peek() {
            if !line.starts_with('\\') {
                break;
            }
            self.lines.next();
        }

        Ok(())
    }
}

fn is_section_start(line: &str) -> bool {
    line.starts_with("diff --git ") || line.starts_with("--- ") || line.starts_with("@@")
}

/// Split `a/old b/new` from a `diff --git` line.
fn split_git_paths(rest: &str) -> (Option<String>, Option<String>) {
    match rest.rfind(" b/") {
        Some(pos) => (
            strip_side_prefix(&rest[..pos]),
            strip_side_prefix(&rest[pos + 1..]),
        ),
        None => (None, None),
    }
}

/// Path from a `---`/`+++` marker, without timestamp or side prefix.
fn parse_marker_path(rest: &str) -> Option<String> {
    let path = rest.split('\t').next().unwrap_or("").trim_end();
    if path.is_empty() || path == DEV_NULL {
        return None;
    }
    strip_side_prefix(path)
}

fn strip_side_prefix(path: &str) -> Option<String> {
    let path = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
