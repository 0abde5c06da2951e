//! Staged diff collection and unified diff parsing.

pub mod parser;
pub mod source;

pub use parser::{ChangeKind, FilePatch, LineChange, PatchParser, parse_patch, parse_patches};
pub use source::{load_patches, read_diff_file, staged_diff, staged_diff_from_cwd};
