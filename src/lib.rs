//! commit-autosuggest - suggests commit messages for staged changes.
//!
//! # Overview
//!
//! The staged diff is split into per-file patches. Each patch's added and
//! removed lines are tokenized by a remote service and sent to one of two
//! inference endpoints: `/diff` for mixed edits, `/added` for everything
//! else. The per-file messages are joined in diff order into one commit
//! message, which can then be committed with `git commit`.

pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod service;
pub mod suggest;

// Re-export commonly used types
pub use config::{ProfileStore, resolve_endpoint};
pub use diff::{ChangeKind, FilePatch, LineChange, parse_patches};
pub use error::{CommitError, ConfigError, DiffError, ParseError, ServiceError};
pub use git::CommitOutcome;
pub use service::{HttpInferenceService, InferenceRequest, InferenceService, PerFileMessage, Route};
pub use suggest::{Classification, SuggestionSet, assemble_message, suggest_messages};
