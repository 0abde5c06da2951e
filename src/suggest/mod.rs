//! Commit message suggestions from classified file patches.

pub mod assemble;
pub mod dispatch;

pub use assemble::assemble_message;
pub use dispatch::{
    Classification, FileSuggestion, SuggestionSet, TokenSet, classify, suggest_messages,
    tokenize_patch,
};
