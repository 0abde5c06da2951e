//! Wire types for the tokenizer and inference endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `POST /tokenizer`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenizeRequest<'a> {
    pub code: &'a str,
}

/// Response of `POST /tokenizer`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizeResponse {
    pub tokens: Vec<String>,
}

/// Body of `POST /diff` and `POST /added`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Position of the file in the diff; the service uses it only for correlation.
    pub idx: usize,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
}

/// Message suggested for one file.
///
/// Only `message` is required. Any other fields the service returns are kept
/// so verbose output can show the full response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerFileMessage {
    pub message: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PerFileMessage {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message: words.into_iter().map(Into::into).collect(),
            extra: serde_json::Map::new(),
        }
    }

    /// Message words joined with single spaces.
    pub fn text(&self) -> String {
        self.message.join(" ")
    }
}

/// Which inference endpoint a file patch is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/diff`: the file has both additions and deletions.
    Diff,
    /// `/added`: everything else.
    Added,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Diff => "diff",
            Route::Added => "added",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}
