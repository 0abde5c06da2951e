//! Error types for commit-autosuggest modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from interpreting unified diff text.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed hunk header on line {line}: {text}")]
    MalformedHunkHeader { line: usize, text: String },

    #[error("Unexpected line {line} inside hunk: {text}")]
    UnexpectedLine { line: usize, text: String },

    #[error(
        "Diff ended inside the hunk starting on line {line} ({old_remaining} old / {new_remaining} new lines missing)"
    )]
    TruncatedHunk {
        line: usize,
        old_remaining: u32,
        new_remaining: u32,
    },
}

/// Errors from obtaining and parsing the diff.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to read diff file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to collect staged diff: {0}")]
    Staged(#[source] git2::Error),

    #[error("Failed to parse diff: {0}")]
    Parse(#[from] ParseError),
}

/// Errors from the tokenizer and inference endpoints.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid service endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Inference service unavailable at {endpoint}: {source}")]
    Unavailable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Inference service at {endpoint} returned HTTP {status}")]
    BadStatus { endpoint: String, status: u16 },

    #[error("Inference service at {endpoint} returned a malformed response: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("Failed to serialize request: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors from reading or writing the profile file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the home directory for the profile file")]
    NoHomeDirectory,

    #[error("Failed to read profile file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse profile file {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    #[error("Failed to write profile file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Errors from creating the commit.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("git executable not found in PATH")]
    GitNotInstalled,

    #[error("Failed to spawn git commit: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git commit exited with {}: {stderr}",
             .code.map_or("unknown status".to_string(), |c| format!("code {c}")))]
    NonZeroExit { code: Option<i32>, stderr: String },
}
