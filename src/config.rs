//! Profile file holding inference endpoints.
//!
//! The file lives at `~/.commit-autosuggestions.toml` with one table per
//! profile:
//!
//! ```toml
//! [default]
//! endpoint = "http://127.0.0.1:5000/"
//!
//! [gpu-box]
//! endpoint = "http://10.0.0.7:5000/"
//! ```
//!
//! Edits go through `toml_edit`, so comments, other profiles and unrelated
//! keys are written back unchanged.

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use reqwest::Url;
use toml_edit::DocumentMut;
use tracing::debug;

use crate::error::ConfigError;
use crate::service::DEFAULT_ENDPOINT;

/// File name of the profile store inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".commit-autosuggestions.toml";

/// Profile used when none is given.
pub const DEFAULT_PROFILE: &str = "default";

/// Environment variable that overrides any configured endpoint.
pub const ENDPOINT_ENV_VAR: &str = "COMMIT_AUTOSUGGEST_ENDPOINT";

const ENDPOINT_KEY: &str = "endpoint";

/// Location of the per-user profile file.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Loaded profile file; call [`ProfileStore::save`] to persist edits.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
    doc: DocumentMut,
}

impl ProfileStore {
    /// Load the store at `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(ConfigError::ReadFailed { path, source }),
        };

        let doc = content
            .parse::<DocumentMut>()
            .map_err(|e| ConfigError::ParseFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Endpoint configured for `profile`, if any.
    pub fn endpoint(&self, profile: &str) -> Option<&str> {
        self.doc
            .get(profile)
            .and_then(|p| p.get(ENDPOINT_KEY))
            .and_then(|v| v.as_str())
    }

    /// Set the endpoint of `profile`, creating the profile if needed.
    ///
    /// Other keys of the profile are left as they are.
    pub fn set_endpoint(&mut self, profile: &str, endpoint: &str) -> Result<(), ConfigError> {
        validate_endpoint(endpoint)?;

        let section = self
            .doc
            .entry(profile)
            .or_insert_with(toml_edit::table)
            .as_table_like_mut()
            .ok_or_else(|| ConfigError::ParseFailed {
                path: self.path.clone(),
                reason: format!("'{}' is not a profile table", profile),
            })?;

        section.insert(ENDPOINT_KEY, toml_edit::value(endpoint));
        Ok(())
    }

    /// All keys of `profile` with their values, in file order.
    pub fn profile_entries(&self, profile: &str) -> Vec<(String, String)> {
        let Some(section) = self.doc.get(profile).and_then(|p| p.as_table_like()) else {
            return Vec::new();
        };

        section
            .iter()
            .map(|(key, item)| {
                let value = item
                    .as_str()
                    .map(String::from)
                    .or_else(|| item.as_value().map(|v| v.to_string().trim().to_string()))
                    .unwrap_or_default();
                (key.to_string(), value)
            })
            .collect()
    }

    /// Write the store back to its path atomically.
    pub fn save(&self) -> Result<(), ConfigError> {
        let write_failed = |source| ConfigError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
        tmp.write_all(self.doc.to_string().as_bytes())
            .map_err(write_failed)?;
        tmp.persist(&self.path).map_err(|e| write_failed(e.error))?;

        debug!("Saved profiles to {}", self.path.display());
        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(())
}

/// Endpoint to use for `profile`.
///
/// Order: the `COMMIT_AUTOSUGGEST_ENDPOINT` environment variable, the
/// profile's `endpoint` key, then the built-in default.
pub fn resolve_endpoint(store: Option<&ProfileStore>, profile: &str) -> String {
    if let Ok(endpoint) = env::var(ENDPOINT_ENV_VAR)
        && !endpoint.is_empty()
    {
        return endpoint;
    }

    store
        .and_then(|s| s.endpoint(profile))
        .unwrap_or(DEFAULT_ENDPOINT)
        .to_string()
}
