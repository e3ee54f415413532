#![forbid(unsafe_code)]

//! Tree view configuration as data.
//!
//! Captures the tunables of a [`TreeView`](crate::TreeView) in one
//! [`TreeViewConfig`] that can be loaded from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # pagetree.toml
//! initial_expand_depth = 1
//! duplicate_rule = "like-move"
//!
//! [endpoints]
//! move_url = "/admin/pages/page/move/"
//! ```
//!
//! ```rust,ignore
//! let config = TreeViewConfig::from_toml_file("pagetree.toml")?;
//! let config = TreeViewConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! Every field is optional. The defaults render only top-level rows, treat
//! duplicates like copies, and post to the stock admin endpoints.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dispatcher::EndpointConfig;
use crate::validator::DuplicateRule;

/// Deepest initial expansion accepted by [`TreeViewConfig::validate`].
pub const MAX_INITIAL_EXPAND_DEPTH: u32 = 64;

/// Top-level configuration for a tree view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeViewConfig {
    /// Nodes shallower than this start expanded. 0 shows only top-level rows.
    pub initial_expand_depth: u32,

    /// Target rule for duplicate actions.
    pub duplicate_rule: DuplicateRule,

    /// Submission endpoints per action kind.
    pub endpoints: EndpointConfig,
}

impl TreeViewConfig {
    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)
            .map_err(ConfigError::Toml)?
            .validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)
            .map_err(ConfigError::Json)?
            .validated()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.initial_expand_depth > MAX_INITIAL_EXPAND_DEPTH {
            errors.push(format!(
                "initial_expand_depth must be <= {MAX_INITIAL_EXPAND_DEPTH}, got {}",
                self.initial_expand_depth
            ));
        }

        let urls = [
            ("endpoints.move_url", &self.endpoints.move_url),
            ("endpoints.copy_url", &self.endpoints.copy_url),
            ("endpoints.duplicate_url", &self.endpoints.duplicate_url),
            ("endpoints.new_child_url", &self.endpoints.new_child_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                errors.push(format!("{name} must not be empty"));
            }
        }
        if self.endpoints.new_child_url.contains('?') {
            errors.push(
                "endpoints.new_child_url must not carry a query string (parent is appended)"
                    .to_owned(),
            );
        }

        errors
    }

    /// Return `self` if [`validate`](Self::validate) finds nothing.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] with every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a tree view configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
