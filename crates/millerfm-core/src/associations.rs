//! File-type associations.
//!
//! The associations file is JSON with two tables keyed by extension:
//!
//! ```json
//! {
//!   "extensions": { "rs": "file.rust", "md": "file.markdown" },
//!   "type": { "md": "file.plaintext" }
//! }
//! ```
//!
//! `extensions` picks the icon association of an entry, `type` its content
//! type. Only `file.plaintext` files get a text preview. Extensions are
//! matched without the leading dot.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Type id of any extension missing from the `type` table.
pub const DEFAULT_TYPE: &str = "file.binary";

/// Type id of files that can be previewed as text.
pub const TEXT_TYPE: &str = "file.plaintext";

/// The lookup key for `name`: the text after its last `.`, or the whole
/// name when it has none (`Makefile` is looked up as `Makefile`).
pub fn extension_of(name: &str) -> &str {
    name.rfind('.').map_or(name, |i| &name[i + 1..])
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Associations {
    #[serde(default)]
    extensions: HashMap<String, String>,
    #[serde(default, rename = "type")]
    types: HashMap<String, String>,
}

impl Associations {
    /// Reads an associations file.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if it is not readable.
    /// - [`CoreError::ConfigParse`] if it is not valid associations JSON.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::from_io(e, &path.display().to_string()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    #[must_use]
    pub fn with_extension(mut self, ext: &str, id: &str) -> Self {
        self.extensions.insert(ext.to_string(), id.to_string());
        self
    }

    #[must_use]
    pub fn with_type(mut self, ext: &str, type_id: &str) -> Self {
        self.types.insert(ext.to_string(), type_id.to_string());
        self
    }

    /// The association id for `ext`, if one is registered.
    pub fn classify_extension(&self, ext: &str) -> Option<&str> {
        self.extensions.get(ext).map(String::as_str)
    }

    /// The content type of `ext`, falling back to [`DEFAULT_TYPE`].
    pub fn type_of(&self, ext: &str) -> &str {
        self.types.get(ext).map_or(DEFAULT_TYPE, String::as_str)
    }

    /// Whether files with `ext` may be previewed as text.
    pub fn is_text(&self, ext: &str) -> bool {
        self.type_of(ext) == TEXT_TYPE
    }
}
