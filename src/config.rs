//! Generator settings loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! banner = "/* generated */"
//! common_includes = ["pyOCCT_Common.hxx"]
//! always_cast = true
//! source_extension = "cxx"
//!
//! [capacity]
//! entities = 400
//! ```

use std::path::Path;

use binder_compiler::EmitOptions;
use binder_core::Capacity;
use serde::{Deserialize, Serialize};

use crate::error::{BinderError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Notice placed at the top of every unit.
    pub banner: String,
    /// Headers every unit includes ahead of the module's own.
    pub common_includes: Vec<String>,
    /// Capacity for modules that do not declare their own.
    pub capacity: Option<Capacity>,
    /// Emit disambiguating casts for single overloads too.
    pub always_cast: bool,
    pub source_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        let options = EmitOptions::default();
        Self {
            banner: options.banner,
            common_includes: options.common_includes,
            capacity: None,
            always_cast: options.always_cast,
            source_extension: options.source_extension,
        }
    }
}

impl Settings {
    /// Read settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| BinderError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Parse settings text; `path` is only used for diagnostics.
    pub fn parse(text: &str, path: impl AsRef<Path>) -> Result<Self> {
        toml::from_str(text).map_err(|source| BinderError::Settings {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            banner: self.banner.clone(),
            common_includes: self.common_includes.clone(),
            always_cast: self.always_cast,
            source_extension: self.source_extension.clone(),
        }
    }
}
