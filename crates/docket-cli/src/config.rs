//! Configuration file for the `docket` tool.
//!
//! The file is TOML:
//!
//! ```toml
//! [search]
//! backend = "tantivy"
//! [search.arguments]
//! index_path = "/var/lib/docket/index"
//!
//! [[models]]
//! type_tag = "document"
//! label = "Document"
//! fields = [{ name = "label", boost = 2.0 }, { name = "content" }]
//! ```

use std::path::{Path, PathBuf};

use docket_core::{Error, Result, SearchModel, SearchModelRegistry};
use docket_search::SearchSettings;
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "DOCKET_CONFIG";

/// Config file name under the platform config directory.
const CONFIG_FILE: &str = "docket.toml";

/// Contents of `docket.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocketConfig {
    /// Search backend selection and arguments.
    #[serde(default)]
    pub search: SearchSettings,

    /// Search models, one per indexable type.
    #[serde(default)]
    pub models: Vec<SearchModel>,
}

impl DocketConfig {
    /// Platform default location (`<config dir>/docket/docket.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docket").join(CONFIG_FILE))
    }

    /// The explicit path if given, else the platform default.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path()
                .ok_or_else(|| Error::config("Could not determine config directory")),
        }
    }

    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Build the model registry, rejecting invalid or duplicate models.
    pub fn model_registry(&self) -> Result<SearchModelRegistry> {
        SearchModelRegistry::from_models(self.models.iter().cloned())
    }
}

// ============================================================================
// Tests
// ============================================================================
