//! Runtime prerequisite declarations.
//!
//! Backends declare what they need from the host (binaries, libraries,
//! bundled assets) so operational tooling can report on it. The
//! declarations are informational: nothing in the search path consults them.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What kind of prerequisite a [`Dependency`] describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyKind {
    /// External executable expected at a path.
    Binary {
        /// Expected location of the executable.
        path: PathBuf,
    },
    /// Linked library with a version requirement.
    Library {
        /// Version requirement (e.g. `"=0.25"`).
        version: String,
    },
    /// Bundled static asset with a version requirement.
    Asset {
        /// Version requirement.
        version: String,
    },
}

/// A declared runtime prerequisite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Short name (e.g. `"tantivy"`).
    pub name: String,
    /// Component declaring the dependency.
    pub module: String,
    /// Prerequisite kind.
    #[serde(flatten)]
    pub kind: DependencyKind,
    /// Why the component needs it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

/// Result of checking a declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    /// Found on the host.
    Available,
    /// Expected on the host but not found.
    Missing,
    /// Compiled in or bundled; nothing to check at runtime.
    Declared,
}

impl fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Missing => write!(f, "missing"),
            Self::Declared => write!(f, "declared"),
        }
    }
}

impl Dependency {
    /// Declare an external binary.
    pub fn binary(
        module: impl Into<String>,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            kind: DependencyKind::Binary {
                path: path.as_ref().to_path_buf(),
            },
            help_text: None,
        }
    }

    /// Declare a library.
    pub fn library(
        module: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            kind: DependencyKind::Library {
                version: version.into(),
            },
            help_text: None,
        }
    }

    /// Declare a bundled asset.
    pub fn asset(
        module: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            kind: DependencyKind::Asset {
                version: version.into(),
            },
            help_text: None,
        }
    }

    /// Attach a help text.
    pub fn with_help(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    /// Check the dependency against the host.
    pub fn check(&self) -> DependencyStatus {
        match &self.kind {
            DependencyKind::Binary { path } if path.is_file() => DependencyStatus::Available,
            DependencyKind::Binary { .. } => DependencyStatus::Missing,
            DependencyKind::Library { .. } | DependencyKind::Asset { .. } => {
                DependencyStatus::Declared
            }
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DependencyKind::Binary { path } => {
                write!(f, "{} (binary at {})", self.name, path.display())
            }
            DependencyKind::Library { version } => write!(f, "{} (library {version})", self.name),
            DependencyKind::Asset { version } => write!(f, "{} (asset {version})", self.name),
        }
    }
}
