//! Migration unit type

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a unit's script text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Script held in memory
    Inline(String),
    /// Script read from this file when the unit is applied
    File(PathBuf),
}

/// A single numbered migration script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    version: u64,
    name: String,
    source: ScriptSource,
}

impl MigrationUnit {
    /// Create a unit with an explicit ordinal.
    pub fn new(version: u64, name: impl Into<String>, source: ScriptSource) -> Self {
        Self {
            version,
            name: name.into(),
            source,
        }
    }

    /// Create an in-memory unit.
    pub fn inline(version: u64, name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::new(version, name, ScriptSource::Inline(sql.into()))
    }

    /// Ordinal version parsed from the name (0 = not a migration)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// File name (or label) the unit was discovered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing file, if the unit was discovered on disk
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            ScriptSource::File(path) => Some(path),
            ScriptSource::Inline(_) => None,
        }
    }

    /// Load the script text.
    pub fn script(&self) -> std::io::Result<Cow<'_, str>> {
        match &self.source {
            ScriptSource::Inline(sql) => Ok(Cow::Borrowed(sql)),
            ScriptSource::File(path) => std::fs::read_to_string(path).map(Cow::Owned),
        }
    }
}

impl fmt::Display for MigrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:03} {}", self.version, self.name)
    }
}
