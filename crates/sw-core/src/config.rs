//! Configuration types and parsing for stepwise.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names searched for in a project directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["stepwise.yml", "stepwise.yaml"];

/// Main configuration from stepwise.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Database driver settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Folders the application reads from
    #[serde(default)]
    pub folders: FoldersConfig,

    /// Migration runner settings
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Directory relative paths are resolved against (the config file's parent)
    #[serde(skip)]
    pub root: PathBuf,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen port (1-65535)
    #[serde(default)]
    pub port: u32,

    /// Public base URL
    #[serde(default)]
    pub url: String,
}

/// Database driver settings. Exactly one driver section is expected.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// File-backed DuckDB database
    #[serde(default)]
    pub duckdb: Option<DuckDbConfig>,
}

/// DuckDB driver settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DuckDbConfig {
    /// Database file path, or `":memory:"` (quoted, a leading `:` is not a
    /// plain YAML scalar)
    #[serde(default)]
    pub path: String,
}

/// Folder settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FoldersConfig {
    /// Data folder; migrations live in a subdirectory of it
    #[serde(default)]
    pub data: String,
}

/// Migration runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Migration directory, relative to the data folder
    #[serde(default = "default_migration_dir")]
    pub dir: String,

    /// Single-row table holding the applied schema version
    #[serde(default = "default_version_table")]
    pub version_table: String,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migration_dir(),
            version_table: default_version_table(),
        }
    }
}

fn default_migration_dir() -> String {
    "migration".to_string()
}

fn default_version_table() -> String {
    "version".to_string()
}

impl Config {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_yaml(&content, root)
    }

    /// Load configuration from a project directory
    /// Looks for stepwise.yml or stepwise.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Parse and validate configuration text, resolving paths against `root`.
    pub fn from_yaml(content: &str, root: PathBuf) -> CoreResult<Self> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.root = root;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if !(1..=65535).contains(&self.server.port) {
            return Err(invalid("server.port needs to be between 1 and 65535"));
        }

        if self.server.url.trim().is_empty() {
            return Err(invalid("server.url is required"));
        }

        let Some(duckdb) = &self.database.duckdb else {
            return Err(invalid("No database driver is provided"));
        };
        if duckdb.path.trim().is_empty() {
            return Err(invalid("Path not specified for database file"));
        }

        if !is_identifier(&self.migrations.version_table) {
            return Err(invalid(format!(
                "migrations.version_table '{}' must contain only letters, digits and underscores",
                self.migrations.version_table
            )));
        }

        check_folder("Data", &self.folders.data, &self.root)
    }

    /// Absolute (or root-relative) path of the data folder
    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.folders.data)
    }

    /// Directory holding the numbered migration scripts
    pub fn migration_dir(&self) -> PathBuf {
        self.data_dir().join(&self.migrations.dir)
    }

    /// Database location as passed to the driver; `:memory:` is kept verbatim
    pub fn database_path(&self) -> Option<String> {
        let path = &self.database.duckdb.as_ref()?.path;
        if path == ":memory:" {
            return Some(path.clone());
        }
        Some(self.resolve(path).display().to_string())
    }

    /// Ledger table name
    pub fn version_table(&self) -> &str {
        &self.migrations.version_table
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check that a configured folder is set, exists, and is a directory.
fn check_folder(name: &str, path: &str, root: &Path) -> CoreResult<()> {
    if path.trim().is_empty() {
        return Err(invalid(format!("Folder '{name}' not specified")));
    }

    let full = if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        root.join(path)
    };

    let meta = match std::fs::metadata(&full) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let abs = std::path::absolute(&full).unwrap_or(full);
            return Err(CoreError::FolderNotFound {
                name: name.to_string(),
                path: abs.display().to_string(),
            });
        }
        Err(e) => {
            return Err(CoreError::IoWithPath {
                path: full.display().to_string(),
                source: e,
            })
        }
    };

    if !meta.is_dir() {
        return Err(CoreError::NotADirectory {
            name: name.to_string(),
            path: full.display().to_string(),
        });
    }

    log::debug!("Folder '{name}' resolved to {}", full.display());
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
