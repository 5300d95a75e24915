//! Engine configuration and per-table queryer files.
//!
//! The engine settings are small and serializable; table files follow the
//! JSON layout the map front-end tooling already writes:
//!
//! ```json
//! {
//!   "tableName": "POINTS",
//!   "impl": "random_features",
//!   "columns": [
//!     {"name": "SHAPE", "type": 10000, "length": 0, "precision": 0},
//!     {"name": "NAME", "type": 12, "length": 50, "precision": 0}
//!   ],
//!   "initParam": {"count": 500}
//! }
//! ```
use crate::error::{GeoRewriteError, Result};
use crate::queryer::{ColumnDefinition, TableSchema};
#[cfg(feature = "toml")]
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration
///
/// # Example
///
/// ```rust
/// use georewrite::Config;
///
/// let config = Config::from_json(r#"{"db_name": "tiles", "tables_dir": "/etc/georewrite/tables"}"#).unwrap();
/// assert_eq!(config.db_name, "tiles");
/// assert_eq!(config.namespace_uri, "http://acme.com");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the in-memory database the front-end connects to
    #[serde(default = "Config::default_db_name")]
    pub db_name: String,

    /// Namespace the declared feature types live in
    #[serde(default = "Config::default_namespace_uri")]
    pub namespace_uri: String,

    /// Directory scanned for `*.json` table files
    #[serde(default = "Config::default_tables_dir")]
    pub tables_dir: PathBuf,
}

impl Config {
    fn default_db_name() -> String {
        "georewrite".to_string()
    }

    fn default_namespace_uri() -> String {
        "http://acme.com".to_string()
    }

    fn default_tables_dir() -> PathBuf {
        PathBuf::from("conf/tables")
    }

    pub fn with_tables_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.tables_dir = dir.into();
        self
    }

    pub fn with_db_name<S: Into<String>>(mut self, name: S) -> Self {
        self.db_name = name.into();
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.db_name.trim().is_empty() {
            return Err("Database name cannot be empty".to_string());
        }
        if self.namespace_uri.trim().is_empty() {
            return Err("Namespace URI cannot be empty".to_string());
        }
        if self.tables_dir.as_os_str().is_empty() {
            return Err("Tables directory cannot be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde::de::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reads a configuration file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::from_json(&text)?),
            #[cfg(feature = "toml")]
            Some("toml") => {
                Self::from_toml(&text).map_err(|e| GeoRewriteError::Config(e.to_string()))
            }
            _ => Err(GeoRewriteError::Config(format!(
                "unsupported configuration format: {}",
                path.display()
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_name: Self::default_db_name(),
            namespace_uri: Self::default_namespace_uri(),
            tables_dir: Self::default_tables_dir(),
        }
    }
}

/// One table file: the table, its columns, and the queryer serving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    /// Name of the queryer implementation, resolved by a `QueryerFactory`.
    #[serde(rename = "impl")]
    pub implementation: String,
    /// Free-form parameters for the queryer constructor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_param: Option<serde_json::Value>,
}

impl TableConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TableConfig = serde_json::from_str(json)?;
        if config.table_name.trim().is_empty() {
            return Err(GeoRewriteError::Config("tableName cannot be empty".into()));
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn schema(&self) -> TableSchema {
        TableSchema::new(self.columns.clone())
    }

    /// Integer `initParam` entry, if present.
    pub fn init_param_u64(&self, key: &str) -> Option<u64> {
        self.init_param.as_ref()?.get(key)?.as_u64()
    }
}

/// `*.json` files directly inside `dir`, sorted by file name.
pub fn table_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
