//! Store layout and output configuration.
//!
//! The defaults match WCSim's tree and branch names, so a configuration file
//! is only needed for renamed branches or to tune output chunking and
//! compression. Every field is optional in JSON:
//!
//! ```json
//! {
//!     "input": { "outer_branch": "wcsimrootevent_OD" },
//!     "output": { "chunk_rows": 1024, "compression": 4 }
//! }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Names of the tables and branches in an input event store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLayout {
    /// Event table.
    pub event_tree: String,
    /// Inner-detector branch of the event table.
    pub inner_branch: String,
    /// Outer-detector branch of the event table.
    pub outer_branch: String,
    /// Geometry table.
    pub geometry_tree: String,
    /// Geometry branch.
    pub geometry_branch: String,
}

impl Default for InputLayout {
    fn default() -> Self {
        Self {
            event_tree: "wcsimT".to_string(),
            inner_branch: "wcsimrootevent".to_string(),
            outer_branch: "wcsimrootevent2".to_string(),
            geometry_tree: "wcsimGeoT".to_string(),
            geometry_branch: "wcsimrootgeom".to_string(),
        }
    }
}

impl InputLayout {
    fn validate(&self) -> Result<()> {
        let names = [
            ("event_tree", &self.event_tree),
            ("inner_branch", &self.inner_branch),
            ("outer_branch", &self.outer_branch),
            ("geometry_tree", &self.geometry_tree),
            ("geometry_branch", &self.geometry_branch),
        ];
        for (field, value) in names {
            if value.is_empty() {
                return Err(config_error(format!("input.{field} must not be empty")));
            }
        }
        if self.inner_branch == self.outer_branch {
            return Err(config_error(format!(
                "inner and outer branch must differ (both '{}')",
                self.inner_branch
            )));
        }
        Ok(())
    }
}

/// Dataset creation options for output stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Chunk length of every extendable dataset.
    pub chunk_rows: usize,
    /// Deflate level (0-9), or `None` for uncompressed datasets.
    pub compression: Option<u8>,
    /// Enable the shuffle filter.
    pub shuffle: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            chunk_rows: 4096,
            compression: None,
            shuffle: false,
        }
    }
}

impl OutputOptions {
    fn validate(&self) -> Result<()> {
        if self.chunk_rows == 0 {
            return Err(config_error("output.chunk_rows must be positive".to_string()));
        }
        if let Some(level) = self.compression {
            if level > 9 {
                return Err(config_error(format!(
                    "output.compression must be 0-9, got {level}"
                )));
            }
        }
        Ok(())
    }
}

/// Complete store configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub input: InputLayout,
    pub output: OutputOptions,
}

impl StoreConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: StoreConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string is not valid JSON or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks names and output options.
    ///
    /// # Errors
    /// Returns [`Error::CoreError`] wrapping a configuration error.
    pub fn validate(&self) -> Result<()> {
        self.input.validate()?;
        self.output.validate()
    }
}

fn config_error(message: String) -> Error {
    Error::CoreError(wcdigi_core::Error::ConfigError(message))
}
