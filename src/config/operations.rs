//! Config loading, validation, and serialization.

use super::model::Config;
use crate::error::{LockdownError, Result};
use crate::fs::{create_parent_dir, load_file_as_string, save_file};
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LockdownError::Io)` - The file could not be read
    /// * `Err(LockdownError::UserError)` - Parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = load_file_as_string(path)?;
        Self::from_yaml(&content)
    }

    /// Write config as YAML, creating missing parent directories.
    ///
    /// The file is replaced atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        create_parent_dir(path)?;
        save_file(path, &self.to_yaml()?)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            LockdownError::UserError(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LockdownError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values.
    ///
    /// - `shared_lock_probe_limit` must be positive
    pub fn validate(&self) -> Result<()> {
        if self.shared_lock_probe_limit == 0 {
            return Err(LockdownError::UserError(
                "config validation failed: shared_lock_probe_limit must be greater than 0"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
