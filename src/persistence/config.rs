use crate::core::{MapId, Result, SaveError};
use crate::storage::SavePaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Operator-selected writer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveOption {
    /// Always write sequentially, even when background writing is permitted.
    #[default]
    Normal,
    /// Use background writers whenever the caller permits it.
    Threaded,
}

/// Configuration for a save strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Writer mode applied to every save
    pub save_option: SaveOption,

    /// Directory holding the Mobiles/Items/Guilds triads
    pub root: PathBuf,

    /// Items placed in this realm never decay
    pub internal_map: MapId,

    /// Bytes a background writer buffers before handing them to its flush task
    pub async_buffer_size: usize,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            save_option: SaveOption::Normal,
            root: PathBuf::from("Saves"),
            internal_map: MapId::INTERNAL,
            async_buffer_size: 1024 * 1024,
        }
    }
}

impl SaveConfig {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn save_option(mut self, option: SaveOption) -> Self {
        self.save_option = option;
        self
    }

    pub fn internal_map(mut self, map: MapId) -> Self {
        self.internal_map = map;
        self
    }

    pub fn async_buffer_size(mut self, size: usize) -> Self {
        self.async_buffer_size = size;
        self
    }

    pub fn paths(&self) -> SavePaths {
        SavePaths::new(&self.root)
    }

    /// Loads a JSON config. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SaveError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let config: SaveConfig = serde_json::from_str(&text).map_err(|e| {
            SaveError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.async_buffer_size == 0 {
            return Err(SaveError::Config(
                "async_buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_force_sequential_writes() {
        let config = SaveConfig::default();
        assert_eq!(config.save_option, SaveOption::Normal);
        assert_eq!(config.internal_map, MapId::INTERNAL);
        assert_eq!(config.root, PathBuf::from("Saves"));
    }

    #[test]
    fn test_from_json_file_fills_missing_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("save.json");
        std::fs::write(&path, r#"{ "save_option": "Threaded", "root": "/srv/world" }"#).unwrap();

        let config = SaveConfig::from_json_file(&path).unwrap();
        assert_eq!(config.save_option, SaveOption::Threaded);
        assert_eq!(config.root, PathBuf::from("/srv/world"));
        assert_eq!(config.async_buffer_size, 1024 * 1024);
    }

    #[test]
    fn test_zero_buffer_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("save.json");
        std::fs::write(&path, r#"{ "async_buffer_size": 0 }"#).unwrap();

        assert!(matches!(
            SaveConfig::from_json_file(&path),
            Err(SaveError::Config(_))
        ));
    }
}
