use crate::errors::{DatasetError, DatasetResult};
use serde_derive::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Describes how a dataset root is laid out on disk.
///
/// Fields missing from a config file fall back to the defaults, which match the
/// `00001/1.jpg` convention with three frames per clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of frame files inside every clip directory
    pub frames_per_clip: usize,
    /// Extension of the frame files, without the leading dot
    pub extension: String,
    /// Number of digits the clip directory ordinals are padded to
    pub dir_name_width: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            frames_per_clip: 3,
            extension: "jpg".to_string(),
            dir_name_width: 5,
        }
    }
}

impl IndexConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DatasetResult<IndexConfig> {
        let raw_file = fs::read_to_string(path)?;
        let config: IndexConfig = serde_json::from_str(&raw_file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DatasetResult<()> {
        if self.frames_per_clip == 0 {
            return Err(DatasetError::ConfigError(
                "frames_per_clip has to be at least 1".to_string(),
            ));
        }
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(DatasetError::ConfigError(format!(
                "frame extension {:?} has to be non-empty and given without a dot",
                self.extension
            )));
        }
        Ok(())
    }
}
