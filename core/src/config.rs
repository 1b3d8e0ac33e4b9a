use crate::FatError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sector at which the FAT partition begins when no partition table is parsed.
pub const DEFAULT_PARTITION_START: u32 = 2048;
/// Sectors of the first FAT copy held in memory.
pub const DEFAULT_FAT_CACHE_SECTORS: usize = 8;
pub const DEFAULT_MAX_OPEN_FILES: usize = 10;

/// Options applied when mounting a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountOptions {
    pub partition_start: u32,
    pub fat_cache_sectors: usize,
    pub max_open_files: usize,
    /// Refuse to mount when the FAT does not fit in the cache. When false the
    /// truncation is logged and lookups past the cache fail individually.
    pub strict_fat_cache: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            partition_start: DEFAULT_PARTITION_START,
            fat_cache_sectors: DEFAULT_FAT_CACHE_SECTORS,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            strict_fat_cache: true,
        }
    }
}

impl MountOptions {
    pub fn from_json_str(json: &str) -> Result<Self, FatError> {
        let options: MountOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, FatError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), FatError> {
        if self.fat_cache_sectors == 0 {
            return Err(FatError::Configuration(
                "fat_cache_sectors must be at least 1".to_string(),
            ));
        }
        if self.max_open_files == 0 {
            return Err(FatError::Configuration(
                "max_open_files must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let options = MountOptions::default();
        assert_eq!(options.partition_start, 2048);
        assert_eq!(options.fat_cache_sectors, 8);
        assert_eq!(options.max_open_files, 10);
        assert!(options.strict_fat_cache);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = MountOptions::from_json_str(r#"{ "partition_start": 0 }"#).unwrap();
        assert_eq!(options.partition_start, 0);
        assert_eq!(options.fat_cache_sectors, DEFAULT_FAT_CACHE_SECTORS);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = MountOptions::from_json_str(r#"{ "max_open_files": 0 }"#);
        assert!(matches!(result, Err(FatError::Configuration(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = MountOptions::from_json_str("{ partition_start: ");
        assert!(matches!(result, Err(FatError::SerializationError(_))));
    }
}
