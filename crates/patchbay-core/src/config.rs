//! Patchbay configuration loaded from environment or a TOML file.
//!
//! Tunables for the routing core: queue capacity, the four depth
//! ceilings, and the collision-tracking toggle. Change behavior without
//! code edits.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | PATCHBAY_MAX_SIZE | 64 | Pending-queue capacity. |
//! | PATCHBAY_STANDARD_DEPTH | 5 | Standard recursion ceiling. |
//! | PATCHBAY_EXTENDED_DEPTH | 8 | Law-loop recursion ceiling. |
//! | PATCHBAY_EMERGENCY_DEPTH | 12 | Emergency recursion ceiling. |
//! | PATCHBAY_ABSOLUTE_DEPTH | 16 | Hard ceiling on every chain. |
//! | PATCHBAY_COLLISION_TRACKING | true | Advisory destination-collision marking. |

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::depth::{
    DepthCeilings, DEFAULT_ABSOLUTE_CEILING, DEFAULT_EMERGENCY_CEILING,
    DEFAULT_EXTENDED_CEILING, DEFAULT_STANDARD_CEILING,
};
use crate::error::PatchbayError;
use crate::queue::DEFAULT_MAX_SIZE;

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_standard_depth() -> u32 {
    DEFAULT_STANDARD_CEILING
}

fn default_extended_depth() -> u32 {
    DEFAULT_EXTENDED_CEILING
}

fn default_emergency_depth() -> u32 {
    DEFAULT_EMERGENCY_CEILING
}

fn default_absolute_depth() -> u32 {
    DEFAULT_ABSOLUTE_CEILING
}

fn default_true() -> bool {
    true
}

/// Patchbay tunables. See the module table for the matching env vars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchbayConfig {
    /// Pending-queue capacity (minimum 1).
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Standard recursion ceiling.
    #[serde(default = "default_standard_depth")]
    pub standard_depth: u32,
    /// Law-loop recursion ceiling.
    #[serde(default = "default_extended_depth")]
    pub extended_depth: u32,
    /// Emergency recursion ceiling.
    #[serde(default = "default_emergency_depth")]
    pub emergency_depth: u32,
    /// Hard ceiling on every chain regardless of tags.
    #[serde(default = "default_absolute_depth")]
    pub absolute_depth: u32,
    /// Advisory destination-collision marking.
    #[serde(default = "default_true")]
    pub collision_tracking: bool,
}

impl Default for PatchbayConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            standard_depth: DEFAULT_STANDARD_CEILING,
            extended_depth: DEFAULT_EXTENDED_CEILING,
            emergency_depth: DEFAULT_EMERGENCY_CEILING,
            absolute_depth: DEFAULT_ABSOLUTE_CEILING,
            collision_tracking: true,
        }
    }
}

impl PatchbayConfig {
    /// Loads tunables from environment. Unset or invalid => defaults.
    pub fn from_env() -> Self {
        Self {
            max_size: env_usize("PATCHBAY_MAX_SIZE", DEFAULT_MAX_SIZE).max(1),
            standard_depth: env_u32("PATCHBAY_STANDARD_DEPTH", DEFAULT_STANDARD_CEILING),
            extended_depth: env_u32("PATCHBAY_EXTENDED_DEPTH", DEFAULT_EXTENDED_CEILING),
            emergency_depth: env_u32("PATCHBAY_EMERGENCY_DEPTH", DEFAULT_EMERGENCY_CEILING),
            absolute_depth: env_u32("PATCHBAY_ABSOLUTE_DEPTH", DEFAULT_ABSOLUTE_CEILING),
            collision_tracking: env_bool("PATCHBAY_COLLISION_TRACKING", true),
        }
    }

    /// Loads from a TOML file, or writes and returns defaults when the
    /// file does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self, PatchbayError> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| PatchbayError::Config(e.to_string()))?;
            toml::from_str(&content).map_err(|e| PatchbayError::Config(e.to_string()))
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            Ok(config)
        }
    }

    /// Writes the config as pretty TOML, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), PatchbayError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PatchbayError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PatchbayError::Config(e.to_string()))?;
        }
        fs::write(path, content).map_err(|e| PatchbayError::Config(e.to_string()))
    }

    /// The depth ceilings as consumed by [`DepthGuard`](crate::DepthGuard).
    pub fn ceilings(&self) -> DepthCeilings {
        DepthCeilings {
            standard: self.standard_depth,
            extended: self.extended_depth,
            emergency: self.emergency_depth,
            absolute: self.absolute_depth,
        }
        .normalized()
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => v.trim().eq_ignore_ascii_case("true") || (v.trim().is_empty() && default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PatchbayConfig::default();
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert_eq!(config.standard_depth, DEFAULT_STANDARD_CEILING);
        assert!(config.collision_tracking);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patchbay.toml");

        let mut config = PatchbayConfig::default();
        config.max_size = 17;
        config.collision_tracking = false;
        config.save_to_path(&path).unwrap();

        let loaded = PatchbayConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.max_size, 17);
        assert!(!loaded.collision_tracking);
        assert_eq!(loaded.standard_depth, DEFAULT_STANDARD_CEILING);
    }

    #[test]
    fn test_load_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("patchbay.toml");

        let config = PatchbayConfig::load_from_path(&path).unwrap();
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert!(path.exists());
    }

    #[test]
    fn test_ceilings_are_normalized() {
        let mut config = PatchbayConfig::default();
        config.absolute_depth = 1;
        let ceilings = config.ceilings();
        assert_eq!(ceilings.absolute, DEFAULT_EMERGENCY_CEILING);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "max_size = 9\n").unwrap();

        let loaded = PatchbayConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.max_size, 9);
        assert_eq!(loaded.extended_depth, DEFAULT_EXTENDED_CEILING);
        assert!(loaded.collision_tracking);
    }
}
