//! Guard configuration file.
//!
//! Loaded from JSON. Every field has a default, so partial files are valid.
//! Older file versions are upgraded in place by [`GuardConfig::migrate`]:
//! - v1: no special-hostile flag (those attackers followed the NPC flag)
//!   and no owned-entity protection
//! - v2: no `protected_cannot_harm_others` (protected players could attack)

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use spawnguard_core::ProtectionConfig;
use thiserror::Error;
use tracing::{info, warn};

/// Version written by this build.
pub const CURRENT_CONFIG_VERSION: u32 = 3;

/// Version assumed for files that predate the `version` field.
const UNVERSIONED: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    #[serde(default = "unversioned")]
    pub version: u32,
    pub protection: ProtectionConfig,
    /// Clear protection windows and the previously-connected set on a wipe.
    pub reset_data_on_wipe: bool,
    /// Default tracing directive when `SPAWNGUARD_LOG` is unset.
    pub log_filter: String,
}

fn unversioned() -> u32 {
    UNVERSIONED
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            protection: ProtectionConfig::default(),
            reset_data_on_wipe: true,
            log_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse guard config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read guard config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write guard config to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "guard config version {found} is newer than supported version {max}",
        max = CURRENT_CONFIG_VERSION
    )]
    UnsupportedVersion { found: u32 },
}

impl GuardConfig {
    /// Parse, reject future versions and normalize. Does not migrate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: GuardConfig = serde_json::from_str(json)?;
        if config.version > CURRENT_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
            });
        }
        config.normalize();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, self.to_json_string()?).map_err(write_err)
    }

    /// Load `path`, migrating and writing back older versions.
    ///
    /// A missing file is created with defaults. Any other failure is logged
    /// and the defaults are used without touching the file.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            if let Err(err) = config.save(path) {
                warn!(target: "spawnguard::config", error = %err, "default config write failed");
            } else {
                info!(
                    target: "spawnguard::config",
                    path = %path.display(),
                    "config.created=default"
                );
            }
            return config;
        }

        match Self::from_file(path) {
            Ok(mut config) => {
                if config.migrate()
                    && let Err(err) = config.save(path)
                {
                    warn!(
                        target: "spawnguard::config",
                        error = %err,
                        "migrated config write failed"
                    );
                }
                info!(target: "spawnguard::config", path = %path.display(), "config.loaded=file");
                config
            }
            Err(err) => {
                warn!(
                    target: "spawnguard::config",
                    path = %path.display(),
                    error = %err,
                    "config.load_failed; using defaults"
                );
                Self::default()
            }
        }
    }

    /// Upgrade an older file version to [`CURRENT_CONFIG_VERSION`].
    ///
    /// Returns whether anything changed.
    pub fn migrate(&mut self) -> bool {
        if self.version >= CURRENT_CONFIG_VERSION {
            return false;
        }
        let from = self.version;

        if self.version < 2 {
            self.protection.protect_against_special_hostile = self.protection.protect_against_npc;
            self.protection.protect_owned_entities = false;
            self.version = 2;
        }
        if self.version < 3 {
            self.protection.protected_cannot_harm_others = false;
            self.version = 3;
        }

        info!(
            target: "spawnguard::config",
            from,
            to = CURRENT_CONFIG_VERSION,
            "config migrated"
        );
        true
    }

    fn normalize(&mut self) {
        if self.protection.duration_seconds < 0 {
            warn!(
                target: "spawnguard::config",
                duration_seconds = self.protection.duration_seconds,
                "negative protection duration clamped to 0"
            );
            self.protection.duration_seconds = 0;
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = GuardConfig::default().log_filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_v1_with_defaults() {
        let config = GuardConfig::from_json_str("{}").unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.protection, ProtectionConfig::default());
        assert!(config.reset_data_on_wipe);
    }

    #[test]
    fn test_default_roundtrips_through_json() {
        let config = GuardConfig::default();
        let json = config.to_json_string().unwrap();
        assert_eq!(GuardConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_v1_migration_follows_npc_flag() {
        let json = r#"{
            "version": 1,
            "protection": { "duration_seconds": 600, "protect_against_npc": false }
        }"#;
        let mut config = GuardConfig::from_json_str(json).unwrap();
        assert!(config.migrate());

        assert_eq!(config.version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.protection.duration_seconds, 600);
        assert!(!config.protection.protect_against_special_hostile);
        assert!(!config.protection.protect_owned_entities);
        assert!(!config.protection.protected_cannot_harm_others);
    }

    #[test]
    fn test_v2_migration_keeps_owned_entities() {
        let json = r#"{
            "version": 2,
            "protection": { "protect_owned_entities": true }
        }"#;
        let mut config = GuardConfig::from_json_str(json).unwrap();
        assert!(config.migrate());
        assert!(config.protection.protect_owned_entities);
        assert!(!config.protection.protected_cannot_harm_others);
    }

    #[test]
    fn test_current_version_not_migrated() {
        let mut config = GuardConfig::default();
        assert!(!config.migrate());
        assert_eq!(config, GuardConfig::default());
    }

    #[test]
    fn test_future_version_rejected() {
        let err = GuardConfig::from_json_str(r#"{ "version": 99 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 99 }));
    }

    #[test]
    fn test_negative_duration_clamped_on_load() {
        let json = r#"{ "version": 3, "protection": { "duration_seconds": -5 } }"#;
        let config = GuardConfig::from_json_str(json).unwrap();
        assert_eq!(config.protection.duration_seconds, 0);
    }

    #[test]
    fn test_load_or_default_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("spawnguard.json");

        let config = GuardConfig::load_or_default(&path);
        assert_eq!(config, GuardConfig::default());
        assert_eq!(GuardConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_writes_back_migration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spawnguard.json");
        fs::write(&path, r#"{ "protection": { "duration_seconds": 90 } }"#).unwrap();

        let config = GuardConfig::load_or_default(&path);
        assert_eq!(config.version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.protection.duration_seconds, 90);

        let on_disk = GuardConfig::from_file(&path).unwrap();
        assert_eq!(on_disk.version, CURRENT_CONFIG_VERSION);
    }

    #[test]
    fn test_load_or_default_keeps_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spawnguard.json");
        fs::write(&path, "{ not json").unwrap();

        let config = GuardConfig::load_or_default(&path);
        assert_eq!(config, GuardConfig::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
