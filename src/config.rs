// src/config.rs

//! Configuration file for the installer
//!
//! Read from `/etc/onbundle/config.toml` unless another path is given.
//! Every key is optional:
//!
//! ```toml
//! temp_dir = "/var/tmp"
//! cache_dir = "/var/cache/apt/archives"
//!
//! [apt]
//! apt_get = "apt-get"
//! simulate = true
//!
//! [install]
//! require_checksums = true
//! keep_extracted = false
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default path for the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/onbundle/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where bundles are extracted (default: the OS temp directory)
    pub temp_dir: Option<PathBuf>,
    /// Archive cache for staged packages (default: ask apt)
    pub cache_dir: Option<PathBuf>,
    pub apt: AptConfig,
    pub install: InstallConfig,
}

/// Commands and flags used by the apt backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AptConfig {
    pub apt_get: String,
    pub apt_cache: String,
    pub apt_config: String,
    /// Pass `-y` to apt-get
    pub assume_yes: bool,
    /// Pass `-s` to apt-get (no changes are made)
    pub simulate: bool,
}

impl Default for AptConfig {
    fn default() -> Self {
        Self {
            apt_get: "apt-get".to_string(),
            apt_cache: "apt-cache".to_string(),
            apt_config: "apt-config".to_string(),
            assume_yes: true,
            simulate: false,
        }
    }
}

/// Caller policy for the install command
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    /// Refuse to install when any checksum fails
    pub require_checksums: bool,
    /// Leave the extracted tree in place after installing
    pub keep_extracted: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            require_checksums: true,
            keep_extracted: false,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// if present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    debug!("No config at {}, using defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        debug!("Loaded config from {}", path.display());
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Root directory for extracted bundles
    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.apt.apt_get, "apt-get");
        assert!(config.apt.assume_yes);
        assert!(config.install.require_checksums);
        assert_eq!(config.temp_root(), std::env::temp_dir());
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::parse(
            r#"
temp_dir = "/var/tmp/bundles"
cache_dir = "/srv/cache"

[apt]
simulate = true

[install]
keep_extracted = true
"#,
        )
        .unwrap();

        assert_eq!(config.temp_root(), PathBuf::from("/var/tmp/bundles"));
        assert_eq!(config.cache_dir, Some(PathBuf::from("/srv/cache")));
        assert!(config.apt.simulate);
        assert_eq!(config.apt.apt_cache, "apt-cache");
        assert!(config.install.keep_extracted);
        assert!(config.install.require_checksums);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::parse("tmp_dir = \"/x\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[apt]\nassume_yes = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(!config.apt.assume_yes);

        let missing = temp.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&missing)).unwrap_err(),
            Error::Config(_)
        ));
    }
}
