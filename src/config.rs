//! Bridge configuration.
//!
//! Everything can come from the environment:
//!   BASS_LIB_DIR           directory holding the bass / bass_ac3 libraries
//!   BASS_BRIDGE_RETENTION  immediate | until-free

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::warn;

/// Environment variable naming the library directory.
pub const ENV_LIB_DIR: &str = "BASS_LIB_DIR";
/// Environment variable selecting the retention policy.
pub const ENV_RETENTION: &str = "BASS_BRIDGE_RETENTION";

/// Library directory computed by the build script.
const DEFAULT_LIB_DIR: &str = env!("BASS_BRIDGE_DEFAULT_LIB_DIR");

/// What happens to a callback that is replaced under the same (handle, slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    /// Drop the replaced callback straight away.
    #[default]
    Immediate,
    /// Keep the replaced callback alive until the handle itself is removed.
    UntilFree,
}

impl FromStr for Retention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Retention::Immediate),
            "until-free" | "until_free" => Ok(Retention::UntilFree),
            other => Err(format!("Unknown retention policy: {}", other)),
        }
    }
}

/// Configuration for loading the native libraries and running the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Directory to load libraries from. `None` = system search path.
    pub library_dir: Option<PathBuf>,
    /// Policy for replaced callbacks.
    pub retention: Retention,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library_dir: Some(PathBuf::from(DEFAULT_LIB_DIR)),
            retention: Retention::default(),
        }
    }
}

impl BridgeConfig {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_LIB_DIR) {
            // Empty value means "use the system search path"
            config.library_dir = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }

        if let Some(value) = lookup(ENV_RETENTION) {
            match value.parse() {
                Ok(retention) => config.retention = retention,
                Err(e) => warn!("{}: {}, keeping {:?}", ENV_RETENTION, e, config.retention),
            }
        }

        config
    }

    /// Set the library directory.
    pub fn with_library_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.library_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the retention policy.
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Resolve the platform file name for `name` (e.g. "bass" -> "libbass.so"),
    /// inside the library directory when one is configured.
    pub fn library_path(&self, name: impl AsRef<OsStr>) -> PathBuf {
        let file_name = libloading::library_filename(name);
        match &self.library_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = BridgeConfig::from_lookup(lookup(&[]));
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.retention, Retention::Immediate);
        assert!(config.library_dir.is_some());
    }

    #[test]
    fn test_lib_dir_from_env() {
        let config = BridgeConfig::from_lookup(lookup(&[(ENV_LIB_DIR, "/opt/bass")]));
        assert_eq!(config.library_dir, Some(PathBuf::from("/opt/bass")));
    }

    #[test]
    fn test_empty_lib_dir_means_search_path() {
        let config = BridgeConfig::from_lookup(lookup(&[(ENV_LIB_DIR, "")]));
        assert_eq!(config.library_dir, None);
        let path = config.library_path("bass");
        assert_eq!(path, PathBuf::from(libloading::library_filename("bass")));
    }

    #[test]
    fn test_retention_parsing() {
        assert_eq!("immediate".parse::<Retention>(), Ok(Retention::Immediate));
        assert_eq!("until-free".parse::<Retention>(), Ok(Retention::UntilFree));
        assert_eq!(" Until_Free ".parse::<Retention>(), Ok(Retention::UntilFree));
        assert!("forever".parse::<Retention>().is_err());
    }

    #[test]
    fn test_bad_retention_keeps_default() {
        let config = BridgeConfig::from_lookup(lookup(&[(ENV_RETENTION, "forever")]));
        assert_eq!(config.retention, Retention::Immediate);
    }

    #[test]
    fn test_library_path_in_dir() {
        let config = BridgeConfig::default().with_library_dir("/sdk/x64");
        let path = config.library_path("bass_ac3");
        assert!(path.starts_with("/sdk/x64"));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("bass_ac3"));
    }
}
