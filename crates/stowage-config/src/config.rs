use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{ConfigError, Result},
    utils::{parse_duration, resolve_path, xdg_config_home, xdg_data_home},
};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// The relational engine a store speaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialectKind {
    #[default]
    Sqlite,
}

impl FromStr for DialectKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnsupportedDialect(other.to_string())),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Where and how the backing store is opened.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the database file, or `:memory:`.
    /// Default: $XDG_DATA_HOME/stowage/store.db
    pub path: Option<String>,

    /// SQL dialect used for migrations and introspection.
    /// Default: sqlite
    pub dialect: Option<String>,
}

/// Result cache policy.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Concurrent misses on one signature share a single load.
    /// Default: true
    pub dedupe_in_flight: Option<bool>,

    /// Saving a resource evicts cached results holding that resource type.
    /// Default: false (cached reads may be stale after a save)
    pub invalidate_on_save: Option<bool>,
}

/// Application's configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Upper bound for a single fetch or save through the repository chain,
    /// e.g. "30s". Unset means no timeout.
    pub fetch_timeout: Option<String>,

    /// Log level used when no verbosity flag is given.
    /// Default: info
    pub log_level: Option<String>,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Location of the configuration file: `$STOWAGE_CONFIG`, or
/// `$XDG_CONFIG_HOME/stowage/config.toml`.
pub fn config_path() -> PathBuf {
    match std::env::var("STOWAGE_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("stowage").join("config.toml"),
    }
}

impl Config {
    pub fn default_config() -> Self {
        let store_path = xdg_data_home().join("stowage").join("store.db");

        Self {
            fetch_timeout: None,
            log_level: Some("info".to_string()),
            store: StoreConfig {
                path: Some(store_path.to_string_lossy().into_owned()),
                dialect: Some(DialectKind::Sqlite.to_string()),
            },
            cache: CacheConfig {
                dedupe_in_flight: Some(true),
                invalidate_on_save: Some(false),
            },
        }
    }

    /// Loads the configuration from `path`, or from [`config_path`] when
    /// `None`. A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

        let mut config = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve()?;
        Ok(config)
    }

    /// Fills unset values with defaults and validates the rest.
    pub fn resolve(&mut self) -> Result<()> {
        let defaults = Self::default_config();

        if self.store.path.is_none() {
            self.store.path = defaults.store.path;
        }
        self.store.dialect.get_or_insert_with(|| "sqlite".into());
        self.cache.dedupe_in_flight.get_or_insert(true);
        self.cache.invalidate_on_save.get_or_insert(false);
        self.log_level.get_or_insert_with(|| "info".into());

        self.dialect()?;
        self.fetch_timeout()?;

        let level = self.log_level();
        if !LOG_LEVELS.contains(&level) {
            return Err(ConfigError::InvalidLogLevel(level.to_string()));
        }

        Ok(())
    }

    pub fn dialect(&self) -> Result<DialectKind> {
        self.store
            .dialect
            .as_deref()
            .map_or(Ok(DialectKind::default()), DialectKind::from_str)
    }

    /// Store location, honouring the `STOWAGE_DB` override.
    pub fn get_store_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("STOWAGE_DB") {
            return resolve_path(&env_path);
        }
        match &self.store.path {
            Some(path) => resolve_path(path),
            None => Err(ConfigError::EmptyStorePath),
        }
    }

    pub fn fetch_timeout(&self) -> Result<Option<Duration>> {
        match self.fetch_timeout.as_deref() {
            None | Some("never") => Ok(None),
            Some(value) => {
                parse_duration(value).map(Some).ok_or_else(|| {
                    ConfigError::InvalidDuration {
                        key: "fetch_timeout",
                        value: value.to_string(),
                    }
                })
            }
        }
    }

    pub fn dedupe_in_flight(&self) -> bool {
        self.cache.dedupe_in_flight.unwrap_or(true)
    }

    pub fn invalidate_on_save(&self) -> bool {
        self.cache.invalidate_on_save.unwrap_or(false)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serialized)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::test_utils::{with_env, without_env};

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert!(config.store.path.as_deref().unwrap().ends_with("stowage/store.db"));
        assert_eq!(config.dialect().unwrap(), DialectKind::Sqlite);
        assert!(config.dedupe_in_flight());
        assert!(!config.invalidate_on_save());
        assert_eq!(config.fetch_timeout().unwrap(), None);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            fetch_timeout = "2s"
            log_level = "debug"

            [store]
            path = ":memory:"

            [cache]
            invalidate_on_save = true
            "#,
        )
        .unwrap();

        assert_eq!(config.store.path.as_deref(), Some(":memory:"));
        assert_eq!(config.dialect().unwrap(), DialectKind::Sqlite);
        assert!(config.dedupe_in_flight());
        assert!(config.invalidate_on_save());
        assert_eq!(
            config.fetch_timeout().unwrap(),
            Some(Duration::from_secs(2))
        );
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_resolve_rejects_unknown_dialect() {
        let err = Config::from_toml_str("[store]\ndialect = \"oracle\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDialect(d) if d == "oracle"));
    }

    #[test]
    fn test_resolve_rejects_bad_duration() {
        let err = Config::from_toml_str("fetch_timeout = \"soon\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDuration {
                key: "fetch_timeout",
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_rejects_bad_log_level() {
        let err = Config::from_toml_str("log_level = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }

    #[test]
    fn test_never_timeout() {
        let config = Config::from_toml_str("fetch_timeout = \"never\"\n").unwrap();
        assert_eq!(config.fetch_timeout().unwrap(), None);
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(config.dedupe_in_flight());
        assert_eq!(config.dialect().unwrap(), DialectKind::Sqlite);
    }

    #[test]
    #[serial]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default_config();
        config.fetch_timeout = Some("45s".into());
        config.cache.dedupe_in_flight = Some(false);
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(
            loaded.fetch_timeout().unwrap(),
            Some(Duration::from_secs(45))
        );
        assert!(!loaded.dedupe_in_flight());
    }

    #[test]
    #[serial]
    fn test_store_path_env_override() {
        with_env(vec![("STOWAGE_DB", "/tmp/stowage-override.db")], || {
            let config = Config::default_config();
            assert_eq!(
                config.get_store_path().unwrap(),
                PathBuf::from("/tmp/stowage-override.db")
            );
        });
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        with_env(vec![("STOWAGE_CONFIG", "/etc/stowage.toml")], || {
            assert_eq!(config_path(), PathBuf::from("/etc/stowage.toml"));
        });
        without_env(&["STOWAGE_CONFIG"], || {
            assert!(config_path().ends_with("stowage/config.toml"));
        });
    }
}
