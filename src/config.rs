//! Configuration (expansion): a TOML-loadable [`DatabaseConfig`], built the
//! same two-step way the teacher turns a config file into a usable struct
//! (`PreDogConfig` → `DogConfig` in the teacher's own `config.rs`) — field
//! validation and path resolution happen once, at load time, not scattered
//! through the rest of the crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::DEFAULT_CAPACITY as DEFAULT_CACHE_CAPACITY;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("pool_size and connection_timeout must be non-negative, got {0}")]
    Negative(i64),
}

/// The capacity an unset `pool_size` resolves to — "the engine picks a
/// small value" (§3/§6).
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Everything the core needs to open and manage connections to one
/// database file.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. Created if absent (§6).
    pub db_file: PathBuf,
    /// Maximum connections the pool will open. `0` is a valid, explicit
    /// choice and means the pool never actually has a connection to hand
    /// out (§4.6 edge case). `None` means unset — the engine picks
    /// [`DEFAULT_POOL_SIZE`] when the pool is actually built (§3/§6).
    pub pool_size: Option<usize>,
    /// Deadline for a pool acquire; `None` means wait indefinitely.
    pub connection_timeout: Option<Duration>,
    /// Passed to the engine's busy handler on every opened connection
    /// (expansion, §6).
    pub busy_timeout_ms: u32,
    /// Applied via `PRAGMA journal_mode` on every opened connection
    /// (expansion, §6).
    pub journal_mode: String,
    /// Per-connection statement cache capacity (§4.2).
    pub statement_cache_capacity: usize,
    /// Logging setup (expansion).
    pub log: LogConfig,
}

/// Ambient logging configuration, read the same way the teacher's app-level
/// config carries non-database settings alongside the database ones.
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Whether to install a stdout `tracing` subscriber layer.
    pub stdout: bool,
    /// Optional path to a rolling log file.
    pub file: Option<PathBuf>,
    /// An `EnvFilter`-compatible directive string, e.g. `"asqlite_core=debug"`.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            stdout: true,
            file: None,
            filter: "info".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            db_file: PathBuf::from("asqlite.db"),
            pool_size: None,
            connection_timeout: None,
            busy_timeout_ms: 5000,
            journal_mode: "wal".to_string(),
            statement_cache_capacity: DEFAULT_CACHE_CAPACITY,
            log: LogConfig::default(),
        }
    }
}

/// The intermediate struct used for deserializing a config file before its
/// fields are validated into a usable [`DatabaseConfig`].
#[derive(Debug, Deserialize)]
struct PreDatabaseConfig {
    db_file: String,
    #[serde(default)]
    pool_size: Option<i64>,
    #[serde(default)]
    connection_timeout_secs: Option<i64>,
    #[serde(default)]
    busy_timeout_ms: Option<u32>,
    #[serde(default)]
    journal_mode: Option<String>,
    #[serde(default)]
    statement_cache_capacity: Option<usize>,
    #[serde(default)]
    log: Option<PreLogConfig>,
}

#[derive(Debug, Deserialize)]
struct PreLogConfig {
    #[serde(default = "default_true")]
    stdout: bool,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    filter: Option<String>,
}

fn default_true() -> bool {
    true
}

impl PreDatabaseConfig {
    fn finalize(self, base_dir: &Path) -> anyhow::Result<DatabaseConfig> {
        let defaults = DatabaseConfig::default();

        let pool_size = match self.pool_size {
            Some(n) if n < 0 => return Err(ConfigError::Negative(n).into()),
            Some(n) => Some(n as usize),
            None => defaults.pool_size,
        };
        let connection_timeout = match self.connection_timeout_secs {
            Some(n) if n < 0 => return Err(ConfigError::Negative(n).into()),
            Some(n) => Some(Duration::from_secs(n as u64)),
            None => defaults.connection_timeout,
        };

        let log = match self.log {
            Some(pre) => LogConfig {
                stdout: pre.stdout,
                file: pre.file.map(|f| base_dir.join(f)),
                filter: pre.filter.unwrap_or(defaults.log.filter),
            },
            None => defaults.log,
        };

        Ok(DatabaseConfig {
            db_file: base_dir.join(self.db_file),
            pool_size,
            connection_timeout,
            busy_timeout_ms: self.busy_timeout_ms.unwrap_or(defaults.busy_timeout_ms),
            journal_mode: self.journal_mode.unwrap_or(defaults.journal_mode),
            statement_cache_capacity: self
                .statement_cache_capacity
                .unwrap_or(defaults.statement_cache_capacity),
            log,
        })
    }
}

impl DatabaseConfig {
    /// Load configuration from a TOML file. `path` can be absolute or
    /// relative to the current working directory; relative paths inside the
    /// file (currently just `log.file`) resolve against the config file's
    /// own directory.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let abs_path = cwd.join(path.as_ref());
        let base_dir = abs_path.parent().map(Path::to_path_buf).unwrap_or(cwd);
        let text = std::fs::read_to_string(&abs_path)?;
        let pre: PreDatabaseConfig = toml::from_str(&text)?;
        pre.finalize(&base_dir)
    }

    /// Build a config pointing at a plain file path, everything else
    /// defaulted. The common case for embedding this crate directly rather
    /// than driving it from a config file.
    pub fn for_path(db_file: impl Into<PathBuf>) -> Self {
        DatabaseConfig {
            db_file: db_file.into(),
            ..DatabaseConfig::default()
        }
    }

    /// Validate and install a new `pool_size`, or clear it back to unset
    /// with `None` — mirroring `set_connection_timeout`'s shape. The setter
    /// takes `i64` to mirror a dynamically-typed caller rejecting negatives
    /// with a typed error (§6); Rust's own type system already rules out
    /// "not an integer".
    pub fn set_pool_size(&mut self, value: Option<i64>) -> Result<(), ConfigError> {
        match value {
            Some(n) if n < 0 => Err(ConfigError::Negative(n)),
            Some(n) => {
                self.pool_size = Some(n as usize);
                Ok(())
            }
            None => {
                self.pool_size = None;
                Ok(())
            }
        }
    }

    /// The capacity the pool actually builds with: the configured value, or
    /// [`DEFAULT_POOL_SIZE`] when `pool_size` is unset.
    pub fn resolved_pool_size(&self) -> usize {
        self.pool_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    pub fn set_connection_timeout(&mut self, seconds: Option<i64>) -> Result<(), ConfigError> {
        match seconds {
            Some(s) if s < 0 => Err(ConfigError::Negative(s)),
            Some(s) => {
                self.connection_timeout = Some(Duration::from_secs(s as u64));
                Ok(())
            }
            None => {
                self.connection_timeout = None;
                Ok(())
            }
        }
    }

    #[cfg(test)]
    pub fn temp_test(db_file: impl Into<PathBuf>) -> Self {
        DatabaseConfig::for_path(db_file)
    }
}

/// Install a `tracing` subscriber from a [`LogConfig`]. Mirrors the
/// teacher's `main.rs` startup sequence, but factored out so library callers
/// (not just a binary) can opt into it.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match (&config.file, config.stdout) {
        (Some(path), true) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(fmt::layer())
                .with(fmt::layer().with_writer(file).with_ansi(false))
                .init();
        }
        (Some(path), false) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(fmt::layer().with_writer(file).with_ansi(false))
                .init();
        }
        (None, true) => {
            registry.with(fmt::layer()).init();
        }
        (None, false) => {
            // Nothing to install; all `tracing` calls remain no-ops.
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_pool_size() {
        let mut cfg = DatabaseConfig::default();
        assert!(cfg.set_pool_size(Some(-1)).is_err());
    }

    #[test]
    fn accepts_zero_pool_size() {
        let mut cfg = DatabaseConfig::default();
        assert!(cfg.set_pool_size(Some(0)).is_ok());
        assert_eq!(cfg.pool_size, Some(0));
    }

    #[test]
    fn unset_pool_size_resolves_to_the_default() {
        let cfg = DatabaseConfig::default();
        assert_eq!(cfg.pool_size, None);
        assert_eq!(cfg.resolved_pool_size(), DEFAULT_POOL_SIZE);
    }

    #[test]
    fn clearing_pool_size_back_to_none_is_accepted() {
        let mut cfg = DatabaseConfig::default();
        cfg.set_pool_size(Some(9)).unwrap();
        cfg.set_pool_size(None).unwrap();
        assert_eq!(cfg.pool_size, None);
    }

    #[test]
    fn rejects_negative_connection_timeout() {
        let mut cfg = DatabaseConfig::default();
        assert!(cfg.set_connection_timeout(Some(-1)).is_err());
    }
}
