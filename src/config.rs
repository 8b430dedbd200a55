//! Application configuration management.
//!
//! Settings are layered with figment, lowest to highest:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config`, else `<config dir>/dupesweep/config.toml`)
//! 3. `DUPESWEEP_*` environment variables
//! 4. command-line flags
//!
//! [`RunOptions`] turns the merged [`Config`] and the CLI into the
//! validated settings of one run.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::delete::{DeletablePrefixes, DeleteMode};
use crate::cli::{Cli, OutputFormat};
use crate::duplicates::DEFAULT_IO_THREADS;
use crate::scanner::path_utils::{self, is_under_prefix};
use crate::scanner::{HashScope, ScanConfig, DEFAULT_PREFIX_BYTES};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "DUPESWEEP_";

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file, environment or flags could not be merged or parsed.
    #[error("invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A setting has a value outside its allowed range.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Setting name
        key: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// A deletable prefix is not inside any scanned root.
    #[error("delete path {0} is not inside any scanned path")]
    PrefixOutsideRoots(PathBuf),

    /// None of the scan roots exists.
    #[error("no accessible path to scan among: {}", display_paths(.0))]
    NoAccessibleRoots(Vec<PathBuf>),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Persistent settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum file size in bytes
    pub min_size: u64,
    /// Bytes hashed per file in fast mode
    pub prefix_bytes: u64,
    /// Hashing threads
    pub io_threads: usize,
    /// Show progress on stderr
    pub progress: bool,
    /// Move deleted files to the trash
    pub trash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: 0,
            prefix_bytes: DEFAULT_PREFIX_BYTES,
            io_threads: DEFAULT_IO_THREADS,
            progress: true,
            trash: false,
        }
    }
}

/// Settings given on the command line; `None` leaves lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    min_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    io_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trash: Option<bool>,
}

impl ConfigOverrides {
    /// Collect the configuration flags present on the command line.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            min_size: cli.min_size,
            prefix_bytes: cli.prefix_bytes,
            io_threads: cli.io_threads,
            progress: cli.no_progress.then_some(false),
            trash: cli.trash.then_some(true),
        }
    }
}

impl Config {
    /// Default configuration file location for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupesweep").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment without extracting it.
    ///
    /// A missing default file is ignored; a missing explicit file is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if `explicit` does not exist.
    pub fn figment(
        explicit: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    log::debug!("Looking for configuration in {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides)))
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer cannot be parsed or a value is
    /// out of range.
    pub fn load(explicit: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(explicit, overrides)?)
    }

    /// Extract and validate a configuration from a figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on parse or validation failure.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Reject values that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero threads or a zero
    /// prefix length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "io_threads",
                message: "must be at least 1".to_string(),
            });
        }
        if self.prefix_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "prefix_bytes",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Where the files to check come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Walk these absolute roots.
    Roots(Vec<PathBuf>),
    /// Read paths from standard input.
    Stdin,
}

/// Validated settings for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Input
    pub source: Source,
    /// Where deletions are allowed
    pub prefixes: DeletablePrefixes,
    /// What happens to selected files
    pub mode: DeleteMode,
    /// Scanner filter
    pub scan: ScanConfig,
    /// Hashed part of each file
    pub scope: HashScope,
    /// Hashing threads
    pub io_threads: usize,
    /// Whether to draw progress
    pub progress: bool,
    /// Report format
    pub output: OutputFormat,
}

impl RunOptions {
    /// Combine CLI flags and the merged configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoAccessibleRoots`] if no root exists
    /// - [`ConfigError::PrefixOutsideRoots`] if a delete path is not below a
    ///   scanned root (not checked when reading paths from stdin)
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self, ConfigError> {
        let source = if cli.stdin {
            Source::Stdin
        } else {
            let roots: Vec<PathBuf> = cli.paths.iter().map(|p| path_utils::resolve(p)).collect();
            if !roots.iter().any(|r| r.exists()) {
                return Err(ConfigError::NoAccessibleRoots(roots));
            }
            for root in roots.iter().filter(|r| !r.exists()) {
                log::warn!("Skipping inaccessible path: {}", root.display());
            }
            Source::Roots(roots)
        };

        let prefixes = DeletablePrefixes::new(&cli.delete_from);
        if let Source::Roots(ref roots) = source {
            if let Some(outside) = prefixes
                .iter()
                .find(|p| !roots.iter().any(|root| is_under_prefix(p, root)))
            {
                return Err(ConfigError::PrefixOutsideRoots(outside.to_path_buf()));
            }
        }

        let mode = if cli.dry_run {
            DeleteMode::DryRun
        } else if config.trash {
            DeleteMode::Trash
        } else {
            DeleteMode::Remove
        };

        let scope = if cli.fast {
            HashScope::Prefix(config.prefix_bytes)
        } else {
            HashScope::Full
        };

        Ok(Self {
            source,
            prefixes,
            mode,
            scan: ScanConfig::new(config.min_size),
            scope,
            io_threads: config.io_threads,
            progress: config.progress && !cli.quiet,
            output: cli.output,
        })
    }
}
