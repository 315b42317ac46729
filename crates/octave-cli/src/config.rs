//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `--config <path>` (must exist)
//! 2. `$OCTAVE_CONFIG` environment variable
//! 3. `<platform config dir>/octave/config.toml`
//! 4. Built-in defaults (everything is optional)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub alloc: AllocConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

/// Matrix store sizing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Slots reserved up front; capacity doubles from here.
    pub initial_capacity: usize,
}

/// Allocation retry policy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AllocConfig {
    /// Immediate retries before an allocation failure becomes fatal.
    pub retries: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// `text` or `json`.
    pub format: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

// --- Defaults ---

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: octave_store::MIN_CAPACITY,
        }
    }
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self {
            retries: octave_core::alloc::DEFAULT_RETRIES,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".into(),
        }
    }
}

/// Load config from disk. Returns defaults if no config file exists, unless
/// the path was given explicitly.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(p) = explicit {
        return read_config(p);
    }

    if let Some(p) = config_path(None) {
        if p.exists() {
            return read_config(&p);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Resolve the config file path.
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }

    if let Ok(p) = std::env::var("OCTAVE_CONFIG") {
        return Some(PathBuf::from(p));
    }

    directories::ProjectDirs::from("dev", "octave", "octave")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Show the active config path (for `octave config`).
pub fn show_config_path(explicit: Option<&Path>) -> String {
    match config_path(explicit) {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}
