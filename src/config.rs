//! Converter configuration.
//!
//! Handles loading, validating, and merging `config.toml`. User values are
//! layered over stock defaults, so a config file only needs the keys it
//! wants to change.
//!
//! ## Config File Location
//!
//! By default `config.toml` is read from the source directory (or, when the
//! source is a single image, from the directory containing it). `--config`
//! points at any other file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [conversion]
//! metrics = ["rgb", "cie76", "cie94", "cie2000"]  # one output per metric
//! compatibility = "corrected"                      # or "legacy"
//!
//! [input]
//! extensions = ["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"]
//! recursive = false           # descend into subdirectories
//!
//! [output]
//! prefix = "c64_"             # prepended to every output file name
//!
//! [processing]
//! max_processes = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::color::{Compatibility, Metric};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the source directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Which metrics to run and how.
    pub conversion: ConversionConfig,
    /// Which files count as source images.
    pub input: InputConfig,
    /// Output naming.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conversion.metrics.is_empty() {
            return Err(ConfigError::Validation(
                "conversion.metrics must not be empty".into(),
            ));
        }
        for (i, metric) in self.conversion.metrics.iter().enumerate() {
            if self.conversion.metrics[..i].contains(metric) {
                return Err(ConfigError::Validation(format!(
                    "conversion.metrics lists '{metric}' more than once"
                )));
            }
        }
        if self.input.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "input.extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self
            .input
            .extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(ConfigError::Validation(format!(
                "input.extensions entry '{ext}' must be a bare extension like \"png\""
            )));
        }
        if self.output.prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.prefix must not contain path separators".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Conversion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// Metrics to convert with; each produces its own output file.
    pub metrics: Vec<Metric>,
    /// `legacy` reproduces the output of earlier releases.
    pub compatibility: Compatibility,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            metrics: Metric::ALL.to_vec(),
            compatibility: Compatibility::default(),
        }
    }
}

/// Source discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// File extensions (case-insensitive, no dot) treated as images.
    pub extensions: Vec<String>,
    /// Descend into subdirectories of the source directory.
    pub recursive: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            recursive: false,
        }
    }
}

impl InputConfig {
    /// Extensions normalized to lower case.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions.iter().map(|e| e.to_lowercase()).collect()
    }
}

/// Output naming settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Prepended to every output file name.
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "c64_".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a TOML file as a raw value.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Returns validated defaults when the directory has no config file.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    resolve_config(
        stock_defaults_value()?,
        load_raw_config(&dir.join(CONFIG_FILENAME))?,
    )
}

/// Load config from an explicit file, which must exist.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# c64image Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as config.toml in the source directory, or pass it
# explicitly with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Conversion
# ---------------------------------------------------------------------------
[conversion]
# Color distance metrics. Every listed metric writes its own output image.
#   rgb      - squared difference of raw RGB channels (fastest)
#   cie76    - squared Euclidean distance in L*a*b*
#   cie94    - CIE94 with graphic arts weights
#   cie2000  - CIEDE2000 (slowest, most faithful)
metrics = ["rgb", "cie76", "cie94", "cie2000"]

# "corrected" or "legacy". Legacy reproduces the palette choices of earlier
# releases: their CIE76 and CIE2000 formulas and the pixels they skipped at
# block edges.
compatibility = "corrected"

# ---------------------------------------------------------------------------
# Input
# ---------------------------------------------------------------------------
[input]
# File extensions treated as source images (case-insensitive).
extensions = ["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"]

# Descend into subdirectories. Outputs mirror the directory layout.
recursive = false

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Output files are named <prefix><stem>_<METRIC>.png
prefix = "c64_"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
