//! Sampling configuration and shared profiles.
//!
//! Encoder and decoder must agree on every sampling value; a mismatch cannot
//! be detected from the carrier text and corrupts the recovered message.
//! Profiles let both parties keep the agreed values in a TOML file,
//! stored by default in `~/.tokenhide/profile.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::StegoError;

/// Default number of greedy tokens before encoding starts.
pub const DEFAULT_SKIP_START: usize = 8;

/// Default maximum number of generated tokens.
pub const DEFAULT_TOKEN_BUDGET: usize = 1024;

/// Default MinP filtering value.
pub const DEFAULT_MIN_P: f64 = 0.02;

/// Default TopK filtering value (0 = no limit).
pub const DEFAULT_TOP_K: usize = 0;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Errors that can occur when loading or saving profiles.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Config directory not found. Unable to determine home directory.")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("Invalid profile: {0}")]
    Invalid(#[from] StegoError),
}

/// Sampling values shared by encoder and decoder.
///
/// `token_budget` only matters when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Sampling temperature, applied as `p^(1/temperature)`.
    pub temperature: f64,

    /// Keep only the `top_k` most likely tokens (0 = no limit).
    pub top_k: usize,

    /// Keep tokens with probability at least `min_p` times the best one.
    pub min_p: f64,

    /// Number of greedy tokens generated before encoding starts.
    pub skip_start: usize,

    /// Maximum number of tokens to generate.
    pub token_budget: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            min_p: DEFAULT_MIN_P,
            skip_start: DEFAULT_SKIP_START,
            token_budget: DEFAULT_TOKEN_BUDGET,
        }
    }
}

impl SamplingConfig {
    /// Creates a config in the order the encode entry point takes its
    /// parameters.
    pub fn new(
        token_budget: usize,
        skip_start: usize,
        min_p: f64,
        top_k: usize,
        temperature: f64,
    ) -> Self {
        Self {
            temperature,
            top_k,
            min_p,
            skip_start,
            token_budget,
        }
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), StegoError> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(StegoError::InvalidConfig(format!(
                "temperature must be a positive number, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.min_p) {
            return Err(StegoError::InvalidConfig(format!(
                "min_p must be between 0 and 1, got {}",
                self.min_p
            )));
        }
        Ok(())
    }

    /// Loads a profile from a TOML file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path)?;
        let config: SamplingConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the default profile, or the built-in defaults if there is none.
    pub fn load_default() -> Result<Self, ProfileError> {
        let path = Self::profile_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Saves the profile as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ProfileError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Path of the default profile.
    pub fn profile_path() -> Result<PathBuf, ProfileError> {
        Ok(get_config_dir()?.join("profile.toml"))
    }

    /// Renders the profile as TOML.
    pub fn to_toml(&self) -> Result<String, ProfileError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Get the tokenhide config directory (`~/.tokenhide`).
pub fn get_config_dir() -> Result<PathBuf, ProfileError> {
    dirs::home_dir()
        .map(|home| home.join(".tokenhide"))
        .ok_or(ProfileError::NoConfigDir)
}
