//! Configuration management (config.toml)
//!
//! Handles loading, saving, and providing defaults for sonification settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::band::{BandSet, SDSS_BANDS};
use crate::coords::CoordUnit;
use crate::error::{Result, SonifyError};
use crate::render::{VoiceSettings, WaveformSettings};
use crate::sweep::SweepMode;

const CONFIG_FILE: &str = "config.toml";

/// Application configuration.
///
/// Contains all user-configurable settings organized into sections.
/// Every field has a default, so partial files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Which images to fetch
    #[serde(default)]
    pub survey: SurveyConfig,
    /// How intensities become pitches
    #[serde(default)]
    pub mapping: SweepMode,
    /// Which renderer plays the sweep
    #[serde(default)]
    pub renderer: RendererKind,
    #[serde(default)]
    pub waveform: WaveformSettings,
    #[serde(default)]
    pub voice: VoiceSettings,
}

/// Renderer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RendererKind {
    /// Sine tones with fades
    #[default]
    Waveform,
    /// Notes on a synthesizer voice
    Voice,
}

impl std::str::FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waveform" | "wave" | "sine" => Ok(RendererKind::Waveform),
            "voice" | "synth" | "midi" => Ok(RendererKind::Voice),
            other => Err(format!("unknown renderer '{other}' (expected waveform or voice)")),
        }
    }
}

/// Survey request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Bands to fetch, in order (default: SDSS u, g, r, i, z)
    #[serde(default = "default_bands")]
    pub bands: Vec<String>,
    /// Image width and height in pixels (default: 256)
    #[serde(default = "default_size")]
    pub size: u32,
    /// Angular radius of the field in degrees (default: 0.2, a 0.4 degree image)
    #[serde(default = "default_radius")]
    pub radius_deg: f64,
    /// Format of RA/Dec arguments (default: hms-dms)
    #[serde(default)]
    pub unit: CoordUnit,
}

fn default_bands() -> Vec<String> {
    SDSS_BANDS.iter().map(|b| b.to_string()).collect()
}
fn default_size() -> u32 {
    256
}
fn default_radius() -> f64 {
    0.2
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            size: default_size(),
            radius_deg: default_radius(),
            unit: CoordUnit::default(),
        }
    }
}

impl SurveyConfig {
    pub fn band_set(&self) -> BandSet {
        BandSet::new(self.bands.iter().map(String::as_str))
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/skysweep`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "skysweep", "skysweep")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of `config.toml`, if a config directory exists on this platform.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Read a configuration file.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// `Config` if the file exists but is not valid TOML for [`Config`].
pub fn load_from(path: &Path) -> Result<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&content).map_err(|e| SonifyError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Loads the configuration from disk.
///
/// Reads `config.toml` from the platform's configuration directory.
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    load_from(&path).unwrap_or_else(|e| {
        warn!("Ignoring configuration: {}", e);
        Config::default()
    })
}

/// Write a configuration file, creating parent directories.
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config).map_err(|e| SonifyError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Saves the configuration to the platform's configuration directory.
///
/// Returns the path written, or `None` when no config directory exists.
pub fn save(config: &Config) -> Result<Option<PathBuf>> {
    match config_path() {
        Some(path) => {
            save_to(config, &path)?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}
