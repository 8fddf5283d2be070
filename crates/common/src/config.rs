//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SplitviewResult;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External tool locations.
    pub tools: ToolPaths,

    /// Layout constants shared by every composition.
    pub layout: LayoutDefaults,

    /// Font and timer assets.
    pub assets: AssetPaths,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Paths (or bare names resolved via `PATH`) of the media tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// Layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutDefaults {
    /// Width of the black separator between adjacent clips.
    pub padding_width: u32,

    /// Fraction of the composition height reserved for the subtitle band.
    /// Timer overlays are scaled to the same height.
    pub subtitle_band_fraction: f64,

    /// Font size used to take reference text measurements.
    pub reference_font_size: f64,
}

/// Asset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// TrueType/OpenType font used for clip labels.
    pub font: PathBuf,

    /// Video overlaid at the top-left of every clip when timers are enabled.
    pub timer_video: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "splitview=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            layout: LayoutDefaults::default(),
            assets: AssetPaths::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Default for LayoutDefaults {
    fn default() -> Self {
        Self {
            padding_width: 20,
            subtitle_band_fraction: 0.1,
            reference_font_size: 100.0,
        }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            font: default_font_path(),
            timer_video: data_dir().join("resources").join("1min_b&w_timer.mp4"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> SplitviewResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> SplitviewResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("splitview").join("config.json")
}

fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"));
    base.join("splitview")
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

#[cfg(target_os = "macos")]
fn default_font_path() -> PathBuf {
    PathBuf::from("/System/Library/Fonts/SFNS.ttf")
}

#[cfg(target_os = "windows")]
fn default_font_path() -> PathBuf {
    PathBuf::from("C:\\Windows\\Fonts\\arial.ttf")
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_font_path() -> PathBuf {
    PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")
}
