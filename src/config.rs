use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize, PartialEq)]
pub struct TrayConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default)]
    pub icon: IconConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct IconConfig {
    /// Outline font used for the percentage. Falls back to the built-in
    /// pixel face when missing or unreadable.
    #[serde(default = "default_font_path")]
    pub font_path: Option<PathBuf>,
    /// Size in points, 96 DPI.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_refresh_interval_ms() -> u64 {
    1000
}

fn default_font_size() -> f32 {
    14.0
}

/// Segoe UI from the Windows font directory.
fn default_font_path() -> Option<PathBuf> {
    let windir = std::env::var_os("WINDIR")?;
    Some(PathBuf::from(windir).join("Fonts").join("segoeui.ttf"))
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            font_path: default_font_path(),
            font_size: default_font_size(),
        }
    }
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            icon: IconConfig::default(),
        }
    }
}

impl TrayConfig {
    /// Timer period, never shorter than 100ms.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(100))
    }
}

/// Load the config file.
/// Search order:
///   1. BATTERY_TRAY_CONFIG env var
///   2. <config dir>/battery-tray/config.toml
///   3. Default values
pub fn load() -> TrayConfig {
    let candidates = [
        std::env::var("BATTERY_TRAY_CONFIG").ok().map(PathBuf::from),
        dirs::config_dir().map(|d| d.join("battery-tray").join("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Some(config) = load_from(&candidate) {
            return config;
        }
    }

    info!("no config file found, using defaults");
    TrayConfig::default()
}

/// Read a single config file. `None` if it is absent or unusable.
pub fn load_from(path: &Path) -> Option<TrayConfig> {
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<TrayConfig>(&content) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    interval_ms = config.refresh_interval_ms,
                    "loaded config"
                );
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse config");
                None
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config");
            None
        }
    }
}
