use crate::error::{CoreError, Result};
use crate::schema::Coordinates;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub speech: SpeechConfig,
    pub location: LocationConfig,
    pub catalog: CatalogConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Speaking rate multiplier, 1.0 is the engine's normal speed.
    pub rate: f32,
    pub pitch: f32,
    /// 0.0 - 1.0
    pub volume: f32,
    /// Voice name fragments tried in order; the first voice containing one wins.
    pub preferred_voices: Vec<String>,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Consent to use the coordinates below for repair-center searches.
    pub share: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zoom: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Replace the built-in scripts with a catalog file of the same layout.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub thinking_delay_ms: u64,
    pub show_resources: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
            preferred_voices: vec![
                "Google".to_string(),
                "Microsoft".to_string(),
                "en".to_string(),
            ],
            command: "espeak-ng".to_string(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            share: false,
            latitude: None,
            longitude: None,
            zoom: 15,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            thinking_delay_ms: 0,
            show_resources: true,
        }
    }
}

impl LocationConfig {
    /// Coordinates the user agreed to share up front, if both halves are set.
    pub fn shared_coordinates(&self) -> Option<Coordinates> {
        if !self.share {
            return None;
        }
        self.coordinates()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.fixify/config.toml`, creating defaults if missing.
    pub fn load() -> Result<Self> {
        let base_dir = Self::default_base_dir()?;
        let config_path = base_dir.join("config.toml");

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = AppConfig::default();
            fs::create_dir_all(&base_dir)?;
            let toml_str = toml::to_string_pretty(&config)
                .map_err(|e| CoreError::Config(format!("failed to serialize config: {e}")))?;
            fs::write(&config_path, toml_str)?;
            Ok(config)
        }
    }

    /// Load config from a specific path (for testing or custom setups).
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("failed to read config: {e}")))?;
        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| CoreError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default base directory (`~/.fixify`).
    pub fn default_base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".fixify"))
    }

    /// Resolved path of the user script catalog, if one is configured.
    pub fn catalog_path(&self) -> Result<Option<PathBuf>> {
        self.catalog.path.as_deref().map(resolve_tilde).transpose()
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.speech.volume) {
            return Err(CoreError::Config(format!(
                "speech.volume must be between 0 and 1, got {}",
                self.speech.volume
            )));
        }
        if self.speech.rate <= 0.0 || self.speech.pitch < 0.0 {
            return Err(CoreError::Config(
                "speech.rate must be positive and speech.pitch non-negative".to_string(),
            ));
        }
        if let Some(lat) = self.location.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(CoreError::Config(format!("latitude out of range: {lat}")));
            }
        }
        if let Some(lng) = self.location.longitude {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(CoreError::Config(format!("longitude out of range: {lng}")));
            }
        }
        Ok(())
    }
}

/// Expand `~` to the user's home directory.
fn resolve_tilde(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(rest))
    } else if path == "~" {
        dirs::home_dir()
            .ok_or_else(|| CoreError::Config("could not determine home directory".to_string()))
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Initialize tracing/logging with env filter.
///
/// Respects `RUST_LOG` env var, falling back to `default_level`.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
