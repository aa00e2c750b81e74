use markup_regions_engine::{FlatKinds, HighlightConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid opacity {value} for {field}: must be within 0.0..=1.0")]
    InvalidOpacity { field: &'static str, value: f32 },
}

/// User-facing settings. Every field is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub marker_class: String,
    pub resting_opacity: f32,
    pub selected_opacity: f32,
    pub selection_enabled: bool,
    /// Snap partial-word selections out to whole words
    pub adjust_selection: bool,
    pub require_active_labels: bool,
    /// Control kinds whose records are restored by the control itself
    pub flat_control_kinds: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let highlight = HighlightConfig::default();
        Self {
            marker_class: highlight.marker_class,
            resting_opacity: highlight.resting_opacity,
            selected_opacity: highlight.selected_opacity,
            selection_enabled: highlight.selection_enabled,
            adjust_selection: highlight.adjust_selection,
            require_active_labels: highlight.require_active_labels,
            flat_control_kinds: FlatKinds::default().kinds().to_vec(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markup-regions");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Engine settings derived from this config
    pub fn highlight(&self) -> HighlightConfig {
        HighlightConfig {
            marker_class: self.marker_class.clone(),
            resting_opacity: self.resting_opacity,
            selected_opacity: self.selected_opacity,
            selection_enabled: self.selection_enabled,
            adjust_selection: self.adjust_selection,
            require_active_labels: self.require_active_labels,
        }
    }

    /// Restore delegate for the configured flat control kinds
    pub fn flat_kinds(&self) -> FlatKinds {
        FlatKinds::new(self.flat_control_kinds.iter().cloned())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("resting_opacity", self.resting_opacity),
            ("selected_opacity", self.selected_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidOpacity { field, value });
            }
        }
        Ok(())
    }
}
