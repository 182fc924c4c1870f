use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Delays and durations, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub delete_submit_delay_ms: u64,     // Busy state gets this long to render before submit
    pub stagger_step_ms: u64,            // Card i starts at i * step
    pub reveal_delay_ms: u64,            // Hidden -> revealing gap
    pub card_transition_ms: u64,
    pub main_transition_ms: u64,
    pub count_interval_ms: u64,
    pub count_steps: u32,                // Count-up reaches its goal within this many ticks
    pub advanced_features_delay_ms: u64, // Search box, batch selection, shortcuts
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            delete_submit_delay_ms: 300,
            stagger_step_ms: 100,
            reveal_delay_ms: 100,
            card_transition_ms: 600,
            main_transition_ms: 500,
            count_interval_ms: 50,
            count_steps: 20,
            advanced_features_delay_ms: 1000,
        }
    }
}

impl Timing {
    pub fn delete_submit_delay(&self) -> Duration {
        Duration::from_millis(self.delete_submit_delay_ms)
    }

    pub fn stagger_step(&self) -> Duration {
        Duration::from_millis(self.stagger_step_ms)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn card_transition(&self) -> Duration {
        Duration::from_millis(self.card_transition_ms)
    }

    pub fn main_transition(&self) -> Duration {
        Duration::from_millis(self.main_transition_ms)
    }

    pub fn count_interval(&self) -> Duration {
        Duration::from_millis(self.count_interval_ms)
    }

    pub fn advanced_features_delay(&self) -> Duration {
        Duration::from_millis(self.advanced_features_delay_ms)
    }
}

/// Class names and attributes the server-rendered markup uses to flag elements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub admin_table: String,
    pub danger_button: String,
    pub confirm_attr: String, // Attribute carrying the confirmation message
    pub stat_card: String,
    pub stat_number: String,
    pub admin_main: String,
    pub admin_header: String,
    pub comment_section: String,
    pub comment_heading: String, // Tag of the clickable heading inside a comment section
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            admin_table: "admin-table".to_string(),
            danger_button: "btn-admin-danger".to_string(),
            confirm_attr: "data-confirm".to_string(),
            stat_card: "stat-card".to_string(),
            stat_number: "stat-number".to_string(),
            admin_main: "admin-main".to_string(),
            admin_header: "admin-header".to_string(),
            comment_section: "chapter-comments".to_string(),
            comment_heading: "h5".to_string(),
        }
    }
}

/// User-visible strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub busy: String,
    pub search_placeholder: String,
    pub validation_failed: String,
    pub shortcuts_title: String,
    pub shortcuts_close: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            busy: "🗑️ Deleting...".to_string(),
            search_placeholder: "🔍 Search users, stories or discussions...".to_string(),
            validation_failed: "Please fill in all required fields".to_string(),
            shortcuts_title: "⌨️ Keyboard shortcuts".to_string(),
            shortcuts_close: "Close".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Attach the delayed advanced features at all
    pub advanced: bool,
    pub search: bool,
    pub batch_selection: bool,
    pub keyboard_shortcuts: bool,

    /// Skip tables that already sit in a responsive wrapper
    pub guard_double_wrap: bool,

    /// Mirror validation alerts as desktop notifications (previewer only)
    pub notifications: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            advanced: true,
            search: true,
            batch_selection: true,
            keyboard_shortcuts: true,
            guard_double_wrap: true,
            notifications: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnhancerConfig {
    #[serde(default)]
    pub timing: Timing,

    #[serde(default)]
    pub markers: Markers,

    #[serde(default)]
    pub labels: Labels,

    #[serde(default)]
    pub features: Features,
}

impl EnhancerConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Invalid("Could not find config directory".to_string()))?
            .join("veneer");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the user config directory, or create the default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(EnhancerConfig::default()),
        };

        if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!("Ignoring config at {}: {}", path.display(), e),
            }
            return Ok(EnhancerConfig::default());
        }

        let config = EnhancerConfig::default();
        if let Err(e) = config.save_to(&path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: EnhancerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timing.count_steps == 0 {
            return Err(Error::Invalid("timing.count_steps must be at least 1".to_string()));
        }
        if self.markers.comment_heading.trim().is_empty() {
            return Err(Error::Invalid("markers.comment_heading must name a tag".to_string()));
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let mut config = EnhancerConfig::default();
        config.timing.delete_submit_delay_ms = 450;
        config.markers.admin_table = "data-grid".to_string();
        config.features.batch_selection = false;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized = EnhancerConfig::parse(&serialized).unwrap();

        assert_eq!(deserialized.timing.delete_submit_delay_ms, 450);
        assert_eq!(deserialized.markers.admin_table, "data-grid");
        assert!(!deserialized.features.batch_selection);
        assert_eq!(deserialized.labels.busy, config.labels.busy);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = EnhancerConfig::parse("[timing]\ncount_interval_ms = 25\n").unwrap();
        assert_eq!(config.timing.count_interval(), Duration::from_millis(25));
        assert_eq!(config.timing.count_steps, 20);
        assert_eq!(config.markers.stat_number, "stat-number");
        assert!(config.features.guard_double_wrap);
    }

    #[test]
    fn test_zero_count_steps_rejected() {
        let err = EnhancerConfig::parse("[timing]\ncount_steps = 0\n").unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn test_malformed_config_is_a_config_error() {
        let err = EnhancerConfig::parse("[timing\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
