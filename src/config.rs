//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/moover/config.json`.
//! Every section is optional, so the file can grow new sections later
//! without breaking older files.
//!
//! # Example
//!
//! ```json
//! {
//!   "overlay": { "timeout_ms": 5000 },
//!   "keybinding": {
//!     "name": "move-focused-window",
//!     "mods": "SUPER",
//!     "key": "M"
//!   },
//!   "placement": { "add_monitor_x": false }
//! }
//! ```

use crate::traits::KeyBinding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Menu lifecycle settings.
    #[serde(default)]
    pub overlay: OverlayConfig,

    /// The global keybinding that opens the menu.
    #[serde(default)]
    pub keybinding: KeybindingConfig,

    /// Window placement settings.
    #[serde(default)]
    pub placement: PlacementConfig,
}

/// Menu lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// How long the menu stays open without a keystroke (ms).
    pub timeout_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

impl OverlayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The global keybinding that opens the menu.
///
/// `mods` and `key` use Hyprland's `bind` notation.  When `command` is
/// unset the daemon binds `<its own executable> trigger`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    /// Name the binding is registered under.
    pub name: String,
    pub mods: String,
    pub key: String,
    /// Shell command run by the compositor when the binding fires.
    pub command: Option<String>,
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            name: "move-focused-window".into(),
            mods: "SUPER".into(),
            key: "M".into(),
            command: None,
        }
    }
}

impl KeybindingConfig {
    /// Build the [`KeyBinding`], running `fallback_command` when no command
    /// is configured.
    pub fn binding(&self, fallback_command: &str) -> KeyBinding {
        KeyBinding {
            mods: self.mods.clone(),
            key: self.key.clone(),
            command: self
                .command
                .clone()
                .unwrap_or_else(|| fallback_command.to_string()),
        }
    }
}

/// Window placement settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Add the monitor's x origin to the computed x coordinate.
    ///
    /// Off by default: the placement arithmetic only offsets `y` by the
    /// monitor origin, so windows on a monitor that does not start at
    /// `x = 0` land on the leftmost monitor's columns unless this is set.
    pub add_monitor_x: bool,
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "overlay": { "timeout_ms": 3000 },
            "keybinding": {
                "name": "moover",
                "mods": "SUPER SHIFT",
                "key": "W",
                "command": "moover-client trigger"
            },
            "placement": { "add_monitor_x": true }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.overlay.timeout(), Duration::from_millis(3000));
        assert_eq!(cfg.keybinding.name, "moover");
        assert_eq!(cfg.keybinding.mods, "SUPER SHIFT");
        assert_eq!(cfg.keybinding.key, "W");
        assert_eq!(cfg.keybinding.command.as_deref(), Some("moover-client trigger"));
        assert!(cfg.placement.add_monitor_x);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.overlay.timeout_ms, 5000);
        assert_eq!(cfg.keybinding.name, "move-focused-window");
        assert_eq!(cfg.keybinding.mods, "SUPER");
        assert_eq!(cfg.keybinding.key, "M");
        assert!(cfg.keybinding.command.is_none());
        assert!(!cfg.placement.add_monitor_x);
    }

    #[test]
    fn deserialize_partial_keybinding() {
        let json = r#"{ "keybinding": { "key": "Space" } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.keybinding.key, "Space");
        assert_eq!(cfg.keybinding.mods, "SUPER");
        assert_eq!(cfg.keybinding.name, "move-focused-window");
    }

    #[test]
    fn binding_falls_back_to_default_command() {
        let kb = KeybindingConfig::default();
        let binding = kb.binding("/usr/bin/moover trigger");
        assert_eq!(binding.command, "/usr/bin/moover trigger");
        assert_eq!(binding.key, "M");

        let kb = KeybindingConfig {
            command: Some("notify-send hi".into()),
            ..KeybindingConfig::default()
        };
        assert_eq!(kb.binding("unused").command, "notify-send hi");
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "overlay": {}, "future_section": { "key": 42 } }"#;
        // Should not fail: unknown keys are silently ignored.
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "moover-missing-{}.json",
            std::process::id()
        ));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
