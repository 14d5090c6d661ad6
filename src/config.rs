use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub esc_quit: bool,

    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,

    /// How many ticks a toast stays on screen
    #[serde(default = "default_notification_ttl")]
    pub notification_ttl: u16,

    #[serde(default)]
    pub keys: Keys,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Keys {
    #[serde(default = "default_refresh_key")]
    pub refresh: char,

    #[serde(default = "default_scan_key")]
    pub scan: char,

    #[serde(default = "default_permission_key")]
    pub permission: char,
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            refresh: default_refresh_key(),
            scan: default_scan_key(),
            permission: default_permission_key(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            esc_quit: false,
            tick_rate_ms: default_tick_rate(),
            notification_ttl: default_notification_ttl(),
            keys: Keys::default(),
        }
    }
}

fn default_tick_rate() -> u64 {
    1000
}

fn default_notification_ttl() -> u16 {
    3
}

fn default_refresh_key() -> char {
    'r'
}

fn default_scan_key() -> char {
    's'
}

fn default_permission_key() -> char {
    'p'
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wifimon").join("config.toml"))
    }

    /// Load the user config, falling back to defaults when there is none
    pub fn new() -> Result<Self> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
