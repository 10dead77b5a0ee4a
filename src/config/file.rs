//! Configuration file management for barscope.
//!
//! This module handles loading the TOML configuration from the user's config
//! directory. A configuration that cannot be read or does not validate is
//! replaced by the built-in default.

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::window_state::{WindowHints, WindowState};
use crate::spectrum::layout::{LayoutParams, BAR_COUNT};

/// Bar fill color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Rgba {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Returns the color blended onto a black background.
    pub fn premultiplied(&self) -> (u8, u8, u8) {
        let blend = |channel: u8| ((channel as u16 * self.alpha as u16 + 127) / 255) as u8;
        (blend(self.red), blend(self.green), blend(self.blue))
    }
}

impl FromStr for Rgba {
    type Err = anyhow::Error;

    /// Parses `#RRGGBBAA` or `#RRGGBB` (leading `#` optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            bail!("Invalid color '{s}': expected #RRGGBBAA or #RRGGBB");
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| anyhow!("Invalid color '{s}': '{}' is not hex", &hex[i..i + 2]))
        };

        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl TryFrom<String> for Rgba {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Input source and display mode.
#[derive(Debug, Clone, Deserialize)]
pub struct MainConfig {
    /// Index of the audio input device (see `barscope list-devices`)
    pub source: u32,
    /// Display modes. Accepts a TOML array or a comma-separated string.
    #[serde(deserialize_with = "deserialize_states")]
    pub state: Vec<WindowState>,
}

/// Bar appearance.
#[derive(Debug, Clone, Deserialize)]
pub struct BarsConfig {
    /// Columns left empty between bars
    pub padding: u16,
    /// Magnitude multiplier
    pub scale: f32,
    pub rgba: Rgba,
}

/// Space kept free around the bars.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffsetConfig {
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub right: i32,
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub bottom: i32,
}

/// Complete application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BarscopeConfig {
    pub main: MainConfig,
    pub bars: BarsConfig,
    #[serde(default)]
    pub offset: OffsetConfig,
}

impl BarscopeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// - If the TOML is malformed or a field has the wrong type
    /// - If a window state tag or the color is not recognised
    /// - If the scale is not a positive finite number
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: BarscopeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`.
    ///
    /// # Errors
    /// - If the file cannot be read
    /// - If the content does not parse or validate
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Returns the configuration embedded in the binary.
    ///
    /// # Errors
    /// - If the embedded default does not parse, which makes startup impossible
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml(crate::setup::DEFAULT_CONFIG)
            .context("Built-in default configuration is invalid")
    }

    /// Loads the user configuration, falling back to the built-in default.
    ///
    /// # Errors
    /// - Only if the built-in default cannot be loaded either
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load_from(path) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to load {}: {err:#}", path.display());
                eprintln!("Failed to read user config {}:", path.display());
                eprintln!("  {err:#}");
                eprintln!("Trying with default config...");

                let config = Self::builtin()?;
                tracing::info!("Default configuration loaded");
                Ok(config)
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.bars.scale.is_finite() || self.bars.scale <= 0.0 {
            bail!(
                "Invalid bars.scale {}: must be a positive number",
                self.bars.scale
            );
        }
        if self.main.state.is_empty() {
            bail!("main.state must list at least one window state");
        }
        Ok(())
    }

    /// Window hints derived from the configured states.
    pub fn window_hints(&self) -> WindowHints {
        WindowHints::from_states(&self.main.state)
    }

    /// Layout parameters for the bar pipeline.
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            bar_count: BAR_COUNT,
            padding: i32::from(self.bars.padding),
            left_offset: self.offset.left,
            right_offset: self.offset.right,
            top_offset: self.offset.top,
            bottom_offset: self.offset.bottom,
            scale: self.bars.scale,
            halve_height: self.window_hints().halve_height,
        }
    }
}

fn deserialize_states<'de, D>(deserializer: D) -> Result<Vec<WindowState>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StateList {
        Joined(String),
        List(Vec<String>),
    }

    let tags: Vec<String> = match StateList::deserialize(deserializer)? {
        StateList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        StateList::List(list) => list,
    };

    tags.iter()
        .map(|tag| tag.trim().parse::<WindowState>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)
}

/// Retrieves the path to the config file.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("barscope").join("barscope.toml"))
}
