// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::chain::{EXPAND_COUNT, SPOKE_ANGLE_DEG, SPOKE_TOLERANCE_DEG};
use crate::focus::{HEADING_EPSILON_DEG, VIEW_TOLERANCE_DEG};
use crate::HudError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Bump when a field's meaning or default changes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// How raw heading samples are turned into the heading compared against node bearings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingMode {
    /// Relative to the first sample: `normalize(reference - raw)`.
    #[default]
    Calibrated,
    /// Raw samples are taken as absolute compass headings.
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    pub spoke_angle_deg: f64,
    pub spoke_tolerance_deg: f64,
    pub view_tolerance_deg: f64,
    pub expand_count: usize,
    pub heading_mode: HeadingMode,
    /// Samples closer than this to the last processed one are dropped.
    pub heading_epsilon_deg: f64,
    /// Files written before versioning carry no field and read as 0.
    #[serde(default = "unversioned")]
    pub schema_version: u32,
}

fn unversioned() -> u32 {
    0
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            spoke_angle_deg: SPOKE_ANGLE_DEG,
            spoke_tolerance_deg: SPOKE_TOLERANCE_DEG,
            view_tolerance_deg: VIEW_TOLERANCE_DEG,
            expand_count: EXPAND_COUNT,
            heading_mode: HeadingMode::Calibrated,
            heading_epsilon_deg: HEADING_EPSILON_DEG,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }
}

impl HudConfig {
    pub fn validate(&self) -> Result<(), HudError> {
        let angle_in = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 && v <= 180.0 {
                Ok(())
            } else {
                Err(HudError::InvalidConfig(format!(
                    "{} must be in (0, 180], got {}",
                    name, v
                )))
            }
        };
        angle_in("spoke_angle_deg", self.spoke_angle_deg)?;
        angle_in("spoke_tolerance_deg", self.spoke_tolerance_deg)?;
        angle_in("view_tolerance_deg", self.view_tolerance_deg)?;
        if !(self.heading_epsilon_deg.is_finite()
            && (0.0..180.0).contains(&self.heading_epsilon_deg))
        {
            return Err(HudError::InvalidConfig(format!(
                "heading_epsilon_deg must be in [0, 180), got {}",
                self.heading_epsilon_deg
            )));
        }
        if self.expand_count == 0 {
            return Err(HudError::InvalidConfig(
                "expand_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: crate::get_config_root().join("config.json"),
        }
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the config, falling back to defaults when the file is absent.
    /// Files from an older schema are upgraded and written back.
    pub fn load(&self) -> Result<HudConfig> {
        if !self.config_path.exists() {
            log::debug!(
                "No config file, using defaults — path={}",
                self.config_path.display()
            );
            return Ok(HudConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config.json")?;
        let mut config: HudConfig =
            serde_json::from_str(&content).context("Failed to parse config.json")?;

        config.validate().context("config.json holds invalid values")?;

        if config.schema_version < CURRENT_SCHEMA_VERSION {
            log::info!(
                "Stamping config.json with schema v{} — was v{}",
                CURRENT_SCHEMA_VERSION,
                config.schema_version
            );
            config.schema_version = CURRENT_SCHEMA_VERSION;
            self.save(&config)?;
        }
        Ok(config)
    }

    pub fn save(&self, config: &HudConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }
        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_path, content).context("Failed to write config.json")
    }

    pub fn reset(&self) -> Result<HudConfig> {
        let config = HudConfig::default();
        self.save(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HudConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.spoke_angle_deg, 120.0);
        assert_eq!(config.spoke_tolerance_deg, 25.0);
        assert_eq!(config.view_tolerance_deg, 20.0);
        assert_eq!(config.expand_count, 2);
        assert_eq!(config.heading_mode, HeadingMode::Calibrated);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            HudConfig {
                spoke_tolerance_deg: 0.0,
                ..HudConfig::default()
            },
            HudConfig {
                view_tolerance_deg: f64::NAN,
                ..HudConfig::default()
            },
            HudConfig {
                spoke_angle_deg: 200.0,
                ..HudConfig::default()
            },
            HudConfig {
                heading_epsilon_deg: -1.0,
                ..HudConfig::default()
            },
            HudConfig {
                expand_count: 0,
                ..HudConfig::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(HudError::InvalidConfig(_))),
                "should reject {:?}",
                config
            );
        }
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: HudConfig =
            serde_json::from_str(r#"{ "spoke_tolerance_deg": 5.0, "heading_mode": "absolute" }"#)
                .unwrap();
        assert_eq!(config.spoke_tolerance_deg, 5.0);
        assert_eq!(config.heading_mode, HeadingMode::Absolute);
        assert_eq!(config.view_tolerance_deg, 20.0);
    }
}
