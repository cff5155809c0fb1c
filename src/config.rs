//! Session Configuration
//!
//! Loaded once at session start from JSON. Every field has a default, so a
//! partial file only overrides what it names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::fixed::Fixed;
use crate::game::damage::DamageRules;

/// Maximum combatants in a session
pub const MAX_SLOTS: u8 = 4;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// JSON did not match the schema.
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Campaign or versus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    SinglePlayer,
    #[default]
    Multiplayer,
}

/// Amounts granted by items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupAmounts {
    pub health_small: u16,
    pub health_medium: u16,
    pub health_big: u16,
    pub ammo_small: u16,
    pub ammo_big: u16,
    /// A weapon pickup tops its pool up to at least this much
    pub weapon_ammo_floor: u16,
    /// Missiles granted when the affinity weapon is one the hunter already has
    pub affinity_missile_bonus: u16,
}

impl Default for PickupAmounts {
    fn default() -> Self {
        Self {
            health_small: 30,
            health_medium: 60,
            health_big: 100,
            ammo_small: 50,
            ammo_big: 100,
            weapon_ammo_floor: 60,
            affinity_missile_bonus: 50,
        }
    }
}

/// Session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub mode: GameMode,
    /// Shorter respawn delay
    pub survival: bool,
    pub teams: bool,
    pub friendly_fire: bool,
    /// Anything below this height dies (raw Q16.16)
    pub kill_height: Option<Fixed>,
    pub max_slots: u8,
    pub pickups: PickupAmounts,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Multiplayer,
            survival: false,
            teams: false,
            friendly_fire: false,
            kill_height: None,
            max_slots: MAX_SLOTS,
            pickups: PickupAmounts::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_slots == 0 || self.max_slots > MAX_SLOTS {
            return Err(ConfigError::Invalid(format!(
                "max_slots must be in 1..={}, got {}",
                MAX_SLOTS, self.max_slots
            )));
        }
        let p = &self.pickups;
        let amounts = [
            ("health_small", p.health_small),
            ("health_medium", p.health_medium),
            ("health_big", p.health_big),
            ("ammo_small", p.ammo_small),
            ("ammo_big", p.ammo_big),
            ("weapon_ammo_floor", p.weapon_ammo_floor),
            ("affinity_missile_bonus", p.affinity_missile_bonus),
        ];
        if let Some((name, _)) = amounts.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("pickups.{} must be non-zero", name)));
        }
        Ok(())
    }

    /// Campaign session.
    #[inline]
    pub fn is_single_player(&self) -> bool {
        self.mode == GameMode::SinglePlayer
    }

    /// Damage rules derived from the mode.
    pub fn damage_rules(&self) -> DamageRules {
        DamageRules {
            single_player: self.is_single_player(),
            teams: self.teams,
            friendly_fire: self.friendly_fire,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pickups.ammo_small, 50);
        assert!(!config.is_single_player());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json_str(
            r#"{ "mode": "single_player", "pickups": { "health_small": 25 } }"#,
        )
        .unwrap();
        assert!(config.is_single_player());
        assert_eq!(config.pickups.health_small, 25);
        assert_eq!(config.pickups.health_big, 100);
        assert_eq!(config.max_slots, MAX_SLOTS);
    }

    #[test]
    fn test_rejects_bad_slots() {
        let err = SimConfig::from_json_str(r#"{ "max_slots": 9 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_amount() {
        let err = SimConfig::from_json_str(r#"{ "pickups": { "ammo_big": 0 } }"#).unwrap_err();
        assert!(err.to_string().contains("ammo_big"));
    }

    #[test]
    fn test_parse_error() {
        let err = SimConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SimConfig::from_json_file("/nonexistent/hunter-sim.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
