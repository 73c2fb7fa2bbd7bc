//! Combat Configuration
//!
//! Tunables for one simulation. Every field has a default, so a JSON config
//! only needs to list what it overrides.

use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, FIXED_ONE,
    ARMOR_CONSTANT, DEFAULT_CRIT_MULTIPLIER, ENERGY_SHIELD_RATIO,
    EXPLOSIVE_MIN_PENETRATION, HEAL_CRIT_CHANCE, HEAL_CRIT_MULTIPLIER,
};
use crate::core::vec3::FixedVec3;
use crate::combat::error::ConfigError;

/// Highest accepted tick rate (Hz). Keeps one tick at least 65/65536 s.
pub const MAX_TICK_RATE: u32 = 1000;

/// Configuration for a combat simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Simulation tick rate (Hz)
    pub tick_rate: u32,
    /// Maximum concurrent buffs per actor
    pub max_buffs_per_actor: usize,
    /// Maximum concurrently active projectiles
    pub max_active_projectiles: usize,
    /// Recycled instances kept per projectile definition
    pub projectile_pool_per_definition: usize,
    /// Crit chance for direct heals (FIXED_ONE = 100%)
    pub heal_crit_chance: Fixed,
    /// Crit multiplier for direct heals
    pub heal_crit_multiplier: Fixed,
    /// Crit multiplier used when an attacker is unknown
    pub default_crit_multiplier: Fixed,
    /// Armor constant `k` in `armor / (armor + k)`
    pub armor_constant: Fixed,
    /// Minimum armor penetration of Explosive damage
    pub explosive_min_penetration: Fixed,
    /// Share of Energy damage the shield may absorb
    pub energy_shield_ratio: Fixed,
    /// Gravity acceleration applied to arcing projectiles
    pub gravity: FixedVec3,
    /// Distance at which a returning boomerang is caught
    pub boomerang_catch_radius: Fixed,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_buffs_per_actor: 32,
            max_active_projectiles: 512,
            projectile_pool_per_definition: 64,
            heal_crit_chance: HEAL_CRIT_CHANCE,
            heal_crit_multiplier: HEAL_CRIT_MULTIPLIER,
            default_crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
            armor_constant: ARMOR_CONSTANT,
            explosive_min_penetration: EXPLOSIVE_MIN_PENETRATION,
            energy_shield_ratio: ENERGY_SHIELD_RATIO,
            gravity: FixedVec3::new(0, 0, -642252), // -9.8 * 65536
            boomerang_catch_radius: FIXED_ONE,
        }
    }
}

impl CombatConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Fixed-point duration of one tick at `tick_rate`.
    pub fn tick_duration(&self) -> Fixed {
        FIXED_ONE / self.tick_rate.clamp(1, MAX_TICK_RATE) as Fixed
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TICK_RATE).contains(&self.tick_rate) {
            return Err(ConfigError::Invalid(format!("tick_rate must be in [1, {}]", MAX_TICK_RATE)));
        }
        if self.max_buffs_per_actor == 0 {
            return Err(ConfigError::Invalid("max_buffs_per_actor must be positive".into()));
        }
        if !(0..=FIXED_ONE).contains(&self.heal_crit_chance) {
            return Err(ConfigError::Invalid("heal_crit_chance must be in [0, 1]".into()));
        }
        if !(0..=FIXED_ONE).contains(&self.explosive_min_penetration) {
            return Err(ConfigError::Invalid("explosive_min_penetration must be in [0, 1]".into()));
        }
        if !(0..=FIXED_ONE).contains(&self.energy_shield_ratio) {
            return Err(ConfigError::Invalid("energy_shield_ratio must be in [0, 1]".into()));
        }
        if self.armor_constant <= 0 {
            return Err(ConfigError::Invalid("armor_constant must be positive".into()));
        }
        if self.heal_crit_multiplier < 0 || self.default_crit_multiplier < 0 {
            return Err(ConfigError::Invalid("crit multipliers must not be negative".into()));
        }
        if self.boomerang_catch_radius < 0 {
            return Err(ConfigError::Invalid("boomerang_catch_radius must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::TICK_DURATION;

    #[test]
    fn test_default_is_valid() {
        let config = CombatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_duration(), TICK_DURATION);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CombatConfig::from_json_str(r#"{ "max_buffs_per_actor": 4 }"#).unwrap();
        assert_eq!(config.max_buffs_per_actor, 4);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.heal_crit_chance, HEAL_CRIT_CHANCE);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = CombatConfig::from_json_str(r#"{ "tick_rate": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CombatConfig::from_json_str(r#"{ "heal_crit_chance": 70000 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_tick_rate_bounds() {
        let fastest = CombatConfig::from_json_str(r#"{ "tick_rate": 1000 }"#).unwrap();
        assert_eq!(fastest.tick_duration(), 65);

        let err = CombatConfig::from_json_str(r#"{ "tick_rate": 1001 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = CombatConfig::from_json_str(r#"{ "tick_rate": 4294967295 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        // Unvalidated configs still produce a positive duration
        let unchecked = CombatConfig { tick_rate: u32::MAX, ..CombatConfig::default() };
        assert_eq!(unchecked.tick_duration(), 65);
        let unchecked = CombatConfig { tick_rate: 0, ..CombatConfig::default() };
        assert_eq!(unchecked.tick_duration(), FIXED_ONE);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = CombatConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CombatConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
