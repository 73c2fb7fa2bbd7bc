//! Actor Handles and Combat Stats
//!
//! Actors are referenced by stable handles only. Poses come from the spatial
//! interface every tick; stats live in the registry entry owned by
//! `CombatState`. Nothing outside this crate holds a pointer to either.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, FIXED_ONE, DEFAULT_CRIT_MULTIPLIER,
    fixed_clamp, fixed_div, fixed_max,
};
use crate::core::hash::StateHasher;
use crate::core::vec3::FixedVec3;
use crate::combat::damage::DamageType;

// =============================================================================
// ACTOR ID
// =============================================================================

/// Unique actor identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ActorId(pub [u8; 16]);

impl ActorId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell actors apart in logs
        write!(f, "{}", hex::encode(&self.0[..4]))
    }
}

/// Team affiliation. Same team = friendly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TeamId(pub u8);

/// Spatial pose of an actor as reported by the spatial interface.
///
/// Valid for the current tick only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorPose {
    /// World position
    pub position: FixedVec3,
    /// Facing direction (unit vector)
    pub forward: FixedVec3,
    /// Collision radius
    pub radius: Fixed,
}

impl ActorPose {
    /// Pose at a position facing +X with the given radius.
    pub fn at(position: FixedVec3, radius: Fixed) -> Self {
        Self {
            position,
            forward: FixedVec3::FORWARD,
            radius,
        }
    }
}

// =============================================================================
// PER-DAMAGE-TYPE TABLE
// =============================================================================

/// One fixed-point value per damage type (resistances, vulnerabilities).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTypeTable([Fixed; DamageType::COUNT]);

impl DamageTypeTable {
    /// Table with the same value for every type.
    pub const fn filled(value: Fixed) -> Self {
        Self([value; DamageType::COUNT])
    }

    /// Value for a damage type.
    #[inline]
    pub fn get(&self, damage_type: DamageType) -> Fixed {
        self.0[damage_type as usize]
    }

    /// Set the value for a damage type.
    #[inline]
    pub fn set(&mut self, damage_type: DamageType, value: Fixed) {
        self.0[damage_type as usize] = value;
    }

    /// Raw values in `DamageType` order.
    pub fn values(&self) -> &[Fixed; DamageType::COUNT] {
        &self.0
    }
}

// =============================================================================
// COMBAT STATS
// =============================================================================

/// Mutable combat state of one registered actor.
///
/// Plain record: no handles, serializable as-is for replication.
/// Written only by the damage engine and buff engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Maximum health
    pub max_health: Fixed,
    /// Current health, `0..=max_health` unless overheal is allowed
    pub health: Fixed,
    /// Allow healing above `max_health`
    pub allow_overheal: bool,
    /// Armor (mitigates Physical and Explosive damage)
    pub armor: Fixed,
    /// Armor penetration applied when this actor attacks, in [0, 1]
    pub armor_penetration: Fixed,
    /// Shield pool (absorbs part of Energy damage)
    pub shield: Fixed,
    /// Per-type resistance in [0, 1]
    pub resistances: DamageTypeTable,
    /// Per-type vulnerability multiplier, >= 0 (1.0 = neutral)
    pub vulnerabilities: DamageTypeTable,
    /// Outgoing damage multiplier
    pub damage_multiplier: Fixed,
    /// Crit chance in [0, 1]
    pub crit_chance: Fixed,
    /// Crit damage multiplier
    pub crit_multiplier: Fixed,
    /// Outgoing healing multiplier
    pub healing_multiplier: Fixed,
    /// Set once when health first reaches 0
    pub dead: bool,
}

impl CombatStats {
    /// Full-health stats with neutral modifiers.
    pub fn new(max_health: Fixed) -> Self {
        let max_health = fixed_max(max_health, 0);
        Self {
            max_health,
            health: max_health,
            allow_overheal: false,
            armor: 0,
            armor_penetration: 0,
            shield: 0,
            resistances: DamageTypeTable::filled(0),
            vulnerabilities: DamageTypeTable::filled(FIXED_ONE),
            damage_multiplier: FIXED_ONE,
            crit_chance: 0,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
            healing_multiplier: FIXED_ONE,
            dead: false,
        }
    }

    /// Set armor.
    pub fn with_armor(mut self, armor: Fixed) -> Self {
        self.armor = fixed_max(armor, 0);
        self
    }

    /// Set armor penetration, clamped to [0, 1].
    pub fn with_armor_penetration(mut self, penetration: Fixed) -> Self {
        self.armor_penetration = fixed_clamp(penetration, 0, FIXED_ONE);
        self
    }

    /// Set shield.
    pub fn with_shield(mut self, shield: Fixed) -> Self {
        self.shield = fixed_max(shield, 0);
        self
    }

    /// Set a resistance, clamped to [0, 1].
    pub fn with_resistance(mut self, damage_type: DamageType, value: Fixed) -> Self {
        self.resistances.set(damage_type, fixed_clamp(value, 0, FIXED_ONE));
        self
    }

    /// Set a vulnerability multiplier, floored at 0.
    pub fn with_vulnerability(mut self, damage_type: DamageType, value: Fixed) -> Self {
        self.vulnerabilities.set(damage_type, fixed_max(value, 0));
        self
    }

    /// Set crit chance (clamped to [0, 1]) and multiplier.
    pub fn with_crit(mut self, chance: Fixed, multiplier: Fixed) -> Self {
        self.crit_chance = fixed_clamp(chance, 0, FIXED_ONE);
        self.crit_multiplier = fixed_max(multiplier, 0);
        self
    }

    /// Set outgoing damage multiplier.
    pub fn with_damage_multiplier(mut self, multiplier: Fixed) -> Self {
        self.damage_multiplier = fixed_max(multiplier, 0);
        self
    }

    /// Allow healing above max health.
    pub fn with_overheal(mut self) -> Self {
        self.allow_overheal = true;
        self
    }

    /// Is the actor alive?
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Health as a fraction of max (FIXED_ONE = full). 0 when max is 0.
    pub fn health_percent(&self) -> Fixed {
        fixed_div(self.health, self.max_health)
    }

    /// Clamp every field back into its documented range.
    pub fn sanitize(&mut self) {
        self.max_health = fixed_max(self.max_health, 0);
        self.health = if self.allow_overheal {
            fixed_max(self.health, 0)
        } else {
            fixed_clamp(self.health, 0, self.max_health)
        };
        self.armor = fixed_max(self.armor, 0);
        self.armor_penetration = fixed_clamp(self.armor_penetration, 0, FIXED_ONE);
        self.shield = fixed_max(self.shield, 0);
        for damage_type in DamageType::ALL {
            let resist = fixed_clamp(self.resistances.get(damage_type), 0, FIXED_ONE);
            self.resistances.set(damage_type, resist);
            let vuln = fixed_max(self.vulnerabilities.get(damage_type), 0);
            self.vulnerabilities.set(damage_type, vuln);
        }
        self.crit_chance = fixed_clamp(self.crit_chance, 0, FIXED_ONE);
        self.crit_multiplier = fixed_max(self.crit_multiplier, 0);
        self.damage_multiplier = fixed_max(self.damage_multiplier, 0);
        self.healing_multiplier = fixed_max(self.healing_multiplier, 0);
    }

    /// Hash this actor's stats for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_fixed(self.max_health);
        hasher.update_fixed(self.health);
        hasher.update_fixed(self.armor);
        hasher.update_fixed(self.armor_penetration);
        hasher.update_fixed(self.shield);
        for value in self.resistances.values() {
            hasher.update_fixed(*value);
        }
        for value in self.vulnerabilities.values() {
            hasher.update_fixed(*value);
        }
        hasher.update_fixed(self.damage_multiplier);
        hasher.update_fixed(self.crit_chance);
        hasher.update_fixed(self.crit_multiplier);
        hasher.update_bool(self.dead);
    }
}

// =============================================================================
// REGISTRY ENTRY
// =============================================================================

/// Registration entry for one actor: team plus exclusively owned stats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorEntry {
    /// Actor handle
    pub id: ActorId,
    /// Team affiliation
    pub team: TeamId,
    /// Combat stats
    pub stats: CombatStats,
}
