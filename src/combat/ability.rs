//! Ability Definitions and Cast Records
//!
//! Definitions are immutable session config registered into `CombatState`.
//! A `CastRequest` is built per attempt; the orchestrator answers with a
//! `CastResult` that records what happened, never what it cost.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, DEG_360};
use crate::core::vec3::FixedVec3;
use crate::combat::actor::ActorId;
use crate::combat::buff::{BuffId, BuffTemplate};
use crate::combat::damage::{DamageResult, DamageType, HealResult};
use crate::combat::error::{CombatError, ConfigError};
use crate::combat::projectile::{ProjectileDefId, ProjectileId};

// =============================================================================
// IDS AND ENUMS
// =============================================================================

/// Ability identifier, unique within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct AbilityId(pub u32);

/// Handle tying a pending timed cast to its later completion or interruption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CastContextId(pub u64);

/// What an ability does to each resolved target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityType {
    /// Damage through the damage engine
    Damage,
    /// Direct heal
    Healing,
    /// Beneficial buff from the ability's template
    Buff,
    /// Harmful buff from the ability's template
    Debuff,
    /// Delegated to gameplay hooks
    Utility,
    /// Delegated to gameplay hooks
    Summon,
    /// Launches the ability's projectile definition
    Projectile,
}

/// How targets are acquired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    /// The caster only
    #[serde(rename = "Self")]
    SelfTarget,
    /// First actor along a ray
    SingleTarget,
    /// Sphere of `radius` at a target point within `range`
    GroundTarget,
    /// Sphere of `radius` around the caster
    Sphere,
    /// Every actor along a ray, in ray order
    #[serde(alias = "Direction")]
    Line,
    /// Actors within `range` and `cone_angle` of the cast direction
    Cone,
}

impl TargetMode {
    /// Does this mode need a cast direction?
    pub fn is_directional(self) -> bool {
        matches!(self, TargetMode::SingleTarget | TargetMode::Line | TargetMode::Cone)
    }
}

/// Resource pool an ability draws from. Accounting is external.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Mana
    Mana,
    /// Stamina
    Stamina,
    /// Energy
    Energy,
    /// Health spent as a resource
    Health,
    /// Game-specific pool
    Custom(u16),
}

/// One resource cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityCost {
    /// Pool
    pub kind: ResourceKind,
    /// Amount
    pub amount: Fixed,
}

// =============================================================================
// DEFINITION
// =============================================================================

/// Immutable per-ability configuration.
///
/// Durations are in seconds, distances in world units, angles in degrees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Identifier
    pub id: AbilityId,
    /// Display name, also handed to the cast timer
    pub name: String,
    /// Effect kind
    pub ability_type: AbilityType,
    /// Acquisition mode
    pub target_mode: TargetMode,
    /// Damage type for Damage abilities
    #[serde(default = "default_damage_type")]
    pub damage_type: DamageType,
    /// Damage or heal amount
    #[serde(default)]
    pub base_power: Fixed,
    /// Resource costs, checked before casting and paid by the caller
    #[serde(default)]
    pub costs: Vec<AbilityCost>,
    /// Cooldown duration, checked before casting and started by the caller
    #[serde(default)]
    pub cooldown: Fixed,
    /// Cast time; 0 resolves immediately
    #[serde(default)]
    pub cast_time: Fixed,
    /// May the caster move while casting?
    #[serde(default)]
    pub movable_while_casting: bool,
    /// Does damage taken interrupt the cast?
    #[serde(default)]
    pub interruptible_by_damage: bool,
    /// Ray length, ground-target reach, cone reach
    #[serde(default)]
    pub range: Fixed,
    /// Sphere radius for GroundTarget and Sphere
    #[serde(default)]
    pub radius: Fixed,
    /// Full cone angle in degrees
    #[serde(default)]
    pub cone_angle: Fixed,
    /// Target cap, 0 = unlimited
    #[serde(default)]
    pub max_targets: u32,
    /// Keep same-team targets
    #[serde(default)]
    pub allow_friendly_fire: bool,
    /// Keep only same-team targets (caster included)
    #[serde(default)]
    pub allies_only: bool,
    /// Volume and ray modes may include the caster
    #[serde(default)]
    pub can_target_self: bool,
    /// Re-check obstruction between caster and each target
    #[serde(default)]
    pub requires_line_of_sight: bool,
    /// Buff applied by Buff/Debuff abilities
    #[serde(default)]
    pub buff: Option<BuffTemplate>,
    /// Projectile launched by Projectile abilities
    #[serde(default)]
    pub projectile: Option<ProjectileDefId>,
}

fn default_damage_type() -> DamageType {
    DamageType::Physical
}

impl AbilityDefinition {
    /// Definition with no power, range or costs.
    pub fn new(id: AbilityId, name: impl Into<String>, ability_type: AbilityType, target_mode: TargetMode) -> Self {
        Self {
            id,
            name: name.into(),
            ability_type,
            target_mode,
            damage_type: DamageType::Physical,
            base_power: 0,
            costs: Vec::new(),
            cooldown: 0,
            cast_time: 0,
            movable_while_casting: false,
            interruptible_by_damage: false,
            range: 0,
            radius: 0,
            cone_angle: 0,
            max_targets: 0,
            allow_friendly_fire: false,
            allies_only: false,
            can_target_self: false,
            requires_line_of_sight: false,
            buff: None,
            projectile: None,
        }
    }

    /// Set damage type and power.
    pub fn with_power(mut self, damage_type: DamageType, base_power: Fixed) -> Self {
        self.damage_type = damage_type;
        self.base_power = base_power;
        self
    }

    /// Set range.
    pub fn with_range(mut self, range: Fixed) -> Self {
        self.range = range;
        self
    }

    /// Set sphere radius.
    pub fn with_radius(mut self, radius: Fixed) -> Self {
        self.radius = radius;
        self
    }

    /// Set full cone angle (degrees).
    pub fn with_cone_angle(mut self, degrees: Fixed) -> Self {
        self.cone_angle = degrees;
        self
    }

    /// Set target cap.
    pub fn with_max_targets(mut self, max_targets: u32) -> Self {
        self.max_targets = max_targets;
        self
    }

    /// Set cast time and flags.
    pub fn with_cast_time(mut self, cast_time: Fixed, movable: bool, interruptible_by_damage: bool) -> Self {
        self.cast_time = cast_time;
        self.movable_while_casting = movable;
        self.interruptible_by_damage = interruptible_by_damage;
        self
    }

    /// Set cooldown.
    pub fn with_cooldown(mut self, cooldown: Fixed) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Add a resource cost.
    pub fn with_cost(mut self, kind: ResourceKind, amount: Fixed) -> Self {
        self.costs.push(AbilityCost { kind, amount });
        self
    }

    /// Set the buff template.
    pub fn with_buff(mut self, buff: BuffTemplate) -> Self {
        self.buff = Some(buff);
        self
    }

    /// Set the projectile definition.
    pub fn with_projectile(mut self, projectile: ProjectileDefId) -> Self {
        self.projectile = Some(projectile);
        self
    }

    /// Keep same-team targets.
    pub fn friendly_fire(mut self) -> Self {
        self.allow_friendly_fire = true;
        self
    }

    /// Keep only same-team targets.
    pub fn allies_only(mut self) -> Self {
        self.allies_only = true;
        self
    }

    /// Allow the caster in volume and ray results.
    pub fn can_target_self(mut self) -> Self {
        self.can_target_self = true;
        self
    }

    /// Require an unobstructed line to each target.
    pub fn requires_line_of_sight(mut self) -> Self {
        self.requires_line_of_sight = true;
        self
    }

    /// Parse a definition from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let definition: Self = serde_json::from_str(json)?;
        definition
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(definition)
    }

    /// Check the definition is internally consistent.
    pub fn validate(&self) -> Result<(), CombatError> {
        let invalid = |reason: &str| CombatError::InvalidDefinition(format!("ability {:?} ({}): {}", self.id, self.name, reason));

        if self.name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.base_power < 0 {
            return Err(invalid("base_power is negative"));
        }
        if self.range < 0 || self.radius < 0 {
            return Err(invalid("range and radius must not be negative"));
        }
        if self.cooldown < 0 || self.cast_time < 0 {
            return Err(invalid("cooldown and cast_time must not be negative"));
        }
        if !(0..=DEG_360).contains(&self.cone_angle) {
            return Err(invalid("cone_angle must be in [0, 360]"));
        }
        if self.costs.iter().any(|c| c.amount < 0) {
            return Err(invalid("cost amount is negative"));
        }
        match self.ability_type {
            AbilityType::Buff | AbilityType::Debuff => match &self.buff {
                Some(template) => template.validate()?,
                None => return Err(invalid("buff ability without a buff template")),
            },
            AbilityType::Projectile if self.projectile.is_none() => {
                return Err(invalid("projectile ability without a projectile definition"));
            }
            _ => {}
        }
        Ok(())
    }
}

// =============================================================================
// CAST REQUEST / RESULT
// =============================================================================

/// One cast attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastRequest {
    /// Caster
    pub caster: ActorId,
    /// Ability to cast
    pub ability: AbilityId,
    /// Aim direction (need not be normalized)
    pub direction: FixedVec3,
    /// Ground target point
    pub target_point: FixedVec3,
    /// Explicit target actor (SingleTarget aim, homing target)
    pub target_actor: Option<ActorId>,
}

impl CastRequest {
    /// Request with no aim.
    pub fn new(caster: ActorId, ability: AbilityId) -> Self {
        Self {
            caster,
            ability,
            direction: FixedVec3::ZERO,
            target_point: FixedVec3::ZERO,
            target_actor: None,
        }
    }

    /// Aim along a direction.
    pub fn toward(mut self, direction: FixedVec3) -> Self {
        self.direction = direction;
        self
    }

    /// Aim at a ground point.
    pub fn at_point(mut self, point: FixedVec3) -> Self {
        self.target_point = point;
        self
    }

    /// Aim at an actor.
    pub fn on_actor(mut self, actor: ActorId) -> Self {
        self.target_actor = Some(actor);
        self
    }
}

/// Why a cast did not resolve. Not an error: nothing was mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastFailure {
    /// Ability id not registered
    UnknownAbility,
    /// Caster not registered
    UnknownCaster,
    /// Caster has no pose in the spatial world
    CasterNotInWorld,
    /// Caster is dead
    CasterDead,
    /// Caster already has a pending cast
    AlreadyCasting,
    /// Directional mode with a zero direction
    InvalidDirection,
    /// Ground point beyond range
    OutOfRange,
    /// Ground point obstructed
    NoLineOfSight,
    /// Cooldown gate refused
    OnCooldown,
    /// Resource gate refused
    InsufficientResource(ResourceKind),
    /// Acquisition came back empty
    NoValidTargets,
    /// Pending cast was interrupted before completing
    Interrupted,
    /// Completion for a context that never existed or already finished
    UnknownContext,
    /// Projectile could not be spawned
    CapacityExceeded,
}

/// Terminal state of a cast attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastOutcome {
    /// Effects were dispatched
    Completed,
    /// Timed cast handed to the cast timer
    CastStarted {
        /// Context the timer reports back with
        context: CastContextId,
    },
    /// Nothing happened
    Failed(CastFailure),
}

/// What one target received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectRecord {
    /// Damage engine result
    Damage(DamageResult),
    /// Heal result
    Heal(HealResult),
    /// Buff applied or refreshed
    Buff {
        /// Instance id
        id: BuffId,
        /// True if an existing (name, caster) instance was refreshed
        refreshed: bool,
    },
    /// Target was at its buff cap
    BuffRejected,
    /// Utility hook invoked
    Utility,
    /// Summon hook invoked
    Summon,
    /// Target vanished between acquisition and dispatch
    Skipped,
}

/// Effect on one target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEffect {
    /// Target
    pub target: ActorId,
    /// Effect
    pub effect: EffectRecord,
}

/// Structured answer to a cast attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastResult {
    /// Ability
    pub ability: AbilityId,
    /// Caster
    pub caster: ActorId,
    /// Outcome
    pub outcome: CastOutcome,
    /// Resolved targets in dispatch order
    pub targets: Vec<ActorId>,
    /// Per-target effects in dispatch order
    pub effects: Vec<TargetEffect>,
    /// Spawned projectile for Projectile abilities
    pub projectile: Option<ProjectileId>,
}

impl CastResult {
    /// A failed result with no effects.
    pub fn failed(ability: AbilityId, caster: ActorId, reason: CastFailure) -> Self {
        Self {
            ability,
            caster,
            outcome: CastOutcome::Failed(reason),
            targets: Vec::new(),
            effects: Vec::new(),
            projectile: None,
        }
    }

    /// Did effects get dispatched?
    pub fn is_completed(&self) -> bool {
        self.outcome == CastOutcome::Completed
    }

    /// Failure reason, if any.
    pub fn failure(&self) -> Option<CastFailure> {
        match self.outcome {
            CastOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Sum of damage dealt to health.
    pub fn total_damage(&self) -> Fixed {
        self.effects
            .iter()
            .filter_map(|e| match &e.effect {
                EffectRecord::Damage(d) => Some(d.amount()),
                _ => None,
            })
            .fold(0, Fixed::saturating_add)
    }

    /// Sum of health restored.
    pub fn total_healing(&self) -> Fixed {
        self.effects
            .iter()
            .filter_map(|e| match &e.effect {
                EffectRecord::Heal(h) => Some(h.restored),
                _ => None,
            })
            .fold(0, Fixed::saturating_add)
    }
}

/// Whether a cast that found no targets still pays its costs.
///
/// No default; every call site picks one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhiffPolicy {
    /// Start cooldown and consume resources even with no targets
    Charge,
    /// A whiff is free
    Free,
}
