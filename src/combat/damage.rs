//! Damage Resolution
//!
//! ```text
//! raw   = base × attacker.damage_multiplier × crit_multiplier (if crit)
//! typed = raw  → armor (Physical/Explosive) | shield (Energy) | none
//! final = typed × (1 − resistance[type]) × vulnerability[type], ≥ 0
//! ```
//!
//! True damage skips everything after `raw` and never crits.
//! `calculate_damage` is pure; `preview_damage` runs it against live state
//! without touching anything (not even the RNG); `apply_damage` is the only
//! path that lowers health.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_div, fixed_max, fixed_min, fixed_mul};
use crate::core::vec3::FixedVec3;
use crate::combat::actor::{ActorId, CombatStats};
use crate::combat::config::CombatConfig;
use crate::combat::error::CombatError;
use crate::combat::events::CombatEventData;
use crate::combat::state::CombatState;

// =============================================================================
// DAMAGE TYPE
// =============================================================================

/// Damage type, selecting the mitigation formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DamageType {
    /// Mitigated by armor
    Physical = 0,
    /// Mitigated by armor, always at least 50% penetration
    Explosive = 1,
    /// Partly absorbed by shield
    Energy = 2,
    /// Ignores armor
    Fire = 3,
    /// Ignores armor, never crits
    Poison = 4,
    /// Ignores all mitigation, never crits
    True = 5,
}

impl DamageType {
    /// Number of damage types.
    pub const COUNT: usize = 6;

    /// All damage types in index order.
    pub const ALL: [DamageType; Self::COUNT] = [
        DamageType::Physical,
        DamageType::Explosive,
        DamageType::Energy,
        DamageType::Fire,
        DamageType::Poison,
        DamageType::True,
    ];

    /// Can this damage type critically hit?
    #[inline]
    pub fn can_crit(self) -> bool {
        !matches!(self, DamageType::True | DamageType::Poison)
    }

    /// Is this damage type reduced by armor?
    #[inline]
    pub fn uses_armor(self) -> bool {
        matches!(self, DamageType::Physical | DamageType::Explosive)
    }
}

/// How the critical hit is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CritRule {
    /// Roll against the attacker's crit chance (when the type allows crits)
    #[default]
    Roll,
    /// Never crit
    Never,
    /// Crit whenever the type allows it
    Always,
}

// =============================================================================
// REQUEST / RESULT
// =============================================================================

/// One damage calculation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRequest {
    /// Attacker, if any (weak reference, may be gone)
    pub attacker: Option<ActorId>,
    /// Target
    pub target: ActorId,
    /// Damage before any modifier
    pub base_damage: Fixed,
    /// Damage type
    pub damage_type: DamageType,
    /// Crit decision
    pub crit: CritRule,
    /// World-space hit point, for feedback
    pub hit_point: Option<FixedVec3>,
    /// World-space hit normal, for feedback
    pub hit_normal: Option<FixedVec3>,
}

impl DamageRequest {
    /// Request with a rolled crit and no hit location.
    pub fn new(
        attacker: Option<ActorId>,
        target: ActorId,
        base_damage: Fixed,
        damage_type: DamageType,
    ) -> Self {
        Self {
            attacker,
            target,
            base_damage,
            damage_type,
            crit: CritRule::Roll,
            hit_point: None,
            hit_normal: None,
        }
    }

    /// Override the crit decision.
    pub fn with_crit(mut self, crit: CritRule) -> Self {
        self.crit = crit;
        self
    }

    /// Attach a hit location.
    pub fn with_hit(mut self, point: FixedVec3, normal: FixedVec3) -> Self {
        self.hit_point = Some(point);
        self.hit_normal = Some(normal);
        self
    }
}

/// Numbers produced by the damage formula.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageBreakdown {
    /// After attacker multiplier and crit, before type modifier
    pub raw: Fixed,
    /// Taken out of the target's shield
    pub shield_absorbed: Fixed,
    /// Reaches health
    pub final_damage: Fixed,
}

/// Outcome of a damage preview or application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    /// Attacker
    pub attacker: Option<ActorId>,
    /// Target
    pub target: ActorId,
    /// Damage type
    pub damage_type: DamageType,
    /// Formula output
    pub breakdown: DamageBreakdown,
    /// Was it a critical hit?
    pub crit: bool,
    /// Did this hit kill the target?
    pub lethal: bool,
    /// Target health before
    pub health_before: Fixed,
    /// Target health after
    pub health_after: Fixed,
    /// False for previews and for hits on already-dead targets
    pub applied: bool,
}

impl DamageResult {
    /// Damage that reached health.
    #[inline]
    pub fn amount(&self) -> Fixed {
        self.breakdown.final_damage
    }
}

/// Direct or periodic heal request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealRequest {
    /// Healer, if any (weak reference)
    pub healer: Option<ActorId>,
    /// Target
    pub target: ActorId,
    /// Amount before multipliers
    pub amount: Fixed,
    /// Crit decision (uses the configured heal crit chance)
    pub crit: CritRule,
}

/// Outcome of a heal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealResult {
    /// Healer
    pub healer: Option<ActorId>,
    /// Target
    pub target: ActorId,
    /// Amount after multipliers and crit, before the max-health cap
    pub requested: Fixed,
    /// Health actually restored
    pub restored: Fixed,
    /// Was it a critical heal?
    pub crit: bool,
    /// False when the target was dead
    pub applied: bool,
}

// =============================================================================
// PURE CALCULATION
// =============================================================================

/// Damage formula over effective stats.
///
/// `attacker` is `None` for environmental damage or when the attacker has
/// despawned: multiplier 1, no penetration, crit multiplier from config.
pub fn calculate_damage(
    attacker: Option<&CombatStats>,
    target: &CombatStats,
    base_damage: Fixed,
    damage_type: DamageType,
    crit: bool,
    config: &CombatConfig,
) -> DamageBreakdown {
    let base = fixed_max(base_damage, 0);
    let multiplier = attacker.map_or(FIXED_ONE, |a| a.damage_multiplier);
    let mut raw = fixed_mul(base, multiplier);

    let crit = crit && damage_type.can_crit();
    if crit {
        let crit_multiplier = attacker.map_or(config.default_crit_multiplier, |a| a.crit_multiplier);
        raw = fixed_mul(raw, crit_multiplier);
    }

    if damage_type == DamageType::True {
        return DamageBreakdown {
            raw,
            shield_absorbed: 0,
            final_damage: raw,
        };
    }

    let mut shield_absorbed = 0;
    let typed = match damage_type {
        DamageType::Physical | DamageType::Explosive => {
            let mut penetration = attacker.map_or(0, |a| a.armor_penetration);
            if damage_type == DamageType::Explosive {
                penetration = fixed_max(penetration, config.explosive_min_penetration);
            }
            let effective_armor = fixed_mul(target.armor, FIXED_ONE - penetration);
            let reduction = armor_reduction(effective_armor, config.armor_constant);
            fixed_mul(raw, FIXED_ONE - reduction)
        }
        DamageType::Energy => {
            let absorbable = fixed_mul(raw, config.energy_shield_ratio);
            shield_absorbed = fixed_min(fixed_max(target.shield, 0), absorbable);
            raw - shield_absorbed
        }
        DamageType::Fire | DamageType::Poison | DamageType::True => raw,
    };

    let resisted = fixed_mul(typed, FIXED_ONE - target.resistances.get(damage_type));
    let final_damage = fixed_max(fixed_mul(resisted, target.vulnerabilities.get(damage_type)), 0);

    DamageBreakdown {
        raw,
        shield_absorbed,
        final_damage,
    }
}

/// `armor / (armor + k)`, 0 for non-positive armor.
#[inline]
pub fn armor_reduction(effective_armor: Fixed, armor_constant: Fixed) -> Fixed {
    if effective_armor <= 0 {
        return 0;
    }
    fixed_div(effective_armor, effective_armor.saturating_add(armor_constant))
}

// =============================================================================
// CONTEXT OPERATIONS
// =============================================================================

/// Calculate damage against live state without mutating anything.
///
/// Never consumes the RNG: `CritRule::Roll` previews as a non-crit.
pub fn preview_damage(state: &CombatState, request: &DamageRequest) -> Result<DamageResult, CombatError> {
    let target = state.effective_stats(request.target).ok_or_else(|| {
        debug!("preview_damage: unknown target {}", request.target);
        CombatError::UnknownActor(request.target)
    })?;
    let attacker = request.attacker.and_then(|id| state.effective_stats(id));

    let crit = request.crit == CritRule::Always && request.damage_type.can_crit();
    let breakdown = calculate_damage(
        attacker.as_ref(),
        &target,
        request.base_damage,
        request.damage_type,
        crit,
        &state.config,
    );
    let health_after = fixed_max(target.health - breakdown.final_damage, 0);

    Ok(DamageResult {
        attacker: request.attacker,
        target: request.target,
        damage_type: request.damage_type,
        breakdown,
        crit,
        lethal: target.is_alive() && target.health > 0 && health_after == 0,
        health_before: target.health,
        health_after,
        applied: false,
    })
}

/// Calculate and apply damage.
///
/// Emits `DamageApplied`, `HealthChanged` and, the first time health reaches
/// 0, `ActorDied`. Against an already-dead target this is a no-op returning
/// `applied == false`. Unknown targets are a logged no-op.
pub fn apply_damage(state: &mut CombatState, request: &DamageRequest) -> Result<DamageResult, CombatError> {
    let Some(target) = state.effective_stats(request.target) else {
        debug!("apply_damage: unknown target {}", request.target);
        return Err(CombatError::UnknownActor(request.target));
    };

    if !target.is_alive() {
        return Ok(DamageResult {
            attacker: request.attacker,
            target: request.target,
            damage_type: request.damage_type,
            breakdown: DamageBreakdown::default(),
            crit: false,
            lethal: false,
            health_before: target.health,
            health_after: target.health,
            applied: false,
        });
    }

    let attacker = request.attacker.and_then(|id| state.effective_stats(id));
    let crit = roll_damage_crit(state, request, attacker.as_ref());
    let breakdown = calculate_damage(
        attacker.as_ref(),
        &target,
        request.base_damage,
        request.damage_type,
        crit,
        &state.config,
    );

    // Mutate the exclusively owned stats
    let (health_before, health_after, max_health, died) = {
        let stats = state
            .stats_mut(request.target)
            .ok_or(CombatError::UnknownActor(request.target))?;
        let before = stats.health;
        stats.shield = fixed_max(stats.shield - breakdown.shield_absorbed, 0);
        stats.health = fixed_max(stats.health.saturating_sub(breakdown.final_damage), 0);
        let died = stats.health == 0 && !stats.dead;
        if died {
            stats.dead = true;
        }
        (before, stats.health, stats.max_health, died)
    };

    let tick = state.tick;
    state.events.push(tick, CombatEventData::DamageApplied {
        attacker: request.attacker,
        target: request.target,
        amount: breakdown.final_damage,
        shield_absorbed: breakdown.shield_absorbed,
        damage_type: request.damage_type,
        crit,
        lethal: died,
        hit_point: request.hit_point,
        hit_normal: request.hit_normal,
    });
    if health_before != health_after {
        state.events.push(tick, CombatEventData::HealthChanged {
            actor: request.target,
            old_health: health_before,
            new_health: health_after,
            max_health,
        });
    }
    if died {
        info!("Actor {} killed by {:?}", request.target, request.attacker.map(|a| a.to_string()));
        state.events.push(tick, CombatEventData::ActorDied {
            actor: request.target,
            killer: request.attacker,
        });
    }

    if breakdown.final_damage > 0 || died {
        crate::combat::cast::interrupt_on_damage(state, request.target, died);
    }

    Ok(DamageResult {
        attacker: request.attacker,
        target: request.target,
        damage_type: request.damage_type,
        breakdown,
        crit,
        lethal: died,
        health_before,
        health_after,
        applied: true,
    })
}

fn roll_damage_crit(state: &mut CombatState, request: &DamageRequest, attacker: Option<&CombatStats>) -> bool {
    if !request.damage_type.can_crit() {
        return false;
    }
    match request.crit {
        CritRule::Never => false,
        CritRule::Always => true,
        CritRule::Roll => match attacker {
            Some(stats) => state.rng.roll(stats.crit_chance),
            None => false,
        },
    }
}

/// Restore health. Unmitigated by armor or resistance.
///
/// Capped at max health unless the target allows overheal. Dead targets are
/// a no-op (`applied == false`); unknown targets a logged no-op.
pub fn apply_heal(state: &mut CombatState, request: &HealRequest) -> Result<HealResult, CombatError> {
    let Some(target) = state.stats(request.target).cloned() else {
        debug!("apply_heal: unknown target {}", request.target);
        return Err(CombatError::UnknownActor(request.target));
    };

    if !target.is_alive() {
        return Ok(HealResult {
            healer: request.healer,
            target: request.target,
            requested: 0,
            restored: 0,
            crit: false,
            applied: false,
        });
    }

    let crit = match request.crit {
        CritRule::Never => false,
        CritRule::Always => true,
        CritRule::Roll => {
            let chance = state.config.heal_crit_chance;
            state.rng.roll(chance)
        }
    };

    let healing_multiplier = request
        .healer
        .and_then(|id| state.effective_stats(id))
        .map_or(FIXED_ONE, |s| s.healing_multiplier);
    let mut amount = fixed_mul(fixed_max(request.amount, 0), healing_multiplier);
    if crit {
        amount = fixed_mul(amount, state.config.heal_crit_multiplier);
    }

    let (before, after, max_health) = {
        let stats = state
            .stats_mut(request.target)
            .ok_or(CombatError::UnknownActor(request.target))?;
        let before = stats.health;
        let healed = stats.health.saturating_add(amount);
        stats.health = if stats.allow_overheal {
            healed
        } else {
            fixed_min(healed, fixed_max(stats.max_health, before))
        };
        (before, stats.health, stats.max_health)
    };

    let restored = after - before;
    let tick = state.tick;
    state.events.push(tick, CombatEventData::HealApplied {
        healer: request.healer,
        target: request.target,
        amount: restored,
        crit,
    });
    if restored != 0 {
        state.events.push(tick, CombatEventData::HealthChanged {
            actor: request.target,
            old_health: before,
            new_health: after,
            max_health,
        });
    }

    Ok(HealResult {
        healer: request.healer,
        target: request.target,
        requested: amount,
        restored,
        crit,
        applied: true,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, to_fixed, FIXED_HALF};
    use crate::combat::actor::TeamId;
    use crate::combat::events::CombatEventData;
    use proptest::prelude::*;

    fn config() -> CombatConfig {
        CombatConfig::default()
    }

    fn state_with(target: CombatStats) -> (CombatState, ActorId, ActorId) {
        let mut state = CombatState::new([0; 16], 7, config());
        let attacker = ActorId::new([1; 16]);
        let victim = ActorId::new([2; 16]);
        state.register_actor(attacker, TeamId(0), CombatStats::new(from_int(100))).unwrap();
        state.register_actor(victim, TeamId(1), target).unwrap();
        (state, attacker, victim)
    }

    #[test]
    fn test_physical_armor_halves_damage() {
        let target = CombatStats::new(from_int(500)).with_armor(from_int(100));
        let out = calculate_damage(None, &target, from_int(100), DamageType::Physical, false, &config());
        assert_eq!(out.final_damage, from_int(50));
    }

    #[test]
    fn test_penetration_reduces_effective_armor() {
        let attacker = CombatStats::new(from_int(100)).with_armor_penetration(FIXED_HALF);
        let target = CombatStats::new(from_int(500)).with_armor(from_int(200));
        // effective armor 100 -> 50% reduction
        let out = calculate_damage(Some(&attacker), &target, from_int(100), DamageType::Physical, false, &config());
        assert_eq!(out.final_damage, from_int(50));
    }

    #[test]
    fn test_explosive_forces_half_penetration() {
        let target = CombatStats::new(from_int(500)).with_armor(from_int(200));
        let physical = calculate_damage(None, &target, from_int(100), DamageType::Physical, false, &config());
        let explosive = calculate_damage(None, &target, from_int(100), DamageType::Explosive, false, &config());
        // Physical: 200 armor -> 2/3 reduction. Explosive: 100 armor -> 1/2.
        assert!(physical.final_damage < explosive.final_damage);
        assert_eq!(explosive.final_damage, from_int(50));
    }

    #[test]
    fn test_energy_shield_absorbs_half() {
        let target = CombatStats::new(from_int(500)).with_shield(from_int(100));
        let out = calculate_damage(None, &target, from_int(40), DamageType::Energy, false, &config());
        assert_eq!(out.shield_absorbed, from_int(20));
        assert_eq!(out.final_damage, from_int(20));
    }

    #[test]
    fn test_energy_small_shield_absorbs_what_it_has() {
        let target = CombatStats::new(from_int(500)).with_shield(from_int(5));
        let out = calculate_damage(None, &target, from_int(40), DamageType::Energy, false, &config());
        assert_eq!(out.shield_absorbed, from_int(5));
        assert_eq!(out.final_damage, from_int(35));
    }

    #[test]
    fn test_fire_ignores_armor_but_not_resistance() {
        let target = CombatStats::new(from_int(500))
            .with_armor(from_int(1000))
            .with_resistance(DamageType::Fire, FIXED_HALF)
            .with_vulnerability(DamageType::Fire, from_int(2));
        let out = calculate_damage(None, &target, from_int(50), DamageType::Fire, false, &config());
        assert_eq!(out.final_damage, from_int(50));
    }

    #[test]
    fn test_true_damage_bypasses_everything() {
        let attacker = CombatStats::new(from_int(100)).with_crit(FIXED_ONE, from_int(3));
        let target = CombatStats::new(from_int(500))
            .with_armor(from_int(1000))
            .with_shield(from_int(1000))
            .with_resistance(DamageType::True, FIXED_ONE)
            .with_vulnerability(DamageType::True, 0);
        let out = calculate_damage(Some(&attacker), &target, from_int(30), DamageType::True, true, &config());
        assert_eq!(out.final_damage, from_int(30));
        assert_eq!(out.shield_absorbed, 0);
    }

    #[test]
    fn test_crit_multiplier_from_attacker() {
        let attacker = CombatStats::new(from_int(100)).with_crit(FIXED_ONE, from_int(3));
        let target = CombatStats::new(from_int(500));
        let out = calculate_damage(Some(&attacker), &target, from_int(10), DamageType::Fire, true, &config());
        assert_eq!(out.final_damage, from_int(30));
        // Poison can't crit even when asked to
        let out = calculate_damage(Some(&attacker), &target, from_int(10), DamageType::Poison, true, &config());
        assert_eq!(out.final_damage, from_int(10));
    }

    #[test]
    fn test_apply_fire_scenario() {
        let (mut state, attacker, victim) = state_with(CombatStats::new(from_int(100)));
        let request = DamageRequest::new(Some(attacker), victim, from_int(50), DamageType::Fire)
            .with_crit(CritRule::Never);
        let result = apply_damage(&mut state, &request).unwrap();
        assert!(result.applied);
        assert_eq!(state.stats(victim).unwrap().health, from_int(50));
        assert_eq!(result.amount(), from_int(50));
    }

    #[test]
    fn test_apply_energy_drains_shield() {
        let (mut state, attacker, victim) =
            state_with(CombatStats::new(from_int(100)).with_shield(from_int(100)));
        let request = DamageRequest::new(Some(attacker), victim, from_int(40), DamageType::Energy);
        apply_damage(&mut state, &request).unwrap();
        let stats = state.stats(victim).unwrap();
        assert_eq!(stats.shield, from_int(80));
        assert_eq!(stats.health, from_int(80));
    }

    #[test]
    fn test_preview_never_mutates() {
        let (mut state, attacker, victim) = state_with(CombatStats::new(from_int(100)));
        let rng_before = state.rng.state();
        let request = DamageRequest::new(Some(attacker), victim, from_int(500), DamageType::Physical);
        let preview = preview_damage(&state, &request).unwrap();
        assert!(!preview.applied);
        assert!(preview.lethal);
        assert_eq!(state.stats(victim).unwrap().health, from_int(100));
        assert_eq!(state.rng.state(), rng_before);
        assert!(state.events.pending().is_empty());

        let applied = apply_damage(&mut state, &request).unwrap();
        assert!(applied.applied);
        assert_eq!(state.stats(victim).unwrap().health, 0);
    }

    #[test]
    fn test_death_notified_exactly_once() {
        let (mut state, attacker, victim) = state_with(CombatStats::new(from_int(10)));
        let request = DamageRequest::new(Some(attacker), victim, from_int(25), DamageType::True);
        let first = apply_damage(&mut state, &request).unwrap();
        assert!(first.lethal);
        let second = apply_damage(&mut state, &request).unwrap();
        assert!(!second.applied);
        assert!(!second.lethal);

        let deaths = state
            .events
            .pending()
            .iter()
            .filter(|e| matches!(e.data, CombatEventData::ActorDied { .. }))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_unknown_target_is_noop() {
        let (mut state, attacker, _) = state_with(CombatStats::new(from_int(10)));
        let ghost = ActorId::new([9; 16]);
        let err = apply_damage(&mut state, &DamageRequest::new(Some(attacker), ghost, FIXED_ONE, DamageType::Fire))
            .unwrap_err();
        assert_eq!(err, CombatError::UnknownActor(ghost));
        assert!(state.events.pending().is_empty());
    }

    #[test]
    fn test_despawned_attacker_still_deals_damage() {
        let (mut state, attacker, victim) = state_with(CombatStats::new(from_int(100)));
        state.unregister_actor(attacker);
        let request = DamageRequest::new(Some(attacker), victim, from_int(10), DamageType::Physical);
        let result = apply_damage(&mut state, &request).unwrap();
        assert_eq!(result.amount(), from_int(10));
        assert!(!result.crit);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let (mut state, healer, victim) = state_with(CombatStats::new(from_int(100)));
        apply_damage(&mut state, &DamageRequest::new(None, victim, from_int(30), DamageType::True)).unwrap();
        let heal = HealRequest {
            healer: Some(healer),
            target: victim,
            amount: from_int(50),
            crit: CritRule::Never,
        };
        let result = apply_heal(&mut state, &heal).unwrap();
        assert_eq!(result.restored, from_int(30));
        assert_eq!(state.stats(victim).unwrap().health, from_int(100));
    }

    #[test]
    fn test_heal_crit_and_overheal() {
        let (mut state, healer, victim) =
            state_with(CombatStats::new(from_int(100)).with_overheal());
        let heal = HealRequest {
            healer: Some(healer),
            target: victim,
            amount: from_int(20),
            crit: CritRule::Always,
        };
        let result = apply_heal(&mut state, &heal).unwrap();
        assert!(result.crit);
        assert_eq!(result.restored, from_int(30));
        assert_eq!(state.stats(victim).unwrap().health, from_int(130));
    }

    #[test]
    fn test_heal_ignores_dead() {
        let (mut state, healer, victim) = state_with(CombatStats::new(from_int(10)));
        apply_damage(&mut state, &DamageRequest::new(None, victim, from_int(10), DamageType::True)).unwrap();
        let heal = HealRequest {
            healer: Some(healer),
            target: victim,
            amount: from_int(20),
            crit: CritRule::Never,
        };
        let result = apply_heal(&mut state, &heal).unwrap();
        assert!(!result.applied);
        assert_eq!(state.stats(victim).unwrap().health, 0);
    }

    #[test]
    fn test_armor_reduction_edges() {
        assert_eq!(armor_reduction(0, from_int(100)), 0);
        assert_eq!(armor_reduction(-from_int(5), from_int(100)), 0);
        assert_eq!(armor_reduction(from_int(100), from_int(100)), FIXED_HALF);
        assert!(armor_reduction(from_int(10000), from_int(100)) < FIXED_ONE);
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_range(
            max in 1i32..5000,
            hits in proptest::collection::vec((0i32..2000, 0usize..6), 1..20),
        ) {
            let (mut state, attacker, victim) = state_with(CombatStats::new(from_int(max)));
            for (amount, kind) in hits {
                let request = DamageRequest::new(Some(attacker), victim, from_int(amount), DamageType::ALL[kind]);
                apply_damage(&mut state, &request).unwrap();
                let stats = state.stats(victim).unwrap();
                prop_assert!(stats.health >= 0 && stats.health <= stats.max_health);
            }
        }

        #[test]
        fn prop_true_damage_is_exact(
            base in 0i32..1000,
            armor in 0i32..1000,
            resist in 0i32..=100,
        ) {
            let attacker = CombatStats::new(from_int(100)).with_crit(FIXED_ONE, from_int(4));
            let target = CombatStats::new(from_int(100))
                .with_armor(from_int(armor))
                .with_resistance(DamageType::True, fixed_div(from_int(resist), from_int(100)));
            let out = calculate_damage(Some(&attacker), &target, from_int(base), DamageType::True, true, &CombatConfig::default());
            prop_assert_eq!(out.final_damage, from_int(base));
        }

        #[test]
        fn prop_damage_never_negative(
            base in -100i32..1000,
            vuln in 0i32..400,
            kind in 0usize..6,
        ) {
            let target = CombatStats::new(from_int(100))
                .with_vulnerability(DamageType::ALL[kind], to_fixed(vuln as f64 / 100.0));
            let out = calculate_damage(None, &target, from_int(base), DamageType::ALL[kind], false, &CombatConfig::default());
            prop_assert!(out.final_damage >= 0);
        }
    }
}
