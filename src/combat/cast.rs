//! Cast Orchestrator
//!
//! ```text
//! cast_ability ──► validate ──► gates ──► cast_time > 0 ? ──► CastStarted
//!                                              │                   │
//!                                              ▼          complete_cast / interrupt_cast
//!                                           resolve ◄──────────────┘
//!                                              │
//!                         acquire targets ──► dispatch per target ──► CastResult
//! ```
//!
//! Dispatch never touches cooldowns or resources. The caller pays through
//! `pay_cast_costs` once it knows what happened.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::combat::ability::{
    AbilityDefinition, AbilityId, AbilityType, CastContextId, CastFailure, CastOutcome,
    CastRequest, CastResult, EffectRecord, TargetEffect, TargetMode, WhiffPolicy,
};
use crate::combat::actor::ActorId;
use crate::combat::buff::{apply_buff, BuffApplication};
use crate::combat::damage::{apply_damage, apply_heal, CritRule, DamageRequest, HealRequest};
use crate::combat::error::CombatError;
use crate::combat::events::{CastInterruptReason, CombatEventData};
use crate::combat::projectile::spawn_projectile;
use crate::combat::services::CastServices;
use crate::combat::spatial::SpatialQuery;
use crate::combat::state::CombatState;
use crate::combat::targeting::{acquire_targets, aim_direction};

// =============================================================================
// PENDING CASTS
// =============================================================================

/// Interrupted contexts remembered for a late `complete_cast`, oldest evicted first.
pub const MAX_INTERRUPT_MARKERS: usize = 64;

/// A timed cast waiting for its timer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCast {
    /// Context handed to the timer
    pub context: CastContextId,
    /// Original request
    pub request: CastRequest,
    /// Damage taken interrupts it
    pub interruptible_by_damage: bool,
    /// Tick the cast started
    pub started_tick: u32,
}

/// Pending casts, at most one per caster.
#[derive(Clone, Debug, Default)]
pub struct CastTracker {
    pending: BTreeMap<CastContextId, PendingCast>,
    by_caster: BTreeMap<ActorId, CastContextId>,
    interrupted: BTreeSet<CastContextId>,
    next_context: u64,
}

impl CastTracker {
    /// No pending casts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Is the actor mid-cast?
    pub fn is_casting(&self, caster: ActorId) -> bool {
        self.by_caster.contains_key(&caster)
    }

    /// The actor's pending cast.
    pub fn pending_for(&self, caster: ActorId) -> Option<&PendingCast> {
        self.by_caster.get(&caster).and_then(|ctx| self.pending.get(ctx))
    }

    /// Number of pending casts.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// No pending casts?
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Interrupted contexts still remembered.
    pub fn interrupt_markers(&self) -> usize {
        self.interrupted.len()
    }

    fn begin(&mut self, request: &CastRequest, interruptible_by_damage: bool, tick: u32) -> CastContextId {
        self.next_context += 1;
        let context = CastContextId(self.next_context);
        self.pending.insert(context, PendingCast {
            context,
            request: request.clone(),
            interruptible_by_damage,
            started_tick: tick,
        });
        self.by_caster.insert(request.caster, context);
        context
    }

    fn take(&mut self, context: CastContextId) -> Option<PendingCast> {
        let cast = self.pending.remove(&context)?;
        self.by_caster.remove(&cast.request.caster);
        Some(cast)
    }

    fn interrupt(&mut self, context: CastContextId) -> Option<PendingCast> {
        let cast = self.take(context)?;
        self.interrupted.insert(context);
        // Context ids only grow, so the first entry is the oldest
        while self.interrupted.len() > MAX_INTERRUPT_MARKERS {
            self.interrupted.pop_first();
        }
        Some(cast)
    }

    /// Consume the interrupted marker for a context.
    fn was_interrupted(&mut self, context: CastContextId) -> bool {
        self.interrupted.remove(&context)
    }
}

// =============================================================================
// CAST
// =============================================================================

/// Attempt a cast.
///
/// Validation and gate failures return `Failed` with nothing mutated. Timed
/// abilities are handed to the cast timer and return `CastStarted`.
pub fn cast_ability(
    state: &mut CombatState,
    world: &dyn SpatialQuery,
    services: &mut CastServices<'_>,
    request: &CastRequest,
) -> CastResult {
    let Some(ability) = state.ability(request.ability).cloned() else {
        debug!("cast rejected: unknown ability {:?}", request.ability);
        return CastResult::failed(request.ability, request.caster, CastFailure::UnknownAbility);
    };

    if state.casts.is_casting(request.caster) {
        return CastResult::failed(ability.id, request.caster, CastFailure::AlreadyCasting);
    }
    if let Err(reason) = validate_cast(state, world, services, &ability, request) {
        debug!("cast {} by {} rejected: {:?}", ability.name, request.caster, reason);
        return CastResult::failed(ability.id, request.caster, reason);
    }

    if ability.cast_time > 0 {
        let tick = state.tick;
        let context = state.casts.begin(request, ability.interruptible_by_damage, tick);
        services.timer.start_cast(
            request.caster,
            &ability.name,
            ability.cast_time,
            ability.movable_while_casting,
            ability.interruptible_by_damage,
            context,
        );
        state.events.push(tick, CombatEventData::CastStarted {
            caster: request.caster,
            ability: ability.id,
            context,
        });
        return CastResult {
            ability: ability.id,
            caster: request.caster,
            outcome: CastOutcome::CastStarted { context },
            targets: Vec::new(),
            effects: Vec::new(),
            projectile: None,
        };
    }

    resolve(state, world, services, &ability, request)
}

/// Finish a timed cast. Re-validates against the current world first.
pub fn complete_cast(
    state: &mut CombatState,
    world: &dyn SpatialQuery,
    services: &mut CastServices<'_>,
    context: CastContextId,
) -> CastResult {
    let Some(pending) = state.casts.take(context) else {
        let reason = if state.casts.was_interrupted(context) {
            CastFailure::Interrupted
        } else {
            CastFailure::UnknownContext
        };
        debug!("complete_cast {:?}: {:?}", context, reason);
        return CastResult::failed(AbilityId::default(), ActorId::default(), reason);
    };

    let request = pending.request;
    let Some(ability) = state.ability(request.ability).cloned() else {
        return CastResult::failed(request.ability, request.caster, CastFailure::UnknownAbility);
    };
    if let Err(reason) = validate_cast(state, world, services, &ability, &request) {
        debug!("cast {} by {} failed on completion: {:?}", ability.name, request.caster, reason);
        return CastResult::failed(ability.id, request.caster, reason);
    }

    resolve(state, world, services, &ability, &request)
}

/// Cancel a pending cast on the timer's behalf. Returns false if unknown.
pub fn interrupt_cast(state: &mut CombatState, context: CastContextId) -> bool {
    match state.casts.interrupt(context) {
        Some(cast) => {
            emit_interrupted(state, &cast, CastInterruptReason::External);
            true
        }
        None => false,
    }
}

/// Called by the damage engine after a hit lands on `actor`.
pub(crate) fn interrupt_on_damage(state: &mut CombatState, actor: ActorId, died: bool) {
    let Some(pending) = state.casts.pending_for(actor) else {
        return;
    };
    if !died && !pending.interruptible_by_damage {
        return;
    }
    let context = pending.context;
    if let Some(cast) = state.casts.interrupt(context) {
        let reason = if died {
            CastInterruptReason::CasterLost
        } else {
            CastInterruptReason::Damage
        };
        emit_interrupted(state, &cast, reason);
    }
}

/// Drop the actor's pending cast, e.g. on unregistration.
pub(crate) fn cancel_casts_for(state: &mut CombatState, actor: ActorId) {
    if let Some(context) = state.casts.pending_for(actor).map(|c| c.context) {
        if let Some(cast) = state.casts.interrupt(context) {
            emit_interrupted(state, &cast, CastInterruptReason::CasterLost);
        }
    }
}

fn emit_interrupted(state: &mut CombatState, cast: &PendingCast, reason: CastInterruptReason) {
    info!("Cast {:?} by {} interrupted ({:?})", cast.context, cast.request.caster, reason);
    let tick = state.tick;
    state.events.push(tick, CombatEventData::CastInterrupted {
        caster: cast.request.caster,
        ability: cast.request.ability,
        context: cast.context,
        reason,
    });
}

/// Well-formedness and authoritative gate checks. Mutates nothing.
fn validate_cast(
    state: &CombatState,
    world: &dyn SpatialQuery,
    services: &CastServices<'_>,
    ability: &AbilityDefinition,
    request: &CastRequest,
) -> Result<(), CastFailure> {
    let caster = request.caster;
    let stats = state.stats(caster).ok_or(CastFailure::UnknownCaster)?;
    if !stats.is_alive() {
        return Err(CastFailure::CasterDead);
    }
    let pose = world.actor_pose(caster).ok_or(CastFailure::CasterNotInWorld)?;

    let needs_direction = ability.ability_type == AbilityType::Projectile
        || (ability.target_mode.is_directional() && ability.target_mode != TargetMode::Cone);
    let self_aim = ability.can_target_self && request.target_actor == Some(caster);
    if needs_direction && !self_aim && aim_direction(world, &pose, request).is_zero() {
        return Err(CastFailure::InvalidDirection);
    }
    if ability.target_mode == TargetMode::GroundTarget
        && ability.ability_type != AbilityType::Projectile
        && !pose.position.within(request.target_point, ability.range)
    {
        return Err(CastFailure::OutOfRange);
    }

    if services.cooldowns.is_on_cooldown(caster, ability.id) {
        return Err(CastFailure::OnCooldown);
    }
    if let Some(cost) = ability
        .costs
        .iter()
        .find(|cost| !services.resources.has_resource(caster, cost.kind, cost.amount))
    {
        return Err(CastFailure::InsufficientResource(cost.kind));
    }
    Ok(())
}

/// Acquire targets and dispatch effects.
fn resolve(
    state: &mut CombatState,
    world: &dyn SpatialQuery,
    services: &mut CastServices<'_>,
    ability: &AbilityDefinition,
    request: &CastRequest,
) -> CastResult {
    let caster = request.caster;

    if ability.ability_type == AbilityType::Projectile {
        return launch(state, world, ability, request);
    }

    let targets = match acquire_targets(state, world, ability, request) {
        Ok(targets) => targets,
        Err(reason) => return CastResult::failed(ability.id, caster, reason),
    };

    let caster_position = world.actor_pose(caster).map(|p| p.position);
    let mut effects = Vec::with_capacity(targets.len());

    for &target in &targets {
        let effect = match ability.ability_type {
            AbilityType::Damage => {
                let mut damage = DamageRequest::new(Some(caster), target, ability.base_power, ability.damage_type);
                if let (Some(from), Some(pose)) = (caster_position, world.actor_pose(target)) {
                    let normal = from.sub(pose.position).normalize();
                    damage = damage.with_hit(pose.position, normal);
                }
                match apply_damage(state, &damage) {
                    Ok(result) => EffectRecord::Damage(result),
                    Err(_) => EffectRecord::Skipped,
                }
            }
            AbilityType::Healing => {
                let heal = HealRequest {
                    healer: Some(caster),
                    target,
                    amount: ability.base_power,
                    crit: CritRule::Roll,
                };
                match apply_heal(state, &heal) {
                    Ok(result) => EffectRecord::Heal(result),
                    Err(_) => EffectRecord::Skipped,
                }
            }
            AbilityType::Buff | AbilityType::Debuff => match &ability.buff {
                Some(template) => match apply_buff(state, target, Some(caster), template) {
                    Ok(BuffApplication::Applied(id)) => EffectRecord::Buff { id, refreshed: false },
                    Ok(BuffApplication::Refreshed(id)) => EffectRecord::Buff { id, refreshed: true },
                    Err(CombatError::BuffCapacity { .. }) => EffectRecord::BuffRejected,
                    Err(_) => EffectRecord::Skipped,
                },
                None => EffectRecord::Skipped,
            },
            AbilityType::Utility => {
                services.hooks.on_utility(caster, target, ability);
                EffectRecord::Utility
            }
            AbilityType::Summon => {
                services.hooks.on_summon(caster, target, ability);
                EffectRecord::Summon
            }
            AbilityType::Projectile => EffectRecord::Skipped,
        };
        effects.push(TargetEffect { target, effect });
    }

    CastResult {
        ability: ability.id,
        caster,
        outcome: CastOutcome::Completed,
        targets,
        effects,
        projectile: None,
    }
}

fn launch(
    state: &mut CombatState,
    world: &dyn SpatialQuery,
    ability: &AbilityDefinition,
    request: &CastRequest,
) -> CastResult {
    let caster = request.caster;
    let (Some(definition), Some(pose)) = (ability.projectile, world.actor_pose(caster)) else {
        return CastResult::failed(ability.id, caster, CastFailure::CasterNotInWorld);
    };
    let direction = aim_direction(world, &pose, request);

    match spawn_projectile(state, definition, caster, pose.position, direction, request.target_actor) {
        Ok(id) => CastResult {
            ability: ability.id,
            caster,
            outcome: CastOutcome::Completed,
            targets: Vec::new(),
            effects: Vec::new(),
            projectile: Some(id),
        },
        Err(e) => {
            debug!("cast {} could not launch: {}", ability.name, e);
            CastResult::failed(ability.id, caster, CastFailure::CapacityExceeded)
        }
    }
}

/// Start the cooldown and consume resources for a cast the caller decided
/// to charge for. Returns whether anything was charged.
///
/// Completed casts always pay. A cast that found no targets pays only under
/// `WhiffPolicy::Charge`. Every other failure is free.
pub fn pay_cast_costs(
    services: &mut CastServices<'_>,
    ability: &AbilityDefinition,
    result: &CastResult,
    policy: WhiffPolicy,
) -> bool {
    let charge = match result.outcome {
        CastOutcome::Completed => true,
        CastOutcome::Failed(CastFailure::NoValidTargets) => policy == WhiffPolicy::Charge,
        _ => false,
    };
    if !charge {
        return false;
    }

    if ability.cooldown > 0 {
        services.cooldowns.start_cooldown(result.caster, ability.id, ability.cooldown);
    }
    for cost in &ability.costs {
        if !services.resources.consume_resource(result.caster, cost.kind, cost.amount) {
            debug!("{} could not pay {:?} for {}", result.caster, cost.kind, ability.name);
        }
    }
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, FIXED_HALF, FIXED_ONE};
    use crate::core::vec3::FixedVec3;
    use crate::combat::ability::ResourceKind;
    use crate::combat::actor::{ActorPose, CombatStats, TeamId};
    use crate::combat::buff::{BuffTemplate, ModifierKind, StatKind};
    use crate::combat::config::CombatConfig;
    use crate::combat::damage::DamageType;
    use crate::combat::events::CombatEventData;
    use crate::combat::projectile::{CollisionPolicy, MovementKind, ProjectileDefId, ProjectileDefinition};
    use crate::combat::services::{CastClock, CooldownBook, CooldownGate, HookLog, ResourceLedger, Unrestricted};
    use crate::combat::spatial::ActorWorld;

    const HERO: ActorId = ActorId::new([1; 16]);
    const FOE: ActorId = ActorId::new([2; 16]);
    const FOE2: ActorId = ActorId::new([3; 16]);

    const FIREBOLT: AbilityId = AbilityId(1);
    const PYRE: AbilityId = AbilityId(2);
    const MEND: AbilityId = AbilityId(3);
    const EMPOWER: AbilityId = AbilityId(4);
    const BLINK: AbilityId = AbilityId(5);
    const ARROW: AbilityId = AbilityId(6);
    const SWEEP: AbilityId = AbilityId(7);

    fn setup() -> (CombatState, ActorWorld) {
        let mut state = CombatState::new([9; 16], 1, CombatConfig::default());
        let mut world = ActorWorld::new();
        for (actor, team, x) in [(HERO, 0, 0), (FOE, 1, 5), (FOE2, 1, 8)] {
            state.register_actor(actor, TeamId(team), CombatStats::new(from_int(100))).unwrap();
            world.upsert_actor(actor, ActorPose::at(FixedVec3::from_ints(x, 0, 0), FIXED_HALF));
        }

        let defs = [
            AbilityDefinition::new(FIREBOLT, "Firebolt", AbilityType::Damage, TargetMode::SingleTarget)
                .with_power(DamageType::Fire, from_int(50))
                .with_range(from_int(30))
                .with_cooldown(from_int(3))
                .with_cost(ResourceKind::Mana, from_int(20)),
            AbilityDefinition::new(PYRE, "Pyre", AbilityType::Damage, TargetMode::SingleTarget)
                .with_power(DamageType::Fire, from_int(80))
                .with_range(from_int(30))
                .with_cast_time(from_int(2), false, true),
            AbilityDefinition::new(MEND, "Mend", AbilityType::Healing, TargetMode::SelfTarget)
                .with_power(DamageType::Physical, from_int(30)),
            AbilityDefinition::new(EMPOWER, "Empower", AbilityType::Buff, TargetMode::SelfTarget).with_buff(
                BuffTemplate::stat("Empower", StatKind::DamageMultiplier, ModifierKind::Percentage, from_int(25), from_int(10)),
            ),
            AbilityDefinition::new(BLINK, "Blink", AbilityType::Utility, TargetMode::Sphere).with_radius(from_int(10)),
            AbilityDefinition::new(ARROW, "Arrow", AbilityType::Projectile, TargetMode::Line)
                .with_projectile(ProjectileDefId(1)),
            AbilityDefinition::new(SWEEP, "Sweep", AbilityType::Damage, TargetMode::Sphere)
                .with_power(DamageType::Physical, from_int(10))
                .with_radius(FIXED_ONE)
                .with_cooldown(from_int(4)),
        ];
        state
            .register_projectile(ProjectileDefinition::new(
                ProjectileDefId(1),
                "Arrow",
                MovementKind::Straight,
                CollisionPolicy::Stop,
                from_int(20),
                from_int(15),
                DamageType::Physical,
            ))
            .unwrap();
        for def in defs {
            state.register_ability(def).unwrap();
        }
        (state, world)
    }

    fn health(state: &CombatState, actor: ActorId) -> i32 {
        state.stats(actor).unwrap().health
    }

    #[test]
    fn test_firebolt_scenario() {
        let (mut state, world) = setup();
        let (mut c, mut r, mut t, mut h) = (Unrestricted, Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut t, hooks: &mut h };

        let request = CastRequest::new(HERO, FIREBOLT).toward(FixedVec3::FORWARD);
        let result = cast_ability(&mut state, &world, &mut services, &request);
        assert!(result.is_completed());
        assert_eq!(result.targets, vec![FOE]);
        assert_eq!(result.total_damage(), from_int(50));
        assert_eq!(health(&state, FOE), from_int(50));
    }

    #[test]
    fn test_gates_block_without_mutation() {
        let (mut state, world) = setup();
        let mut cooldowns = CooldownBook::new();
        let mut resources = ResourceLedger::new();
        let (mut timer, mut hooks) = (Unrestricted, Unrestricted);
        let ability = state.ability(FIREBOLT).unwrap().clone();
        let request = CastRequest::new(HERO, FIREBOLT).toward(FixedVec3::FORWARD);

        let mut services = CastServices {
            cooldowns: &mut cooldowns,
            resources: &mut resources,
            timer: &mut timer,
            hooks: &mut hooks,
        };
        let result = cast_ability(&mut state, &world, &mut services, &request);
        assert_eq!(result.failure(), Some(CastFailure::InsufficientResource(ResourceKind::Mana)));
        assert_eq!(health(&state, FOE), from_int(100));

        resources.set_pool(HERO, ResourceKind::Mana, from_int(30));
        let mut services = CastServices {
            cooldowns: &mut cooldowns,
            resources: &mut resources,
            timer: &mut timer,
            hooks: &mut hooks,
        };
        let result = cast_ability(&mut state, &world, &mut services, &request);
        assert!(result.is_completed());
        assert!(pay_cast_costs(&mut services, &ability, &result, WhiffPolicy::Free));

        let result = cast_ability(&mut state, &world, &mut services, &request);
        assert_eq!(result.failure(), Some(CastFailure::OnCooldown));
        assert_eq!(resources.current(HERO, ResourceKind::Mana), from_int(10));
        assert!(cooldowns.is_on_cooldown(HERO, FIREBOLT));
    }

    #[test]
    fn test_whiff_policy_is_callers_choice() {
        let (mut state, world) = setup();
        let ability = state.ability(SWEEP).unwrap().clone();
        let mut cooldowns = CooldownBook::new();
        let (mut resources, mut timer, mut hooks) = (Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices {
            cooldowns: &mut cooldowns,
            resources: &mut resources,
            timer: &mut timer,
            hooks: &mut hooks,
        };

        let result = cast_ability(&mut state, &world, &mut services, &CastRequest::new(HERO, SWEEP));
        assert_eq!(result.failure(), Some(CastFailure::NoValidTargets));
        assert!(!pay_cast_costs(&mut services, &ability, &result, WhiffPolicy::Free));
        assert!(pay_cast_costs(&mut services, &ability, &result, WhiffPolicy::Charge));
        assert_eq!(cooldowns.remaining(HERO, SWEEP), from_int(4));
    }

    #[test]
    fn test_timed_cast_completes() {
        let (mut state, world) = setup();
        let mut clock = CastClock::new();
        let (mut c, mut r, mut h) = (Unrestricted, Unrestricted, Unrestricted);
        let request = CastRequest::new(HERO, PYRE).toward(FixedVec3::FORWARD);

        let context = {
            let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut clock, hooks: &mut h };
            let result = cast_ability(&mut state, &world, &mut services, &request);
            let CastOutcome::CastStarted { context } = result.outcome else {
                panic!("expected a timed cast, got {:?}", result.outcome);
            };
            // Second cast while casting is rejected
            let again = cast_ability(&mut state, &world, &mut services, &request);
            assert_eq!(again.failure(), Some(CastFailure::AlreadyCasting));
            context
        };
        assert_eq!(health(&state, FOE), from_int(100));
        assert!(state.casts.is_casting(HERO));

        let finished = clock.advance(from_int(2));
        assert_eq!(finished, vec![context]);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut clock, hooks: &mut h };
        let result = complete_cast(&mut state, &world, &mut services, context);
        assert!(result.is_completed());
        assert_eq!(health(&state, FOE), from_int(20));
        assert!(!state.casts.is_casting(HERO));

        // Completing twice is unknown
        let result = complete_cast(&mut state, &world, &mut services, context);
        assert_eq!(result.failure(), Some(CastFailure::UnknownContext));
    }

    #[test]
    fn test_damage_interrupts_cast() {
        let (mut state, world) = setup();
        let (mut c, mut r, mut t, mut h) = (Unrestricted, Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut t, hooks: &mut h };
        let request = CastRequest::new(HERO, PYRE).toward(FixedVec3::FORWARD);
        let result = cast_ability(&mut state, &world, &mut services, &request);
        let CastOutcome::CastStarted { context } = result.outcome else {
            panic!("expected a timed cast");
        };

        apply_damage(&mut state, &DamageRequest::new(Some(FOE), HERO, from_int(5), DamageType::Fire)).unwrap();
        assert!(!state.casts.is_casting(HERO));
        assert!(state.events.pending().iter().any(|e| matches!(
            e.data,
            CombatEventData::CastInterrupted { reason: CastInterruptReason::Damage, .. }
        )));

        let result = complete_cast(&mut state, &world, &mut services, context);
        assert_eq!(result.failure(), Some(CastFailure::Interrupted));
        assert_eq!(health(&state, FOE), from_int(100));
    }

    #[test]
    fn test_external_interrupt() {
        let (mut state, world) = setup();
        let (mut c, mut r, mut t, mut h) = (Unrestricted, Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut t, hooks: &mut h };
        let request = CastRequest::new(HERO, PYRE).toward(FixedVec3::FORWARD);
        let CastOutcome::CastStarted { context } = cast_ability(&mut state, &world, &mut services, &request).outcome else {
            panic!("expected a timed cast");
        };
        assert!(interrupt_cast(&mut state, context));
        assert!(!interrupt_cast(&mut state, context));
        assert_eq!(
            complete_cast(&mut state, &world, &mut services, context).failure(),
            Some(CastFailure::Interrupted)
        );
    }

    #[test]
    fn test_interrupt_markers_are_bounded() {
        let (mut state, world) = setup();
        let (mut c, mut r, mut t, mut h) = (Unrestricted, Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut t, hooks: &mut h };
        let request = CastRequest::new(HERO, PYRE).toward(FixedVec3::FORWARD);

        let mut contexts = Vec::new();
        for _ in 0..1000 {
            let CastOutcome::CastStarted { context } = cast_ability(&mut state, &world, &mut services, &request).outcome else {
                panic!("expected a timed cast");
            };
            assert!(interrupt_cast(&mut state, context));
            contexts.push(context);
        }
        assert_eq!(state.casts.interrupt_markers(), MAX_INTERRUPT_MARKERS);

        // Recent contexts still report the interrupt, evicted ones are unknown
        let newest = contexts[999];
        assert_eq!(complete_cast(&mut state, &world, &mut services, newest).failure(), Some(CastFailure::Interrupted));
        assert_eq!(state.casts.interrupt_markers(), MAX_INTERRUPT_MARKERS - 1);
        let oldest = contexts[0];
        assert_eq!(complete_cast(&mut state, &world, &mut services, oldest).failure(), Some(CastFailure::UnknownContext));
    }

    #[test]
    fn test_heal_and_buff_dispatch() {
        let (mut state, world) = setup();
        state.stats_mut(HERO).unwrap().health = from_int(40);
        let (mut c, mut r, mut t, mut h) = (Unrestricted, Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut t, hooks: &mut h };

        let heal = cast_ability(&mut state, &world, &mut services, &CastRequest::new(HERO, MEND));
        assert_eq!(heal.targets, vec![HERO]);
        let restored = heal.total_healing();
        assert!(restored == from_int(30) || restored == from_int(45));

        let buff = cast_ability(&mut state, &world, &mut services, &CastRequest::new(HERO, EMPOWER));
        assert!(matches!(buff.effects[0].effect, EffectRecord::Buff { refreshed: false, .. }));
        let again = cast_ability(&mut state, &world, &mut services, &CastRequest::new(HERO, EMPOWER));
        assert!(matches!(again.effects[0].effect, EffectRecord::Buff { refreshed: true, .. }));
        assert_eq!(state.buffs.active(HERO).len(), 1);
    }

    #[test]
    fn test_utility_hook_once_per_target() {
        let (mut state, world) = setup();
        let mut hooks = HookLog::default();
        let (mut c, mut r, mut t) = (Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut t, hooks: &mut hooks };
        let result = cast_ability(&mut state, &world, &mut services, &CastRequest::new(HERO, BLINK));
        assert_eq!(result.targets, vec![FOE, FOE2]);
        assert_eq!(hooks.utility, vec![(BLINK, HERO, FOE), (BLINK, HERO, FOE2)]);
        assert!(hooks.summon.is_empty());
    }

    #[test]
    fn test_projectile_cast_spawns() {
        let (mut state, world) = setup();
        let (mut c, mut r, mut t, mut h) = (Unrestricted, Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut t, hooks: &mut h };

        let missing_aim = cast_ability(&mut state, &world, &mut services, &CastRequest::new(HERO, ARROW));
        assert_eq!(missing_aim.failure(), Some(CastFailure::InvalidDirection));

        let request = CastRequest::new(HERO, ARROW).toward(FixedVec3::FORWARD);
        let result = cast_ability(&mut state, &world, &mut services, &request);
        assert!(result.is_completed());
        let id = result.projectile.unwrap();
        assert_eq!(state.projectiles.by_caster(HERO).len(), 1);
        assert_eq!(state.projectiles.get(id).unwrap().caster, HERO);
    }

    #[test]
    fn test_validation_failures() {
        let (mut state, world) = setup();
        let (mut c, mut r, mut t, mut h) = (Unrestricted, Unrestricted, Unrestricted, Unrestricted);
        let mut services = CastServices { cooldowns: &mut c, resources: &mut r, timer: &mut t, hooks: &mut h };

        let unknown = cast_ability(&mut state, &world, &mut services, &CastRequest::new(HERO, AbilityId(99)));
        assert_eq!(unknown.failure(), Some(CastFailure::UnknownAbility));

        let ghost = cast_ability(&mut state, &world, &mut services, &CastRequest::new(ActorId::new([8; 16]), MEND));
        assert_eq!(ghost.failure(), Some(CastFailure::UnknownCaster));

        state.stats_mut(HERO).unwrap().dead = true;
        let dead = cast_ability(&mut state, &world, &mut services, &CastRequest::new(HERO, MEND));
        assert_eq!(dead.failure(), Some(CastFailure::CasterDead));
    }
}
