//! Buff/Debuff Engine
//!
//! Owns every active `BuffInstance`, keyed by target. Actors iterate in id
//! order, instances in insertion order.
//!
//! Aggregation per (actor, stat):
//!
//! ```text
//! flat    = Σ value                    (Flat instances)
//! percent = 1 + Σ value / 100          (Percentage instances, additive)
//! modifier       = flat × percent
//! effective stat = (base + flat) × percent
//! ```
//!
//! The update pass only mutates timers and collects what fired or expired;
//! periodic damage and healing are applied afterwards against the full
//! context, so no instance is skipped or processed twice.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_clamp, fixed_max, fixed_min, fixed_mul, fixed_percent};
use crate::core::hash::StateHasher;
use crate::combat::actor::{ActorId, CombatStats};
use crate::combat::damage::{apply_damage, apply_heal, CritRule, DamageRequest, DamageType, HealRequest};
use crate::combat::error::CombatError;
use crate::combat::events::CombatEventData;
use crate::combat::state::CombatState;

// =============================================================================
// TYPES
// =============================================================================

/// Buff instance identifier, unique within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuffId(pub u64);

/// Stat a buff modifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Outgoing damage multiplier
    DamageMultiplier,
    /// Armor
    Armor,
    /// Armor penetration
    ArmorPenetration,
    /// Crit chance
    CritChance,
    /// Crit multiplier
    CritMultiplier,
    /// Outgoing healing multiplier
    HealingMultiplier,
    /// Resistance to one damage type
    Resistance(DamageType),
    /// Vulnerability to one damage type
    Vulnerability(DamageType),
    /// Movement speed (consumed by the movement system, not combat math)
    MoveSpeed,
}

/// How a buff's value combines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Added to the stat
    Flat,
    /// Percent points added to the stat's multiplier (25 = +25%)
    Percentage,
}

/// Effect fired every tick interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodicEffect {
    /// Damage over time (never crits)
    Damage {
        /// Damage per tick
        amount: Fixed,
        /// Damage type
        damage_type: DamageType,
    },
    /// Healing over time (never crits)
    Heal {
        /// Healing per tick
        amount: Fixed,
    },
}

/// Buff parameters carried by ability definitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffTemplate {
    /// Name; (name, caster) identifies an instance on a target
    pub name: String,
    /// Modified stat
    pub stat: StatKind,
    /// Combination rule
    pub modifier: ModifierKind,
    /// Modifier value
    #[serde(default)]
    pub value: Fixed,
    /// Total duration in seconds
    pub duration: Fixed,
    /// Seconds between periodic ticks, 0 = none
    #[serde(default)]
    pub tick_interval: Fixed,
    /// Periodic effect
    #[serde(default)]
    pub periodic: Option<PeriodicEffect>,
    /// Harmful?
    #[serde(default)]
    pub is_debuff: bool,
}

impl BuffTemplate {
    /// Pure stat modifier.
    pub fn stat(name: impl Into<String>, stat: StatKind, modifier: ModifierKind, value: Fixed, duration: Fixed) -> Self {
        Self {
            name: name.into(),
            stat,
            modifier,
            value,
            duration,
            tick_interval: 0,
            periodic: None,
            is_debuff: false,
        }
    }

    /// Periodic effect with no stat change.
    pub fn periodic(name: impl Into<String>, effect: PeriodicEffect, tick_interval: Fixed, duration: Fixed) -> Self {
        Self {
            name: name.into(),
            stat: StatKind::DamageMultiplier,
            modifier: ModifierKind::Flat,
            value: 0,
            duration,
            tick_interval,
            periodic: Some(effect),
            is_debuff: matches!(effect, PeriodicEffect::Damage { .. }),
        }
    }

    /// Mark as a debuff.
    pub fn debuff(mut self) -> Self {
        self.is_debuff = true;
        self
    }

    /// Check durations and intervals.
    pub fn validate(&self) -> Result<(), CombatError> {
        if self.name.is_empty() {
            return Err(CombatError::InvalidDefinition("buff name is empty".into()));
        }
        if self.duration <= 0 {
            return Err(CombatError::InvalidDefinition(format!("buff {}: duration must be positive", self.name)));
        }
        if self.tick_interval < 0 {
            return Err(CombatError::InvalidDefinition(format!("buff {}: tick_interval is negative", self.name)));
        }
        if self.periodic.is_some() && self.tick_interval == 0 {
            return Err(CombatError::InvalidDefinition(format!("buff {}: periodic effect needs a tick_interval", self.name)));
        }
        Ok(())
    }
}

/// One active buff on one target.
///
/// Plain record: caster and target are weak ids, looked up when needed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffInstance {
    /// Instance id
    pub id: BuffId,
    /// Name
    pub name: String,
    /// Caster (may have despawned)
    pub caster: Option<ActorId>,
    /// Target
    pub target: ActorId,
    /// Modified stat
    pub stat: StatKind,
    /// Combination rule
    pub modifier: ModifierKind,
    /// Modifier value
    pub value: Fixed,
    /// Total duration
    pub duration: Fixed,
    /// Time left, `0..=duration`
    pub remaining: Fixed,
    /// Seconds between periodic ticks, 0 = none
    pub tick_interval: Fixed,
    /// Time until the next periodic tick
    pub next_tick_in: Fixed,
    /// Periodic effect
    pub periodic: Option<PeriodicEffect>,
    /// Harmful?
    pub is_debuff: bool,
    /// Tick the instance was first applied
    pub applied_tick: u32,
}

impl BuffInstance {
    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.id.0);
        hasher.update_str(&self.name);
        hasher.update_bool(self.caster.is_some());
        if let Some(caster) = &self.caster {
            hasher.update_uuid(caster.as_bytes());
        }
        hasher.update_fixed(self.value);
        hasher.update_fixed(self.remaining);
        hasher.update_fixed(self.next_tick_in);
    }
}

/// Result of applying a buff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuffApplication {
    /// New instance inserted
    Applied(BuffId),
    /// Existing (name, caster) instance had its duration refreshed
    Refreshed(BuffId),
}

impl BuffApplication {
    /// Instance id either way.
    pub fn id(self) -> BuffId {
        match self {
            BuffApplication::Applied(id) | BuffApplication::Refreshed(id) => id,
        }
    }
}

/// A periodic effect that came due during an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PeriodicHit {
    caster: Option<ActorId>,
    target: ActorId,
    effect: PeriodicEffect,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Buff storage.
#[derive(Clone, Debug, Default)]
pub struct BuffEngine {
    buffs: BTreeMap<ActorId, Vec<BuffInstance>>,
    next_id: u64,
    max_per_actor: usize,
}

impl BuffEngine {
    /// Empty engine with a per-actor cap.
    pub fn new(max_per_actor: usize) -> Self {
        Self {
            buffs: BTreeMap::new(),
            next_id: 1,
            max_per_actor,
        }
    }

    /// Active buffs on an actor, insertion order.
    pub fn active(&self, actor: ActorId) -> &[BuffInstance] {
        self.buffs.get(&actor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buff by id.
    pub fn get(&self, actor: ActorId, id: BuffId) -> Option<&BuffInstance> {
        self.active(actor).iter().find(|b| b.id == id)
    }

    /// Total active instances across all actors.
    pub fn total(&self) -> usize {
        self.buffs.values().map(Vec::len).sum()
    }

    /// Iterate (actor, buffs) in actor order.
    pub fn iter(&self) -> impl Iterator<Item = (&ActorId, &Vec<BuffInstance>)> {
        self.buffs.iter()
    }

    /// `(flat, percent)` for one stat on one actor.
    pub fn stat_breakdown(&self, actor: ActorId, stat: StatKind) -> (Fixed, Fixed) {
        let mut flat: Fixed = 0;
        let mut percent_points: Fixed = 0;
        for buff in self.active(actor).iter().filter(|b| b.stat == stat) {
            match buff.modifier {
                ModifierKind::Flat => flat = flat.saturating_add(buff.value),
                ModifierKind::Percentage => percent_points = percent_points.saturating_add(buff.value),
            }
        }
        (flat, FIXED_ONE.saturating_add(fixed_percent(percent_points)))
    }

    /// Aggregate modifier `flat × percent`.
    pub fn stat_modifier(&self, actor: ActorId, stat: StatKind) -> Fixed {
        let (flat, percent) = self.stat_breakdown(actor, stat);
        fixed_mul(flat, percent)
    }

    /// Base stats adjusted by every active buff on the actor.
    pub fn effective_stats(&self, actor: ActorId, base: &CombatStats) -> CombatStats {
        let mut stats = base.clone();
        if self.active(actor).is_empty() {
            return stats;
        }
        let adjust = |value: Fixed, stat: StatKind| {
            let (flat, percent) = self.stat_breakdown(actor, stat);
            fixed_mul(value.saturating_add(flat), percent)
        };

        stats.damage_multiplier = fixed_max(adjust(base.damage_multiplier, StatKind::DamageMultiplier), 0);
        stats.armor = fixed_max(adjust(base.armor, StatKind::Armor), 0);
        stats.armor_penetration = fixed_clamp(adjust(base.armor_penetration, StatKind::ArmorPenetration), 0, FIXED_ONE);
        stats.crit_chance = fixed_clamp(adjust(base.crit_chance, StatKind::CritChance), 0, FIXED_ONE);
        stats.crit_multiplier = fixed_max(adjust(base.crit_multiplier, StatKind::CritMultiplier), 0);
        stats.healing_multiplier = fixed_max(adjust(base.healing_multiplier, StatKind::HealingMultiplier), 0);
        for damage_type in DamageType::ALL {
            let resist = adjust(base.resistances.get(damage_type), StatKind::Resistance(damage_type));
            stats.resistances.set(damage_type, fixed_clamp(resist, 0, FIXED_ONE));
            let vuln = adjust(base.vulnerabilities.get(damage_type), StatKind::Vulnerability(damage_type));
            stats.vulnerabilities.set(damage_type, fixed_max(vuln, 0));
        }
        stats
    }

    /// Insert or refresh. Returns the stored instance.
    fn insert(
        &mut self,
        target: ActorId,
        caster: Option<ActorId>,
        template: &BuffTemplate,
        tick: u32,
    ) -> Result<(BuffApplication, BuffInstance), CombatError> {
        let max_per_actor = self.max_per_actor;
        let list = self.buffs.entry(target).or_default();

        if let Some(existing) = list.iter_mut().find(|b| b.name == template.name && b.caster == caster) {
            // Refresh, never stack
            existing.duration = template.duration;
            existing.remaining = template.duration;
            return Ok((BuffApplication::Refreshed(existing.id), existing.clone()));
        }

        if list.len() >= max_per_actor {
            if list.is_empty() {
                self.buffs.remove(&target);
            }
            return Err(CombatError::BuffCapacity { actor: target, limit: max_per_actor });
        }

        let id = BuffId(self.next_id);
        self.next_id += 1;
        let instance = BuffInstance {
            id,
            name: template.name.clone(),
            caster,
            target,
            stat: template.stat,
            modifier: template.modifier,
            value: template.value,
            duration: template.duration,
            remaining: template.duration,
            tick_interval: template.tick_interval,
            next_tick_in: template.tick_interval,
            periodic: template.periodic,
            is_debuff: template.is_debuff,
            applied_tick: tick,
        };
        list.push(instance.clone());
        Ok((BuffApplication::Applied(id), instance))
    }

    /// Remove matching instances from one actor.
    fn remove_where(&mut self, actor: ActorId, mut predicate: impl FnMut(&BuffInstance) -> bool) -> Vec<BuffInstance> {
        let Some(list) = self.buffs.get_mut(&actor) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        list.retain(|b| {
            if predicate(b) {
                removed.push(b.clone());
                false
            } else {
                true
            }
        });
        if list.is_empty() {
            self.buffs.remove(&actor);
        }
        removed
    }

    /// Advance every timer by `dt`. Returns periodic hits and expired instances.
    fn advance(&mut self, dt: Fixed) -> (Vec<PeriodicHit>, Vec<BuffInstance>) {
        let mut hits = Vec::new();
        let mut expired = Vec::new();
        let dt = fixed_max(dt, 0);

        for list in self.buffs.values_mut() {
            list.retain_mut(|buff| {
                // Time past the end of the buff never counts toward ticks
                let step = fixed_min(dt, buff.remaining);
                buff.remaining -= step;

                if buff.tick_interval > 0 {
                    buff.next_tick_in -= step;
                    while buff.next_tick_in <= 0 {
                        if let Some(effect) = buff.periodic {
                            hits.push(PeriodicHit {
                                caster: buff.caster,
                                target: buff.target,
                                effect,
                            });
                        }
                        buff.next_tick_in += buff.tick_interval;
                    }
                }

                if buff.remaining <= 0 {
                    expired.push(buff.clone());
                    false
                } else {
                    true
                }
            });
        }
        self.buffs.retain(|_, list| !list.is_empty());
        (hits, expired)
    }

    /// Hash every instance in iteration order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.total() as u32);
        for (actor, list) in &self.buffs {
            hasher.update_uuid(actor.as_bytes());
            for buff in list {
                buff.hash_into(hasher);
            }
        }
    }
}

// =============================================================================
// CONTEXT OPERATIONS
// =============================================================================

/// Apply a buff to a target, or refresh the caster's existing one.
///
/// Rejects with `BuffCapacity` when the target is at the cap; nothing changes.
pub fn apply_buff(
    state: &mut CombatState,
    target: ActorId,
    caster: Option<ActorId>,
    template: &BuffTemplate,
) -> Result<BuffApplication, CombatError> {
    template.validate()?;
    match state.stats(target) {
        None => {
            debug!("apply_buff: unknown target {}", target);
            return Err(CombatError::UnknownActor(target));
        }
        Some(stats) if !stats.is_alive() => {
            debug!("apply_buff: target {} is dead", target);
            return Err(CombatError::DeadActor(target));
        }
        Some(_) => {}
    }

    let tick = state.tick;
    let (application, instance) = state.buffs.insert(target, caster, template, tick).map_err(|e| {
        debug!("apply_buff: {}", e);
        e
    })?;

    let event = match application {
        BuffApplication::Applied(_) => CombatEventData::BuffApplied { buff: instance },
        BuffApplication::Refreshed(_) => CombatEventData::BuffRefreshed { buff: instance },
    };
    state.events.push(tick, event);
    Ok(application)
}

/// Remove one buff by id. Removing a missing id is a no-op returning false.
pub fn remove_buff(state: &mut CombatState, actor: ActorId, id: BuffId) -> bool {
    let removed = state.buffs.remove_where(actor, |b| b.id == id);
    emit_removed(state, removed)
}

/// Remove the (name, caster) instance from an actor.
pub fn remove_buff_by_source(state: &mut CombatState, actor: ActorId, name: &str, caster: Option<ActorId>) -> bool {
    let removed = state.buffs.remove_where(actor, |b| b.name == name && b.caster == caster);
    emit_removed(state, removed)
}

/// Remove every buff on an actor. Returns how many were removed.
pub fn clear_buffs(state: &mut CombatState, actor: ActorId) -> usize {
    let removed = state.buffs.remove_where(actor, |_| true);
    let count = removed.len();
    emit_removed(state, removed);
    count
}

fn emit_removed(state: &mut CombatState, removed: Vec<BuffInstance>) -> bool {
    let any = !removed.is_empty();
    let tick = state.tick;
    for buff in removed {
        state.events.push(tick, CombatEventData::BuffRemoved { buff });
    }
    any
}

/// Aggregate modifier for one stat on one actor.
pub fn stat_modifier(state: &CombatState, actor: ActorId, stat: StatKind) -> Fixed {
    state.buffs.stat_modifier(actor, stat)
}

/// Per-tick buff pass: timers, then periodic effects, then expirations.
pub fn update_buffs(state: &mut CombatState, dt: Fixed) {
    let (hits, expired) = state.buffs.advance(dt);

    for hit in hits {
        // Targets may have died or despawned since the hit was collected
        let outcome = match hit.effect {
            PeriodicEffect::Damage { amount, damage_type } => {
                let request = DamageRequest::new(hit.caster, hit.target, amount, damage_type).with_crit(CritRule::Never);
                apply_damage(state, &request).map(|_| ())
            }
            PeriodicEffect::Heal { amount } => {
                let request = HealRequest {
                    healer: hit.caster,
                    target: hit.target,
                    amount,
                    crit: CritRule::Never,
                };
                apply_heal(state, &request).map(|_| ())
            }
        };
        if let Err(e) = outcome {
            debug!("periodic effect skipped: {}", e);
        }
    }

    let tick = state.tick;
    for buff in expired {
        state.events.push(tick, CombatEventData::BuffExpired { buff });
    }
}

// =============================================================================
// TESTS
// =============================================================================
