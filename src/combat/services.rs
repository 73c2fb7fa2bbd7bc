//! External Collaborators
//!
//! Cooldowns, resource pools, cast timers and gameplay hooks live outside
//! the combat core. The orchestrator only asks and notifies through these
//! traits. Simple in-memory implementations are provided for the demo
//! binary, tests and tools that don't need anything fancier.

use std::collections::BTreeMap;

use crate::core::fixed::{Fixed, fixed_max, fixed_min};
use crate::combat::ability::{AbilityDefinition, AbilityId, CastContextId, ResourceKind};
use crate::combat::actor::ActorId;

/// Cooldown bookkeeping.
pub trait CooldownGate {
    /// Is the ability cooling down for this caster?
    fn is_on_cooldown(&self, caster: ActorId, ability: AbilityId) -> bool;
    /// Start a cooldown.
    fn start_cooldown(&mut self, caster: ActorId, ability: AbilityId, duration: Fixed);
}

/// Resource pools.
pub trait ResourceGate {
    /// Can the caster afford `amount`?
    fn has_resource(&self, caster: ActorId, kind: ResourceKind, amount: Fixed) -> bool;
    /// Spend `amount`. Returns false if it could not be afforded.
    fn consume_resource(&mut self, caster: ActorId, kind: ResourceKind, amount: Fixed) -> bool;
    /// Give back up to `amount`. Returns what was actually restored.
    fn restore_resource(&mut self, caster: ActorId, kind: ResourceKind, amount: Fixed) -> Fixed;
}

/// Cast-time tracking. Reports back through `complete_cast` /
/// `interrupt_cast` with the same context.
pub trait CastTimer {
    /// A timed cast has begun.
    fn start_cast(
        &mut self,
        caster: ActorId,
        ability_name: &str,
        duration: Fixed,
        movable: bool,
        interruptible_by_damage: bool,
        context: CastContextId,
    );
}

/// Game-specific effects the core does not model.
pub trait GameplayHooks {
    /// Utility ability resolved on one target.
    fn on_utility(&mut self, caster: ActorId, target: ActorId, ability: &AbilityDefinition);
    /// Summon ability resolved on one target.
    fn on_summon(&mut self, caster: ActorId, target: ActorId, ability: &AbilityDefinition);
}

/// Every collaborator a cast needs, borrowed for the duration of one call.
pub struct CastServices<'a> {
    /// Cooldowns
    pub cooldowns: &'a mut dyn CooldownGate,
    /// Resources
    pub resources: &'a mut dyn ResourceGate,
    /// Cast timer
    pub timer: &'a mut dyn CastTimer,
    /// Gameplay hooks
    pub hooks: &'a mut dyn GameplayHooks,
}

// =============================================================================
// REFERENCE IMPLEMENTATIONS
// =============================================================================

/// Collaborator that never says no and ignores notifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unrestricted;

impl CooldownGate for Unrestricted {
    fn is_on_cooldown(&self, _caster: ActorId, _ability: AbilityId) -> bool {
        false
    }
    fn start_cooldown(&mut self, _caster: ActorId, _ability: AbilityId, _duration: Fixed) {}
}

impl ResourceGate for Unrestricted {
    fn has_resource(&self, _caster: ActorId, _kind: ResourceKind, _amount: Fixed) -> bool {
        true
    }
    fn consume_resource(&mut self, _caster: ActorId, _kind: ResourceKind, _amount: Fixed) -> bool {
        true
    }
    fn restore_resource(&mut self, _caster: ActorId, _kind: ResourceKind, amount: Fixed) -> Fixed {
        amount
    }
}

impl CastTimer for Unrestricted {
    fn start_cast(&mut self, _: ActorId, _: &str, _: Fixed, _: bool, _: bool, _: CastContextId) {}
}

impl GameplayHooks for Unrestricted {
    fn on_utility(&mut self, _caster: ActorId, _target: ActorId, _ability: &AbilityDefinition) {}
    fn on_summon(&mut self, _caster: ActorId, _target: ActorId, _ability: &AbilityDefinition) {}
}

/// Cooldown table counting down in seconds.
#[derive(Clone, Debug, Default)]
pub struct CooldownBook {
    remaining: BTreeMap<(ActorId, AbilityId), Fixed>,
}

impl CooldownBook {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left on a cooldown, 0 if ready.
    pub fn remaining(&self, caster: ActorId, ability: AbilityId) -> Fixed {
        self.remaining.get(&(caster, ability)).copied().unwrap_or(0)
    }

    /// Count every cooldown down by `dt`.
    pub fn advance(&mut self, dt: Fixed) {
        for left in self.remaining.values_mut() {
            *left -= dt;
        }
        self.remaining.retain(|_, left| *left > 0);
    }
}

impl CooldownGate for CooldownBook {
    fn is_on_cooldown(&self, caster: ActorId, ability: AbilityId) -> bool {
        self.remaining(caster, ability) > 0
    }

    fn start_cooldown(&mut self, caster: ActorId, ability: AbilityId, duration: Fixed) {
        if duration > 0 {
            self.remaining.insert((caster, ability), duration);
        }
    }
}

/// Capped resource pools per (actor, kind). Missing pools are empty.
#[derive(Clone, Debug, Default)]
pub struct ResourceLedger {
    pools: BTreeMap<(ActorId, ResourceKind), (Fixed, Fixed)>,
}

impl ResourceLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or reset a pool to full.
    pub fn set_pool(&mut self, actor: ActorId, kind: ResourceKind, max: Fixed) {
        let max = fixed_max(max, 0);
        self.pools.insert((actor, kind), (max, max));
    }

    /// Current amount.
    pub fn current(&self, actor: ActorId, kind: ResourceKind) -> Fixed {
        self.pools.get(&(actor, kind)).map_or(0, |(current, _)| *current)
    }
}

impl ResourceGate for ResourceLedger {
    fn has_resource(&self, caster: ActorId, kind: ResourceKind, amount: Fixed) -> bool {
        amount <= 0 || self.current(caster, kind) >= amount
    }

    fn consume_resource(&mut self, caster: ActorId, kind: ResourceKind, amount: Fixed) -> bool {
        if !self.has_resource(caster, kind, amount) {
            return false;
        }
        if let Some((current, _)) = self.pools.get_mut(&(caster, kind)) {
            *current -= fixed_max(amount, 0);
        }
        true
    }

    fn restore_resource(&mut self, caster: ActorId, kind: ResourceKind, amount: Fixed) -> Fixed {
        match self.pools.get_mut(&(caster, kind)) {
            Some((current, max)) => {
                let restored = fixed_min(fixed_max(amount, 0), *max - *current);
                *current += restored;
                restored
            }
            None => 0,
        }
    }
}

/// A cast handed to `CastClock`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedCast {
    /// Caster
    pub caster: ActorId,
    /// Ability name
    pub ability_name: String,
    /// Time left
    pub remaining: Fixed,
    /// Context to report back
    pub context: CastContextId,
}

/// Cast timer that counts casts down and reports which finished.
#[derive(Clone, Debug, Default)]
pub struct CastClock {
    casts: Vec<TimedCast>,
}

impl CastClock {
    /// No casts in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Casts in flight, in start order.
    pub fn in_flight(&self) -> &[TimedCast] {
        &self.casts
    }

    /// Count down by `dt`. Returns contexts whose cast time elapsed, in start order.
    pub fn advance(&mut self, dt: Fixed) -> Vec<CastContextId> {
        let mut finished = Vec::new();
        self.casts.retain_mut(|cast| {
            cast.remaining -= dt;
            if cast.remaining <= 0 {
                finished.push(cast.context);
                false
            } else {
                true
            }
        });
        finished
    }

    /// Forget a cast (e.g. after it was interrupted).
    pub fn cancel(&mut self, context: CastContextId) {
        self.casts.retain(|cast| cast.context != context);
    }
}

impl CastTimer for CastClock {
    fn start_cast(
        &mut self,
        caster: ActorId,
        ability_name: &str,
        duration: Fixed,
        _movable: bool,
        _interruptible_by_damage: bool,
        context: CastContextId,
    ) {
        self.casts.push(TimedCast {
            caster,
            ability_name: ability_name.to_string(),
            remaining: duration,
            context,
        });
    }
}

/// Gameplay hooks that record every call.
#[derive(Clone, Debug, Default)]
pub struct HookLog {
    /// (ability, caster, target) per utility call
    pub utility: Vec<(AbilityId, ActorId, ActorId)>,
    /// (ability, caster, target) per summon call
    pub summon: Vec<(AbilityId, ActorId, ActorId)>,
}

impl GameplayHooks for HookLog {
    fn on_utility(&mut self, caster: ActorId, target: ActorId, ability: &AbilityDefinition) {
        self.utility.push((ability.id, caster, target));
    }

    fn on_summon(&mut self, caster: ActorId, target: ActorId, ability: &AbilityDefinition) {
        self.summon.push((ability.id, caster, target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, FIXED_ONE};

    const A: ActorId = ActorId::new([1; 16]);

    #[test]
    fn test_cooldown_book() {
        let mut book = CooldownBook::new();
        assert!(!book.is_on_cooldown(A, AbilityId(1)));
        book.start_cooldown(A, AbilityId(1), from_int(2));
        assert!(book.is_on_cooldown(A, AbilityId(1)));
        assert!(!book.is_on_cooldown(A, AbilityId(2)));
        book.advance(FIXED_ONE);
        assert_eq!(book.remaining(A, AbilityId(1)), FIXED_ONE);
        book.advance(FIXED_ONE);
        assert!(!book.is_on_cooldown(A, AbilityId(1)));
    }

    #[test]
    fn test_resource_ledger_caps_restore() {
        let mut ledger = ResourceLedger::new();
        ledger.set_pool(A, ResourceKind::Mana, from_int(50));
        assert!(ledger.consume_resource(A, ResourceKind::Mana, from_int(30)));
        assert!(!ledger.consume_resource(A, ResourceKind::Mana, from_int(30)));
        assert_eq!(ledger.current(A, ResourceKind::Mana), from_int(20));
        assert_eq!(ledger.restore_resource(A, ResourceKind::Mana, from_int(100)), from_int(30));
        assert_eq!(ledger.restore_resource(A, ResourceKind::Energy, from_int(5)), 0);
        assert!(!ledger.has_resource(A, ResourceKind::Energy, FIXED_ONE));
    }

    #[test]
    fn test_cast_clock_reports_in_order() {
        let mut clock = CastClock::new();
        clock.start_cast(A, "Slow", from_int(2), false, true, CastContextId(1));
        clock.start_cast(A, "Fast", FIXED_ONE, false, true, CastContextId(2));
        assert_eq!(clock.advance(FIXED_ONE), vec![CastContextId(2)]);
        clock.cancel(CastContextId(1));
        assert!(clock.advance(from_int(5)).is_empty());
        assert!(clock.in_flight().is_empty());
    }
}
