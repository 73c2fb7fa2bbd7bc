//! Combat Events
//!
//! Notifications emitted during simulation. Events queue on the context in
//! emission order and are handed to observers in registration order when the
//! tick flushes them. UI, VFX, audio and analytics hang off this; none of it
//! feeds back into the simulation.

use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::core::vec3::FixedVec3;
use crate::combat::ability::{AbilityId, CastContextId};
use crate::combat::actor::ActorId;
use crate::combat::buff::BuffInstance;
use crate::combat::damage::DamageType;
use crate::combat::projectile::{ProjectileDefId, ProjectileId};

/// Why a projectile was destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileEndReason {
    /// Lifetime ran out
    Expired,
    /// Traveled its maximum distance
    MaxDistance,
    /// Terminal collision (stop, explode, last pierce/bounce/chain)
    Collision,
    /// Chain found no further target
    ChainExhausted,
    /// Boomerang returned to its caster
    Caught,
    /// Boomerang caster no longer exists
    CasterLost,
    /// Removed explicitly (e.g. session teardown)
    Cleared,
}

/// Why a pending cast was interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastInterruptReason {
    /// Caster took damage during a damage-interruptible cast
    Damage,
    /// Cast timer reported an interruption (movement, stun, ...)
    External,
    /// Caster died or was unregistered
    CasterLost,
}

/// Combat event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEventData {
    /// Damage was applied to a target
    DamageApplied {
        attacker: Option<ActorId>,
        target: ActorId,
        amount: Fixed,
        shield_absorbed: Fixed,
        damage_type: DamageType,
        crit: bool,
        lethal: bool,
        hit_point: Option<FixedVec3>,
        hit_normal: Option<FixedVec3>,
    },

    /// Healing was applied to a target
    HealApplied {
        healer: Option<ActorId>,
        target: ActorId,
        amount: Fixed,
        crit: bool,
    },

    /// An actor's health changed
    HealthChanged {
        actor: ActorId,
        old_health: Fixed,
        new_health: Fixed,
        max_health: Fixed,
    },

    /// An actor died (emitted once per death)
    ActorDied {
        actor: ActorId,
        killer: Option<ActorId>,
    },

    /// A new buff was applied
    BuffApplied { buff: BuffInstance },

    /// An existing buff had its duration refreshed
    BuffRefreshed { buff: BuffInstance },

    /// A buff was removed before expiring
    BuffRemoved { buff: BuffInstance },

    /// A buff ran out
    BuffExpired { buff: BuffInstance },

    /// A projectile was launched
    ProjectileSpawned {
        projectile: ProjectileId,
        definition: ProjectileDefId,
        caster: ActorId,
        position: FixedVec3,
    },

    /// A projectile struck an actor
    ProjectileHit {
        projectile: ProjectileId,
        target: ActorId,
        position: FixedVec3,
    },

    /// A projectile detonated
    ProjectileExploded {
        projectile: ProjectileId,
        position: FixedVec3,
        radius: Fixed,
        victims: Vec<ActorId>,
    },

    /// A projectile left the simulation
    ProjectileDestroyed {
        projectile: ProjectileId,
        reason: ProjectileEndReason,
    },

    /// A timed cast began
    CastStarted {
        caster: ActorId,
        ability: AbilityId,
        context: CastContextId,
    },

    /// A timed cast was interrupted before resolving
    CastInterrupted {
        caster: ActorId,
        ability: AbilityId,
        context: CastContextId,
        reason: CastInterruptReason,
    },
}

/// A combat event with timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Tick when event occurred
    pub tick: u32,
    /// Emission order within the session
    pub sequence: u64,
    /// Event data
    pub data: CombatEventData,
}

/// Receives combat events.
pub trait CombatObserver {
    /// Called once per event, in emission order.
    fn on_event(&mut self, event: &CombatEvent);
}

/// Observer that keeps every event it sees. Handy for tests and tooling.
#[derive(Default, Debug)]
pub struct EventRecorder {
    /// Events received so far
    pub events: Vec<CombatEvent>,
}

impl CombatObserver for EventRecorder {
    fn on_event(&mut self, event: &CombatEvent) {
        self.events.push(event.clone());
    }
}

/// Observer handle returned at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(pub u32);

/// Pending events plus the observer list, owned by the simulation context.
#[derive(Default)]
pub struct EventBus {
    pending: Vec<CombatEvent>,
    observers: Vec<(ObserverId, Box<dyn CombatObserver>)>,
    next_sequence: u64,
    next_observer: u32,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, tick: u32, data: CombatEventData) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.push(CombatEvent { tick, sequence, data });
    }

    /// Events queued since the last flush.
    pub fn pending(&self) -> &[CombatEvent] {
        &self.pending
    }

    /// Register an observer. Delivery follows registration order.
    pub fn subscribe(&mut self, observer: Box<dyn CombatObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn CombatObserver>> {
        let index = self.observers.iter().position(|(oid, _)| *oid == id)?;
        Some(self.observers.remove(index).1)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Deliver all pending events to every observer and return them.
    ///
    /// Each event goes to all observers (in registration order) before the
    /// next event is delivered.
    pub fn flush(&mut self) -> Vec<CombatEvent> {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            for (_, observer) in self.observers.iter_mut() {
                observer.on_event(event);
            }
        }
        events
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.pending.len())
            .field("observers", &self.observers.len())
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Tagged {
        tag: &'static str,
        log: Rc<RefCell<Vec<(&'static str, u64)>>>,
    }

    impl CombatObserver for Tagged {
        fn on_event(&mut self, event: &CombatEvent) {
            self.log.borrow_mut().push((self.tag, event.sequence));
        }
    }

    fn died(n: u8) -> CombatEventData {
        CombatEventData::ActorDied {
            actor: ActorId::new([n; 16]),
            killer: None,
        }
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut bus = EventBus::new();
        bus.push(1, died(1));
        bus.push(1, died(2));
        bus.push(2, died(3));
        let events = bus.flush();
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert!(bus.pending().is_empty());
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(Box::new(Tagged { tag: "first", log: log.clone() }));
        bus.subscribe(Box::new(Tagged { tag: "second", log: log.clone() }));

        bus.push(0, died(1));
        bus.push(0, died(2));
        bus.flush();

        assert_eq!(
            *log.borrow(),
            vec![("first", 0), ("second", 0), ("first", 1), ("second", 1)]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let id = bus.subscribe(Box::new(Tagged { tag: "gone", log: log.clone() }));
        assert!(bus.unsubscribe(id).is_some());
        assert!(bus.unsubscribe(id).is_none());

        bus.push(0, died(1));
        bus.flush();
        assert!(log.borrow().is_empty());
        assert_eq!(bus.observer_count(), 0);
    }
}
