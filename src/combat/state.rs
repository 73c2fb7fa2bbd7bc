//! Simulation Context
//!
//! `CombatState` owns every piece of mutable combat state for one session:
//! the actor registry, definitions, buffs, projectiles, pending casts, the
//! RNG and the event bus. Every operation takes it explicitly, so several
//! simulations can run side by side in one process.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::core::fixed::Fixed;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::combat::ability::{AbilityDefinition, AbilityId};
use crate::combat::actor::{ActorEntry, ActorId, CombatStats, TeamId};
use crate::combat::buff::{clear_buffs, BuffEngine};
use crate::combat::cast::{cancel_casts_for, CastTracker};
use crate::combat::config::CombatConfig;
use crate::combat::error::CombatError;
use crate::combat::events::{CombatEvent, CombatObserver, EventBus, ObserverId};
use crate::combat::projectile::{ProjectileDefinition, ProjectileEngine};

/// Complete state of one combat session.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug)]
pub struct CombatState {
    /// Session identifier
    pub session_id: [u8; 16],

    /// Ticks simulated so far
    pub tick: u32,

    /// RNG seed (for verification)
    pub rng_seed: u64,

    /// Crit roll source
    pub rng: DeterministicRng,

    /// Tunables
    pub config: CombatConfig,

    /// Registered actors (BTreeMap for deterministic iteration)
    actors: BTreeMap<ActorId, ActorEntry>,

    /// Ability definitions
    abilities: BTreeMap<AbilityId, AbilityDefinition>,

    /// Active buffs
    pub buffs: BuffEngine,

    /// Projectile definitions and instances
    pub projectiles: ProjectileEngine,

    /// Pending timed casts
    pub casts: CastTracker,

    /// Queued events and observers
    pub events: EventBus,
}

impl CombatState {
    /// Create an empty session.
    pub fn new(session_id: [u8; 16], rng_seed: u64, config: CombatConfig) -> Self {
        Self {
            session_id,
            tick: 0,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            buffs: BuffEngine::new(config.max_buffs_per_actor),
            projectiles: ProjectileEngine::new(config.max_active_projectiles, config.projectile_pool_per_definition),
            config,
            actors: BTreeMap::new(),
            abilities: BTreeMap::new(),
            casts: CastTracker::new(),
            events: EventBus::new(),
        }
    }

    // =========================================================================
    // ACTORS
    // =========================================================================

    /// Register an actor with its team and base stats.
    pub fn register_actor(&mut self, id: ActorId, team: TeamId, mut stats: CombatStats) -> Result<(), CombatError> {
        if self.actors.contains_key(&id) {
            return Err(CombatError::ActorAlreadyRegistered(id));
        }
        stats.sanitize();
        info!("Actor {} joined team {}", id, team.0);
        self.actors.insert(id, ActorEntry { id, team, stats });
        Ok(())
    }

    /// Remove an actor. Its buffs and pending cast go with it; projectiles it
    /// launched keep flying. Returns false if it was not registered.
    pub fn unregister_actor(&mut self, id: ActorId) -> bool {
        if !self.actors.contains_key(&id) {
            debug!("unregister_actor: unknown actor {}", id);
            return false;
        }
        clear_buffs(self, id);
        cancel_casts_for(self, id);
        self.actors.remove(&id);
        info!("Actor {} left the session", id);
        true
    }

    /// Registration entry.
    pub fn actor(&self, id: ActorId) -> Option<&ActorEntry> {
        self.actors.get(&id)
    }

    /// Registered actors in id order.
    pub fn actors(&self) -> impl Iterator<Item = &ActorEntry> {
        self.actors.values()
    }

    /// Is the actor registered?
    pub fn is_registered(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Base stats, without buffs.
    pub fn stats(&self, id: ActorId) -> Option<&CombatStats> {
        self.actors.get(&id).map(|entry| &entry.stats)
    }

    /// Base stats for mutation. Health and shield belong to the damage and
    /// buff engines.
    pub(crate) fn stats_mut(&mut self, id: ActorId) -> Option<&mut CombatStats> {
        self.actors.get_mut(&id).map(|entry| &mut entry.stats)
    }

    /// Stats with every active buff folded in.
    pub fn effective_stats(&self, id: ActorId) -> Option<CombatStats> {
        let base = self.stats(id)?;
        Some(self.buffs.effective_stats(id, base))
    }

    /// Registered and not dead.
    pub fn is_alive(&self, id: ActorId) -> bool {
        self.stats(id).is_some_and(CombatStats::is_alive)
    }

    /// Team of a registered actor.
    pub fn team_of(&self, id: ActorId) -> Option<TeamId> {
        self.actors.get(&id).map(|entry| entry.team)
    }

    /// Health as a fraction of max health, `None` for unknown actors.
    pub fn health_percent(&self, id: ActorId) -> Option<Fixed> {
        self.stats(id).map(CombatStats::health_percent)
    }

    // =========================================================================
    // DEFINITIONS
    // =========================================================================

    /// Register an ability. Projectile abilities need their projectile
    /// definition registered first.
    pub fn register_ability(&mut self, ability: AbilityDefinition) -> Result<(), CombatError> {
        ability.validate()?;
        if let Some(projectile) = ability.projectile {
            if self.projectiles.definition(projectile).is_none() {
                return Err(CombatError::UnknownProjectile(projectile));
            }
        }
        debug!("registered ability {:?} ({})", ability.id, ability.name);
        self.abilities.insert(ability.id, ability);
        Ok(())
    }

    /// Ability definition by id.
    pub fn ability(&self, id: AbilityId) -> Option<&AbilityDefinition> {
        self.abilities.get(&id)
    }

    /// Register a projectile definition.
    pub fn register_projectile(&mut self, definition: ProjectileDefinition) -> Result<(), CombatError> {
        debug!("registered projectile {:?} ({})", definition.id, definition.name);
        self.projectiles.register(definition)
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Add an observer. Delivery follows registration order.
    pub fn subscribe(&mut self, observer: Box<dyn CombatObserver>) -> ObserverId {
        self.events.subscribe(observer)
    }

    /// Remove an observer.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn CombatObserver>> {
        self.events.unsubscribe(id)
    }

    /// Deliver queued events now instead of waiting for the next tick.
    pub fn flush_events(&mut self) -> Vec<CombatEvent> {
        self.events.flush()
    }

    // =========================================================================
    // VERIFICATION
    // =========================================================================

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng.state(), |hasher| {
            hasher.update_u64(self.rng_seed);

            // Actors in sorted order (BTreeMap guarantees this)
            hasher.update_u32(self.actors.len() as u32);
            for entry in self.actors.values() {
                hasher.update_uuid(entry.id.as_bytes());
                hasher.update_u8(entry.team.0);
                entry.stats.hash_into(hasher);
            }

            self.buffs.hash_into(hasher);
            self.projectiles.hash_into(hasher);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
