//! Fixed-Rate Combat Tick
//!
//! One pass of the simulation: buff timers and periodic effects, then
//! projectiles in spawn order, then event delivery to observers.
//! Casts are driven by the caller between ticks.

use crate::core::fixed::Fixed;
use crate::combat::actor::ActorId;
use crate::combat::buff::update_buffs;
use crate::combat::events::{CombatEvent, CombatEventData};
use crate::combat::projectile::update_projectiles;
use crate::combat::spatial::SpatialQuery;
use crate::combat::state::CombatState;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events delivered this tick, in emission order
    pub events: Vec<CombatEvent>,
    /// Actors that died this tick
    pub deaths: Vec<ActorId>,
}

/// Run one simulation tick of length `dt` seconds.
///
/// # Determinism
///
/// Buffs advance in actor-id then insertion order, projectiles in spawn
/// order, and crit rolls draw from `state.rng` only. The same state, world
/// and `dt` always produce the same result.
pub fn tick(state: &mut CombatState, world: &dyn SpatialQuery, dt: Fixed) -> TickResult {
    update_buffs(state, dt);
    update_projectiles(state, world, dt);

    state.tick += 1;
    let events = state.events.flush();
    let deaths = events
        .iter()
        .filter_map(|event| match event.data {
            CombatEventData::ActorDied { actor, .. } => Some(actor),
            _ => None,
        })
        .collect();

    TickResult { events, deaths }
}

// =============================================================================
// TESTS
// =============================================================================
