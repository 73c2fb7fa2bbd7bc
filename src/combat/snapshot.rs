//! Combat Snapshots
//!
//! Plain structured copies of the replicated parts of a session: actor
//! stats, active buffs and active projectiles. Encoded with bincode for
//! replication and JSON for tooling. How they travel is the caller's business.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHash;
use crate::combat::actor::ActorEntry;
use crate::combat::buff::BuffInstance;
use crate::combat::error::SnapshotError;
use crate::combat::projectile::ProjectileInstance;
use crate::combat::state::CombatState;

/// Point-in-time copy of a session's replicated state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    /// Session identifier
    pub session_id: [u8; 16],
    /// Tick the snapshot was taken at
    pub tick: u32,
    /// State hash at capture time
    pub state_hash: StateHash,
    /// Registered actors in id order
    pub actors: Vec<ActorEntry>,
    /// Active buffs in actor-id then insertion order
    pub buffs: Vec<BuffInstance>,
    /// Active projectiles in spawn order
    pub projectiles: Vec<ProjectileInstance>,
}

impl CombatSnapshot {
    /// Capture the current state.
    pub fn capture(state: &CombatState) -> Self {
        Self {
            session_id: state.session_id,
            tick: state.tick,
            state_hash: state.compute_hash(),
            actors: state.actors().cloned().collect(),
            buffs: state
                .buffs
                .iter()
                .flat_map(|(_, list)| list.iter().cloned())
                .collect(),
            projectiles: state.projectiles.active().to_vec(),
        }
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(data)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// State hash as lowercase hex, for logs.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.state_hash)
    }
}
