//! Combat errors.
//!
//! Nothing here is fatal: every error means "no effect, state untouched".
//! Cast validation outcomes are not errors, see `CastFailure`.

use crate::combat::actor::ActorId;
use crate::combat::projectile::ProjectileDefId;

/// Errors returned by combat operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    /// Operation targeted an actor with no registration entry.
    #[error("actor {0} is not registered")]
    UnknownActor(ActorId),

    /// Actor is registered but dead.
    #[error("actor {0} is dead")]
    DeadActor(ActorId),

    /// Actor is already registered.
    #[error("actor {0} is already registered")]
    ActorAlreadyRegistered(ActorId),

    /// Projectile definition id has no definition in this session.
    #[error("projectile definition {0:?} is not registered")]
    UnknownProjectile(ProjectileDefId),

    /// Target already carries the maximum number of buffs.
    #[error("actor {actor} already has {limit} active buffs")]
    BuffCapacity {
        /// Target actor
        actor: ActorId,
        /// Configured cap
        limit: usize,
    },

    /// Active projectile limit reached.
    #[error("active projectile limit of {0} reached")]
    ProjectileCapacity(usize),

    /// Definition failed validation at registration.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
}

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the config file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config is not valid JSON for the expected shape.
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// Config parsed but a value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors encoding or decoding a combat snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Binary encoding failed or the bytes are not a snapshot.
    #[error("bincode snapshot error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON encoding failed or the text is not a snapshot.
    #[error("json snapshot error: {0}")]
    Json(#[from] serde_json::Error),
}
