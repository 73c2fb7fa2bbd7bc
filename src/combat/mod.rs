//! Combat logic (deterministic).
//!
//! Everything here runs on fixed-point math, BTreeMap ordering and the
//! session RNG, so the same inputs always resolve the same way.

pub mod error;
pub mod config;
pub mod actor;
pub mod events;
pub mod spatial;
pub mod services;
pub mod damage;
pub mod buff;
pub mod ability;
pub mod targeting;
pub mod projectile;
pub mod cast;
pub mod state;
pub mod tick;
pub mod snapshot;

pub use ability::{
    AbilityDefinition, AbilityId, AbilityType, CastFailure, CastOutcome, CastRequest, CastResult,
    TargetMode, WhiffPolicy,
};
pub use actor::{ActorId, ActorPose, CombatStats, TeamId};
pub use buff::{apply_buff, remove_buff, stat_modifier, BuffId, BuffInstance, BuffTemplate, ModifierKind, StatKind};
pub use cast::{cast_ability, complete_cast, interrupt_cast, pay_cast_costs};
pub use config::CombatConfig;
pub use damage::{apply_damage, apply_heal, preview_damage, DamageRequest, DamageResult, DamageType, HealRequest};
pub use error::{CombatError, ConfigError, SnapshotError};
pub use events::{CombatEvent, CombatEventData, CombatObserver};
pub use projectile::{spawn_projectile, ProjectileDefId, ProjectileDefinition, ProjectileId};
pub use services::CastServices;
pub use snapshot::CombatSnapshot;
pub use spatial::{ActorWorld, SpatialQuery};
pub use state::CombatState;
pub use tick::{tick, TickResult};
