//! # Relic Combat
//!
//! Deterministic, server-authoritative combat resolution for Rune Relic.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RELIC COMBAT                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── fixed.rs     - Q16.16 fixed-point arithmetic            │
//! │  ├── vec3.rs      - 3D vector with fixed-point               │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  combat/          - Combat logic (deterministic)             │
//! │  ├── actor.rs     - Actor handles and combat stats           │
//! │  ├── damage.rs    - Damage / heal resolution                 │
//! │  ├── buff.rs      - Buffs, debuffs, DoT / HoT                │
//! │  ├── targeting.rs - Target acquisition                       │
//! │  ├── cast.rs      - Cast orchestration and dispatch          │
//! │  ├── projectile.rs- Projectile simulation and pooling        │
//! │  ├── spatial.rs   - Spatial query interface                  │
//! │  ├── services.rs  - Cooldown / resource / timer seams        │
//! │  ├── state.rs     - Session context                          │
//! │  ├── tick.rs      - Fixed-rate simulation pass               │
//! │  └── snapshot.rs  - Replication snapshots                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `combat/` modules are **100% deterministic**:
//! - No floating-point arithmetic in combat math
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from the session's seeded Xorshift128+
//!
//! Given identical inputs and RNG seed, a session produces
//! **identical results** on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod combat;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec3::FixedVec3;
pub use core::rng::DeterministicRng;
pub use combat::{
    tick, ActorId, ActorPose, ActorWorld, CombatConfig, CombatError, CombatEvent, CombatState,
    CombatStats, SpatialQuery, TeamId, TickResult,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
