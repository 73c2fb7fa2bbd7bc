//! Projectile Simulation
//!
//! Each active projectile runs one atomic step per tick:
//!
//! ```text
//! steer (homing / arcing / boomerang) → move → lifetime & distance
//!   expired?  → destroy (no collision this tick)
//!   else      → sphere query at CollisionRadius → first eligible actor
//!                 → collision policy (pierce, stop, bounce, explode, chain)
//! ```
//!
//! Active instances keep spawn order. Terminated instances are reset and
//! parked in a bounded pool per definition for reuse.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::fixed::{Fixed, DEG_180, FIXED_HALF, FIXED_ONE, fixed_cos_deg, fixed_max, fixed_mul, fixed_sin_deg};
use crate::core::hash::StateHasher;
use crate::core::vec3::FixedVec3;
use crate::combat::actor::ActorId;
use crate::combat::damage::{apply_damage, DamageRequest, DamageType};
use crate::combat::error::CombatError;
use crate::combat::events::{CombatEventData, ProjectileEndReason};
use crate::combat::spatial::SpatialQuery;
use crate::combat::state::CombatState;

// =============================================================================
// DEFINITIONS
// =============================================================================

/// Projectile definition identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ProjectileDefId(pub u32);

/// Runtime projectile identifier, monotonic per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

/// How a projectile moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    /// Constant velocity
    Straight,
    /// Steers toward its target after the activation delay
    Homing,
    /// Falls under gravity
    Arcing,
    /// Flies out to max distance, then returns to the caster
    Boomerang,
    /// Straight between chain jumps
    Chaining,
}

/// What happens when a projectile strikes an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Damage and continue until `max_pierce_targets` hits
    Pierce,
    /// Damage once and stop
    Stop,
    /// Damage and reflect until `max_bounces` hits
    Bounce,
    /// Blast every actor in the radius except the caster, stop
    Explode,
    /// Damage and jump to the nearest unhit actor until `max_chain_targets` hits
    Chain,
}

/// Static projectile configuration. Distances in world units, times in seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileDefinition {
    /// Identifier
    pub id: ProjectileDefId,
    /// Name for logs
    pub name: String,
    /// Launch speed (units/s)
    pub speed: Fixed,
    /// Seconds before expiry
    pub lifetime: Fixed,
    /// Travel distance before expiry (Boomerang: before turning back); 0 = unlimited
    pub max_distance: Fixed,
    /// Collision sphere radius
    pub collision_radius: Fixed,
    /// Kinematics
    pub movement: MovementKind,
    /// Collision resolution
    pub collision: CollisionPolicy,
    /// Damage per hit
    pub damage: Fixed,
    /// Damage type
    pub damage_type: DamageType,
    /// Seconds before homing engages
    #[serde(default)]
    pub homing_delay: Fixed,
    /// Homing turn rate (degrees/s)
    #[serde(default)]
    pub homing_turn_rate: Fixed,
    /// Gravity scale for Arcing
    #[serde(default = "default_multiplier")]
    pub gravity_multiplier: Fixed,
    /// Return speed for Boomerang
    #[serde(default)]
    pub return_speed: Fixed,
    /// Blast radius for Explode, 0 = no damage at all
    #[serde(default)]
    pub explosion_radius: Fixed,
    /// Blast damage as a multiple of `damage`
    #[serde(default = "default_multiplier")]
    pub explosion_multiplier: Fixed,
    /// Pierce hit budget
    #[serde(default = "default_budget")]
    pub max_pierce_targets: u32,
    /// Bounce hit budget
    #[serde(default = "default_budget")]
    pub max_bounces: u32,
    /// Chain hit budget
    #[serde(default = "default_budget")]
    pub max_chain_targets: u32,
    /// Chain jump search radius
    #[serde(default)]
    pub chain_range: Fixed,
}

fn default_multiplier() -> Fixed {
    FIXED_ONE
}

fn default_budget() -> u32 {
    1
}

impl ProjectileDefinition {
    /// Definition with 5 s lifetime, 100 units range, 0.5 collision radius.
    pub fn new(
        id: ProjectileDefId,
        name: impl Into<String>,
        movement: MovementKind,
        collision: CollisionPolicy,
        speed: Fixed,
        damage: Fixed,
        damage_type: DamageType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            speed,
            lifetime: 5 * FIXED_ONE,
            max_distance: 100 * FIXED_ONE,
            collision_radius: FIXED_HALF,
            movement,
            collision,
            damage,
            damage_type,
            homing_delay: 0,
            homing_turn_rate: 0,
            gravity_multiplier: FIXED_ONE,
            return_speed: speed,
            explosion_radius: 0,
            explosion_multiplier: FIXED_ONE,
            max_pierce_targets: 1,
            max_bounces: 1,
            max_chain_targets: 1,
            chain_range: 0,
        }
    }

    /// Set lifetime and travel range.
    pub fn with_range(mut self, lifetime: Fixed, max_distance: Fixed) -> Self {
        self.lifetime = lifetime;
        self.max_distance = max_distance;
        self
    }

    /// Set the collision sphere radius.
    pub fn with_collision_radius(mut self, radius: Fixed) -> Self {
        self.collision_radius = radius;
        self
    }

    /// Homing delay (seconds) and turn rate (degrees/s).
    pub fn with_homing(mut self, delay: Fixed, turn_rate: Fixed) -> Self {
        self.homing_delay = delay;
        self.homing_turn_rate = turn_rate;
        self
    }

    /// Gravity scale for arcing flight.
    pub fn with_gravity(mut self, multiplier: Fixed) -> Self {
        self.gravity_multiplier = multiplier;
        self
    }

    /// Boomerang return speed.
    pub fn with_return_speed(mut self, speed: Fixed) -> Self {
        self.return_speed = speed;
        self
    }

    /// Blast radius and blast damage multiplier.
    pub fn with_explosion(mut self, radius: Fixed, multiplier: Fixed) -> Self {
        self.explosion_radius = radius;
        self.explosion_multiplier = multiplier;
        self
    }

    /// Pierce hit budget.
    pub fn with_pierce(mut self, max_targets: u32) -> Self {
        self.max_pierce_targets = max_targets;
        self
    }

    /// Bounce hit budget.
    pub fn with_bounces(mut self, max_bounces: u32) -> Self {
        self.max_bounces = max_bounces;
        self
    }

    /// Chain hit budget and jump radius.
    pub fn with_chain(mut self, max_targets: u32, range: Fixed) -> Self {
        self.max_chain_targets = max_targets;
        self.chain_range = range;
        self
    }

    /// Parse a definition from JSON. Validation happens at registration.
    pub fn from_json_str(json: &str) -> Result<Self, crate::combat::error::ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Hits before the projectile is spent.
    pub fn hit_budget(&self) -> u32 {
        match self.collision {
            CollisionPolicy::Pierce => self.max_pierce_targets,
            CollisionPolicy::Bounce => self.max_bounces,
            CollisionPolicy::Chain => self.max_chain_targets,
            CollisionPolicy::Stop | CollisionPolicy::Explode => 1,
        }
    }

    /// Check the definition is usable.
    pub fn validate(&self) -> Result<(), CombatError> {
        let invalid = |reason: &str| CombatError::InvalidDefinition(format!("projectile {:?} ({}): {}", self.id, self.name, reason));
        if self.speed <= 0 {
            return Err(invalid("speed must be positive"));
        }
        if self.lifetime <= 0 {
            return Err(invalid("lifetime must be positive"));
        }
        if self.max_distance < 0 || self.collision_radius < 0 || self.damage < 0 {
            return Err(invalid("distances and damage must not be negative"));
        }
        if self.explosion_radius < 0 || self.chain_range < 0 {
            return Err(invalid("explosion_radius and chain_range must not be negative"));
        }
        if self.hit_budget() == 0 {
            return Err(invalid("hit budget must be at least 1"));
        }
        if self.movement == MovementKind::Boomerang && (self.return_speed <= 0 || self.max_distance == 0) {
            return Err(invalid("boomerang needs a return_speed and a max_distance"));
        }
        Ok(())
    }
}

// =============================================================================
// INSTANCES
// =============================================================================

/// Runtime state of one projectile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileInstance {
    /// Identifier
    pub id: ProjectileId,
    /// Definition
    pub definition: ProjectileDefId,
    /// Caster (weak reference)
    pub caster: ActorId,
    /// Position
    pub position: FixedVec3,
    /// Velocity (units/s)
    pub velocity: FixedVec3,
    /// Seconds left
    pub lifetime_remaining: Fixed,
    /// Distance flown
    pub distance_traveled: Fixed,
    /// Hits left before the projectile is spent
    pub hits_remaining: u32,
    /// Actors already struck, in hit order
    pub hit_set: Vec<ActorId>,
    /// Homing target (weak reference)
    pub homing_target: Option<ActorId>,
    /// Boomerang on its way back
    pub returning: bool,
    /// Seconds since spawn
    pub age: Fixed,
}

impl ProjectileInstance {
    fn blank(definition: ProjectileDefId) -> Self {
        Self {
            id: ProjectileId(0),
            definition,
            caster: ActorId::default(),
            position: FixedVec3::ZERO,
            velocity: FixedVec3::ZERO,
            lifetime_remaining: 0,
            distance_traveled: 0,
            hits_remaining: 0,
            hit_set: Vec::new(),
            homing_target: None,
            returning: false,
            age: 0,
        }
    }

    /// Clear runtime state before the instance goes back to the pool.
    fn reset(&mut self) {
        let definition = self.definition;
        let mut hit_set = std::mem::take(&mut self.hit_set);
        hit_set.clear();
        *self = Self::blank(definition);
        self.hit_set = hit_set;
    }

    /// Has this projectile already struck the actor?
    pub fn has_hit(&self, actor: ActorId) -> bool {
        self.hit_set.contains(&actor)
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_u32(self.definition.0);
        hasher.update_uuid(self.caster.as_bytes());
        hasher.update_vec3(self.position);
        hasher.update_vec3(self.velocity);
        hasher.update_fixed(self.lifetime_remaining);
        hasher.update_fixed(self.distance_traveled);
        hasher.update_u32(self.hits_remaining);
        hasher.update_u32(self.hit_set.len() as u32);
        for actor in &self.hit_set {
            hasher.update_uuid(actor.as_bytes());
        }
        hasher.update_bool(self.returning);
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Definitions, active instances and the recycle pool.
#[derive(Clone, Debug, Default)]
pub struct ProjectileEngine {
    definitions: BTreeMap<ProjectileDefId, ProjectileDefinition>,
    active: Vec<ProjectileInstance>,
    pool: BTreeMap<ProjectileDefId, Vec<ProjectileInstance>>,
    next_id: u32,
    max_active: usize,
    pool_per_definition: usize,
}

impl ProjectileEngine {
    /// Empty engine.
    pub fn new(max_active: usize, pool_per_definition: usize) -> Self {
        Self {
            definitions: BTreeMap::new(),
            active: Vec::new(),
            pool: BTreeMap::new(),
            next_id: 1,
            max_active,
            pool_per_definition,
        }
    }

    /// Register a definition. Re-registering an id replaces it.
    pub fn register(&mut self, definition: ProjectileDefinition) -> Result<(), CombatError> {
        definition.validate()?;
        self.definitions.insert(definition.id, definition);
        Ok(())
    }

    /// Definition by id.
    pub fn definition(&self, id: ProjectileDefId) -> Option<&ProjectileDefinition> {
        self.definitions.get(&id)
    }

    /// Active projectiles in spawn order.
    pub fn active(&self) -> &[ProjectileInstance] {
        &self.active
    }

    /// Active projectiles launched by one caster.
    pub fn by_caster(&self, caster: ActorId) -> Vec<&ProjectileInstance> {
        self.active.iter().filter(|p| p.caster == caster).collect()
    }

    /// Active projectile by id.
    pub fn get(&self, id: ProjectileId) -> Option<&ProjectileInstance> {
        self.active.iter().find(|p| p.id == id)
    }

    /// Number of active projectiles.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Recycled instances waiting for a definition.
    pub fn pooled(&self, definition: ProjectileDefId) -> usize {
        self.pool.get(&definition).map_or(0, Vec::len)
    }

    fn acquire(&mut self, definition: ProjectileDefId) -> ProjectileInstance {
        self.pool
            .get_mut(&definition)
            .and_then(Vec::pop)
            .unwrap_or_else(|| ProjectileInstance::blank(definition))
    }

    fn recycle(&mut self, mut instance: ProjectileInstance) {
        instance.reset();
        let limit = self.pool_per_definition;
        let pool = self.pool.entry(instance.definition).or_default();
        if pool.len() < limit {
            pool.push(instance);
        }
    }

    /// Hash active instances in spawn order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.active.len() as u32);
        for projectile in &self.active {
            projectile.hash_into(hasher);
        }
    }
}

// =============================================================================
// CONTEXT OPERATIONS
// =============================================================================

/// Launch a projectile from `origin` along `direction`.
///
/// A zero direction launches along +X. Fails with `ProjectileCapacity` at
/// the active limit, `UnknownProjectile` for unregistered definitions.
pub fn spawn_projectile(
    state: &mut CombatState,
    definition: ProjectileDefId,
    caster: ActorId,
    origin: FixedVec3,
    direction: FixedVec3,
    homing_target: Option<ActorId>,
) -> Result<ProjectileId, CombatError> {
    let (speed, lifetime, budget) = match state.projectiles.definition(definition) {
        Some(def) => (def.speed, def.lifetime, def.hit_budget()),
        None => return Err(CombatError::UnknownProjectile(definition)),
    };
    if state.projectiles.active.len() >= state.projectiles.max_active {
        debug!("spawn_projectile: active limit {} reached", state.projectiles.max_active);
        return Err(CombatError::ProjectileCapacity(state.projectiles.max_active));
    }

    let mut direction = direction.normalize();
    if direction.is_zero() {
        direction = FixedVec3::FORWARD;
    }

    let id = ProjectileId(state.projectiles.next_id);
    state.projectiles.next_id += 1;

    let mut instance = state.projectiles.acquire(definition);
    instance.id = id;
    instance.caster = caster;
    instance.position = origin;
    instance.velocity = direction.scale(speed);
    instance.lifetime_remaining = lifetime;
    instance.hits_remaining = budget;
    instance.homing_target = homing_target;
    state.projectiles.active.push(instance);

    let tick = state.tick;
    state.events.push(tick, CombatEventData::ProjectileSpawned {
        projectile: id,
        definition,
        caster,
        position: origin,
    });
    Ok(id)
}

/// Remove one projectile immediately. Idempotent.
pub fn destroy_projectile(state: &mut CombatState, id: ProjectileId) -> bool {
    let Some(index) = state.projectiles.active.iter().position(|p| p.id == id) else {
        return false;
    };
    let instance = state.projectiles.active.remove(index);
    finish(state, instance, ProjectileEndReason::Cleared);
    true
}

/// Remove every active projectile.
pub fn clear_projectiles(state: &mut CombatState) -> usize {
    let active = std::mem::take(&mut state.projectiles.active);
    let count = active.len();
    for instance in active {
        finish(state, instance, ProjectileEndReason::Cleared);
    }
    count
}

/// Advance every active projectile by `dt`, in spawn order.
pub fn update_projectiles(state: &mut CombatState, world: &dyn SpatialQuery, dt: Fixed) {
    let active = std::mem::take(&mut state.projectiles.active);
    let mut survivors = Vec::with_capacity(active.len());

    for mut projectile in active {
        let Some(definition) = state.projectiles.definition(projectile.definition).cloned() else {
            finish(state, projectile, ProjectileEndReason::Cleared);
            continue;
        };
        match step(state, world, &definition, &mut projectile, dt) {
            None => survivors.push(projectile),
            Some(reason) => finish(state, projectile, reason),
        }
    }

    // Anything spawned during the pass goes after the survivors
    survivors.append(&mut state.projectiles.active);
    state.projectiles.active = survivors;
}

fn finish(state: &mut CombatState, instance: ProjectileInstance, reason: ProjectileEndReason) {
    let tick = state.tick;
    state.events.push(tick, CombatEventData::ProjectileDestroyed {
        projectile: instance.id,
        reason,
    });
    state.projectiles.recycle(instance);
}

/// One atomic step. Returns the end reason if the projectile terminated.
fn step(
    state: &mut CombatState,
    world: &dyn SpatialQuery,
    def: &ProjectileDefinition,
    p: &mut ProjectileInstance,
    dt: Fixed,
) -> Option<ProjectileEndReason> {
    p.age = p.age.saturating_add(dt);

    match def.movement {
        MovementKind::Straight | MovementKind::Chaining => {}
        MovementKind::Homing => steer_homing(state, world, def, p, dt),
        MovementKind::Arcing => {
            let gravity = state.config.gravity.scale(def.gravity_multiplier).scale(dt);
            p.velocity = p.velocity.add(gravity);
        }
        MovementKind::Boomerang => {
            if p.returning {
                let caster = world.actor_pose(p.caster).filter(|_| state.is_registered(p.caster));
                let Some(pose) = caster else {
                    return Some(ProjectileEndReason::CasterLost);
                };
                p.velocity = pose.position.sub(p.position).with_length(def.return_speed);
            }
        }
    }

    let displacement = p.velocity.scale(dt);
    p.position = p.position.add(displacement);
    p.distance_traveled = p.distance_traveled.saturating_add(displacement.length());
    p.lifetime_remaining -= dt;

    #[cfg(feature = "debug-tracing")]
    trace!("projectile {:?} at {:?} v={:?}", p.id, p.position.to_floats(), p.velocity.to_floats());

    if p.returning {
        let caught = world
            .actor_pose(p.caster)
            .is_some_and(|pose| p.position.within(pose.position, state.config.boomerang_catch_radius.saturating_add(pose.radius)));
        if caught {
            return Some(ProjectileEndReason::Caught);
        }
    }

    if p.lifetime_remaining <= 0 {
        return Some(ProjectileEndReason::Expired);
    }
    if def.max_distance > 0 && p.distance_traveled >= def.max_distance && !p.returning {
        if def.movement == MovementKind::Boomerang {
            p.returning = true;
        } else {
            return Some(ProjectileEndReason::MaxDistance);
        }
    }

    let target = world
        .overlap_sphere(p.position, def.collision_radius)
        .into_iter()
        .find(|actor| *actor != p.caster && !p.has_hit(*actor) && state.is_alive(*actor))?;

    resolve_collision(state, world, def, p, target)
}

fn steer_homing(state: &CombatState, world: &dyn SpatialQuery, def: &ProjectileDefinition, p: &mut ProjectileInstance, dt: Fixed) {
    if p.age < def.homing_delay {
        return;
    }
    let Some(target) = p.homing_target.filter(|t| state.is_alive(*t)) else {
        return;
    };
    let Some(pose) = world.actor_pose(target) else {
        return;
    };

    let speed = p.velocity.length();
    let current = p.velocity.normalize();
    let desired = pose.position.sub(p.position).normalize();
    if current.is_zero() || desired.is_zero() {
        return;
    }

    let max_turn = fixed_mul(def.homing_turn_rate, dt);
    let cos_now = current.dot(desired);
    let cos_max = fixed_cos_deg(max_turn);

    let heading = if max_turn >= DEG_180 || cos_now >= cos_max {
        desired
    } else {
        // Rotate toward `desired` by max_turn within their common plane
        let mut perpendicular = desired.sub(current.scale(cos_now)).normalize();
        if perpendicular.is_zero() {
            perpendicular = current.cross(FixedVec3::UP).normalize();
            if perpendicular.is_zero() {
                perpendicular = current.cross(FixedVec3::RIGHT).normalize();
            }
        }
        current
            .scale(cos_max)
            .add(perpendicular.scale(fixed_sin_deg(max_turn)))
    };
    p.velocity = heading.with_length(speed);
}

fn resolve_collision(
    state: &mut CombatState,
    world: &dyn SpatialQuery,
    def: &ProjectileDefinition,
    p: &mut ProjectileInstance,
    target: ActorId,
) -> Option<ProjectileEndReason> {
    p.hit_set.push(target);
    let tick = state.tick;
    state.events.push(tick, CombatEventData::ProjectileHit {
        projectile: p.id,
        target,
        position: p.position,
    });

    p.hits_remaining = p.hits_remaining.saturating_sub(1);

    // The blast is the whole payload, the struck actor included
    if def.collision == CollisionPolicy::Explode {
        explode(state, world, def, p);
        return Some(ProjectileEndReason::Collision);
    }

    let target_position = world.actor_pose(target).map(|pose| pose.position);
    hit(state, p, def, target, def.damage, target_position);

    match def.collision {
        CollisionPolicy::Stop | CollisionPolicy::Explode => Some(ProjectileEndReason::Collision),

        CollisionPolicy::Pierce => (p.hits_remaining == 0).then_some(ProjectileEndReason::Collision),

        CollisionPolicy::Bounce => {
            if p.hits_remaining == 0 {
                return Some(ProjectileEndReason::Collision);
            }
            let speed = p.velocity.length();
            let away = target_position.map_or(FixedVec3::ZERO, |t| p.position.sub(t).normalize());
            p.velocity = if away.is_zero() {
                p.velocity.negate()
            } else {
                away.scale(speed)
            };
            None
        }

        CollisionPolicy::Chain => {
            if p.hits_remaining == 0 {
                return Some(ProjectileEndReason::Collision);
            }
            let next = world
                .overlap_sphere(p.position, def.chain_range)
                .into_iter()
                .filter(|actor| *actor != p.caster && !p.has_hit(*actor) && state.is_alive(*actor))
                .filter_map(|actor| world.actor_pose(actor).map(|pose| (actor, pose.position)))
                .min_by_key(|(_, position)| p.position.distance_squared_wide(*position));
            match next {
                Some((actor, position)) => {
                    let speed = p.velocity.length();
                    let toward = position.sub(p.position).normalize();
                    if !toward.is_zero() {
                        p.velocity = toward.scale(speed);
                    }
                    p.homing_target = Some(actor);
                    None
                }
                None => Some(ProjectileEndReason::ChainExhausted),
            }
        }
    }
}

fn hit(
    state: &mut CombatState,
    p: &ProjectileInstance,
    def: &ProjectileDefinition,
    target: ActorId,
    amount: Fixed,
    target_position: Option<FixedVec3>,
) {
    let normal = target_position.map_or(FixedVec3::ZERO, |t| p.position.sub(t).normalize());
    let request = DamageRequest::new(Some(p.caster), target, amount, def.damage_type).with_hit(p.position, normal);
    if let Err(e) = apply_damage(state, &request) {
        debug!("projectile {:?} hit skipped: {}", p.id, e);
    }
}

fn explode(
    state: &mut CombatState,
    world: &dyn SpatialQuery,
    def: &ProjectileDefinition,
    p: &ProjectileInstance,
) {
    let radius = fixed_max(def.explosion_radius, 0);
    let victims: Vec<ActorId> = if radius == 0 {
        Vec::new()
    } else {
        world
            .overlap_sphere(p.position, radius)
            .into_iter()
            .filter(|actor| *actor != p.caster && state.is_alive(*actor))
            .collect()
    };

    let amount = fixed_mul(def.damage, def.explosion_multiplier);
    for &victim in &victims {
        let position = world.actor_pose(victim).map(|pose| pose.position);
        hit(state, p, def, victim, amount, position);
    }

    info!("Projectile {:?} exploded, {} caught in the blast", p.id, victims.len());
    let tick = state.tick;
    state.events.push(tick, CombatEventData::ProjectileExploded {
        projectile: p.id,
        position: p.position,
        radius,
        victims,
    });
}

// =============================================================================
// TESTS
// =============================================================================
