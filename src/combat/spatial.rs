//! Spatial Queries
//!
//! The combat core never owns actor positions. It asks a `SpatialQuery`
//! implementation every time, so answers always reflect the world as it is
//! during the current tick.
//!
//! `ActorWorld` is a small in-memory implementation (spheres for actors and
//! obstacles) used by the demo binary, tests and benches.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_SCALE, fixed_sqrt_wide, saturate};
use crate::core::vec3::FixedVec3;
use crate::combat::actor::{ActorId, ActorPose};

/// One actor intersected by a ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorHit {
    /// Actor hit
    pub actor: ActorId,
    /// Entry point on the actor's collision sphere
    pub point: FixedVec3,
    /// Surface normal at the entry point
    pub normal: FixedVec3,
    /// Distance from the ray origin
    pub distance: Fixed,
}

/// World queries consumed by targeting and projectiles.
pub trait SpatialQuery {
    /// Current pose of an actor, `None` if it is not in the world.
    fn actor_pose(&self, actor: ActorId) -> Option<ActorPose>;

    /// Every actor intersecting the ray within `max_distance`, nearest first.
    ///
    /// `direction` must be a unit vector. `exclude` is skipped.
    fn raycast(
        &self,
        origin: FixedVec3,
        direction: FixedVec3,
        max_distance: Fixed,
        exclude: Option<ActorId>,
    ) -> Vec<ActorHit>;

    /// Actors whose collision sphere touches the query sphere, in world order.
    fn overlap_sphere(&self, center: FixedVec3, radius: Fixed) -> Vec<ActorId>;

    /// Is the segment between two points free of obstructions?
    fn line_of_sight(&self, from: FixedVec3, to: FixedVec3) -> bool;
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Check if two spheres overlap (touching counts).
#[inline]
pub fn spheres_overlap(pos_a: FixedVec3, radius_a: Fixed, pos_b: FixedVec3, radius_b: Fixed) -> bool {
    pos_a.within(pos_b, radius_a.saturating_add(radius_b))
}

/// Distance along a unit ray to the first intersection with a sphere.
///
/// 0 when the origin is inside the sphere, `None` on a miss.
pub fn ray_sphere(origin: FixedVec3, direction: FixedVec3, center: FixedVec3, radius: Fixed) -> Option<Fixed> {
    let m = origin.sub(center);
    let b = m.dot_wide(direction);
    let radius_sq = ((radius as i64) * (radius as i64)) >> FIXED_SCALE;
    let c = m.length_squared_wide() - radius_sq;

    // Origin outside and pointing away
    if c > 0 && b > 0 {
        return None;
    }

    let b_sq = (((b as i128) * (b as i128)) >> FIXED_SCALE).min(i64::MAX as i128) as i64;
    let discriminant = b_sq.saturating_sub(c);
    if discriminant < 0 {
        return None;
    }

    let t = b.saturating_neg().saturating_sub(fixed_sqrt_wide(discriminant) as i64);
    Some(saturate(t.max(0)))
}

// =============================================================================
// REFERENCE WORLD
// =============================================================================

/// Static spherical obstruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    /// Center
    pub center: FixedVec3,
    /// Radius
    pub radius: Fixed,
}

/// In-memory world of actor spheres and spherical blockers.
///
/// Actors keep insertion order, which is the order volume queries report.
#[derive(Clone, Debug, Default)]
pub struct ActorWorld {
    actors: Vec<(ActorId, ActorPose)>,
    blockers: Vec<Blocker>,
}

impl ActorWorld {
    /// Empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an actor, or replace its pose in place.
    pub fn upsert_actor(&mut self, actor: ActorId, pose: ActorPose) {
        match self.actors.iter_mut().find(|(id, _)| *id == actor) {
            Some(entry) => entry.1 = pose,
            None => self.actors.push((actor, pose)),
        }
    }

    /// Move an actor. Returns false if it is not in the world.
    pub fn move_actor(&mut self, actor: ActorId, position: FixedVec3) -> bool {
        match self.actors.iter_mut().find(|(id, _)| *id == actor) {
            Some(entry) => {
                entry.1.position = position;
                true
            }
            None => false,
        }
    }

    /// Turn an actor. The direction is normalized.
    pub fn face(&mut self, actor: ActorId, forward: FixedVec3) -> bool {
        let forward = forward.normalize();
        match self.actors.iter_mut().find(|(id, _)| *id == actor) {
            Some(entry) if !forward.is_zero() => {
                entry.1.forward = forward;
                true
            }
            _ => false,
        }
    }

    /// Remove an actor.
    pub fn remove_actor(&mut self, actor: ActorId) -> bool {
        let before = self.actors.len();
        self.actors.retain(|(id, _)| *id != actor);
        self.actors.len() != before
    }

    /// Add an obstruction.
    pub fn add_blocker(&mut self, center: FixedVec3, radius: Fixed) {
        self.blockers.push(Blocker { center, radius });
    }

    /// Number of actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Is the world empty?
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl SpatialQuery for ActorWorld {
    fn actor_pose(&self, actor: ActorId) -> Option<ActorPose> {
        self.actors.iter().find(|(id, _)| *id == actor).map(|(_, pose)| *pose)
    }

    fn raycast(
        &self,
        origin: FixedVec3,
        direction: FixedVec3,
        max_distance: Fixed,
        exclude: Option<ActorId>,
    ) -> Vec<ActorHit> {
        let mut hits: Vec<ActorHit> = self
            .actors
            .iter()
            .filter(|(id, _)| Some(*id) != exclude)
            .filter_map(|(id, pose)| {
                let distance = ray_sphere(origin, direction, pose.position, pose.radius)?;
                if distance > max_distance {
                    return None;
                }
                let point = origin.add(direction.scale(distance));
                let mut normal = point.sub(pose.position).normalize();
                if normal.is_zero() {
                    normal = direction.negate();
                }
                Some(ActorHit {
                    actor: *id,
                    point,
                    normal,
                    distance,
                })
            })
            .collect();
        // Stable: equal distances keep world order
        hits.sort_by_key(|hit| hit.distance);
        hits
    }

    fn overlap_sphere(&self, center: FixedVec3, radius: Fixed) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, pose)| spheres_overlap(center, radius, pose.position, pose.radius))
            .map(|(id, _)| *id)
            .collect()
    }

    fn line_of_sight(&self, from: FixedVec3, to: FixedVec3) -> bool {
        let delta = to.sub(from);
        let length = delta.length();
        if length == 0 {
            return true;
        }
        let direction = delta.normalize();
        !self.blockers.iter().any(|blocker| {
            matches!(ray_sphere(from, direction, blocker.center, blocker.radius), Some(t) if t <= length)
        })
    }
}
