//! Target Acquisition
//!
//! Turns an ability's target mode plus a cast request into an ordered list
//! of actors. Candidates come from the spatial interface in query order,
//! then one uniform filter pass drops dead or unregistered actors, applies
//! the team rules and truncates to `max_targets`. Results are never
//! re-sorted by distance.

use tracing::debug;

use crate::core::fixed::{DEG_360, FIXED_SCALE, fixed_cos_deg};
use crate::core::vec3::FixedVec3;
use crate::combat::ability::{AbilityDefinition, CastFailure, CastRequest, TargetMode};
use crate::combat::actor::{ActorId, ActorPose};
use crate::combat::spatial::SpatialQuery;
use crate::combat::state::CombatState;

/// Aim direction for a request: toward the target actor when one is given
/// and present in the world, else the request direction. Unit length, or
/// zero if there is no usable aim.
pub fn aim_direction(world: &dyn SpatialQuery, caster_pose: &ActorPose, request: &CastRequest) -> FixedVec3 {
    if let Some(target) = request.target_actor {
        if let Some(pose) = world.actor_pose(target) {
            let toward = pose.position.sub(caster_pose.position).normalize();
            if !toward.is_zero() {
                return toward;
            }
        }
    }
    request.direction.normalize()
}

/// Is `offset` inside a cone of full angle `cone_angle` (degrees) around the
/// unit vector `forward`?
///
/// 0° accepts only offsets exactly along `forward`, 360° or more accepts
/// everything. A zero offset is always inside.
pub fn in_cone(forward: FixedVec3, offset: FixedVec3, cone_angle: i32) -> bool {
    if cone_angle >= DEG_360 || offset.is_zero() {
        return true;
    }

    if cone_angle <= 0 {
        // Exactly collinear and pointing the same way
        let (f, o) = (forward, offset);
        let cross_zero = (f.y as i128) * (o.z as i128) == (f.z as i128) * (o.y as i128)
            && (f.z as i128) * (o.x as i128) == (f.x as i128) * (o.z as i128)
            && (f.x as i128) * (o.y as i128) == (f.y as i128) * (o.x as i128);
        return cross_zero && forward.dot_wide(offset) > 0;
    }

    let cos_half = fixed_cos_deg(cone_angle / 2) as i64;
    let lhs = forward.dot_wide(offset);
    let rhs = (cos_half * offset.length() as i64) >> FIXED_SCALE;
    lhs >= rhs
}

/// Acquire targets for a cast.
///
/// Fails with `NoValidTargets` when nothing survives filtering, and with a
/// validation reason when the request cannot be evaluated at all.
pub fn acquire_targets(
    state: &CombatState,
    world: &dyn SpatialQuery,
    ability: &AbilityDefinition,
    request: &CastRequest,
) -> Result<Vec<ActorId>, CastFailure> {
    let caster = request.caster;
    let pose = world.actor_pose(caster).ok_or(CastFailure::CasterNotInWorld)?;
    let origin = pose.position;
    let exclude_caster = |ids: Vec<ActorId>| -> Vec<ActorId> {
        if ability.can_target_self {
            ids
        } else {
            ids.into_iter().filter(|id| *id != caster).collect()
        }
    };

    let candidates: Vec<ActorId> = match ability.target_mode {
        TargetMode::SelfTarget => vec![caster],

        TargetMode::SingleTarget => {
            if ability.can_target_self && request.target_actor == Some(caster) {
                vec![caster]
            } else {
                let direction = aim_direction(world, &pose, request);
                if direction.is_zero() {
                    return Err(CastFailure::InvalidDirection);
                }
                // Corpses and unregistered props don't stop the ray
                let first = world
                    .raycast(origin, direction, ability.range, Some(caster))
                    .into_iter()
                    .find(|hit| state.is_alive(hit.actor));
                match first {
                    Some(hit) if !ability.requires_line_of_sight || world.line_of_sight(origin, hit.point) => {
                        vec![hit.actor]
                    }
                    _ => Vec::new(),
                }
            }
        }

        TargetMode::GroundTarget => {
            let point = request.target_point;
            if !origin.within(point, ability.range) {
                return Err(CastFailure::OutOfRange);
            }
            if ability.requires_line_of_sight && !world.line_of_sight(origin, point) {
                return Err(CastFailure::NoLineOfSight);
            }
            exclude_caster(world.overlap_sphere(point, ability.radius))
        }

        TargetMode::Sphere => {
            let found = exclude_caster(world.overlap_sphere(origin, ability.radius));
            los_filter(world, ability, origin, found)
        }

        TargetMode::Line => {
            let direction = aim_direction(world, &pose, request);
            if direction.is_zero() {
                return Err(CastFailure::InvalidDirection);
            }
            let exclude = if ability.can_target_self { None } else { Some(caster) };
            world
                .raycast(origin, direction, ability.range, exclude)
                .into_iter()
                .filter(|hit| !ability.requires_line_of_sight || world.line_of_sight(origin, hit.point))
                .map(|hit| hit.actor)
                .collect()
        }

        TargetMode::Cone => {
            let mut forward = aim_direction(world, &pose, request);
            if forward.is_zero() {
                forward = pose.forward.normalize();
            }
            if forward.is_zero() {
                return Err(CastFailure::InvalidDirection);
            }
            let found: Vec<ActorId> = exclude_caster(world.overlap_sphere(origin, ability.range))
                .into_iter()
                .filter(|id| {
                    world
                        .actor_pose(*id)
                        .is_some_and(|p| in_cone(forward, p.position.sub(origin), ability.cone_angle))
                })
                .collect();
            los_filter(world, ability, origin, found)
        }
    };

    let targets = filter_targets(state, ability, caster, candidates);
    if targets.is_empty() {
        debug!("{} ({:?}) found no valid targets", ability.name, ability.target_mode);
        return Err(CastFailure::NoValidTargets);
    }
    Ok(targets)
}

fn los_filter(world: &dyn SpatialQuery, ability: &AbilityDefinition, origin: FixedVec3, ids: Vec<ActorId>) -> Vec<ActorId> {
    if !ability.requires_line_of_sight {
        return ids;
    }
    ids.into_iter()
        .filter(|id| world.actor_pose(*id).is_some_and(|p| world.line_of_sight(origin, p.position)))
        .collect()
}

/// Uniform filter pass: live registered actors, team rules, target cap.
///
/// The caster always survives the team rules. Allies-only keeps only the
/// caster's team; otherwise same-team actors are dropped unless friendly
/// fire is allowed.
pub fn filter_targets(
    state: &CombatState,
    ability: &AbilityDefinition,
    caster: ActorId,
    candidates: Vec<ActorId>,
) -> Vec<ActorId> {
    let caster_team = state.team_of(caster);
    let mut targets: Vec<ActorId> = Vec::with_capacity(candidates.len());

    for id in candidates {
        if targets.contains(&id) || !state.is_alive(id) {
            continue;
        }
        if id != caster {
            let same_team = state.team_of(id) == caster_team;
            let keep = if ability.allies_only {
                same_team
            } else {
                !same_team || ability.allow_friendly_fire
            };
            if !keep {
                continue;
            }
        }
        targets.push(id);
        if ability.max_targets > 0 && targets.len() >= ability.max_targets as usize {
            break;
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, FIXED_HALF, FIXED_ONE};
    use crate::combat::ability::{AbilityId, AbilityType};
    use crate::combat::actor::{CombatStats, TeamId};
    use crate::combat::config::CombatConfig;
    use crate::combat::damage::DamageType;
    use crate::combat::spatial::ActorWorld;

    const CASTER: ActorId = ActorId::new([1; 16]);

    fn id(n: u8) -> ActorId {
        ActorId::new([n; 16])
    }

    /// Caster at the origin facing +X; enemies (team 1) and one ally (team 0).
    fn arena() -> (CombatState, ActorWorld) {
        let mut state = CombatState::new([0; 16], 5, CombatConfig::default());
        let mut world = ActorWorld::new();
        let mut add = |actor: ActorId, team: u8, x: i32, y: i32| {
            state.register_actor(actor, TeamId(team), CombatStats::new(from_int(100))).unwrap();
            world.upsert_actor(actor, ActorPose::at(FixedVec3::from_ints(x, y, 0), FIXED_HALF));
        };
        add(CASTER, 0, 0, 0);
        add(id(10), 1, 5, 0);
        add(id(11), 1, 10, 0);
        add(id(12), 1, 0, 5);
        add(id(13), 0, 3, 1);
        add(id(14), 1, -6, 0);
        (state, world)
    }

    fn ability(mode: TargetMode) -> AbilityDefinition {
        AbilityDefinition::new(AbilityId(1), "Test", AbilityType::Damage, mode)
            .with_power(DamageType::Fire, from_int(10))
            .with_range(from_int(20))
    }

    #[test]
    fn test_self_target() {
        let (state, world) = arena();
        let request = CastRequest::new(CASTER, AbilityId(1));
        let targets = acquire_targets(&state, &world, &ability(TargetMode::SelfTarget), &request).unwrap();
        assert_eq!(targets, vec![CASTER]);
    }

    #[test]
    fn test_single_target_first_hit() {
        let (state, world) = arena();
        let request = CastRequest::new(CASTER, AbilityId(1)).toward(FixedVec3::FORWARD);
        let targets = acquire_targets(&state, &world, &ability(TargetMode::SingleTarget), &request).unwrap();
        assert_eq!(targets, vec![id(10)]);
    }

    #[test]
    fn test_single_target_toward_actor() {
        let (state, world) = arena();
        let request = CastRequest::new(CASTER, AbilityId(1)).on_actor(id(12));
        let targets = acquire_targets(&state, &world, &ability(TargetMode::SingleTarget), &request).unwrap();
        assert_eq!(targets, vec![id(12)]);
    }

    #[test]
    fn test_single_target_zero_direction() {
        let (state, world) = arena();
        let request = CastRequest::new(CASTER, AbilityId(1));
        assert_eq!(
            acquire_targets(&state, &world, &ability(TargetMode::SingleTarget), &request),
            Err(CastFailure::InvalidDirection)
        );
    }

    #[test]
    fn test_single_target_skips_corpses() {
        let (mut state, world) = arena();
        state.stats_mut(id(10)).unwrap().dead = true;
        let request = CastRequest::new(CASTER, AbilityId(1)).toward(FixedVec3::FORWARD);
        let targets = acquire_targets(&state, &world, &ability(TargetMode::SingleTarget), &request).unwrap();
        assert_eq!(targets, vec![id(11)]);
    }

    #[test]
    fn test_single_target_obstructed() {
        let (state, mut world) = arena();
        world.add_blocker(FixedVec3::from_ints(2, 0, 0), FIXED_HALF);
        let request = CastRequest::new(CASTER, AbilityId(1)).toward(FixedVec3::FORWARD);
        let los = ability(TargetMode::SingleTarget).requires_line_of_sight();
        assert_eq!(acquire_targets(&state, &world, &los, &request), Err(CastFailure::NoValidTargets));
        // Without the flag the blocker is ignored
        assert!(acquire_targets(&state, &world, &ability(TargetMode::SingleTarget), &request).is_ok());
    }

    #[test]
    fn test_ground_target_range_and_order() {
        let (state, world) = arena();
        let def = ability(TargetMode::GroundTarget).with_radius(from_int(6));
        let request = CastRequest::new(CASTER, AbilityId(1)).at_point(FixedVec3::from_ints(8, 0, 0));
        let targets = acquire_targets(&state, &world, &def, &request).unwrap();
        // World order, ally dropped
        assert_eq!(targets, vec![id(10), id(11)]);

        let far = CastRequest::new(CASTER, AbilityId(1)).at_point(FixedVec3::from_ints(50, 0, 0));
        assert_eq!(acquire_targets(&state, &world, &def, &far), Err(CastFailure::OutOfRange));
    }

    #[test]
    fn test_sphere_centered_on_caster() {
        let (state, world) = arena();
        let def = ability(TargetMode::Sphere).with_radius(from_int(6)).with_max_targets(2);
        let request = CastRequest::new(CASTER, AbilityId(1));
        let targets = acquire_targets(&state, &world, &def, &request).unwrap();
        assert_eq!(targets, vec![id(10), id(12)]);
    }

    #[test]
    fn test_line_in_ray_order() {
        let (state, world) = arena();
        let request = CastRequest::new(CASTER, AbilityId(1)).toward(FixedVec3::FORWARD);
        let targets = acquire_targets(&state, &world, &ability(TargetMode::Line), &request).unwrap();
        assert_eq!(targets, vec![id(10), id(11)]);

        let capped = ability(TargetMode::Line).with_max_targets(1);
        assert_eq!(acquire_targets(&state, &world, &capped, &request).unwrap(), vec![id(10)]);
    }

    #[test]
    fn test_cone_filters_by_angle() {
        let (state, world) = arena();
        let request = CastRequest::new(CASTER, AbilityId(1)).toward(FixedVec3::FORWARD);
        let narrow = ability(TargetMode::Cone).with_cone_angle(from_int(90));
        assert_eq!(acquire_targets(&state, &world, &narrow, &request).unwrap(), vec![id(10), id(11)]);

        // 180° reaches the actor standing exactly at 90°
        let wide = ability(TargetMode::Cone).with_cone_angle(from_int(180));
        assert_eq!(
            acquire_targets(&state, &world, &wide, &request).unwrap(),
            vec![id(10), id(11), id(12)]
        );

        let all = ability(TargetMode::Cone).with_cone_angle(from_int(360));
        assert_eq!(
            acquire_targets(&state, &world, &all, &request).unwrap(),
            vec![id(10), id(11), id(12), id(14)]
        );
    }

    #[test]
    fn test_cone_zero_is_exact_forward() {
        let forward = FixedVec3::FORWARD;
        assert!(in_cone(forward, FixedVec3::from_ints(7, 0, 0), 0));
        assert!(!in_cone(forward, FixedVec3::new(from_int(7), 1, 0), 0));
        assert!(!in_cone(forward, FixedVec3::from_ints(-7, 0, 0), 0));
        assert!(in_cone(forward, FixedVec3::from_ints(-7, 3, 0), DEG_360));
    }

    #[test]
    fn test_friendly_fire_and_allies_only() {
        let (state, world) = arena();
        let request = CastRequest::new(CASTER, AbilityId(1));
        let ff = ability(TargetMode::Sphere).with_radius(from_int(4)).friendly_fire();
        assert_eq!(acquire_targets(&state, &world, &ff, &request).unwrap(), vec![id(13)]);

        let heal = AbilityDefinition::new(AbilityId(2), "Circle", AbilityType::Healing, TargetMode::Sphere)
            .with_radius(from_int(20))
            .allies_only()
            .can_target_self();
        assert_eq!(acquire_targets(&state, &world, &heal, &request).unwrap(), vec![CASTER, id(13)]);
    }

    #[test]
    fn test_no_valid_targets() {
        let (state, world) = arena();
        let def = ability(TargetMode::Sphere).with_radius(FIXED_ONE);
        let request = CastRequest::new(CASTER, AbilityId(1));
        assert_eq!(acquire_targets(&state, &world, &def, &request), Err(CastFailure::NoValidTargets));
    }

    #[test]
    fn test_caster_not_in_world() {
        let (state, _) = arena();
        let empty = ActorWorld::new();
        let request = CastRequest::new(CASTER, AbilityId(1));
        assert_eq!(
            acquire_targets(&state, &empty, &ability(TargetMode::SelfTarget), &request),
            Err(CastFailure::CasterNotInWorld)
        );
    }
}
