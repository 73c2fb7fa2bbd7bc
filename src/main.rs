//! Relic Combat Simulator
//!
//! Runs a scripted skirmish through the combat core, logs the notable
//! events, then replays it and checks the state hashes match.

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use relic_combat::{
    TICK_RATE, VERSION,
    core::fixed::{from_int, to_float, FIXED_HALF, FIXED_ONE},
    core::vec3::FixedVec3,
    combat::{
        ability::{AbilityDefinition, AbilityId, AbilityType, CastOutcome, CastRequest, ResourceKind, TargetMode, WhiffPolicy},
        actor::{ActorId, ActorPose, CombatStats, TeamId},
        buff::{BuffTemplate, ModifierKind, PeriodicEffect, StatKind},
        cast::{cast_ability, complete_cast, pay_cast_costs},
        config::CombatConfig,
        damage::DamageType,
        events::CombatEventData,
        projectile::{CollisionPolicy, MovementKind, ProjectileDefId, ProjectileDefinition},
        services::{CastClock, CastServices, CooldownBook, HookLog, ResourceLedger},
        snapshot::CombatSnapshot,
        spatial::ActorWorld,
        state::CombatState,
        tick::tick,
    },
};

const SESSION_ID: [u8; 16] = [7; 16];
const RNG_SEED: u64 = 0x0052_454C_4943;
const SKIRMISH_TICKS: u32 = 600;

const PALADIN: ActorId = ActorId::new([0x10; 16]);
const ARCHER: ActorId = ActorId::new([0x11; 16]);
const WARLOCK: ActorId = ActorId::new([0x20; 16]);
const GOLEM: ActorId = ActorId::new([0x21; 16]);

const FIREBALL: AbilityId = AbilityId(1);
const CHAIN_LIGHTNING: AbilityId = AbilityId(2);
const CURSE: AbilityId = AbilityId(3);
const SMITE: AbilityId = AbilityId(4);
const MEND: AbilityId = AbilityId(5);
const FORTIFY: AbilityId = AbilityId(6);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Relic Combat Simulator v{}", VERSION);

    let config = match std::env::var("COMBAT_CONFIG") {
        Ok(path) => CombatConfig::from_json_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => CombatConfig {
            tick_rate: TICK_RATE,
            ..CombatConfig::default()
        },
    };
    info!("Tick Rate: {} Hz, {} ticks", config.tick_rate, SKIRMISH_TICKS);

    let first = run_skirmish(config.clone(), true)?;
    let replay = run_skirmish(config, false)?;

    info!("Final State Hash: {}", first.hash_hex());
    if first.state_hash != replay.state_hash {
        bail!("replay diverged: {} vs {}", first.hash_hex(), replay.hash_hex());
    }
    info!("Replay verified, {} bytes per snapshot", first.to_bytes()?.len());
    Ok(())
}

/// In-memory stand-ins for the game's cooldown, resource and timer systems.
#[derive(Default)]
struct Collaborators {
    cooldowns: CooldownBook,
    resources: ResourceLedger,
    timer: CastClock,
    hooks: HookLog,
}

impl Collaborators {
    fn services(&mut self) -> CastServices<'_> {
        CastServices {
            cooldowns: &mut self.cooldowns,
            resources: &mut self.resources,
            timer: &mut self.timer,
            hooks: &mut self.hooks,
        }
    }
}

/// Build the arena: two teams of two, facing each other across 16 units.
fn setup(config: CombatConfig) -> Result<(CombatState, ActorWorld)> {
    let mut state = CombatState::new(SESSION_ID, RNG_SEED, config);
    let mut world = ActorWorld::new();

    let roster = [
        (PALADIN, TeamId(0), CombatStats::new(from_int(220)).with_armor(from_int(60)), FixedVec3::from_ints(0, 0, 0)),
        (ARCHER, TeamId(0), CombatStats::new(from_int(140)).with_crit(FIXED_ONE / 4, from_int(2)), FixedVec3::from_ints(-2, 3, 0)),
        (WARLOCK, TeamId(1), CombatStats::new(from_int(150)).with_shield(from_int(40)), FixedVec3::from_ints(16, 1, 0)),
        (GOLEM, TeamId(1), CombatStats::new(from_int(300)).with_armor(from_int(120)).with_vulnerability(DamageType::Energy, from_int(2)), FixedVec3::from_ints(14, -1, 0)),
    ];
    for (id, team, stats, position) in roster {
        state.register_actor(id, team, stats)?;
        world.upsert_actor(id, ActorPose::at(position, FIXED_HALF));
    }

    state.register_projectile(
        ProjectileDefinition::new(ProjectileDefId(1), "Fireball", MovementKind::Straight, CollisionPolicy::Explode, from_int(18), from_int(30), DamageType::Fire)
            .with_explosion(from_int(3), FIXED_HALF),
    )?;
    state.register_projectile(
        ProjectileDefinition::new(ProjectileDefId(2), "Arc", MovementKind::Chaining, CollisionPolicy::Chain, from_int(40), from_int(14), DamageType::Energy)
            .with_chain(3, from_int(6)),
    )?;

    state.register_ability(
        AbilityDefinition::new(FIREBALL, "Fireball", AbilityType::Projectile, TargetMode::Line)
            .with_projectile(ProjectileDefId(1))
            .with_range(from_int(30))
            .with_cooldown(from_int(3))
            .with_cost(ResourceKind::Mana, from_int(20)),
    )?;
    state.register_ability(
        AbilityDefinition::new(CHAIN_LIGHTNING, "Chain Lightning", AbilityType::Projectile, TargetMode::Line)
            .with_projectile(ProjectileDefId(2))
            .with_range(from_int(30))
            .with_cooldown(from_int(4)),
    )?;
    state.register_ability(
        AbilityDefinition::new(CURSE, "Curse of Agony", AbilityType::Debuff, TargetMode::SingleTarget)
            .with_range(from_int(25))
            .with_cast_time(FIXED_ONE, false, true)
            .with_cooldown(from_int(6))
            .with_buff(
                BuffTemplate::periodic("Agony", PeriodicEffect::Damage { amount: from_int(6), damage_type: DamageType::Poison }, FIXED_ONE, from_int(6))
                    .debuff(),
            ),
    )?;
    state.register_ability(
        AbilityDefinition::new(SMITE, "Smite", AbilityType::Damage, TargetMode::Cone)
            .with_power(DamageType::Physical, from_int(25))
            .with_range(from_int(20))
            .with_cone_angle(from_int(40))
            .with_cooldown(from_int(2)),
    )?;
    state.register_ability(
        AbilityDefinition::new(MEND, "Mend", AbilityType::Healing, TargetMode::Sphere)
            .with_power(DamageType::True, from_int(20))
            .with_radius(from_int(6))
            .allies_only()
            .with_cooldown(from_int(5)),
    )?;
    state.register_ability(
        AbilityDefinition::new(FORTIFY, "Fortify", AbilityType::Buff, TargetMode::SelfTarget)
            .with_cooldown(from_int(8))
            .with_buff(BuffTemplate::stat("Fortify", StatKind::Armor, ModifierKind::Flat, from_int(15), from_int(4))),
    )?;

    Ok((state, world))
}

/// Run the scripted skirmish and return the final snapshot.
fn run_skirmish(config: CombatConfig, verbose: bool) -> Result<CombatSnapshot> {
    let (mut state, mut world) = setup(config)?;
    let dt = state.config.tick_duration();

    let mut collaborators = Collaborators::default();
    for id in [PALADIN, ARCHER, WARLOCK, GOLEM] {
        collaborators.resources.set_pool(id, ResourceKind::Mana, from_int(100));
    }

    world.face(PALADIN, FixedVec3::FORWARD);
    world.face(WARLOCK, FixedVec3::FORWARD.negate());

    let script = [
        (PALADIN, SMITE, Some(GOLEM)),
        (ARCHER, CHAIN_LIGHTNING, Some(WARLOCK)),
        (WARLOCK, FIREBALL, Some(PALADIN)),
        (WARLOCK, CURSE, Some(ARCHER)),
        (PALADIN, MEND, None),
        (PALADIN, FORTIFY, None),
    ];

    let mut kills = 0;
    for n in 0..SKIRMISH_TICKS {
        // Every half second, the next scripted caster acts
        if n % 30 == 0 {
            let mut services = collaborators.services();
            let (caster, ability, target) = script[(n / 30) as usize % script.len()];
            let mut request = CastRequest::new(caster, ability);
            if let Some(target) = target {
                request = request.on_actor(target);
            }
            let result = cast_ability(&mut state, &world, &mut services, &request);
            if let Some(definition) = state.ability(ability).cloned() {
                pay_cast_costs(&mut services, &definition, &result, WhiffPolicy::Free);
            }
            if verbose {
                match &result.outcome {
                    CastOutcome::Failed(reason) => info!("{} cast {:?}: {:?}", caster, ability, reason),
                    CastOutcome::CastStarted { context } => info!("{} began casting {:?} ({:?})", caster, ability, context),
                    CastOutcome::Completed => {}
                }
            }
        }

        for context in collaborators.timer.advance(dt) {
            let mut services = collaborators.services();
            let result = complete_cast(&mut state, &world, &mut services, context);
            if let Some(definition) = state.ability(result.ability).cloned() {
                pay_cast_costs(&mut services, &definition, &result, WhiffPolicy::Free);
            }
        }
        collaborators.cooldowns.advance(dt);

        let result = tick(&mut state, &world, dt);
        for dead in &result.deaths {
            world.remove_actor(*dead);
            kills += 1;
        }
        if verbose {
            log_events(&result.events);
        }
    }

    if verbose {
        for entry in state.actors() {
            info!(
                "{} team {} health {:.1}/{:.1}{}",
                entry.id,
                entry.team.0,
                to_float(entry.stats.health),
                to_float(entry.stats.max_health),
                if entry.stats.dead { " (dead)" } else { "" }
            );
        }
        info!("{} deaths, {} buffs and {} projectiles still active", kills, state.buffs.total(), state.projectiles.active_count());
    }
    Ok(CombatSnapshot::capture(&state))
}

fn log_events(events: &[relic_combat::CombatEvent]) {
    for event in events {
        match &event.data {
            CombatEventData::DamageApplied { attacker, target, amount, damage_type, crit, .. } => {
                let source = attacker.map_or_else(|| "-".to_string(), |a| a.to_string());
                info!(
                    "[{}] {} hit {} for {:.1} {:?}{}",
                    event.tick,
                    source,
                    target,
                    to_float(*amount),
                    damage_type,
                    if *crit { " (crit)" } else { "" }
                );
            }
            CombatEventData::HealApplied { target, amount, .. } => {
                info!("[{}] {} healed for {:.1}", event.tick, target, to_float(*amount));
            }
            CombatEventData::ActorDied { actor, killer } => {
                info!("[{}] {} died (killer: {:?})", event.tick, actor, killer.map(|k| k.to_string()));
            }
            CombatEventData::ProjectileExploded { victims, .. } => {
                info!("[{}] explosion caught {} actors", event.tick, victims.len());
            }
            _ => {}
        }
    }
}
