//! Eviction: враг внутри safe zone или в свете прячется, телепортируется на
//! spawn и появляется снова.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use super::steering::pick_roam_target;
use crate::ai::{
    EnemyConfig, EnemyMemory, EnemyState, EnemyStateChanged, Eviction, EvictionPhase, LightAvoidance, LightSource,
};
use crate::components::{Concealed, Enemy, SpawnPoint};
use crate::logger;
use crate::spatial::{hierarchy_root, world_transform, ObstacleField, SafeZoneIndex};
use crate::DeterministicRng;

/// Прячет врага: погоня отменена, скорость в ноль, Eviction + Concealed
fn begin_eviction(
    commands: &mut Commands,
    entity: Entity,
    state: &mut EnemyState,
    memory: &mut EnemyMemory,
    velocity: &mut Velocity,
    state_events: &mut EventWriter<EnemyStateChanged>,
    eviction: Eviction,
) {
    if *state != EnemyState::Idle {
        state_events.write(EnemyStateChanged {
            enemy: entity,
            from: *state,
            to: EnemyState::Idle,
        });
        *state = EnemyState::Idle;
    }
    memory.roam_target = None;
    velocity.linvel = Vec3::ZERO;
    commands.entity(entity).insert((eviction, Concealed));
}

/// Система: враг в свете `LightSource` исчезает (фаза Perception, до FSM)
#[allow(clippy::type_complexity)]
pub fn avoid_lights(
    mut commands: Commands,
    lights: Query<(Entity, &LightSource)>,
    transforms: Query<&Transform>,
    parents: Query<&ChildOf>,
    mut enemies: Query<
        (Entity, &mut EnemyState, &mut EnemyMemory, &mut Velocity, &LightAvoidance),
        (With<Enemy>, Without<Concealed>, Without<Eviction>),
    >,
    mut state_events: EventWriter<EnemyStateChanged>,
) {
    if lights.is_empty() {
        return;
    }

    // Детерминированный порядок: первый по Entity свет выигрывает
    let mut sources: Vec<(Entity, Vec3, LightSource)> = lights
        .iter()
        .filter(|(_, source)| source.enabled)
        .filter_map(|(entity, source)| {
            world_transform(entity, &transforms, &parents).map(|world| (entity, world.translation, *source))
        })
        .collect();
    sources.sort_by_key(|(entity, _, _)| *entity);

    for (enemy, mut state, mut memory, mut velocity, avoidance) in enemies.iter_mut() {
        if !avoidance.enabled || *state == EnemyState::CatchingPlayer {
            continue;
        }
        let Ok(enemy_transform) = transforms.get(enemy) else {
            continue;
        };

        // Собственный свет врага (фонарь, catch spotlight) не считается
        let touched = sources.iter().find(|(light, position, source)| {
            hierarchy_root(*light, &parents) != enemy && avoidance.touches(enemy_transform.translation, *position, source)
        });
        let Some((light, position, _)) = touched else {
            continue;
        };

        logger::log_info(&format!(
            "💡 Enemy {:?} touched light {:?} at {:?}, vanishing",
            enemy, light, position
        ));
        begin_eviction(
            &mut commands,
            enemy,
            &mut state,
            &mut memory,
            &mut velocity,
            &mut state_events,
            Eviction::light(avoidance),
        );
    }
}

/// Система: старт safe-zone eviction и продвижение всех eviction (фаза Movement, после движения)
#[allow(clippy::type_complexity)]
pub fn evict_enemies_from_safe_zones(
    mut commands: Commands,
    safe_zones: Res<SafeZoneIndex>,
    field: Res<ObstacleField>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut enemies: Query<
        (
            Entity,
            &mut Transform,
            &mut EnemyState,
            &mut EnemyMemory,
            &SpawnPoint,
            &EnemyConfig,
            &mut Velocity,
            Option<&mut Eviction>,
        ),
        With<Enemy>,
    >,
    mut state_events: EventWriter<EnemyStateChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut state, mut memory, spawn, config, mut velocity, eviction) in enemies.iter_mut() {
        let Some(mut eviction) = eviction else {
            if *state == EnemyState::CatchingPlayer || !safe_zones.contains(transform.translation) {
                continue;
            }

            logger::log_info(&format!(
                "🛡️ Enemy {:?} entered a safe zone at {:?}, evicting",
                entity, transform.translation
            ));
            begin_eviction(
                &mut commands,
                entity,
                &mut state,
                &mut memory,
                &mut velocity,
                &mut state_events,
                Eviction::safe_zone(),
            );
            continue;
        };

        eviction.timer -= delta;
        if eviction.timer > 0.0 {
            continue;
        }

        match eviction.phase {
            EvictionPhase::Hidden => {
                transform.translation = spawn.position();
                velocity.linvel = Vec3::ZERO;
                memory.reset();
                if config.roams() {
                    let spawn_position = spawn.position();
                    memory.roam_target = Some(pick_roam_target(
                        &mut rng.rng,
                        spawn_position,
                        spawn_position,
                        config,
                        &*field,
                        &safe_zones,
                    ));
                }
                eviction.phase = EvictionPhase::Reappearing;
                eviction.timer = eviction.reappear_secs;
                logger::log(&format!(
                    "🛡️ Enemy {:?} teleported to spawn {:?} ({:?})",
                    entity,
                    spawn.position(),
                    eviction.cause
                ));
            }
            EvictionPhase::Reappearing => {
                commands.entity(entity).remove::<(Eviction, Concealed)>();
                logger::log(&format!("🛡️ Enemy {:?} reappeared", entity));
            }
        }
    }
}
