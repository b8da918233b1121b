//! Enemy movement (фаза Movement): chase steering, roam, freeze.
//!
//! Позиция пишется прямо в Transform (kinematic интеграция, как в headless режиме),
//! rapier `Velocity` отражает намеренную скорость для хоста и аниматора.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use super::steering::{avoid_obstacles, pick_roam_target, snap_to_ground};
use crate::ai::{EnemyConfig, EnemyMemory, EnemyState};
use crate::components::{Concealed, Enemy, SpawnPoint};
use crate::math;
use crate::spatial::{ObstacleField, SafeZoneIndex};
use crate::DeterministicRng;

/// Угол до цели, начиная с которого враг только разворачивается
pub const MAX_MOVE_ANGLE: f32 = 90.0;
/// Roam разворачивается вдвое медленнее погони
pub const ROAM_ROTATION_FACTOR: f32 = 0.5;

/// Система: движение по состоянию FSM
pub fn enemy_movement(
    field: Res<ObstacleField>,
    safe_zones: Res<SafeZoneIndex>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut enemies: Query<
        (Entity, &mut Transform, &EnemyConfig, &EnemyState, &mut EnemyMemory, &SpawnPoint, &mut Velocity),
        (With<Enemy>, Without<Concealed>),
    >,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, config, state, mut memory, spawn, mut velocity) in enemies.iter_mut() {
        match state {
            EnemyState::CatchingPlayer => continue,

            EnemyState::Frozen => {
                // Горизонтальная скорость в ноль, вертикаль оставляем хосту
                velocity.linvel.x = 0.0;
                velocity.linvel.z = 0.0;
                velocity.angvel = Vec3::ZERO;
            }

            EnemyState::Chasing => {
                let step = chase_step(entity, &transform, config, &memory, &field, &safe_zones, delta);
                apply_step(&mut transform, &mut velocity, step);
            }

            EnemyState::Idle => {
                let step = roam_step(
                    entity,
                    &transform,
                    config,
                    &mut memory,
                    spawn,
                    &field,
                    &safe_zones,
                    &mut rng,
                    delta,
                );
                apply_step(&mut transform, &mut velocity, step);
            }
        }
    }
}

/// Результат одного шага движения
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveStep {
    pub rotation: Quat,
    pub translation: Vec3,
    /// Горизонтальная скорость (для Velocity и аниматора)
    pub velocity: Vec3,
}

impl MoveStep {
    fn hold(transform: &Transform, rotation: Quat) -> Self {
        Self {
            rotation,
            translation: transform.translation,
            velocity: Vec3::ZERO,
        }
    }
}

fn apply_step(transform: &mut Transform, velocity: &mut Velocity, step: MoveStep) {
    transform.rotation = step.rotation;
    transform.translation = step.translation;
    velocity.linvel = Vec3::new(step.velocity.x, velocity.linvel.y, step.velocity.z);
    velocity.angvel = Vec3::ZERO;
}

/// Chase: slerp к голове игрока, движение при угле < 90° и дистанции > min_follow_distance.
pub fn chase_step(
    entity: Entity,
    transform: &Transform,
    config: &EnemyConfig,
    memory: &EnemyMemory,
    field: &ObstacleField,
    safe_zones: &SafeZoneIndex,
    delta: f32,
) -> MoveStep {
    let position = transform.translation;
    let Some(target) = memory.player_target else {
        return MoveStep::hold(transform, transform.rotation);
    };

    let to_target = target - position;
    let rotation = match math::yaw_rotation_towards(to_target) {
        Some(look) => transform.rotation.slerp(look, math::slerp_factor(delta, config.rotation_speed)),
        None => transform.rotation,
    };

    let angle = math::angle_between_deg(math::forward_flat(rotation), math::flat(to_target));
    if angle >= MAX_MOVE_ANGLE || memory.distance_to_player <= config.min_follow_distance {
        return MoveStep::hold(transform, rotation);
    }

    let mut speed = if memory.in_sight() {
        config.chase_speed * config.in_sight_speed_multiplier
    } else {
        config.out_of_sight_speed
    };
    if memory.watched && !config.completely_stop_when_watched {
        speed *= config.watched_speed_multiplier;
    }

    // Не лезем в safe zone за игроком; сами внутри зоны: сначала наружу
    let player_feet = target - Vec3::Y * config.target_head_offset;
    let goal = if safe_zones.contains(position) {
        safe_zones.nearest_point_outside(position)
    } else if safe_zones.contains(player_feet) || safe_zones.path_crosses(position, player_feet) {
        safe_zones.nearest_safe_approach(player_feet, position)
    } else {
        player_feet
    };

    advance_towards(entity, transform, rotation, goal, speed, config, field, safe_zones, delta)
}

/// Idle: ждём на точке или идём к roam точке
#[allow(clippy::too_many_arguments)]
pub fn roam_step(
    entity: Entity,
    transform: &Transform,
    config: &EnemyConfig,
    memory: &mut EnemyMemory,
    spawn: &SpawnPoint,
    field: &ObstacleField,
    safe_zones: &SafeZoneIndex,
    rng: &mut DeterministicRng,
    delta: f32,
) -> MoveStep {
    let position = transform.translation;
    if !config.roams() {
        return MoveStep::hold(transform, transform.rotation);
    }

    if memory.waiting {
        memory.wait_timer -= delta;
        if memory.wait_timer <= 0.0 {
            memory.waiting = false;
            memory.roam_target = None;
        }
        return MoveStep::hold(transform, transform.rotation);
    }

    let target = match memory.roam_target {
        Some(target) => target,
        None => {
            let target = pick_roam_target(&mut rng.rng, spawn.position(), position, config, field, safe_zones);
            memory.roam_target = Some(target);
            target
        }
    };

    if math::flat_distance(position, target) < config.arrival_distance {
        memory.waiting = true;
        memory.wait_timer = config.wait_time_at_point;
        return MoveStep::hold(transform, transform.rotation);
    }

    let rotation = match math::yaw_rotation_towards(target - position) {
        Some(look) => transform
            .rotation
            .slerp(look, math::slerp_factor(delta, config.rotation_speed * ROAM_ROTATION_FACTOR)),
        None => transform.rotation,
    };

    let step = advance_towards(entity, transform, rotation, target, config.roam_speed, config, field, safe_zones, delta);
    if step.velocity == Vec3::ZERO {
        // Застряли (стена или граница safe zone) — новая точка в следующем tick'е
        memory.roam_target = None;
    }
    step
}

/// Общий шаг к `goal`: avoidance, запрет входа в safe zone (снаружи), ground snap
#[allow(clippy::too_many_arguments)]
fn advance_towards(
    entity: Entity,
    transform: &Transform,
    rotation: Quat,
    goal: Vec3,
    speed: f32,
    config: &EnemyConfig,
    field: &ObstacleField,
    safe_zones: &SafeZoneIndex,
    delta: f32,
) -> MoveStep {
    let position = transform.translation;
    let remaining = math::flat_distance(position, goal);
    let step_length = (speed * delta).min(remaining);
    if step_length <= f32::EPSILON {
        return MoveStep::hold(transform, rotation);
    }

    let Some(direction) = avoid_obstacles(field, position, goal - position, step_length, config, entity) else {
        return MoveStep::hold(transform, rotation);
    };

    let next = position + direction * step_length;
    if safe_zones.contains(next) && !safe_zones.contains(position) {
        return MoveStep::hold(transform, rotation);
    }

    MoveStep {
        rotation,
        translation: snap_to_ground(field, next, config.ground_offset),
        velocity: direction * speed,
    }
}
