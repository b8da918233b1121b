//! Animation sink pushes (фаза Movement, последней).

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use crate::ai::{EnemyConfig, EnemyMemory, EnemyState};
use crate::components::{AnimationSink, AnimatorParams, Enemy, PARAM_FROZEN, PARAM_PLAYER_IN_SIGHT, PARAM_SPEED};
use crate::math;

/// Система: speed / isPlayerInsight / isFrozen → AnimatorParams
///
/// playerCatch ведёт catch sequence. Отсутствующие параметры молча пропускаются.
pub fn push_enemy_animation(
    mut enemies: Query<(&EnemyState, &EnemyMemory, &EnemyConfig, &Velocity, &mut AnimatorParams), With<Enemy>>,
) {
    for (state, memory, config, velocity, mut animator) in enemies.iter_mut() {
        if *state == EnemyState::CatchingPlayer {
            continue;
        }

        let speed = math::flat(velocity.linvel).length();
        animator.try_set_float(PARAM_SPEED, speed);
        animator.try_set_bool(PARAM_FROZEN, *state == EnemyState::Frozen);
        animator.try_set_bool(PARAM_PLAYER_IN_SIGHT, memory.shows_in_sight(config.in_sight_memory));
    }
}
