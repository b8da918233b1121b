//! Enemy perception (фаза Perception, после WatchTracker).

use bevy::prelude::*;

use crate::ai::{EnemyConfig, EnemyMemory, EnemyState};
use crate::components::{Concealed, Enemy, Player};
use crate::logger;
use crate::math;
use crate::perception::{can_see, Sighting, WatchTracker};
use crate::spatial::{ObstacleField, RayFilter, MASK_LINE_OF_SIGHT};

/// Система: sighting + watched флаги → EnemyMemory
///
/// Враги в CatchingPlayer и скрытые (Concealed) не обновляются.
pub fn update_enemy_perception(
    field: Res<ObstacleField>,
    tracker: Res<WatchTracker>,
    time: Res<Time<Fixed>>,
    players: Query<(Entity, &Transform), With<Player>>,
    mut enemies: Query<(Entity, &Transform, &EnemyConfig, &EnemyState, &mut EnemyMemory), (With<Enemy>, Without<Concealed>)>,
    mut warned_missing_player: Local<bool>,
) {
    let delta = time.delta_secs();
    let player = players.single().ok();

    if player.is_none() && !*warned_missing_player {
        logger::log_warning("⚠️ Enemy perception: no Player found, enemies go blind");
        *warned_missing_player = true;
    } else if player.is_some() {
        *warned_missing_player = false;
    }

    for (entity, transform, config, state, mut memory) in enemies.iter_mut() {
        if *state == EnemyState::CatchingPlayer {
            continue;
        }

        memory.watched_now = tracker.is_watched_now(entity);
        memory.watched = tracker.is_watched(entity);

        let Some((player_entity, player_transform)) = player else {
            memory.sighting = Sighting::None;
            memory.player_target = None;
            memory.distance_to_player = f32::INFINITY;
            memory.out_of_sight_timer += delta;
            continue;
        };

        let target = player_transform.translation + Vec3::Y * config.target_head_offset;
        let eye = transform.translation + Vec3::Y * config.eye_height;

        let sighting = can_see(
            eye,
            math::forward_flat(transform.rotation),
            target,
            player_entity,
            &config.vision(),
            &*field,
            RayFilter::new(MASK_LINE_OF_SIGHT).excluding(entity),
        );

        if sighting.is_detected() != memory.sighting.is_detected() {
            logger::log(&format!(
                "👁️ Enemy {:?}: sighting {:?} → {:?}",
                entity, memory.sighting, sighting
            ));
        }

        memory.sighting = sighting;
        memory.player_target = Some(target);
        memory.distance_to_player = transform.translation.distance(player_transform.translation);

        if sighting.is_detected() {
            memory.out_of_sight_timer = 0.0;
        } else {
            memory.out_of_sight_timer += delta;
        }
    }
}
