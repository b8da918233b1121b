//! Enemy FSM transitions (фаза Decision).

use bevy::prelude::*;

use crate::ai::{EnemyConfig, EnemyMemory, EnemyState, EnemyStateChanged, WatchSummary};
use crate::components::{Concealed, Enemy};
use crate::perception::WatchTracker;

/// Следующее состояние по perception результатам этого tick'а.
///
/// Приоритеты:
/// 1. CatchingPlayer — только внешний выход
/// 2. Frozen — держится пока смотрят; выход после непрерывных `freeze_grace_period` без взгляда
/// 3. Watched (debounced) + completely_stop → Frozen
/// 4. Idle → Chasing по sighting (cone или proximity)
/// 5. Chasing → Idle только без sighting и дальше `max_follow_range × 1.5`
pub fn next_state(state: EnemyState, config: &EnemyConfig, memory: &mut EnemyMemory, delta: f32) -> EnemyState {
    match state {
        EnemyState::CatchingPlayer => EnemyState::CatchingPlayer,

        EnemyState::Frozen => {
            if memory.forced_freeze || memory.watched_now {
                memory.freeze_timer = 0.0;
                EnemyState::Frozen
            } else {
                memory.freeze_timer += delta;
                if memory.freeze_timer >= config.freeze_grace_period {
                    EnemyState::Idle
                } else {
                    EnemyState::Frozen
                }
            }
        }

        EnemyState::Idle | EnemyState::Chasing
            if memory.forced_freeze || (config.completely_stop_when_watched && memory.watched) =>
        {
            memory.freeze_timer = 0.0;
            EnemyState::Frozen
        }

        EnemyState::Idle => {
            if memory.in_sight() {
                EnemyState::Chasing
            } else {
                EnemyState::Idle
            }
        }

        EnemyState::Chasing => {
            if !memory.in_sight() && memory.distance_to_player > config.chase_exit_range() {
                EnemyState::Idle
            } else {
                EnemyState::Chasing
            }
        }
    }
}

/// Система: FSM transitions
///
/// Переходы логируются и публикуются как EnemyStateChanged.
pub fn enemy_fsm_transitions(
    mut enemies: Query<(Entity, &EnemyConfig, &mut EnemyState, &mut EnemyMemory), (With<Enemy>, Without<Concealed>)>,
    mut state_events: EventWriter<EnemyStateChanged>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, config, mut state, mut memory) in enemies.iter_mut() {
        let old_state = *state;
        let new_state = next_state(old_state, config, &mut memory, delta);

        if new_state == old_state {
            continue;
        }

        if new_state == EnemyState::Idle {
            // Свежая roam точка после погони/заморозки
            memory.roam_target = None;
            memory.waiting = false;
        }

        crate::log(&format!("🧠 Enemy {:?}: {:?} → {:?}", entity, old_state, new_state));
        *state = new_state;
        state_events.write(EnemyStateChanged {
            enemy: entity,
            from: old_state,
            to: new_state,
        });
    }
}

/// Система: WatchSummary после transitions этого tick'а
pub fn summarize_watch_state(
    tracker: Res<WatchTracker>,
    enemies: Query<&EnemyState, With<Enemy>>,
    mut summary: ResMut<WatchSummary>,
) {
    let next = WatchSummary {
        watched: tracker.watched_count(),
        frozen: enemies.iter().filter(|state| **state == EnemyState::Frozen).count(),
        most_watched: tracker.most_watched(),
    };

    if next.frozen != summary.frozen {
        crate::log(&format!("🧊 Frozen enemies: {} → {}", summary.frozen, next.frozen));
    }
    *summary = next;
}
