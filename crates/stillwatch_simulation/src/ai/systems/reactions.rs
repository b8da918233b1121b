//! AI reaction systems (внешние команды FSM).

use bevy::prelude::*;

use crate::ai::{CancelChase, EnemyMemory, EnemyState, EnemyStateChanged, ForceFreeze};
use crate::components::Enemy;
use crate::spatial::SafeZoneIndex;

/// System: ForceFreeze / CancelChase от хоста
///
/// Выполняется в фазе Decision до FSM transitions. Враги в CatchingPlayer
/// команды игнорируют: sequence сама вернёт их в Idle.
pub fn react_to_ai_commands(
    mut freeze_events: EventReader<ForceFreeze>,
    mut cancel_events: EventReader<CancelChase>,
    mut enemies: Query<(&Transform, &mut EnemyState, &mut EnemyMemory), With<Enemy>>,
    safe_zones: Res<SafeZoneIndex>,
    mut state_events: EventWriter<EnemyStateChanged>,
) {
    for event in freeze_events.read() {
        let Ok((_, mut state, mut memory)) = enemies.get_mut(event.enemy) else {
            continue;
        };
        if *state == EnemyState::CatchingPlayer {
            continue;
        }

        memory.forced_freeze = event.freeze;
        memory.freeze_timer = 0.0;

        let target_state = if event.freeze { EnemyState::Frozen } else { EnemyState::Idle };
        if *state != target_state && (event.freeze || *state == EnemyState::Frozen) {
            crate::log(&format!(
                "🧊 Enemy {:?}: forced {} ({:?} → {:?})",
                event.enemy,
                if event.freeze { "freeze" } else { "unfreeze" },
                *state,
                target_state
            ));
            state_events.write(EnemyStateChanged {
                enemy: event.enemy,
                from: *state,
                to: target_state,
            });
            *state = target_state;
        }
    }

    for event in cancel_events.read() {
        let Ok((transform, mut state, mut memory)) = enemies.get_mut(event.enemy) else {
            continue;
        };
        if *state == EnemyState::CatchingPlayer {
            continue;
        }

        let escape = safe_zones.nearest_point_outside(transform.translation);
        memory.roam_target = Some(escape);
        memory.waiting = false;

        if *state != EnemyState::Idle {
            crate::log(&format!("🛑 Enemy {:?}: chase cancelled ({:?} → Idle)", event.enemy, *state));
            state_events.write(EnemyStateChanged {
                enemy: event.enemy,
                from: *state,
                to: EnemyState::Idle,
            });
            *state = EnemyState::Idle;
        }
    }
}
