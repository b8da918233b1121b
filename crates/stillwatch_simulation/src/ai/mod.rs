//! Enemy AI: perception → FSM → movement.
//!
//! FSM: Idle (roam/wait) ↔ Chasing, Frozen под взглядом игрока,
//! CatchingPlayer пока идёт catch sequence.

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod systems;

// Re-export основных типов
pub use components::*;
pub use events::*;

use crate::perception::{update_watch_tracker, WatchConfig, WatchTracker};
use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate. Порядок выполнения:
/// 1. Perception: update_watch_tracker → update_enemy_perception → avoid_lights
/// 2. Decision: react_to_ai_commands → enemy_fsm_transitions → summarize_watch_state
/// 3. Movement: enemy_movement → evict_enemies_from_safe_zones → push_enemy_animation
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ForceFreeze>()
            .add_event::<CancelChase>()
            .add_event::<EnemyStateChanged>()
            .init_resource::<WatchConfig>()
            .init_resource::<WatchTracker>()
            .init_resource::<WatchSummary>()
            .register_type::<EnemyState>()
            .register_type::<EnemyConfig>()
            .register_type::<EnemyMemory>()
            .register_type::<WatchSummary>()
            .register_type::<LightSource>()
            .register_type::<LightAvoidance>()
            .register_type::<Eviction>()
            .add_systems(
                FixedUpdate,
                (update_watch_tracker, systems::update_enemy_perception, systems::avoid_lights)
                    .chain()
                    .in_set(SimulationSet::Perception),
            )
            .add_systems(
                FixedUpdate,
                (
                    systems::react_to_ai_commands,
                    systems::enemy_fsm_transitions,
                    systems::summarize_watch_state,
                )
                    .chain()
                    .in_set(SimulationSet::Decision),
            )
            .add_systems(
                FixedUpdate,
                (
                    systems::enemy_movement,
                    systems::evict_enemies_from_safe_zones,
                    systems::push_enemy_animation,
                )
                    .chain() // Последовательное выполнение для детерминизма
                    .in_set(SimulationSet::Movement),
            );
    }
}
