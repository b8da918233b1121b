//! Catch: proximity trigger → кинематографичная sequence → respawn.
//!
//! Пока идёт sequence, враг в `EnemyState::CatchingPlayer` (AI подавлен),
//! а у игрока отключено управление.

use bevy::prelude::*;

pub mod components;
pub mod counter;
pub mod error;
pub mod events;
pub mod fade;
pub mod lights;
pub mod respawn;
pub mod sequence;
pub mod systems;

pub use components::*;
pub use counter::CatchCounter;
pub use error::CatchAbort;
pub use events::*;
pub use fade::{advance_screen_fade, ScreenFade};
pub use lights::{CatchSpotlight, EnemyLight, SpotlightManager};
pub use respawn::{record_player_spawn, resolve_spawn, PlayerSpawnManager};
pub use systems::{begin_catch, PlayerSnapshot};

use crate::SimulationSet;

/// Catch Plugin
///
/// Порядок в фазе Sequence:
/// record_player_spawn → toggles → re-arm → trigger → sequence tick → fade
pub struct CatchPlugin;

impl Plugin for CatchPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ForceCatch>()
            .add_event::<StopCatchSequence>()
            .add_event::<SetCatchEnabled>()
            .add_event::<SetRespawnPosition>()
            .add_event::<CatchStarted>()
            .add_event::<CatchCompleted>()
            .add_event::<CatchSoundRequested>()
            .add_event::<GameResetRequested>()
            .init_resource::<CatchCounter>()
            .init_resource::<ScreenFade>()
            .init_resource::<SpotlightManager>()
            .register_type::<CatchConfig>()
            .register_type::<CatchGate>()
            .register_type::<CatchSequence>()
            .register_type::<EnemyLight>()
            .add_systems(
                FixedUpdate,
                (
                    record_player_spawn,
                    systems::handle_catch_toggles,
                    systems::tick_catch_gates,
                    systems::trigger_catches,
                    systems::advance_catch_sequences,
                    advance_screen_fade,
                )
                    .chain()
                    .in_set(SimulationSet::Sequence),
            );
    }
}
