//! STILLWATCH Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: враг-сталкер, который замирает под взглядом
//! игрока, преследует его вне взгляда и ловит вблизи.
//!
//! Хост-движок (рендер, аудио, ввод) читает components/events и пишет
//! позицию игрока, камеру и фонарик. Ядро не рисует и не играет звуки.
//!
//! Tick (FixedUpdate, 60Hz), строго по фазам `SimulationSet`:
//! Registry → Perception → Decision → Movement → Sequence

use std::time::Duration;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod catch;
pub mod components;
pub mod logger;
pub mod math;
pub mod perception;
pub mod spatial;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, EnemyConfig, EnemyMemory, EnemyState};
pub use catch::{CatchConfig, CatchCounter, CatchPlugin};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use perception::{WatchConfig, WatchTracker};
pub use spatial::{ObstacleField, SafeZone, SafeZoneIndex, SpatialPlugin};

/// Частота fixed tick'а (Hz)
pub const FIXED_TIMESTEP_HZ: f64 = 60.0;

/// Фазы одного tick'а. Хост может ставить свои системы до/после.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Obstacle field и safe zone registry
    Registry,
    /// WatchTracker + vision
    Perception,
    /// Команды хоста + FSM transitions
    Decision,
    /// Steering, eviction, animation sink
    Movement,
    /// Catch trigger и sequence
    Sequence,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(FIXED_TIMESTEP_HZ))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Registry,
                    SimulationSet::Perception,
                    SimulationSet::Decision,
                    SimulationSet::Movement,
                    SimulationSet::Sequence,
                )
                    .chain(),
            )
            .register_type::<Player>()
            .register_type::<PlayerView>()
            .register_type::<PlayerControl>()
            .register_type::<Flashlight>()
            .register_type::<Enemy>()
            .register_type::<SpawnPoint>()
            .register_type::<AnimatorParams>()
            // Подсистемы
            .add_plugins((SpatialPlugin, AIPlugin, CatchPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, SimulationPlugin))
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Прогон `ticks` фиксированных шагов напрямую, без ожидания реального времени.
///
/// Тесты и headless бинарь так получают детерминированный tick.
pub fn run_fixed_ticks(app: &mut App, ticks: usize) {
    let step = Duration::from_secs_f64(1.0 / FIXED_TIMESTEP_HZ);
    for _ in 0..ticks {
        let world = app.world_mut();
        world.resource_mut::<Time<Fixed>>().advance_by(step);
        world.run_schedule(FixedUpdate);
    }
}

/// Прогон симуляции на `seconds` (округление вверх до целого tick'а)
pub fn run_for_seconds(app: &mut App, seconds: f32) {
    let ticks = (seconds as f64 * FIXED_TIMESTEP_HZ).ceil() as usize;
    run_fixed_ticks(app, ticks);
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
