//! Catch events: хост → ядро (управление) и ядро → хост (аудио, UI, сброс).

use bevy::prelude::*;

use crate::components::SpawnPose;

/// Запустить catch в обход range/safe-zone проверок (testing entry point)
#[derive(Event, Debug, Clone, Copy)]
pub struct ForceCatch {
    pub enemy: Entity,
}

/// Cooperative cancel: подзадачи выходят, контроль и камера восстанавливаются сразу
#[derive(Event, Debug, Clone, Copy)]
pub struct StopCatchSequence {
    pub enemy: Entity,
}

/// Включить/выключить catch у врага
#[derive(Event, Debug, Clone, Copy)]
pub struct SetCatchEnabled {
    pub enemy: Entity,
    pub enabled: bool,
}

/// Чекпоинт: новая точка респауна игрока (PlayerSpawnManager)
#[derive(Event, Debug, Clone, Copy)]
pub struct SetRespawnPosition {
    pub pose: SpawnPose,
}

/// Catch sequence стартовала
#[derive(Event, Debug, Clone, Copy)]
pub struct CatchStarted {
    pub enemy: Entity,
    pub player: Entity,
    pub forced: bool,
}

/// Catch sequence завершилась (или была остановлена)
#[derive(Event, Debug, Clone, Copy)]
pub struct CatchCompleted {
    pub enemy: Entity,
    pub player: Entity,
    /// false если sequence остановили до подсчёта
    pub counted: bool,
}

/// Хост проигрывает звук поимки
#[derive(Event, Debug, Clone, Copy)]
pub struct CatchSoundRequested {
    pub enemy: Entity,
}

/// Достигнут максимум поимок, хост перезагружает уровень
#[derive(Event, Debug, Clone, Copy)]
pub struct GameResetRequested {
    pub catches: u32,
}
