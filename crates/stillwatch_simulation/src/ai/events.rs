//! AI Events — внешние команды FSM и уведомления о переходах.

use bevy::prelude::*;

use super::EnemyState;

/// Принудительная заморозка/разморозка (хост: скриптовые сцены, дебаг)
#[derive(Event, Debug, Clone, Copy)]
pub struct ForceFreeze {
    pub enemy: Entity,
    pub freeze: bool,
}

/// Сбросить преследование: Idle, следующая roam точка — ближайшая вне safe zones
#[derive(Event, Debug, Clone, Copy)]
pub struct CancelChase {
    pub enemy: Entity,
}

/// FSM перешёл в новое состояние
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EnemyStateChanged {
    pub enemy: Entity,
    pub from: EnemyState,
    pub to: EnemyState,
}
