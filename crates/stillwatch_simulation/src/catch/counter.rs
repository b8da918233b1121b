//! Счётчик поимок (бывший singleton, теперь resource).

use bevy::prelude::*;

/// Сколько раз игрока поймали с последнего сброса
#[derive(Resource, Debug, Clone, Copy, Reflect)]
#[reflect(Resource)]
pub struct CatchCounter {
    pub count: u32,
    /// При достижении — GameResetRequested
    pub max_catches: u32,
}

impl Default for CatchCounter {
    fn default() -> Self {
        Self {
            count: 0,
            max_catches: 1,
        }
    }
}

impl CatchCounter {
    pub fn with_max(max_catches: u32) -> Self {
        Self {
            count: 0,
            max_catches,
        }
    }

    /// +1. Возвращает true если максимум достигнут
    pub fn increment(&mut self) -> bool {
        self.count += 1;
        self.count >= self.max_catches
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
