//! Enemy FSM components (state, tunables, runtime memory).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::perception::{Sighting, VisionParams};

/// Enemy FSM состояния
///
/// Ровно одно активно. CatchingPlayer подавляет perception и movement.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum EnemyState {
    /// Roam-or-wait
    #[default]
    Idle,
    /// Преследование игрока
    Chasing,
    /// Игрок смотрит — стоим
    Frozen,
    /// Catch sequence активна, FSM выключен
    CatchingPlayer,
}

impl EnemyState {
    /// Двигается ли враг к игроку
    pub fn is_pursuing(&self) -> bool {
        matches!(self, EnemyState::Chasing)
    }
}

/// Параметры врага (perception + movement + roam + freeze)
///
/// Default — дальнобойный "stalker". Пресеты: `stalker()`, `wanderer()`.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct EnemyConfig {
    /// Высота глаз над ступнями
    pub eye_height: f32,
    /// Смещение точки прицеливания над ступнями игрока (голова)
    pub target_head_offset: f32,

    // Perception
    /// Половина угла vision cone (градусы)
    pub vision_half_angle: f32,
    pub max_follow_range: f32,
    /// Chase → Idle только дальше `max_follow_range × chase_exit_multiplier`
    pub chase_exit_multiplier: f32,
    pub proximity_range: f32,
    pub require_line_of_sight: bool,

    // Movement
    pub min_follow_distance: f32,
    pub chase_speed: f32,
    pub in_sight_speed_multiplier: f32,
    pub out_of_sight_speed: f32,
    /// Множитель скорости, когда смотрят, но полная заморозка выключена
    pub watched_speed_multiplier: f32,
    /// Per-second slerp blend factor
    pub rotation_speed: f32,
    pub ground_offset: f32,

    // Watched freeze
    pub completely_stop_when_watched: bool,
    pub freeze_grace_period: f32,

    // Roam (radius 0 или speed 0 → стоим на месте)
    pub roam_speed: f32,
    pub roam_radius: f32,
    pub wait_time_at_point: f32,
    /// Горизонтальная дистанция "дошли до roam точки"
    pub arrival_distance: f32,

    // Obstacle avoidance
    /// Шаг перебора альтернативных направлений (градусы)
    pub avoidance_step: f32,
    /// Максимальное отклонение (градусы)
    pub avoidance_max_angle: f32,
    /// Запас длины луча сверх шага движения
    pub avoidance_lookahead: f32,

    /// Сколько держать isPlayerInsight после потери игрока (секунды)
    pub in_sight_memory: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self::stalker()
    }
}

impl EnemyConfig {
    /// Дальнобойный наблюдатель: стоит на месте, видит далеко, замирает под взглядом
    pub fn stalker() -> Self {
        Self {
            eye_height: 1.5,
            target_head_offset: 1.7,
            vision_half_angle: 45.0,
            max_follow_range: 40.0,
            chase_exit_multiplier: 1.5,
            proximity_range: 45.0,
            require_line_of_sight: false,
            min_follow_distance: 2.0,
            chase_speed: 2.0,
            in_sight_speed_multiplier: 3.0,
            out_of_sight_speed: 0.3,
            watched_speed_multiplier: 0.1,
            rotation_speed: 3.0,
            ground_offset: 0.1,
            completely_stop_when_watched: true,
            freeze_grace_period: 0.1,
            roam_speed: 0.0,
            roam_radius: 0.0,
            wait_time_at_point: 2.0,
            arrival_distance: 0.5,
            avoidance_step: 15.0,
            avoidance_max_angle: 165.0,
            avoidance_lookahead: 0.5,
            in_sight_memory: 1.0,
        }
    }

    /// Бродяга: короткая дистанция, бродит вокруг spawn, без proximity
    pub fn wanderer() -> Self {
        Self {
            max_follow_range: 15.0,
            proximity_range: 0.0,
            roam_speed: 0.7,
            roam_radius: 10.0,
            ..Self::stalker()
        }
    }

    pub fn vision(&self) -> VisionParams {
        VisionParams {
            half_angle_deg: self.vision_half_angle,
            max_range: self.max_follow_range,
            proximity_range: self.proximity_range,
            require_line_of_sight: self.require_line_of_sight,
        }
    }

    /// Дистанция, после которой потерянный игрок забывается
    pub fn chase_exit_range(&self) -> f32 {
        self.max_follow_range * self.chase_exit_multiplier
    }

    pub fn roams(&self) -> bool {
        self.roam_radius > 0.0 && self.roam_speed > 0.0
    }
}

/// Runtime память врага (perception результаты + таймеры)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct EnemyMemory {
    /// Как видим игрока в этом tick
    pub sighting: Sighting,
    pub distance_to_player: f32,
    /// Точка прицеливания (голова игрока), None если игрока нет
    pub player_target: Option<Vec3>,

    /// Debounced: смотрят дольше watch threshold
    pub watched: bool,
    /// Сырой флаг этого tick'а
    pub watched_now: bool,
    /// ForceFreeze от хоста
    pub forced_freeze: bool,
    /// Непрерывное время без взгляда в Frozen
    pub freeze_timer: f32,

    /// Непрерывное время без sighting. `INFINITY` пока игрока ни разу не видели.
    pub out_of_sight_timer: f32,

    pub roam_target: Option<Vec3>,
    pub waiting: bool,
    pub wait_timer: f32,
}

impl Default for EnemyMemory {
    fn default() -> Self {
        Self {
            sighting: Sighting::None,
            distance_to_player: 0.0,
            player_target: None,
            watched: false,
            watched_now: false,
            forced_freeze: false,
            freeze_timer: 0.0,
            out_of_sight_timer: f32::INFINITY,
            roam_target: None,
            waiting: false,
            wait_timer: 0.0,
        }
    }
}

impl EnemyMemory {
    pub fn in_sight(&self) -> bool {
        self.sighting.is_detected()
    }

    /// isPlayerInsight для аниматора: гаснет только после `memory` секунд без игрока
    pub fn shows_in_sight(&self, memory: f32) -> bool {
        self.in_sight() || self.out_of_sight_timer < memory
    }

    /// Полный сброс при возврате в Idle после catch/eviction
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Resource: сводка по взглядам за последний tick (для HUD/дебага хоста)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct WatchSummary {
    /// Debounced-watched враги
    pub watched: usize,
    /// Враги в Frozen
    pub frozen: usize,
    /// На кого смотрят дольше всех
    pub most_watched: Option<Entity>,
}

impl WatchSummary {
    pub fn frozen_count(&self) -> usize {
        self.frozen
    }
}
