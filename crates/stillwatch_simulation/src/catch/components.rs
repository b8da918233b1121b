//! Catch components: tunables, gate, sequence context.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{PlayerControl, SpawnPose};

/// Задержка между началом разворота врага и остальными эффектами
pub const CATCH_WIND_UP_SECS: f32 = 0.2;
/// Длительность разворота врага к игроку
pub const ENEMY_TURN_SECS: f32 = 1.0;
/// Длительность наведения камеры игрока на врага
pub const CAMERA_LOOK_SECS: f32 = 1.5;

/// Параметры catch sequence (на враге)
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct CatchConfig {
    pub catch_range: f32,

    // Respawn
    pub respawn_player_on_catch: bool,
    pub respawn_delay: f32,
    /// Авторская точка респауна (второй приоритет после PlayerSpawnManager)
    pub respawn_point: Option<SpawnPose>,

    // Cinematic
    /// Per-second slerp factor разворота врага
    pub enemy_turn_speed: f32,
    /// Per-second slerp factor камеры игрока
    pub camera_rotation_speed: f32,
    pub shake_duration: f32,
    pub shake_amount: f32,
    /// Камера смотрит на точку выше ступней врага
    pub enemy_face_y_offset: f32,
    pub player_lift_amount: f32,
    pub player_lift_duration: f32,
    /// Дистанция, на которой игрок висит перед врагом
    pub enemy_player_distance: f32,

    // Screen fade
    pub use_fade: bool,
    pub fade_duration: f32,

    /// Гасить эффекты сразу после подсчёта catch'а
    pub stop_after_catch: bool,
    /// Пауза перед повторным catch'ем
    pub rearm_delay: f32,
}

impl Default for CatchConfig {
    fn default() -> Self {
        Self {
            catch_range: 2.5,
            respawn_player_on_catch: true,
            respawn_delay: 2.0,
            respawn_point: None,
            enemy_turn_speed: 10.0,
            camera_rotation_speed: 5.0,
            shake_duration: 1.5,
            shake_amount: 0.1,
            enemy_face_y_offset: 3.0,
            player_lift_amount: 1.0,
            player_lift_duration: 5.0,
            enemy_player_distance: 2.3,
            use_fade: false,
            fade_duration: 1.0,
            stop_after_catch: false,
            rearm_delay: 2.0,
        }
    }
}

impl CatchConfig {
    /// Hold фаза: до конца самого длинного эффекта
    pub fn hold_duration(&self) -> f32 {
        self.shake_duration.max(self.player_lift_duration)
    }
}

/// Можно ли этому врагу сейчас ловить
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CatchGate {
    /// SetCatchEnabled
    pub enabled: bool,
    /// Остаток re-arm паузы после прошлого catch'а
    pub cooldown: f32,
}

impl Default for CatchGate {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown: 0.0,
        }
    }
}

impl CatchGate {
    pub fn can_catch(&self) -> bool {
        self.enabled && self.cooldown <= 0.0
    }

    pub fn tick(&mut self, delta: f32) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - delta).max(0.0);
        }
    }
}

/// Marker на игроке: его уже ловят (один catch за раз)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BeingCaught {
    pub by: Entity,
}

/// Одна анимационная подзадача (turn / look / shake / lift)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum SubTask {
    /// Ещё не запущена
    Pending,
    Running { elapsed: f32, duration: f32 },
    Done,
}

impl SubTask {
    pub fn running(duration: f32) -> Self {
        Self::Running { elapsed: 0.0, duration }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SubTask::Running { .. })
    }
}

/// Фазы sequence (оркестратор, поверх подзадач)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum CatchPhase {
    /// Враг разворачивается, остальные эффекты ждут
    WindUp { remaining: f32 },
    /// Камера/shake/lift, ждём max(shake, lift)
    Holding { remaining: f32 },
    /// Ждём respawn_delay (с respawn'ом враг kinematic, без — просто пауза перед сбросом)
    AwaitRespawn { remaining: f32 },
    /// Игрок телепортирован, капсула выключена на этот tick
    ReleaseColliders,
}

/// Component на враге: контекст идущей catch sequence.
///
/// Живёт от trigger'а до конца respawn. Все подзадачи проверяют `should_stop`
/// перед каждой записью позиции/поворота.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct CatchSequence {
    pub player: Entity,
    /// Cooperative cancellation flag
    pub should_stop: bool,
    pub phase: CatchPhase,
    pub elapsed: f32,

    pub turn: SubTask,
    pub look: SubTask,
    pub shake: SubTask,
    pub lift: SubTask,

    // Снимок до начала (для restore)
    pub original_control: PlayerControl,
    pub original_camera_position: Vec3,
    pub original_player_position: Vec3,
    /// Высота, на которой висит игрок (считается при старте lift)
    pub lifted_y: Option<f32>,

    /// Spotlight, созданный SpotlightManager'ом (удаляется после hold)
    pub spotlight: Option<Entity>,
    /// Был ли счётчик уже увеличен (ровно один раз за sequence)
    pub counted: bool,
}

impl CatchSequence {
    pub fn new(player: Entity, control: PlayerControl, camera_position: Vec3, player_position: Vec3) -> Self {
        Self {
            player,
            should_stop: false,
            phase: CatchPhase::WindUp {
                remaining: CATCH_WIND_UP_SECS,
            },
            elapsed: 0.0,
            turn: SubTask::running(ENEMY_TURN_SECS),
            look: SubTask::Pending,
            shake: SubTask::Pending,
            lift: SubTask::Pending,
            original_control: control,
            original_camera_position: camera_position,
            original_player_position: player_position,
            lifted_y: None,
            spotlight: None,
            counted: false,
        }
    }

    /// Запуск эффектов после wind-up
    pub fn start_effects(&mut self, config: &CatchConfig) {
        self.look = SubTask::running(CAMERA_LOOK_SECS);
        self.shake = SubTask::running(config.shake_duration);
        self.lift = SubTask::running(config.player_lift_duration);
    }

    /// Cooperative stop: подзадачи выйдут на следующем tick'е без записей
    pub fn request_stop(&mut self) {
        self.should_stop = true;
    }

    pub fn any_effect_running(&self) -> bool {
        self.turn.is_running() || self.look.is_running() || self.shake.is_running() || self.lift.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_config_defaults() {
        let config = CatchConfig::default();
        assert_eq!(config.catch_range, 2.5);
        assert_eq!(config.respawn_delay, 2.0);
        assert_eq!(config.hold_duration(), 5.0);
        assert!(!config.stop_after_catch);
    }

    #[test]
    fn test_gate_cooldown() {
        let mut gate = CatchGate {
            enabled: true,
            cooldown: 2.0,
        };
        assert!(!gate.can_catch());
        gate.tick(1.5);
        assert!(!gate.can_catch());
        gate.tick(1.0);
        assert!(gate.can_catch());
        assert_eq!(gate.cooldown, 0.0);

        gate.enabled = false;
        assert!(!gate.can_catch());
    }

    #[test]
    fn test_sequence_starts_with_turn_only() {
        let mut sequence = CatchSequence::new(Entity::from_raw(1), PlayerControl::default(), Vec3::Y, Vec3::ZERO);
        assert!(sequence.turn.is_running());
        assert_eq!(sequence.look, SubTask::Pending);

        sequence.start_effects(&CatchConfig::default());
        assert!(sequence.look.is_running() && sequence.shake.is_running() && sequence.lift.is_running());
    }
}
