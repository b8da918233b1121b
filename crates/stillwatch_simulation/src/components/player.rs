//! Player components (наблюдаемый объект, ядром не управляется).
//!
//! Ядро читает позицию/взгляд/фонарик и временно забирает управление
//! (PlayerControl) на время catch sequence.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::spatial::Obstacle;

/// Высота глаз (камеры) над ступнями
pub const PLAYER_EYE_HEIGHT: f32 = 1.6;

/// Marker: игрок (ровно один на уровень)
///
/// Через Required Components получает камеру, control lock и фонарик.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(PlayerView, PlayerControl, Flashlight)]
pub struct Player;

/// First-person камера игрока.
///
/// Тело вращается только по yaw (Transform.rotation), pitch живёт здесь.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PlayerView {
    /// Локальная позиция камеры (меняется camera shake)
    pub local_position: Vec3,
    /// Pitch камеры (радианы, + вверх)
    pub pitch: f32,
}

impl Default for PlayerView {
    fn default() -> Self {
        Self {
            local_position: Vec3::Y * PLAYER_EYE_HEIGHT,
            pitch: 0.0,
        }
    }
}

impl PlayerView {
    /// World позиция камеры
    pub fn eye(&self, body: &Transform) -> Vec3 {
        body.translation + body.rotation * self.local_position
    }

    /// World forward камеры (yaw тела + pitch камеры)
    pub fn forward(&self, body: &Transform) -> Vec3 {
        body.rotation * Quat::from_rotation_x(self.pitch) * Vec3::NEG_Z
    }
}

/// Player locomotion lock (setMovementEnabled / setCameraEnabled)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct PlayerControl {
    pub movement_enabled: bool,
    pub camera_enabled: bool,
}

impl Default for PlayerControl {
    fn default() -> Self {
        Self {
            movement_enabled: true,
            camera_enabled: true,
        }
    }
}

impl PlayerControl {
    pub fn set_movement_enabled(&mut self, enabled: bool) {
        self.movement_enabled = enabled;
    }

    pub fn set_camera_enabled(&mut self, enabled: bool) {
        self.camera_enabled = enabled;
    }
}

/// Фонарик игрока
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Flashlight {
    pub on: bool,
}

impl Flashlight {
    pub fn is_on(&self) -> bool {
        self.on
    }
}

/// Позиция игрока при старте уровня (последний fallback респауна)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PlayerAnchor {
    pub initial_position: Vec3,
}

/// Spawn helper: игрок с капсулой rapier и obstacle volume для лучей
pub fn spawn_player(commands: &mut Commands, transform: Transform) -> Entity {
    commands
        .spawn((
            transform,
            Player,
            PlayerAnchor {
                initial_position: transform.translation,
            },
            // Rapier physics
            RigidBody::Dynamic,
            Collider::capsule_y(0.5, 0.4), // Высота 1.8m (0.5 + 0.5 + 2×0.4)
            LockedAxes::ROTATION_LOCKED,
            Velocity::zero(),
            // Для LOS/steering лучей
            Obstacle::actor(0.4, 0.5),
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_forward_follows_yaw_and_pitch() {
        let body = Transform::from_xyz(0.0, 0.0, 0.0).looking_to(Vec3::X, Vec3::Y);
        let mut view = PlayerView::default();

        assert!(view.forward(&body).distance(Vec3::X) < 1e-5);

        view.pitch = std::f32::consts::FRAC_PI_2;
        assert!(view.forward(&body).distance(Vec3::Y) < 1e-5);
    }

    #[test]
    fn test_eye_position() {
        let body = Transform::from_xyz(1.0, 0.0, 2.0);
        let view = PlayerView::default();
        assert!(view.eye(&body).distance(Vec3::new(1.0, PLAYER_EYE_HEIGHT, 2.0)) < 1e-5);
    }

    #[test]
    fn test_control_defaults_enabled() {
        let mut control = PlayerControl::default();
        assert!(control.movement_enabled && control.camera_enabled);
        control.set_movement_enabled(false);
        assert!(!control.movement_enabled);
    }
}
