//! Yaw/pitch helpers.
//!
//! Конвенция Bevy: forward = -Z, up = +Y. Враги и тело игрока вращаются
//! только по yaw, pitch живёт в камере игрока.

use bevy::prelude::*;

/// Минимальная длина горизонтального вектора, ниже которой направление не определено
pub const DIRECTION_EPSILON: f32 = 1e-4;

/// Горизонтальная проекция (y = 0)
pub fn flat(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Горизонтальное расстояние между точками
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    flat(b - a).length()
}

/// Нормализованный горизонтальный forward для rotation
pub fn forward_flat(rotation: Quat) -> Vec3 {
    flat(rotation * Vec3::NEG_Z).normalize_or_zero()
}

/// Yaw-only rotation, у которой forward смотрит вдоль горизонтальной проекции `direction`.
///
/// `None` если проекция вырождена (цель ровно сверху/снизу).
pub fn yaw_rotation_towards(direction: Vec3) -> Option<Quat> {
    let dir = flat(direction);
    if dir.length_squared() < DIRECTION_EPSILON * DIRECTION_EPSILON {
        return None;
    }
    Some(Quat::from_rotation_y(f32::atan2(-dir.x, -dir.z)))
}

/// Pitch (рад) камеры, смотрящей вдоль `direction`. Положительный — вверх.
pub fn look_pitch(direction: Vec3) -> f32 {
    f32::atan2(direction.y, flat(direction).length())
}

/// Угол (градусы) между двумя векторами. 0 если один из них нулевой.
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() < DIRECTION_EPSILON || b.length_squared() < DIRECTION_EPSILON {
        return 0.0;
    }
    a.angle_between(b).to_degrees()
}

/// Per-second blend factor → доля slerp за тик. Не точный clamp угловой скорости.
pub fn slerp_factor(delta: f32, speed: f32) -> f32 {
    (delta * speed).clamp(0.0, 1.0)
}

/// Горизонтальный вектор, повернутый вокруг +Y на `degrees`
pub fn rotate_yaw(direction: Vec3, degrees: f32) -> Vec3 {
    Quat::from_rotation_y(degrees.to_radians()) * direction
}
