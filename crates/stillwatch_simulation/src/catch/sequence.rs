//! Per-tick шаги подзадач catch sequence (чистые функции, без ECS).

use bevy::prelude::*;
use rand::Rng;

use super::components::SubTask;
use crate::math::{flat, forward_flat, look_pitch, slerp_factor, yaw_rotation_towards};

/// Наклон вектора подъёма в сторону врага
const LIFT_TILT: f32 = 0.2;

impl SubTask {
    /// Продвинуть таймер. true — подзадача закончилась на этом tick'е
    pub fn advance(&mut self, delta: f32) -> bool {
        let SubTask::Running { elapsed, duration } = self else {
            return false;
        };
        *elapsed += delta;
        if *elapsed >= *duration {
            *self = SubTask::Done;
            return true;
        }
        false
    }
}

/// Yaw-only поворот из `from` на `to`; `current` если цель ровно сверху/снизу
pub fn facing(from: Vec3, to: Vec3, current: Quat) -> Quat {
    yaw_rotation_towards(to - from).unwrap_or(current)
}

/// Один tick разворота врага к игроку
pub fn turn_step(current: Quat, enemy: Vec3, player: Vec3, turn_speed: f32, delta: f32) -> Quat {
    let target = facing(enemy, player, current);
    current.slerp(target, slerp_factor(delta, turn_speed))
}

/// Один tick наведения камеры: yaw уходит в тело, pitch в камеру
pub fn look_step(body: Quat, pitch: f32, eye: Vec3, target: Vec3, speed: f32, delta: f32) -> (Quat, f32) {
    let direction = target - eye;
    let t = slerp_factor(delta, speed);

    let target_body = yaw_rotation_towards(direction).unwrap_or(body);
    let target_pitch = look_pitch(direction);

    (body.slerp(target_body, t), pitch + (target_pitch - pitch) * t)
}

/// Случайное смещение камеры в кубе ±amount
pub fn shake_offset(rng: &mut impl Rng, amount: f32) -> Vec3 {
    if amount <= 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.gen_range(-amount..amount),
        rng.gen_range(-amount..amount),
        rng.gen_range(-amount..amount),
    )
}

/// Горизонтальное направление от игрока к врагу (forward врага наоборот, если совпадают)
fn direction_to_enemy(enemy: Vec3, enemy_rotation: Quat, player: Vec3) -> Vec3 {
    let direction = flat(enemy - player).normalize_or_zero();
    if direction != Vec3::ZERO {
        return direction;
    }
    -forward_flat(enemy_rotation)
}

/// Высота подвешенного игрока: подъём по (up + наклон к врагу), нормированному на amount
pub fn lift_height(original_y: f32, enemy: Vec3, enemy_rotation: Quat, player: Vec3, amount: f32) -> f32 {
    let direction = direction_to_enemy(enemy, enemy_rotation, player);
    let lift = (Vec3::Y + direction * LIFT_TILT).normalize() * amount;
    original_y + lift.y
}

/// Позиция игрока на `distance` перед врагом (перепривязка каждый tick)
pub fn held_position(enemy: Vec3, enemy_rotation: Quat, player: Vec3, distance: f32, lifted_y: f32) -> Vec3 {
    let direction = direction_to_enemy(enemy, enemy_rotation, player);
    let xz = flat(enemy) - direction * distance;
    Vec3::new(xz.x, lifted_y, xz.z)
}
