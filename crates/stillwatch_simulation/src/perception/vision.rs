//! Visibility oracle: vision cone + line of sight + proximity override.
//!
//! Proximity проверяется ДО конуса: враг "чувствует" игрока, который
//! подкрался вплотную сбоку или сзади.

use bevy::prelude::*;

use crate::math;
use crate::spatial::{RayFilter, SpatialQuery};

/// Параметры восприятия одного наблюдателя
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionParams {
    /// Половина угла конуса (градусы)
    pub half_angle_deg: f32,
    pub max_range: f32,
    /// Радиус, внутри которого конус игнорируется
    pub proximity_range: f32,
    pub require_line_of_sight: bool,
}

/// Как наблюдатель заметил цель
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum Sighting {
    #[default]
    None,
    /// Proximity override (угол не важен)
    Proximity,
    /// Цель в конусе и в радиусе
    Cone,
}

impl Sighting {
    pub fn is_detected(&self) -> bool {
        !matches!(self, Sighting::None)
    }
}

/// Line of sight: первое попадание луча — сама цель (или её потомок).
///
/// Любое другое попадание блокирует. Луч, не задевший ничего, считается чистым:
/// у цели может не быть коллайдера в spatial мире.
pub fn line_of_sight(
    spatial: &impl SpatialQuery,
    from: Vec3,
    to: Vec3,
    target_root: Entity,
    filter: RayFilter,
) -> bool {
    let offset = to - from;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return true;
    }

    match spatial.cast_ray(from, offset, distance, filter) {
        Some(hit) => hit.root == target_root || hit.entity == target_root,
        None => true,
    }
}

/// canSee: наблюдатель в `observer`, смотрит вдоль `forward`, цель в `target`.
pub fn can_see(
    observer: Vec3,
    forward: Vec3,
    target: Vec3,
    target_root: Entity,
    params: &VisionParams,
    spatial: &impl SpatialQuery,
    filter: RayFilter,
) -> Sighting {
    let offset = target - observer;
    let distance = offset.length();

    // LOS считаем лениво и один раз
    let mut los_cache: Option<bool> = None;
    let mut los_ok = || {
        if !params.require_line_of_sight {
            return true;
        }
        *los_cache.get_or_insert_with(|| line_of_sight(spatial, observer, target, target_root, filter))
    };

    // Proximity override — раньше конуса
    if distance <= params.proximity_range && los_ok() {
        return Sighting::Proximity;
    }

    if distance > params.max_range {
        return Sighting::None;
    }

    if math::angle_between_deg(forward, offset) > params.half_angle_deg {
        return Sighting::None;
    }

    if los_ok() {
        Sighting::Cone
    } else {
        Sighting::None
    }
}
