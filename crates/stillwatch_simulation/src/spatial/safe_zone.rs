//! Safe zones — "no-chase" объёмы.
//!
//! `SafeZoneIndex` — owned resource вместо статического списка:
//! register/unregister привязаны к lifecycle `SafeZone` компонента
//! (spawn, enable/disable, перемещение, despawn).
//!
//! Все escape-запросы — эвристики: для выпуклых непересекающихся зон они
//! находят точку снаружи, для вогнутых/перекрывающихся могут вернуть точку
//! внутри (best effort, без паники).

use std::collections::BTreeMap;

use bevy::math::bounding::Aabb3d;
use bevy::math::Vec3A;
use bevy::prelude::*;

use crate::logger;

/// Радиус первой попытки выхода из зоны
pub const ESCAPE_RADIUS: f32 = 5.0;
/// Сколько раз удваиваем радиус, прежде чем сдаться
pub const ESCAPE_MAX_DOUBLINGS: u32 = 5;
/// Шаг поиска точки подхода
pub const APPROACH_STEP: f32 = 10.0;
/// Минимум sample-точек в path_crosses
pub const PATH_MIN_SAMPLES: usize = 5;

/// Component: safe zone (axis-aligned, центр = Transform.translation)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct SafeZone {
    pub half_extents: Vec3,
    /// Выключенная зона снимается с регистрации (аналог collider.enabled)
    pub enabled: bool,
}

impl SafeZone {
    pub fn new(half_extents: Vec3) -> Self {
        Self { half_extents, enabled: true }
    }
}

/// Resource: реестр активных safe zones
///
/// BTreeMap по Entity → детерминированный порядок обхода.
#[derive(Resource, Debug, Default)]
pub struct SafeZoneIndex {
    zones: BTreeMap<Entity, Aabb3d>,
}

impl SafeZoneIndex {
    /// Регистрирует (или обновляет bounds) зону. `true` если зона новая.
    pub fn register(&mut self, zone: Entity, bounds: Aabb3d) -> bool {
        self.zones.insert(zone, bounds).is_none()
    }

    /// Снимает зону. Повторный вызов — no-op (`false`).
    pub fn unregister(&mut self, zone: Entity) -> bool {
        self.zones.remove(&zone).is_some()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Точка внутри любой зарегистрированной зоны (границы включительно)
    pub fn contains(&self, point: Vec3) -> bool {
        let p = Vec3A::from(point);
        self.zones
            .values()
            .any(|aabb| p.cmpge(aabb.min).all() && p.cmple(aabb.max).all())
    }

    /// Проходит ли отрезок через зону.
    ///
    /// `max(5, ceil(distance))` равномерных sample-точек, включая оба конца.
    pub fn path_crosses(&self, start: Vec3, end: Vec3) -> bool {
        let samples = PATH_MIN_SAMPLES.max(start.distance(end).ceil() as usize);
        (0..samples).any(|i| {
            let t = i as f32 / (samples - 1) as f32;
            self.contains(start.lerp(end, t))
        })
    }

    /// Ближайшая точка вне зон: 8 направлений (оси + диагонали) на радиусе 5,
    /// при полном провале радиус удваивается.
    pub fn nearest_point_outside(&self, point: Vec3) -> Vec3 {
        if !self.contains(point) {
            return point;
        }

        let mut radius = ESCAPE_RADIUS;
        for _ in 0..=ESCAPE_MAX_DOUBLINGS {
            for dir in escape_directions() {
                let candidate = point + dir * radius;
                if !self.contains(candidate) {
                    return candidate;
                }
            }
            radius *= 2.0;
        }

        logger::log_warning(&format!(
            "⚠️ SafeZoneIndex: no escape point found around {:?}, returning it unchanged",
            point
        ));
        point
    }

    /// Цель для преследования с учётом зон.
    ///
    /// Цель снаружи → сама цель. Иначе: вдоль from→target за цель с шагом 10 (×2..×5),
    /// затем 4 стороны света на шаге 10, иначе остаёмся в `from`.
    pub fn nearest_safe_approach(&self, target: Vec3, from: Vec3) -> Vec3 {
        if !self.contains(target) {
            return target;
        }

        let direction = (target - from).normalize_or_zero();
        if direction != Vec3::ZERO {
            for multiple in 2..=5 {
                let candidate = target + direction * (APPROACH_STEP * multiple as f32);
                if !self.contains(candidate) {
                    return candidate;
                }
            }
        }

        for dir in [Vec3::NEG_Z, Vec3::Z, Vec3::NEG_X, Vec3::X] {
            let candidate = target + dir * APPROACH_STEP;
            if !self.contains(candidate) {
                return candidate;
            }
        }

        from
    }
}

/// Оси + диагонали в горизонтальной плоскости
fn escape_directions() -> [Vec3; 8] {
    let d = std::f32::consts::FRAC_1_SQRT_2;
    [
        Vec3::NEG_Z,
        Vec3::Z,
        Vec3::NEG_X,
        Vec3::X,
        Vec3::new(d, 0.0, -d),
        Vec3::new(-d, 0.0, -d),
        Vec3::new(d, 0.0, d),
        Vec3::new(-d, 0.0, d),
    ]
}

/// Система: register/unregister зон при spawn, перемещении и enable/disable
pub fn sync_safe_zones(
    mut index: ResMut<SafeZoneIndex>,
    zones: Query<(Entity, &SafeZone, &Transform), Or<(Changed<SafeZone>, Changed<Transform>)>>,
) {
    for (entity, zone, transform) in zones.iter() {
        if zone.enabled {
            let bounds = Aabb3d::new(transform.translation, zone.half_extents * transform.scale.abs());
            if index.register(entity, bounds) {
                logger::log(&format!("🛡️ SafeZone {:?} registered ({} active)", entity, index.len()));
            }
        } else if index.unregister(entity) {
            logger::log(&format!("🛡️ SafeZone {:?} disabled ({} active)", entity, index.len()));
        }
    }
}

/// Система: снять с регистрации удалённые зоны (despawn / remove component)
pub fn unregister_removed_safe_zones(
    mut index: ResMut<SafeZoneIndex>,
    mut removed: RemovedComponents<SafeZone>,
) {
    for entity in removed.read() {
        if index.unregister(entity) {
            logger::log(&format!("🛡️ SafeZone {:?} removed ({} active)", entity, index.len()));
        }
    }
}
