//! Eviction: враг исчезает, телепортируется на spawn и появляется снова.
//!
//! Два повода: враг внутри safe zone или враг в свете `LightSource`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Сколько враг скрыт до телепорта (safe zone)
pub const EVICTION_HIDE_SECS: f32 = 1.5;
/// Пауза после телепорта до появления
pub const EVICTION_REAPPEAR_SECS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum EvictionPhase {
    /// Скрыт на месте, ждёт телепорта
    Hidden,
    /// Уже на spawn, ждёт появления
    Reappearing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum EvictionCause {
    SafeZone,
    Light,
}

/// Component: идущая eviction (вместе с `Concealed`)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Eviction {
    pub cause: EvictionCause,
    pub phase: EvictionPhase,
    pub timer: f32,
    /// Длина фазы Reappearing
    pub reappear_secs: f32,
}

impl Eviction {
    pub fn safe_zone() -> Self {
        Self {
            cause: EvictionCause::SafeZone,
            phase: EvictionPhase::Hidden,
            timer: EVICTION_HIDE_SECS,
            reappear_secs: EVICTION_REAPPEAR_SECS,
        }
    }

    /// Исчезновение (effect) + задержка телепорта, затем появление (effect)
    pub fn light(avoidance: &LightAvoidance) -> Self {
        Self {
            cause: EvictionCause::Light,
            phase: EvictionPhase::Hidden,
            timer: avoidance.effect_duration + avoidance.teleport_delay,
            reappear_secs: avoidance.effect_duration,
        }
    }
}

/// Component: источник света, от которого враги уходят
///
/// Враг реагирует на дистанции `max(range, LightAvoidance::detection_radius)`.
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct LightSource {
    pub range: f32,
    pub enabled: bool,
}

impl LightSource {
    pub fn new(range: f32) -> Self {
        Self { range, enabled: true }
    }
}

/// Component: враг боится света
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct LightAvoidance {
    pub enabled: bool,
    pub detection_radius: f32,
    pub teleport_delay: f32,
    /// Длительность исчезновения и появления (каждого)
    pub effect_duration: f32,
}

impl Default for LightAvoidance {
    fn default() -> Self {
        Self {
            enabled: true,
            detection_radius: 2.0,
            teleport_delay: 0.1,
            effect_duration: 0.5,
        }
    }
}

impl LightAvoidance {
    /// Касается ли враг в `enemy` света в `light`
    pub fn touches(&self, enemy: Vec3, light: Vec3, source: &LightSource) -> bool {
        source.enabled && enemy.distance(light) <= self.detection_radius.max(source.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_radius_is_max_of_range_and_detection() {
        let avoidance = LightAvoidance::default();
        let small = LightSource::new(1.0);
        let wide = LightSource::new(6.0);

        assert!(avoidance.touches(Vec3::ZERO, Vec3::new(1.9, 0.0, 0.0), &small));
        assert!(!avoidance.touches(Vec3::ZERO, Vec3::new(2.1, 0.0, 0.0), &small));
        assert!(avoidance.touches(Vec3::ZERO, Vec3::new(5.5, 0.0, 0.0), &wide));

        let off = LightSource { enabled: false, ..wide };
        assert!(!avoidance.touches(Vec3::ZERO, Vec3::ZERO, &off));
    }

    #[test]
    fn test_light_eviction_timings() {
        let eviction = Eviction::light(&LightAvoidance::default());
        assert_eq!(eviction.cause, EvictionCause::Light);
        assert!((eviction.timer - 0.6).abs() < 1e-6);
        assert_eq!(eviction.reappear_secs, 0.5);
    }
}
