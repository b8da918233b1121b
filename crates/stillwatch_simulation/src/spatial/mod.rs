//! Spatial queries: obstacle raycasts, ground snapping, safe zones.
//!
//! Хост-движок владеет настоящей физикой. Симуляции нужны только лучи
//! (line of sight, obstacle avoidance, ground snap) и safe-zone predicate,
//! поэтому здесь лёгкий AABB-мир, синхронизируемый из компонентов.

use bevy::prelude::*;

pub mod obstacles;
pub mod safe_zone;

pub use obstacles::{ground_height, hierarchy_root, world_transform, Obstacle, ObstacleField, ObstacleVolume};
pub use safe_zone::{SafeZone, SafeZoneIndex};

// Collision layers (bitmask)
pub const LAYER_ENVIRONMENT: u32 = 0b0001;
pub const LAYER_ACTORS: u32 = 0b0010;
pub const LAYER_GROUND: u32 = 0b0100;

/// Line of sight: стены + акторы (цель должна быть первым попаданием)
pub const MASK_LINE_OF_SIGHT: u32 = LAYER_ENVIRONMENT | LAYER_ACTORS;
/// Obstacle avoidance: только статическое окружение
pub const MASK_STEERING: u32 = LAYER_ENVIRONMENT;

/// Результат raycast'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entity попавшего volume
    pub entity: Entity,
    /// Корень иерархии попавшего volume (для "цель или её потомок")
    pub root: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Фильтр raycast'а (аналог rapier QueryFilter)
#[derive(Debug, Clone, Copy)]
pub struct RayFilter {
    pub mask: u32,
    /// Исключить volume'ы этой иерархии (луч из собственного коллайдера)
    pub exclude_root: Option<Entity>,
}

impl RayFilter {
    pub fn new(mask: u32) -> Self {
        Self { mask, exclude_root: None }
    }

    pub fn excluding(mut self, root: Entity) -> Self {
        self.exclude_root = Some(root);
        self
    }
}

/// Seam для raycast'ов. `ObstacleField` — headless реализация,
/// хост может подставить свой движковый backend.
pub trait SpatialQuery {
    /// Первое попадание вдоль луча. `direction` не обязан быть нормализован.
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, filter: RayFilter) -> Option<RayHit>;
}

/// Spatial Plugin
///
/// Держит `ObstacleField` и `SafeZoneIndex` в синхроне с ECS в фазе Registry.
pub struct SpatialPlugin;

impl Plugin for SpatialPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ObstacleField>()
            .init_resource::<SafeZoneIndex>()
            .add_systems(
                FixedUpdate,
                (
                    obstacles::rebuild_obstacle_field,
                    safe_zone::sync_safe_zones,
                    safe_zone::unregister_removed_safe_zones,
                )
                    .chain()
                    .in_set(crate::SimulationSet::Registry),
            );
    }
}
