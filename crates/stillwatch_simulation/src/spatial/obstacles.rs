//! ObstacleField — AABB-мир для raycast'ов.
//!
//! Пересобирается каждый tick из `Obstacle` компонентов (фаза Registry).
//! Коллайдеры с rapier `ColliderDisabled` в мир не попадают: телепорт игрока
//! на один tick выключает его капсулу.

use bevy::math::bounding::{Aabb3d, RayCast3d};
use bevy::math::{Dir3, Ray3d};
use bevy::prelude::*;
use bevy_rapier3d::prelude::ColliderDisabled;

use super::{RayFilter, RayHit, SpatialQuery, LAYER_GROUND};

/// Высота старта ground-луча над точкой
pub const GROUND_RAY_HEIGHT: f32 = 10.0;
/// Длина ground-луча
pub const GROUND_RAY_LENGTH: f32 = 20.0;

/// Component: объём, который блокирует лучи
///
/// Центр — `offset` в локальных координатах entity (с учётом родителей),
/// размеры — `half_extents * scale`. Rotation не учитывается (AABB).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Obstacle {
    pub half_extents: Vec3,
    pub offset: Vec3,
    /// Collision layers (LAYER_*)
    pub layers: u32,
}

impl Obstacle {
    pub fn wall(half_extents: Vec3) -> Self {
        Self { half_extents, offset: Vec3::ZERO, layers: super::LAYER_ENVIRONMENT }
    }

    pub fn ground(half_extents: Vec3) -> Self {
        Self { half_extents, offset: Vec3::ZERO, layers: LAYER_GROUND }
    }

    /// Капсула актора (Transform = ступни), аппроксимированная коробкой
    pub fn actor(radius: f32, half_height: f32) -> Self {
        let half_y = half_height + radius;
        Self {
            half_extents: Vec3::new(radius, half_y, radius),
            offset: Vec3::Y * half_y,
            layers: super::LAYER_ACTORS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObstacleVolume {
    pub entity: Entity,
    pub root: Entity,
    pub aabb: Aabb3d,
    pub layers: u32,
}

/// Resource: все активные obstacle volumes, отсортированные по Entity
#[derive(Resource, Debug, Default)]
pub struct ObstacleField {
    volumes: Vec<ObstacleVolume>,
}

impl ObstacleField {
    pub fn clear(&mut self) {
        self.volumes.clear();
    }

    pub fn insert(&mut self, volume: ObstacleVolume) {
        self.volumes.push(volume);
    }

    /// Удобный insert для top-level volume (entity сам себе root)
    pub fn insert_box(&mut self, entity: Entity, center: Vec3, half_extents: Vec3, layers: u32) {
        self.insert(ObstacleVolume {
            entity,
            root: entity,
            aabb: Aabb3d::new(center, half_extents),
            layers,
        });
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

impl SpatialQuery for ObstacleField {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, filter: RayFilter) -> Option<RayHit> {
        let Ok(dir) = Dir3::new(direction) else {
            return None;
        };
        if max_distance <= 0.0 {
            return None;
        }

        let ray = RayCast3d::from_ray(Ray3d { origin, direction: dir }, max_distance);

        let mut best: Option<RayHit> = None;
        for volume in &self.volumes {
            if volume.layers & filter.mask == 0 {
                continue;
            }
            if filter.exclude_root == Some(volume.root) || filter.exclude_root == Some(volume.entity) {
                continue;
            }
            let Some(distance) = ray.aabb_intersection_at(&volume.aabb) else {
                continue;
            };
            if best.is_none_or(|hit| distance < hit.distance) {
                best = Some(RayHit {
                    entity: volume.entity,
                    root: volume.root,
                    point: origin + *dir * distance,
                    distance,
                });
            }
        }
        best
    }
}

/// Высота земли под точкой (луч вниз с `point + 10 up` длиной 20).
///
/// `None` если земли нет — вызывающий оставляет текущую высоту.
pub fn ground_height(query: &impl SpatialQuery, point: Vec3) -> Option<f32> {
    let origin = point + Vec3::Y * GROUND_RAY_HEIGHT;
    query
        .cast_ray(origin, Vec3::NEG_Y, GROUND_RAY_LENGTH, RayFilter::new(LAYER_GROUND))
        .map(|hit| hit.point.y)
}

/// Корень иерархии (entity без ChildOf)
pub fn hierarchy_root(entity: Entity, parents: &Query<&ChildOf>) -> Entity {
    let mut current = entity;
    while let Ok(child_of) = parents.get(current) {
        current = child_of.parent();
    }
    current
}

/// World transform через цепочку родителей (headless: GlobalTransform не пропагируется)
pub fn world_transform(entity: Entity, transforms: &Query<&Transform>, parents: &Query<&ChildOf>) -> Option<Transform> {
    let local = *transforms.get(entity).ok()?;
    match parents.get(entity) {
        Ok(child_of) => {
            let parent = world_transform(child_of.parent(), transforms, parents)?;
            Some(parent.mul_transform(local))
        }
        Err(_) => Some(local),
    }
}

/// Система: пересборка ObstacleField из Obstacle компонентов
pub fn rebuild_obstacle_field(
    mut field: ResMut<ObstacleField>,
    obstacles: Query<(Entity, &Obstacle), Without<ColliderDisabled>>,
    transforms: Query<&Transform>,
    parents: Query<&ChildOf>,
) {
    field.clear();

    let mut entries: Vec<_> = obstacles.iter().collect();
    entries.sort_by_key(|(entity, _)| *entity);

    for (entity, obstacle) in entries {
        let Some(world) = world_transform(entity, &transforms, &parents) else {
            continue;
        };
        field.insert(ObstacleVolume {
            entity,
            root: hierarchy_root(entity, &parents),
            aabb: Aabb3d::new(world.transform_point(obstacle.offset), obstacle.half_extents * world.scale.abs()),
            layers: obstacle.layers,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{LAYER_ACTORS, LAYER_ENVIRONMENT, MASK_LINE_OF_SIGHT};

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn test_ray_hits_nearest_volume() {
        let mut field = ObstacleField::default();
        field.insert_box(entity(1), Vec3::new(0.0, 0.0, -10.0), Vec3::splat(1.0), LAYER_ENVIRONMENT);
        field.insert_box(entity(2), Vec3::new(0.0, 0.0, -5.0), Vec3::splat(1.0), LAYER_ENVIRONMENT);

        let hit = field
            .cast_ray(Vec3::ZERO, Vec3::NEG_Z, 100.0, RayFilter::new(MASK_LINE_OF_SIGHT))
            .expect("должен попасть");
        assert_eq!(hit.entity, entity(2));
        assert!((hit.distance - 4.0).abs() < 1e-4);
        assert!(hit.point.distance(Vec3::new(0.0, 0.0, -4.0)) < 1e-4);
    }

    #[test]
    fn test_ray_respects_mask_and_range() {
        let mut field = ObstacleField::default();
        field.insert_box(entity(1), Vec3::new(0.0, 0.0, -5.0), Vec3::splat(1.0), LAYER_ACTORS);

        assert!(field.cast_ray(Vec3::ZERO, Vec3::NEG_Z, 100.0, RayFilter::new(LAYER_ENVIRONMENT)).is_none());
        assert!(field.cast_ray(Vec3::ZERO, Vec3::NEG_Z, 3.0, RayFilter::new(LAYER_ACTORS)).is_none());
        assert!(field.cast_ray(Vec3::ZERO, Vec3::NEG_Z, 4.5, RayFilter::new(LAYER_ACTORS)).is_some());
    }

    #[test]
    fn test_ray_excludes_own_hierarchy() {
        let mut field = ObstacleField::default();
        // Луч из центра собственной капсулы
        field.insert_box(entity(7), Vec3::ZERO, Vec3::splat(0.5), LAYER_ACTORS);

        let filter = RayFilter::new(LAYER_ACTORS);
        assert!(field.cast_ray(Vec3::ZERO, Vec3::X, 10.0, filter).is_some());
        assert!(field.cast_ray(Vec3::ZERO, Vec3::X, 10.0, filter.excluding(entity(7))).is_none());
    }

    #[test]
    fn test_ground_height() {
        let mut field = ObstacleField::default();
        // Пол: верхняя грань на y = 0.5
        field.insert_box(entity(1), Vec3::new(0.0, 0.0, 0.0), Vec3::new(50.0, 0.5, 50.0), LAYER_GROUND);

        let height = ground_height(&field, Vec3::new(3.0, 2.0, 3.0)).unwrap();
        assert!((height - 0.5).abs() < 1e-4);

        // За пределами пола — None
        assert!(ground_height(&field, Vec3::new(100.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_zero_direction_never_hits() {
        let mut field = ObstacleField::default();
        field.insert_box(entity(1), Vec3::ZERO, Vec3::splat(1.0), LAYER_ENVIRONMENT);
        assert!(field.cast_ray(Vec3::ZERO, Vec3::ZERO, 10.0, RayFilter::new(LAYER_ENVIRONMENT)).is_none());
    }
}
