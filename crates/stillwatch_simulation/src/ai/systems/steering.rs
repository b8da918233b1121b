//! Steering helpers: obstacle avoidance, ground snap, roam targets.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use crate::ai::EnemyConfig;
use crate::math;
use crate::spatial::{ground_height, RayFilter, SafeZoneIndex, SpatialQuery, MASK_STEERING};

/// Высота лучей obstacle avoidance над ступнями
pub const AVOIDANCE_RAY_HEIGHT: f32 = 0.1;

/// Направление движения с обходом препятствий.
///
/// Луч вдоль `desired` длиной `distance + lookahead`. Если занято — перебор
/// ±step, ±2·step … ±max_angle (левый поворот первым). `None` если всё занято.
pub fn avoid_obstacles(
    spatial: &impl SpatialQuery,
    origin: Vec3,
    desired: Vec3,
    distance: f32,
    config: &EnemyConfig,
    self_root: Entity,
) -> Option<Vec3> {
    let desired = math::flat(desired).normalize_or_zero();
    if desired == Vec3::ZERO {
        return None;
    }

    let ray_origin = origin + Vec3::Y * AVOIDANCE_RAY_HEIGHT;
    let reach = distance + config.avoidance_lookahead;
    let filter = RayFilter::new(MASK_STEERING).excluding(self_root);
    let is_clear = |dir: Vec3| spatial.cast_ray(ray_origin, dir, reach, filter).is_none();

    if is_clear(desired) {
        return Some(desired);
    }

    if config.avoidance_step <= 0.0 {
        return None;
    }

    let mut angle = config.avoidance_step;
    while angle <= config.avoidance_max_angle + f32::EPSILON {
        // +yaw = поворот налево (forward -Z → -X)
        for signed in [angle, -angle] {
            let candidate = math::rotate_yaw(desired, signed);
            if is_clear(candidate) {
                return Some(candidate);
            }
        }
        angle += config.avoidance_step;
    }

    None
}

/// Ставит точку на землю (+ ground_offset). Без земли — высота не меняется.
pub fn snap_to_ground(spatial: &impl SpatialQuery, position: Vec3, ground_offset: f32) -> Vec3 {
    match ground_height(spatial, position) {
        Some(height) => Vec3::new(position.x, height + ground_offset, position.z),
        None => position,
    }
}

/// Roam точка: равномерно в круге `roam_radius` вокруг spawn, на земле, вне safe zones.
///
/// Нет земли под точкой → текущая позиция (ждём и пробуем снова).
pub fn pick_roam_target(
    rng: &mut impl Rng,
    spawn: Vec3,
    current: Vec3,
    config: &EnemyConfig,
    spatial: &impl SpatialQuery,
    safe_zones: &SafeZoneIndex,
) -> Vec3 {
    let angle = rng.gen_range(0.0..TAU);
    let radius = config.roam_radius * rng.gen::<f32>().sqrt();
    let candidate = spawn + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);

    let Some(height) = ground_height(spatial, candidate) else {
        return current;
    };
    let grounded = Vec3::new(candidate.x, height + config.ground_offset, candidate.z);

    if safe_zones.contains(grounded) {
        safe_zones.nearest_point_outside(grounded)
    } else {
        grounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{ObstacleField, LAYER_ENVIRONMENT, LAYER_GROUND};
    use bevy::math::bounding::Aabb3d;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn me() -> Entity {
        Entity::from_raw(1)
    }

    #[test]
    fn test_clear_path_keeps_direction() {
        let field = ObstacleField::default();
        let dir = avoid_obstacles(&field, Vec3::ZERO, Vec3::NEG_Z * 3.0, 0.1, &EnemyConfig::default(), me()).unwrap();
        assert!(dir.distance(Vec3::NEG_Z) < 1e-5);
    }

    #[test]
    fn test_blocked_path_turns_left_first() {
        let mut field = ObstacleField::default();
        // Узкий столб прямо по курсу
        field.insert_box(Entity::from_raw(9), Vec3::new(0.0, 0.5, -0.4), Vec3::new(0.05, 1.0, 0.05), LAYER_ENVIRONMENT);

        let dir = avoid_obstacles(&field, Vec3::ZERO, Vec3::NEG_Z, 0.1, &EnemyConfig::default(), me()).unwrap();
        let expected = math::rotate_yaw(Vec3::NEG_Z, 15.0);
        assert!(dir.distance(expected) < 1e-4, "got {:?}", dir);
        // Левее курса (x < 0 при движении к -Z)
        assert!(dir.x < 0.0);
    }

    #[test]
    fn test_fully_enclosed_returns_none() {
        let mut field = ObstacleField::default();
        // Коробка вокруг точки старта (луч изнутри попадает на дистанции 0)
        field.insert_box(Entity::from_raw(9), Vec3::ZERO, Vec3::splat(2.0), LAYER_ENVIRONMENT);
        assert!(avoid_obstacles(&field, Vec3::ZERO, Vec3::NEG_Z, 0.1, &EnemyConfig::default(), me()).is_none());
    }

    #[test]
    fn test_snap_to_ground() {
        let mut field = ObstacleField::default();
        field.insert_box(Entity::from_raw(2), Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), LAYER_GROUND);
        let snapped = snap_to_ground(&field, Vec3::new(1.0, 3.0, 1.0), 0.1);
        assert!((snapped.y - 0.1).abs() < 1e-4);

        let empty = ObstacleField::default();
        assert_eq!(snap_to_ground(&empty, Vec3::new(1.0, 3.0, 1.0), 0.1), Vec3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn test_roam_target_within_radius_and_outside_safe_zones() {
        let mut field = ObstacleField::default();
        field.insert_box(Entity::from_raw(2), Vec3::new(0.0, -0.5, 0.0), Vec3::new(100.0, 0.5, 100.0), LAYER_GROUND);
        let mut safe_zones = SafeZoneIndex::default();
        safe_zones.register(Entity::from_raw(3), Aabb3d::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0)));

        let config = EnemyConfig::wanderer();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let target = pick_roam_target(&mut rng, Vec3::ZERO, Vec3::ZERO, &config, &field, &safe_zones);
            assert!(!safe_zones.contains(target), "target {:?} inside safe zone", target);
            // Escape может вынести точку за радиус, но не дальше радиуса + escape
            assert!(math::flat(target).length() <= config.roam_radius + 10.0);
        }
    }

    #[test]
    fn test_roam_target_without_ground_stays_put() {
        let field = ObstacleField::default();
        let safe_zones = SafeZoneIndex::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let current = Vec3::new(4.0, 0.0, 4.0);
        let target = pick_roam_target(&mut rng, Vec3::ZERO, current, &EnemyConfig::wanderer(), &field, &safe_zones);
        assert_eq!(target, current);
    }
}
