//! Подсветка врага во время catch'а.

use bevy::prelude::*;

/// Свет на самом враге (EnemyLightController)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct EnemyLight {
    /// Включать на время catch'а
    pub enable_on_catch: bool,
    pub on: bool,
}

/// Spotlight над врагом, если своего света нет
#[derive(Resource, Debug, Clone, Copy, Reflect)]
#[reflect(Resource)]
pub struct SpotlightManager {
    pub enable_on_catch: bool,
    pub height_offset: f32,
    pub intensity: f32,
    pub range: f32,
    /// Угол конуса (градусы)
    pub spot_angle: f32,
}

impl Default for SpotlightManager {
    fn default() -> Self {
        Self {
            enable_on_catch: true,
            height_offset: 7.0,
            intensity: 5.0,
            range: 10.0,
            spot_angle: 30.0,
        }
    }
}

/// Временный spotlight (child врага), светит строго вниз
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CatchSpotlight {
    pub intensity: f32,
    pub range: f32,
    pub spot_angle: f32,
}

impl SpotlightManager {
    /// Spawn spotlight над врагом. None если менеджер выключен.
    pub fn spawn_for(&self, commands: &mut Commands, enemy: Entity) -> Option<Entity> {
        if !self.enable_on_catch {
            return None;
        }

        let transform = Transform::from_translation(Vec3::Y * self.height_offset).looking_to(Vec3::NEG_Y, Vec3::Z);
        let spotlight = commands
            .spawn((
                transform,
                CatchSpotlight {
                    intensity: self.intensity,
                    range: self.range,
                    spot_angle: self.spot_angle,
                },
                ChildOf(enemy),
            ))
            .id();
        Some(spotlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spotlight_points_down() {
        let mut world = World::new();
        let enemy = world.spawn(Transform::default()).id();
        let manager = SpotlightManager::default();

        let mut commands = world.commands();
        let spotlight = manager.spawn_for(&mut commands, enemy);
        world.flush();

        let spotlight = spotlight.unwrap();
        let transform = world.get::<Transform>(spotlight).unwrap();
        assert!(transform.forward().as_vec3().distance(Vec3::NEG_Y) < 1e-5);
        assert_eq!(transform.translation, Vec3::Y * 7.0);
        assert_eq!(world.get::<ChildOf>(spotlight).unwrap().parent(), enemy);
    }

    #[test]
    fn test_disabled_manager_spawns_nothing() {
        let mut world = World::new();
        let enemy = world.spawn_empty().id();
        let manager = SpotlightManager {
            enable_on_catch: false,
            ..default()
        };

        let mut commands = world.commands();
        assert!(manager.spawn_for(&mut commands, enemy).is_none());
    }
}
