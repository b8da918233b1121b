//! Respawn игрока: spawn manager и приоритет точек.

use bevy::prelude::*;

use super::{CatchConfig, SetRespawnPosition};
use crate::components::{Player, PlayerAnchor, SpawnPose};
use crate::logger;

/// Точка респауна игрока (чекпоинт). Пустой — пока игрок не появился.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlayerSpawnManager {
    pub spawn: Option<SpawnPose>,
}

impl PlayerSpawnManager {
    pub fn with_spawn(pose: SpawnPose) -> Self {
        Self { spawn: Some(pose) }
    }
}

/// Приоритет: spawn manager → CatchConfig::respawn_point → стартовая позиция
/// игрока (с нулевым поворотом)
pub fn resolve_spawn(
    manager: Option<&PlayerSpawnManager>,
    config: &CatchConfig,
    anchor: Option<&PlayerAnchor>,
    current: Vec3,
) -> SpawnPose {
    if let Some(pose) = manager.and_then(|manager| manager.spawn) {
        return pose;
    }
    if let Some(pose) = config.respawn_point {
        return pose;
    }
    match anchor {
        Some(anchor) => SpawnPose::new(anchor.initial_position, Quat::IDENTITY),
        None => {
            logger::log_warning("⚠️ No respawn point available, respawning in place");
            SpawnPose::new(current, Quat::IDENTITY)
        }
    }
}

/// Система: spawn manager запоминает позу игрока при появлении и принимает чекпоинты
pub fn record_player_spawn(
    manager: Option<ResMut<PlayerSpawnManager>>,
    players: Query<&Transform, Added<Player>>,
    mut checkpoints: EventReader<SetRespawnPosition>,
) {
    let Some(mut manager) = manager else {
        checkpoints.clear();
        return;
    };

    if manager.spawn.is_none() {
        if let Some(transform) = players.iter().next() {
            manager.spawn = Some(SpawnPose::from_transform(transform));
            logger::log(&format!("📍 Player spawn recorded at {:?}", transform.translation));
        }
    }

    for event in checkpoints.read() {
        manager.spawn = Some(event.pose);
        logger::log(&format!("📍 Player respawn point set to {:?}", event.pose.position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> PlayerAnchor {
        PlayerAnchor {
            initial_position: Vec3::new(1.0, 0.0, 1.0),
        }
    }

    #[test]
    fn test_manager_has_priority() {
        let manager = PlayerSpawnManager::with_spawn(SpawnPose::new(Vec3::X * 5.0, Quat::IDENTITY));
        let config = CatchConfig {
            respawn_point: Some(SpawnPose::new(Vec3::Z * 5.0, Quat::IDENTITY)),
            ..default()
        };

        let pose = resolve_spawn(Some(&manager), &config, Some(&anchor()), Vec3::ZERO);
        assert_eq!(pose.position, Vec3::X * 5.0);
    }

    #[test]
    fn test_configured_point_before_anchor() {
        let config = CatchConfig {
            respawn_point: Some(SpawnPose::new(Vec3::Z * 5.0, Quat::IDENTITY)),
            ..default()
        };

        let pose = resolve_spawn(Some(&PlayerSpawnManager::default()), &config, Some(&anchor()), Vec3::ZERO);
        assert_eq!(pose.position, Vec3::Z * 5.0);
    }

    #[test]
    fn test_anchor_fallback_uses_identity_rotation() {
        let pose = resolve_spawn(None, &CatchConfig::default(), Some(&anchor()), Vec3::ZERO);
        assert_eq!(pose.position, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(pose.rotation, Quat::IDENTITY);

        let in_place = resolve_spawn(None, &CatchConfig::default(), None, Vec3::Y);
        assert_eq!(in_place.position, Vec3::Y);
    }
}
