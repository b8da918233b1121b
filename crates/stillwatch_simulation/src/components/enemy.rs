//! Enemy components: marker, spawn anchor, concealment.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{EnemyConfig, EnemyMemory, EnemyState, LightAvoidance};
use crate::catch::{CatchConfig, CatchGate};
use crate::components::AnimatorParams;
use crate::spatial::Obstacle;

/// Marker: враг
///
/// FSM state и runtime память приходят через Required Components.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(EnemyState, EnemyMemory)]
pub struct Enemy;

/// Поза в мире (spawn врага, respawn игрока)
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct SpawnPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl SpawnPose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }
}

/// Spawn врага: неизменен после создания (центр roam, цель reset'а после catch)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct SpawnPoint(pub SpawnPose);

impl SpawnPoint {
    pub fn position(&self) -> Vec3 {
        self.0.position
    }

    pub fn rotation(&self) -> Quat {
        self.0.rotation
    }
}

/// Marker: враг скрыт (хост прячет меш и вторичные коллайдеры)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Concealed;

/// Spawn helper: враг с полным набором AI/catch компонентов
pub fn spawn_enemy(commands: &mut Commands, transform: Transform, config: EnemyConfig) -> Entity {
    commands
        .spawn((
            transform,
            Enemy,
            SpawnPoint(SpawnPose::from_transform(&transform)),
            config,
            LightAvoidance::default(),
            AnimatorParams::enemy(),
            // Catch
            (CatchConfig::default(), CatchGate::default()),
            // Rapier physics (тело не опрокидывается)
            RigidBody::Dynamic,
            Collider::capsule_y(0.6, 0.4),
            LockedAxes::ROTATION_LOCKED,
            Velocity::zero(),
            // Для LOS лучей
            Obstacle::actor(0.4, 0.6),
        ))
        .id()
}
