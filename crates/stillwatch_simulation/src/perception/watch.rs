//! WatchTracker — смотрит ли игрок на врага.
//!
//! Watched-now: dot(camera forward, direction to enemy) > 0.3 (≈70°, шире
//! собственного конуса врага), в пределах max_follow_range врага, опционально
//! без препятствий. Watched: watched-now держится дольше `watch_time_threshold`.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::vision::line_of_sight;
use crate::ai::EnemyConfig;
use crate::components::{Concealed, Enemy, Flashlight, Player, PlayerView};
use crate::logger;
use crate::spatial::{ObstacleField, RayFilter, SpatialQuery, MASK_LINE_OF_SIGHT};

/// Resource: параметры watch detection
#[derive(Resource, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct WatchConfig {
    /// Порог dot product (строго больше)
    pub view_dot_threshold: f32,
    /// Debounce (секунды)
    pub watch_time_threshold: f32,
    /// Лучевая проверка препятствий между камерой и врагом
    pub check_obstruction: bool,
    /// Смотрит только игрок с включённым фонариком
    pub require_flashlight: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            view_dot_threshold: 0.3,
            watch_time_threshold: 0.1,
            check_obstruction: true,
            require_flashlight: false,
        }
    }
}

/// Накопленное время взгляда на одного врага
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct WatchRecord {
    pub watch_time: f32,
    pub watched_now: bool,
}

/// Resource: per-enemy таблица взглядов
#[derive(Resource, Debug, Default)]
pub struct WatchTracker {
    records: BTreeMap<Entity, WatchRecord>,
    threshold: f32,
}

impl WatchTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            records: BTreeMap::new(),
            threshold,
        }
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Tick для одного врага: время растёт пока watched-now, иначе мгновенно 0
    pub fn record(&mut self, enemy: Entity, watched_now: bool, delta: f32) {
        let record = self.records.entry(enemy).or_default();
        record.watched_now = watched_now;
        if watched_now {
            record.watch_time += delta;
        } else {
            record.watch_time = 0.0;
        }
    }

    pub fn is_watched_now(&self, enemy: Entity) -> bool {
        self.records.get(&enemy).is_some_and(|r| r.watched_now)
    }

    /// Debounced флаг
    pub fn is_watched(&self, enemy: Entity) -> bool {
        self.records
            .get(&enemy)
            .is_some_and(|r| r.watched_now && r.watch_time >= self.threshold)
    }

    pub fn watch_time(&self, enemy: Entity) -> f32 {
        self.records.get(&enemy).map_or(0.0, |r| r.watch_time)
    }

    pub fn reset(&mut self, enemy: Entity) {
        if let Some(record) = self.records.get_mut(&enemy) {
            *record = WatchRecord::default();
        }
    }

    /// Сколько врагов сейчас debounced-watched
    pub fn watched_count(&self) -> usize {
        self.records.keys().filter(|e| self.is_watched(**e)).count()
    }

    /// Враг, на которого смотрят дольше всех (если хоть на кого-то смотрят)
    pub fn most_watched(&self) -> Option<Entity> {
        self.records
            .iter()
            .filter(|(_, r)| r.watched_now)
            .max_by(|a, b| a.1.watch_time.total_cmp(&b.1.watch_time))
            .map(|(e, _)| *e)
    }

    /// Удаляет записи врагов, которых больше нет. Возвращает число удалённых.
    pub fn sweep(&mut self, alive: impl Fn(Entity) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|enemy, _| alive(*enemy));
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Смотрит ли камера на точку (без debounce)
#[allow(clippy::too_many_arguments)]
pub fn is_watching(
    eye: Vec3,
    forward: Vec3,
    enemy_position: Vec3,
    enemy_root: Entity,
    max_range: f32,
    config: &WatchConfig,
    spatial: &impl SpatialQuery,
    filter: RayFilter,
) -> bool {
    let offset = enemy_position - eye;
    let distance = offset.length();
    if distance > max_range {
        return false;
    }

    let Some(direction) = offset.try_normalize() else {
        // Камера внутри врага
        return true;
    };
    if forward.normalize_or_zero().dot(direction) <= config.view_dot_threshold {
        return false;
    }

    !config.check_obstruction || line_of_sight(spatial, eye, enemy_position, enemy_root, filter)
}

/// Система: обновление WatchTracker (фаза Perception, до FSM)
pub fn update_watch_tracker(
    mut tracker: ResMut<WatchTracker>,
    config: Res<WatchConfig>,
    field: Res<ObstacleField>,
    time: Res<Time<Fixed>>,
    players: Query<(Entity, &Transform, &PlayerView, Option<&Flashlight>), With<Player>>,
    enemies: Query<(Entity, &Transform, &EnemyConfig, Has<Concealed>), With<Enemy>>,
    mut warned_missing_player: Local<bool>,
) {
    let delta = time.delta_secs();
    tracker.set_threshold(config.watch_time_threshold);

    let viewer = players.single().ok();
    if viewer.is_none() && !*warned_missing_player {
        logger::log_warning("⚠️ WatchTracker: no Player found, watch detection disabled");
        *warned_missing_player = true;
    } else if viewer.is_some() {
        *warned_missing_player = false;
    }

    for (enemy, enemy_transform, enemy_config, concealed) in enemies.iter() {
        let watched_now = match viewer {
            Some((player, body, view, flashlight)) if !concealed => {
                let flashlight_ok = !config.require_flashlight || flashlight.is_some_and(|f| f.is_on());
                flashlight_ok
                    && is_watching(
                        view.eye(body),
                        view.forward(body),
                        enemy_transform.translation,
                        enemy,
                        enemy_config.max_follow_range,
                        &config,
                        &*field,
                        RayFilter::new(MASK_LINE_OF_SIGHT).excluding(player),
                    )
            }
            _ => false,
        };
        tracker.record(enemy, watched_now, delta);
    }

    // Stale записи (despawned враги)
    let removed = tracker.sweep(|e| enemies.contains(e));
    if removed > 0 {
        logger::log(&format!("👁️ WatchTracker: removed {} stale entries", removed));
    }
}
