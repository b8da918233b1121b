//! Catch systems: toggles → re-arm → trigger → sequence driver.
//!
//! Sequence = один component на враге (`CatchSequence`), который продвигается
//! раз в tick. Подзадачи (turn/look/shake/lift) — поля этого component'а,
//! общий флаг `should_stop` проверяется перед каждой записью.

use bevy::ecs::query::QueryData;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::{ColliderDisabled, RigidBody, Velocity};
use rand::Rng;

use super::components::{BeingCaught, CatchConfig, CatchGate, CatchPhase, CatchSequence, SubTask};
use super::error::CatchAbort;
use super::events::*;
use super::lights::{EnemyLight, SpotlightManager};
use super::respawn::{resolve_spawn, PlayerSpawnManager};
use super::sequence::{facing, held_position, lift_height, look_step, shake_offset, turn_step};
use super::{CatchCounter, ScreenFade};
use crate::ai::{EnemyMemory, EnemyState, EnemyStateChanged};
use crate::components::{
    AnimationSink, AnimatorParams, Concealed, Enemy, Player, PlayerAnchor, PlayerControl, PlayerView, SpawnPoint,
    PARAM_PLAYER_CATCH,
};
use crate::logger;
use crate::spatial::SafeZoneIndex;
use crate::DeterministicRng;

/// Все исходящие события catch'а (уменьшает число параметров систем)
#[derive(SystemParam)]
pub struct CatchEventWriters<'w> {
    pub started: EventWriter<'w, CatchStarted>,
    pub completed: EventWriter<'w, CatchCompleted>,
    pub sound: EventWriter<'w, CatchSoundRequested>,
    pub reset: EventWriter<'w, GameResetRequested>,
    pub state_changed: EventWriter<'w, EnemyStateChanged>,
}

/// Враг, который может начать catch
#[derive(QueryData)]
#[query_data(mutable)]
pub struct CatchCandidate {
    pub entity: Entity,
    pub transform: &'static Transform,
    pub config: &'static CatchConfig,
    pub gate: &'static CatchGate,
    pub memory: &'static EnemyMemory,
    pub state: &'static mut EnemyState,
    pub velocity: Option<&'static mut Velocity>,
    pub animator: Option<&'static mut AnimatorParams>,
    pub light: Option<&'static mut EnemyLight>,
    pub running: Has<CatchSequence>,
    pub concealed: Has<Concealed>,
}

/// Игрок в момент trigger'а
#[derive(QueryData)]
#[query_data(mutable)]
pub struct CatchTarget {
    pub entity: Entity,
    pub transform: &'static Transform,
    pub view: Option<&'static PlayerView>,
    pub control: &'static mut PlayerControl,
    pub velocity: Option<&'static mut Velocity>,
    pub caught: Option<&'static BeingCaught>,
}

/// Враг с идущей sequence
#[derive(QueryData)]
#[query_data(mutable)]
pub struct CatchingEnemy {
    pub entity: Entity,
    pub transform: &'static mut Transform,
    pub sequence: &'static mut CatchSequence,
    pub config: &'static CatchConfig,
    pub spawn: &'static SpawnPoint,
    pub state: &'static mut EnemyState,
    pub memory: &'static mut EnemyMemory,
    pub gate: &'static mut CatchGate,
    pub velocity: Option<&'static mut Velocity>,
    pub body: Option<&'static mut RigidBody>,
    pub animator: Option<&'static mut AnimatorParams>,
    pub light: Option<&'static mut EnemyLight>,
}

/// Пойманный игрок
#[derive(QueryData)]
#[query_data(mutable)]
pub struct CaughtPlayer {
    pub entity: Entity,
    pub transform: &'static mut Transform,
    pub view: &'static mut PlayerView,
    pub control: &'static mut PlayerControl,
    pub velocity: Option<&'static mut Velocity>,
    pub anchor: Option<&'static PlayerAnchor>,
}

/// Снимок игрока для проверки preconditions (без ECS borrow'ов)
#[derive(Debug, Clone, Copy)]
pub struct PlayerSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub control: PlayerControl,
    pub view: Option<PlayerView>,
    /// Кто уже ловит этого игрока
    pub caught_by: Option<Entity>,
}

/// Проверка preconditions и создание контекста. Ничего не меняет в мире.
///
/// Range и safe zone проверяет вызывающий (ForceCatch их обходит).
/// Скрытый враг (eviction, свет) не ловит никогда.
pub fn begin_catch(
    enemy: Entity,
    gate: &CatchGate,
    running: bool,
    concealed: bool,
    player: Option<PlayerSnapshot>,
) -> Result<CatchSequence, CatchAbort> {
    if !gate.enabled {
        return Err(CatchAbort::Disabled(enemy));
    }
    if concealed {
        return Err(CatchAbort::Concealed(enemy));
    }
    let player = player.ok_or(CatchAbort::MissingPlayer(enemy))?;
    if running {
        return Err(CatchAbort::AlreadyRunning {
            enemy,
            player: player.entity,
        });
    }
    if let Some(by) = player.caught_by {
        return Err(CatchAbort::AlreadyRunning {
            enemy: by,
            player: player.entity,
        });
    }
    let view = player.view.ok_or(CatchAbort::MissingCamera(player.entity))?;

    Ok(CatchSequence::new(
        player.entity,
        player.control,
        view.local_position,
        player.position,
    ))
}

/// Система: SetCatchEnabled
pub fn handle_catch_toggles(mut events: EventReader<SetCatchEnabled>, mut gates: Query<&mut CatchGate>) {
    for event in events.read() {
        match gates.get_mut(event.enemy) {
            Ok(mut gate) => {
                gate.enabled = event.enabled;
                crate::log(&format!(
                    "🎯 Enemy {:?}: catching {}",
                    event.enemy,
                    if event.enabled { "enabled" } else { "disabled" }
                ));
            }
            Err(_) => logger::log_warning(&format!("⚠️ SetCatchEnabled: {:?} has no CatchGate", event.enemy)),
        }
    }
}

/// Система: re-arm пауза после завершённого catch'а
pub fn tick_catch_gates(time: Res<Time<Fixed>>, mut gates: Query<&mut CatchGate, Without<CatchSequence>>) {
    let delta = time.delta_secs();
    for mut gate in gates.iter_mut() {
        if gate.cooldown > 0.0 {
            gate.tick(delta);
        }
    }
}

/// Система: ForceCatch + proximity trigger
///
/// Proximity: distance ≤ catch_range и игрок не в safe zone. Взгляд игрока
/// catch не блокирует (только логируется).
#[allow(clippy::too_many_arguments)]
pub fn trigger_catches(
    mut commands: Commands,
    mut forced: EventReader<ForceCatch>,
    safe_zones: Res<SafeZoneIndex>,
    spotlights: Option<Res<SpotlightManager>>,
    mut fade: ResMut<ScreenFade>,
    mut enemies: Query<CatchCandidate, (With<Enemy>, Without<Player>)>,
    mut players: Query<CatchTarget, (With<Player>, Without<Enemy>)>,
    mut events: CatchEventWriters,
) {
    let mut player = players.single_mut().ok();
    let spotlights = spotlights.as_deref();
    // BeingCaught вставляется через commands, поэтому захват в этом tick'е помним локально
    let mut claimed_by: Option<Entity> = None;

    for event in forced.read() {
        let Ok(mut enemy) = enemies.get_mut(event.enemy) else {
            logger::log_warning(&format!("⚠️ ForceCatch: {:?} is not an enemy", event.enemy));
            continue;
        };

        let snapshot = player.as_ref().map(|player| snapshot_of(player, claimed_by));
        match begin_catch(enemy.entity, enemy.gate, enemy.running, enemy.concealed, snapshot) {
            Ok(sequence) => {
                if let Some(player) = player.as_mut() {
                    claimed_by = Some(enemy.entity);
                    start_catch(&mut commands, &mut enemy, player, sequence, spotlights, &mut fade, &mut events, true);
                }
            }
            Err(abort) => logger::log_error(&format!("❌ ForceCatch aborted: {}", abort)),
        }
    }

    let Some(player) = player.as_mut() else {
        return;
    };
    if claimed_by.is_some() || player.caught.is_some() {
        return;
    }
    let player_position = player.transform.translation;
    if safe_zones.contains(player_position) {
        return;
    }

    for mut enemy in enemies.iter_mut() {
        if enemy.running || enemy.concealed || !enemy.gate.can_catch() {
            continue;
        }
        if enemy.transform.translation.distance(player_position) > enemy.config.catch_range {
            continue;
        }

        if enemy.memory.watched {
            crate::log(&format!("👁️ Enemy {:?} is being watched, catching anyway", enemy.entity));
        }

        match begin_catch(
            enemy.entity,
            enemy.gate,
            enemy.running,
            enemy.concealed,
            Some(snapshot_of(player, claimed_by)),
        ) {
            Ok(sequence) => {
                start_catch(&mut commands, &mut enemy, player, sequence, spotlights, &mut fade, &mut events, false);
                // Один catch за раз
                return;
            }
            Err(abort) => logger::log_error(&format!("❌ Catch aborted: {}", abort)),
        }
    }
}

fn snapshot_of(player: &CatchTargetItem, claimed_by: Option<Entity>) -> PlayerSnapshot {
    PlayerSnapshot {
        entity: player.entity,
        position: player.transform.translation,
        control: *player.control,
        view: player.view.copied(),
        caught_by: player.caught.map(|caught| caught.by).or(claimed_by),
    }
}

/// Переключение флагов после успешного begin_catch
#[allow(clippy::too_many_arguments)]
fn start_catch(
    commands: &mut Commands,
    enemy: &mut CatchCandidateItem,
    player: &mut CatchTargetItem,
    mut sequence: CatchSequence,
    spotlights: Option<&SpotlightManager>,
    fade: &mut ScreenFade,
    events: &mut CatchEventWriters,
    forced: bool,
) {
    // FSM подавлена
    let previous = *enemy.state;
    *enemy.state = EnemyState::CatchingPlayer;
    events.state_changed.write(EnemyStateChanged {
        enemy: enemy.entity,
        from: previous,
        to: EnemyState::CatchingPlayer,
    });
    if let Some(velocity) = enemy.velocity.as_mut() {
        velocity.linvel = Vec3::ZERO;
    }

    // Игрок заморожен
    player.control.set_movement_enabled(false);
    player.control.set_camera_enabled(false);
    if let Some(velocity) = player.velocity.as_mut() {
        velocity.linvel = Vec3::ZERO;
        velocity.angvel = Vec3::ZERO;
    }

    if let Some(animator) = enemy.animator.as_mut() {
        animator.try_set_bool(PARAM_PLAYER_CATCH, true);
    }

    // Свой свет врага приоритетнее общего spotlight'а
    match enemy.light.as_mut() {
        Some(light) if light.enable_on_catch => light.on = true,
        _ => sequence.spotlight = spotlights.and_then(|manager| manager.spawn_for(commands, enemy.entity)),
    }

    if enemy.config.use_fade {
        fade.fade_out(enemy.config.fade_duration);
    }

    crate::log(&format!(
        "😱 Enemy {:?} caught player {:?}{} ({:?} → CatchingPlayer)",
        enemy.entity,
        player.entity,
        if forced { " (forced)" } else { "" },
        previous
    ));

    commands.entity(player.entity).insert(BeingCaught { by: enemy.entity });
    commands.entity(enemy.entity).insert(sequence);
    events.started.write(CatchStarted {
        enemy: enemy.entity,
        player: player.entity,
        forced,
    });
}

/// Система: один tick каждой идущей sequence (+ StopCatchSequence)
#[allow(clippy::too_many_arguments)]
pub fn advance_catch_sequences(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut counter: ResMut<CatchCounter>,
    mut fade: ResMut<ScreenFade>,
    spawn_manager: Option<Res<PlayerSpawnManager>>,
    mut stops: EventReader<StopCatchSequence>,
    mut enemies: Query<CatchingEnemy, (With<Enemy>, Without<Player>)>,
    mut players: Query<CaughtPlayer, (With<Player>, Without<Enemy>)>,
    mut events: CatchEventWriters,
) {
    let delta = time.delta_secs();
    let stop_requests: Vec<Entity> = stops.read().map(|event| event.enemy).collect();

    for mut enemy in enemies.iter_mut() {
        let Ok(mut player) = players.get_mut(enemy.sequence.player) else {
            // Игрок пропал посреди sequence: возвращаем врага, игрока не трогаем
            logger::log_error(&format!(
                "❌ Catch sequence of {:?} lost player {:?}, aborting",
                enemy.entity, enemy.sequence.player
            ));
            finish_sequence(&mut commands, &mut enemy, None, &mut fade, &mut events);
            continue;
        };

        if stop_requests.contains(&enemy.entity) {
            crate::log(&format!("🛑 Catch sequence of {:?} stopped", enemy.entity));
            enemy.sequence.request_stop();
            finish_sequence(&mut commands, &mut enemy, Some(&mut player), &mut fade, &mut events);
            continue;
        }

        enemy.sequence.elapsed += delta;
        run_sub_tasks(&mut enemy, &mut player, &mut rng.rng, delta);

        match enemy.sequence.phase {
            CatchPhase::WindUp { remaining } => {
                let remaining = remaining - delta;
                if remaining > 0.0 {
                    enemy.sequence.phase = CatchPhase::WindUp { remaining };
                    continue;
                }
                let config = enemy.config;
                enemy.sequence.start_effects(config);
                enemy.sequence.phase = CatchPhase::Holding {
                    remaining: config.hold_duration(),
                };
                events.sound.write(CatchSoundRequested { enemy: enemy.entity });
            }
            CatchPhase::Holding { remaining } => {
                let remaining = remaining - delta;
                if remaining > 0.0 {
                    enemy.sequence.phase = CatchPhase::Holding { remaining };
                    continue;
                }
                end_hold(&mut commands, &mut enemy, &mut counter, &mut events);

                if enemy.config.respawn_player_on_catch {
                    if let Some(body) = enemy.body.as_mut() {
                        **body = RigidBody::KinematicPositionBased;
                    }
                }
                enemy.sequence.phase = CatchPhase::AwaitRespawn {
                    remaining: enemy.config.respawn_delay,
                };
            }
            CatchPhase::AwaitRespawn { remaining } => {
                let remaining = remaining - delta;
                if remaining > 0.0 {
                    enemy.sequence.phase = CatchPhase::AwaitRespawn { remaining };
                    continue;
                }
                if enemy.config.respawn_player_on_catch {
                    respawn(&mut commands, &mut enemy, &mut player, spawn_manager.as_deref());
                    enemy.sequence.phase = CatchPhase::ReleaseColliders;
                } else {
                    finish_sequence(&mut commands, &mut enemy, Some(&mut player), &mut fade, &mut events);
                }
            }
            CatchPhase::ReleaseColliders => {
                finish_sequence(&mut commands, &mut enemy, Some(&mut player), &mut fade, &mut events);
            }
        }
    }
}

/// Подзадачи: после `should_stop` ни одной записи позиции/поворота,
/// кроме финального сброса камеры
fn run_sub_tasks(enemy: &mut CatchingEnemyItem, player: &mut CaughtPlayerItem, rng: &mut impl Rng, delta: f32) {
    let config = enemy.config;
    let sequence = &mut *enemy.sequence;

    if sequence.should_stop {
        if sequence.shake.is_running() {
            player.view.local_position = sequence.original_camera_position;
        }
        for task in [&mut sequence.turn, &mut sequence.look, &mut sequence.shake, &mut sequence.lift] {
            if task.is_running() {
                *task = SubTask::Done;
            }
        }
        return;
    }

    // Враг разворачивается к игроку, в конце — точный поворот
    if sequence.turn.is_running() {
        let enemy_position = enemy.transform.translation;
        let player_position = player.transform.translation;
        enemy.transform.rotation = if sequence.turn.advance(delta) {
            facing(enemy_position, player_position, enemy.transform.rotation)
        } else {
            turn_step(
                enemy.transform.rotation,
                enemy_position,
                player_position,
                config.enemy_turn_speed,
                delta,
            )
        };
    }

    // Камера на лицо врага: yaw телом, pitch камерой
    if sequence.look.is_running() {
        let target = enemy.transform.translation + Vec3::Y * config.enemy_face_y_offset;
        let eye = player.view.eye(&player.transform);
        let (body, pitch) = look_step(
            player.transform.rotation,
            player.view.pitch,
            eye,
            target,
            config.camera_rotation_speed,
            delta,
        );
        player.transform.rotation = body;
        player.view.pitch = pitch;
        sequence.look.advance(delta);
    }

    if sequence.shake.is_running() {
        player.view.local_position = if sequence.shake.advance(delta) {
            sequence.original_camera_position
        } else {
            sequence.original_camera_position + shake_offset(rng, config.shake_amount)
        };
    }

    // Игрок висит перед врагом, перепривязка если враг сдвинулся
    if sequence.lift.is_running() {
        let lifted_y = match sequence.lifted_y {
            Some(y) => y,
            None => {
                let y = lift_height(
                    sequence.original_player_position.y,
                    enemy.transform.translation,
                    enemy.transform.rotation,
                    player.transform.translation,
                    config.player_lift_amount,
                );
                sequence.lifted_y = Some(y);
                y
            }
        };
        player.transform.translation = held_position(
            enemy.transform.translation,
            enemy.transform.rotation,
            player.transform.translation,
            config.enemy_player_distance,
            lifted_y,
        );
        if let Some(velocity) = player.velocity.as_mut() {
            velocity.linvel = Vec3::ZERO;
        }
        sequence.lift.advance(delta);
    }
}

/// Конец hold: spotlight убран, счётчик +1, опционально stop
fn end_hold(commands: &mut Commands, enemy: &mut CatchingEnemyItem, counter: &mut CatchCounter, events: &mut CatchEventWriters) {
    if let Some(spotlight) = enemy.sequence.spotlight.take() {
        commands.entity(spotlight).despawn();
    }

    let reached_max = counter.increment();
    enemy.sequence.counted = true;
    crate::log(&format!(
        "📊 Catch counted: {}/{}",
        counter.count, counter.max_catches
    ));
    if reached_max {
        logger::log_warning(&format!("🔄 Maximum catches reached ({}), requesting game reset", counter.count));
        events.reset.write(GameResetRequested { catches: counter.count });
        counter.reset();
    }

    if enemy.config.stop_after_catch {
        enemy.sequence.request_stop();
    }
}

/// Телепорт игрока на resolved spawn, враг обратно на свой spawn
fn respawn(
    commands: &mut Commands,
    enemy: &mut CatchingEnemyItem,
    player: &mut CaughtPlayerItem,
    spawn_manager: Option<&PlayerSpawnManager>,
) {
    // Подзадачи больше не пишут
    enemy.sequence.request_stop();

    let pose = resolve_spawn(spawn_manager, enemy.config, player.anchor, player.transform.translation);
    // Капсула выключена на время телепорта, включается на следующем tick'е
    commands.entity(player.entity).insert(ColliderDisabled);
    player.transform.translation = pose.position;
    player.transform.rotation = pose.rotation;
    player.view.pitch = 0.0;
    if let Some(velocity) = player.velocity.as_mut() {
        velocity.linvel = Vec3::ZERO;
        velocity.angvel = Vec3::ZERO;
    }

    enemy.transform.translation = enemy.spawn.position();
    enemy.transform.rotation = enemy.spawn.rotation();
    if let Some(body) = enemy.body.as_mut() {
        **body = RigidBody::Dynamic;
    }
    if let Some(velocity) = enemy.velocity.as_mut() {
        velocity.linvel = Vec3::ZERO;
    }

    crate::log(&format!(
        "🔁 Respawn: player {:?} → {:?}, enemy {:?} → spawn {:?}",
        player.entity,
        pose.position,
        enemy.entity,
        enemy.spawn.position()
    ));
}

/// Общий финал (нормальный конец, StopCatchSequence, потерянный игрок).
///
/// Восстанавливает сохранённые настройки игрока и камеры, возвращает FSM в Idle.
fn finish_sequence(
    commands: &mut Commands,
    enemy: &mut CatchingEnemyItem,
    player: Option<&mut CaughtPlayerItem>,
    fade: &mut ScreenFade,
    events: &mut CatchEventWriters,
) {
    let config = enemy.config;
    let sequence = &mut *enemy.sequence;
    sequence.request_stop();

    if let Some(player) = player {
        *player.control = sequence.original_control;
        player.view.local_position = sequence.original_camera_position;
        commands.entity(player.entity).remove::<(BeingCaught, ColliderDisabled)>();
    }

    if let Some(spotlight) = sequence.spotlight.take() {
        commands.entity(spotlight).despawn();
    }
    if let Some(light) = enemy.light.as_mut() {
        light.on = false;
    }
    if let Some(animator) = enemy.animator.as_mut() {
        animator.try_set_bool(PARAM_PLAYER_CATCH, false);
    }
    if let Some(body) = enemy.body.as_mut() {
        **body = RigidBody::Dynamic;
    }
    if config.use_fade {
        fade.fade_in(config.fade_duration);
    }

    if *enemy.state != EnemyState::Idle {
        events.state_changed.write(EnemyStateChanged {
            enemy: enemy.entity,
            from: *enemy.state,
            to: EnemyState::Idle,
        });
        *enemy.state = EnemyState::Idle;
    }
    enemy.memory.reset();
    enemy.gate.cooldown = config.rearm_delay;

    commands.entity(enemy.entity).remove::<CatchSequence>();
    events.completed.write(CatchCompleted {
        enemy: enemy.entity,
        player: sequence.player,
        counted: sequence.counted,
    });
    crate::log(&format!(
        "✅ Catch sequence of {:?} finished after {:.2}s (counted: {})",
        enemy.entity, sequence.elapsed, sequence.counted
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PlayerSnapshot {
        PlayerSnapshot {
            entity: Entity::from_raw(1),
            position: Vec3::new(0.0, 0.0, 2.0),
            control: PlayerControl::default(),
            view: Some(PlayerView::default()),
            caught_by: None,
        }
    }

    #[test]
    fn test_begin_catch_snapshots_player() {
        let enemy = Entity::from_raw(2);
        let sequence = begin_catch(enemy, &CatchGate::default(), false, false, Some(snapshot())).unwrap();

        assert_eq!(sequence.player, Entity::from_raw(1));
        assert_eq!(sequence.original_player_position, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(sequence.original_camera_position, PlayerView::default().local_position);
        assert!(!sequence.should_stop);
    }

    #[test]
    fn test_begin_catch_aborts() {
        let enemy = Entity::from_raw(2);
        let disabled = CatchGate {
            enabled: false,
            cooldown: 0.0,
        };

        assert_eq!(
            begin_catch(enemy, &disabled, false, false, Some(snapshot())).unwrap_err(),
            CatchAbort::Disabled(enemy)
        );
        assert_eq!(
            begin_catch(enemy, &CatchGate::default(), false, false, None).unwrap_err(),
            CatchAbort::MissingPlayer(enemy)
        );
        assert!(matches!(
            begin_catch(enemy, &CatchGate::default(), true, false, Some(snapshot())),
            Err(CatchAbort::AlreadyRunning { .. })
        ));

        let other = Entity::from_raw(9);
        let caught = PlayerSnapshot {
            caught_by: Some(other),
            ..snapshot()
        };
        assert_eq!(
            begin_catch(enemy, &CatchGate::default(), false, false, Some(caught)).unwrap_err(),
            CatchAbort::AlreadyRunning {
                enemy: other,
                player: Entity::from_raw(1)
            }
        );

        assert_eq!(
            begin_catch(enemy, &CatchGate::default(), false, true, Some(snapshot())).unwrap_err(),
            CatchAbort::Concealed(enemy)
        );

        let blind = PlayerSnapshot {
            view: None,
            ..snapshot()
        };
        assert_eq!(
            begin_catch(enemy, &CatchGate::default(), false, false, Some(blind)).unwrap_err(),
            CatchAbort::MissingCamera(Entity::from_raw(1))
        );
    }
}
