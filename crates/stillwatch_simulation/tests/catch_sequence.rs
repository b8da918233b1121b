//! Catch sequence integration tests
//!
//! Проверяем:
//! - Catch на 2.0м: sequence, счётчик ровно +1, враг обратно на spawn
//! - Игрок в safe zone не ловится даже вплотную
//! - ForceCatch / StopCatchSequence
//! - Максимум поимок → GameResetRequested

use bevy::prelude::*;
use bevy_rapier3d::prelude::ColliderDisabled;
use stillwatch_simulation::catch::*;
use stillwatch_simulation::spatial::{Obstacle, SafeZone};
use stillwatch_simulation::*;

/// Helper: App + пол, счётчик с запасом (без сброса игры)
fn create_level(max_catches: u32) -> App {
    let mut app = create_headless_app(42);
    app.update();
    app.insert_resource(CatchCounter::with_max(max_catches));
    app.world_mut()
        .spawn((Transform::from_xyz(0.0, -0.5, 0.0), Obstacle::ground(Vec3::new(100.0, 0.5, 100.0))));
    app
}

/// Helper: игрок в начале координат спиной к врагу (смотрит в +Z)
fn place_player(app: &mut App) -> Entity {
    let player = spawn_player(
        &mut app.world_mut().commands(),
        Transform::from_xyz(0.0, 0.0, 0.0).looking_to(Vec3::Z, Vec3::Y),
    );
    app.world_mut().flush();
    player
}

/// Helper: враг на -Z, смотрит на игрока
fn place_enemy(app: &mut App, distance: f32, catch_config: Option<CatchConfig>) -> Entity {
    let enemy = spawn_enemy(
        &mut app.world_mut().commands(),
        Transform::from_xyz(0.0, 0.0, -distance).looking_at(Vec3::ZERO, Vec3::Y),
        EnemyConfig::stalker(),
    );
    app.world_mut().flush();
    if let Some(config) = catch_config {
        app.world_mut().entity_mut(enemy).insert(config);
    }
    enemy
}

fn drain<E: Event>(app: &mut App) -> Vec<E> {
    app.world_mut().resource_mut::<Events<E>>().drain().collect()
}

fn state_of(app: &App, enemy: Entity) -> EnemyState {
    *app.world().get::<EnemyState>(enemy).unwrap()
}

/// Test: catch на 2.0м при catch_range 2.5 — полный цикл с respawn
#[test]
fn test_catch_runs_full_sequence_and_returns_enemy_to_spawn() {
    let mut app = create_level(5);
    let player = place_player(&mut app);
    let enemy = place_enemy(&mut app, 2.0, None);
    let spawn = Vec3::new(0.0, 0.0, -2.0);

    run_fixed_ticks(&mut app, 1);
    assert_eq!(state_of(&app, enemy), EnemyState::CatchingPlayer);
    assert_eq!(drain::<CatchStarted>(&mut app).len(), 1);

    // 1s: игрок заморожен и висит перед врагом
    run_for_seconds(&mut app, 1.0);
    {
        let world = app.world();
        let control = world.get::<PlayerControl>(player).unwrap();
        assert!(!control.movement_enabled && !control.camera_enabled);
        assert_eq!(world.get::<BeingCaught>(player).unwrap().by, enemy);

        let player_position = world.get::<Transform>(player).unwrap().translation;
        let enemy_position = world.get::<Transform>(enemy).unwrap().translation;
        assert!(player_position.y > 0.9, "player at {:?}", player_position);
        assert!((math::flat_distance(player_position, enemy_position) - 2.3).abs() < 1e-3);
    }
    assert_eq!(drain::<CatchSoundRequested>(&mut app).len(), 1);

    // wind-up 0.2 + hold 5.0 + respawn 2.0 + release tick
    run_for_seconds(&mut app, 7.0);

    let world = app.world();
    assert!(world.get::<CatchSequence>(enemy).is_none());
    assert!(world.get::<BeingCaught>(player).is_none());
    assert!(world.get::<ColliderDisabled>(player).is_none());
    assert_ne!(state_of(&app, enemy), EnemyState::CatchingPlayer);

    let enemy_position = world.get::<Transform>(enemy).unwrap().translation;
    assert!(enemy_position.distance(spawn) < 1e-4, "enemy at {:?}", enemy_position);

    // Игрок на стартовой позиции, управление и камера восстановлены
    let player_position = world.get::<Transform>(player).unwrap().translation;
    assert!(player_position.distance(Vec3::ZERO) < 1e-4);
    assert_eq!(*world.get::<PlayerControl>(player).unwrap(), PlayerControl::default());
    assert_eq!(
        world.get::<PlayerView>(player).unwrap().local_position,
        PlayerView::default().local_position
    );

    assert_eq!(world.resource::<CatchCounter>().count, 1);
    assert!(world.get::<CatchGate>(enemy).unwrap().cooldown > 0.0);

    let completed = drain::<CatchCompleted>(&mut app);
    assert_eq!(completed.len(), 1);
    assert!(completed[0].counted);
}

/// Test: игрок в safe zone — catch запрещён даже на 2.2м
#[test]
fn test_no_catch_while_player_inside_safe_zone() {
    let mut app = create_level(5);
    place_player(&mut app);
    app.world_mut()
        .spawn((Transform::from_xyz(0.0, 1.0, 0.0), SafeZone::new(Vec3::new(1.5, 2.0, 1.5))));
    let enemy = place_enemy(&mut app, 2.2, None);

    for _ in 0..120 {
        run_fixed_ticks(&mut app, 1);
        assert_ne!(state_of(&app, enemy), EnemyState::CatchingPlayer);
    }
    assert_eq!(app.world().resource::<CatchCounter>().count, 0);
    assert!(drain::<CatchStarted>(&mut app).is_empty());
}

/// Test: ForceCatch обходит range, повторный ForceCatch отклоняется
#[test]
fn test_force_catch_bypasses_range() {
    let mut app = create_level(5);
    let player = place_player(&mut app);
    let enemy = place_enemy(&mut app, 20.0, None);

    run_fixed_ticks(&mut app, 1);
    assert_ne!(state_of(&app, enemy), EnemyState::CatchingPlayer);

    app.world_mut().send_event(ForceCatch { enemy });
    run_fixed_ticks(&mut app, 1);
    assert_eq!(state_of(&app, enemy), EnemyState::CatchingPlayer);
    assert!(app.world().get::<BeingCaught>(player).is_some());

    app.world_mut().send_event(ForceCatch { enemy });
    run_fixed_ticks(&mut app, 1);

    let started = drain::<CatchStarted>(&mut app);
    assert_eq!(started.len(), 1);
    assert!(started[0].forced);
}

/// Test: StopCatchSequence восстанавливает контроль и камеру сразу, без подсчёта
#[test]
fn test_stop_sequence_restores_player_immediately() {
    let mut app = create_level(5);
    let player = place_player(&mut app);
    let enemy = place_enemy(&mut app, 20.0, None);

    app.world_mut().send_event(ForceCatch { enemy });
    // Идёт shake/lift
    run_for_seconds(&mut app, 1.0);
    assert_ne!(
        app.world().get::<PlayerView>(player).unwrap().local_position,
        PlayerView::default().local_position
    );

    app.world_mut().send_event(StopCatchSequence { enemy });
    run_fixed_ticks(&mut app, 1);

    let world = app.world();
    assert!(world.get::<CatchSequence>(enemy).is_none());
    assert_eq!(*world.get::<PlayerControl>(player).unwrap(), PlayerControl::default());
    assert_eq!(
        world.get::<PlayerView>(player).unwrap().local_position,
        PlayerView::default().local_position
    );
    assert_eq!(state_of(&app, enemy), EnemyState::Idle);
    assert_eq!(world.resource::<CatchCounter>().count, 0);

    // После stop позиция игрока больше не пишется
    let held_at = world.get::<Transform>(player).unwrap().translation;
    run_fixed_ticks(&mut app, 30);
    assert_eq!(app.world().get::<Transform>(player).unwrap().translation, held_at);

    let completed = drain::<CatchCompleted>(&mut app);
    assert_eq!(completed.len(), 1);
    assert!(!completed[0].counted);
}

/// Test: без respawn sequence ждёт respawn_delay после hold, игрока не телепортирует
#[test]
fn test_catch_without_respawn_waits_delay_then_ends() {
    let mut app = create_level(5);
    let player = place_player(&mut app);
    let config = CatchConfig {
        respawn_player_on_catch: false,
        respawn_delay: 1.0,
        shake_duration: 0.5,
        player_lift_duration: 1.0,
        stop_after_catch: true,
        ..Default::default()
    };
    let enemy = place_enemy(&mut app, 2.0, Some(config));

    // wind-up 0.2 + hold 1.0: засчитан, но sequence ещё ждёт
    run_for_seconds(&mut app, 1.4);
    assert!(app.world().get::<CatchSequence>(enemy).is_some());
    assert_eq!(app.world().resource::<CatchCounter>().count, 1);
    assert!(drain::<CatchCompleted>(&mut app).is_empty());
    let held_at = app.world().get::<Transform>(player).unwrap().translation;

    // + respawn_delay 1.0
    run_for_seconds(&mut app, 1.1);
    let world = app.world();
    assert!(world.get::<CatchSequence>(enemy).is_none());
    assert!(world.get::<BeingCaught>(player).is_none());
    assert_eq!(*world.get::<PlayerControl>(player).unwrap(), PlayerControl::default());
    // Без телепорта: игрок там, где его отпустили
    assert_eq!(world.get::<Transform>(player).unwrap().translation, held_at);
    assert_eq!(drain::<CatchCompleted>(&mut app).len(), 1);
}

/// Test: скрытый (evicted) враг не принимает ForceCatch
#[test]
fn test_concealed_enemy_rejects_force_catch() {
    let mut app = create_level(5);
    let player = place_player(&mut app);
    let enemy = place_enemy(&mut app, 20.0, None);
    let spawn = Vec3::new(0.0, 0.0, -20.0);

    app.world_mut()
        .spawn((Transform::from_xyz(10.0, 1.0, -20.0), SafeZone::new(Vec3::new(2.0, 2.0, 2.0))));
    app.world_mut().get_mut::<Transform>(enemy).unwrap().translation = Vec3::new(10.0, 0.0, -20.0);

    run_fixed_ticks(&mut app, 3);
    assert!(app.world().get::<Concealed>(enemy).is_some());

    app.world_mut().send_event(ForceCatch { enemy });
    run_fixed_ticks(&mut app, 1);
    assert_ne!(state_of(&app, enemy), EnemyState::CatchingPlayer);
    assert!(app.world().get::<BeingCaught>(player).is_none());
    assert!(drain::<CatchStarted>(&mut app).is_empty());

    // Eviction идёт своим чередом
    run_fixed_ticks(&mut app, 100);
    let world = app.world();
    assert!(world.get::<CatchSequence>(enemy).is_none());
    let position = world.get::<Transform>(enemy).unwrap().translation;
    assert!(position.distance(spawn) < 1e-4, "enemy at {:?}", position);
}

/// Test: use_fade — экран темнеет на старте и светлеет после respawn
#[test]
fn test_fade_out_on_catch_and_in_after_respawn() {
    let mut app = create_level(5);
    place_player(&mut app);
    let config = CatchConfig {
        use_fade: true,
        fade_duration: 0.5,
        ..Default::default()
    };
    let enemy = place_enemy(&mut app, 2.0, Some(config));

    run_fixed_ticks(&mut app, 1);
    let alpha = app.world().resource::<ScreenFade>().alpha;
    assert!(alpha > 0.0 && alpha < 1.0, "alpha {}", alpha);

    // Весь hold под чёрным экраном
    run_for_seconds(&mut app, 5.0);
    assert!(app.world().get::<CatchSequence>(enemy).is_some());
    assert_eq!(app.world().resource::<ScreenFade>().alpha, 1.0);

    // wind-up 0.2 + hold 5.0 + respawn 2.0, затем fade in 0.5
    run_for_seconds(&mut app, 3.0);
    let fade = app.world().resource::<ScreenFade>();
    assert!(app.world().get::<CatchSequence>(enemy).is_none());
    assert_eq!(fade.alpha, 0.0);
    assert!(!fade.is_animating());
}

/// Test: достигнут максимум — GameResetRequested и счётчик в ноль
#[test]
fn test_max_catches_requests_game_reset() {
    let mut app = create_level(1);
    place_player(&mut app);
    let enemy = place_enemy(&mut app, 2.0, None);

    run_for_seconds(&mut app, 5.5);

    let resets = drain::<GameResetRequested>(&mut app);
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].catches, 1);
    assert_eq!(app.world().resource::<CatchCounter>().count, 0);
    // Sequence продолжается до respawn
    assert!(app.world().get::<CatchSequence>(enemy).is_some());
}

/// Test: без своего света враг получает временный spotlight на время hold
#[test]
fn test_spotlight_lives_for_hold_phase() {
    let mut app = create_level(5);
    place_player(&mut app);
    let enemy = place_enemy(&mut app, 2.0, None);

    run_for_seconds(&mut app, 1.0);
    let mut spotlights = app.world_mut().query::<(&CatchSpotlight, &ChildOf)>();
    let parents: Vec<Entity> = spotlights.iter(app.world()).map(|(_, parent)| parent.parent()).collect();
    assert_eq!(parents, vec![enemy]);

    run_for_seconds(&mut app, 5.0);
    let mut spotlights = app.world_mut().query::<&CatchSpotlight>();
    assert_eq!(spotlights.iter(app.world()).count(), 0);
}

/// Test: SetCatchEnabled(false) отключает proximity catch
#[test]
fn test_disabled_enemy_never_catches() {
    let mut app = create_level(5);
    place_player(&mut app);
    let enemy = place_enemy(&mut app, 2.0, None);
    app.world_mut().send_event(SetCatchEnabled { enemy, enabled: false });

    run_for_seconds(&mut app, 1.0);
    assert_ne!(state_of(&app, enemy), EnemyState::CatchingPlayer);
    assert!(drain::<CatchStarted>(&mut app).is_empty());
}
