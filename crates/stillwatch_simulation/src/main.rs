//! Headless симуляция STILLWATCH
//!
//! Демо-уровень без рендера: пол, игрок, сталкер, safe zone.
//! Игрок стоит спиной к врагу, потом разворачивается и смотрит на него.

use bevy::prelude::*;
use stillwatch_simulation::ai::EnemyStateChanged;
use stillwatch_simulation::catch::{CatchCompleted, CatchStarted};
use stillwatch_simulation::spatial::{Obstacle, SafeZone};
use stillwatch_simulation::{
    create_headless_app, log_info, run_fixed_ticks, spawn_enemy, spawn_player, EnemyConfig, EnemyState,
};

const SEED: u64 = 42;
const TICKS: usize = 1200;

/// Сцена: пол 100×100, safe zone у старта игрока, враг в 20м
fn setup_level(app: &mut App) -> (Entity, Entity) {
    let world = app.world_mut();
    world.spawn((Transform::from_xyz(0.0, -0.5, 0.0), Obstacle::ground(Vec3::new(50.0, 0.5, 50.0))));
    world.spawn((
        Transform::from_xyz(0.0, 1.0, 8.0),
        SafeZone::new(Vec3::new(2.0, 2.0, 2.0)),
    ));

    let mut commands = world.commands();
    let player = spawn_player(
        &mut commands,
        Transform::from_xyz(0.0, 0.0, 5.0).looking_to(Vec3::Z, Vec3::Y),
    );
    let enemy = spawn_enemy(
        &mut commands,
        Transform::from_xyz(0.0, 0.0, -15.0),
        EnemyConfig::stalker(),
    );
    world.flush();

    (player, enemy)
}

/// Сводка событий tick'а для stdout
fn report_events(world: &mut World) {
    let transitions: Vec<EnemyStateChanged> = world.resource_mut::<Events<EnemyStateChanged>>().drain().collect();
    for change in transitions {
        println!("  {:?}: {:?} → {:?}", change.enemy, change.from, change.to);
    }
    for started in world.resource_mut::<Events<CatchStarted>>().drain() {
        println!("  catch started by {:?}", started.enemy);
    }
    for completed in world.resource_mut::<Events<CatchCompleted>>().drain() {
        println!("  catch completed by {:?} (counted: {})", completed.enemy, completed.counted);
    }
}

fn main() {
    println!("Starting STILLWATCH headless simulation (seed: {})", SEED);

    let mut app = create_headless_app(SEED);
    app.update();
    let (player, enemy) = setup_level(&mut app);

    for tick in 0..TICKS {
        // Первые 10 секунд игрок смотрит в другую сторону, потом на врага
        if tick == 600 {
            if let Some(mut transform) = app.world_mut().get_mut::<Transform>(player) {
                transform.look_at(Vec3::new(0.0, 0.0, -15.0), Vec3::Y);
                log_info("👀 Player turns around");
            }
        }

        run_fixed_ticks(&mut app, 1);
        report_events(app.world_mut());

        if tick % 120 == 0 {
            let state = app.world().get::<EnemyState>(enemy).copied();
            let position = app.world().get::<Transform>(enemy).map(|t| t.translation);
            println!("Tick {}: enemy {:?} at {:?}", tick, state, position);
        }
    }

    println!("Simulation complete!");
}
