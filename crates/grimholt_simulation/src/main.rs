//! Headless симуляция Grimholt
//!
//! Демо-сцена без рендера: hero + патрулирующий враг с оружием,
//! прогон фиксированных тиков для проверки детерминизма.

use bevy::prelude::*;
use grimholt_simulation::{
    create_headless_app, spawn_weapon, step_fixed, world_snapshot, Agent, Enemy, EquipIntent,
    Hero, PatrolRoute, WeaponKind,
};

fn main() {
    let seed = 42;
    println!("Starting Grimholt headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    let hero = app
        .world_mut()
        .spawn((
            Hero,
            Agent {
                faction_id: 1,
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, 0.0),
        ))
        .id();

    let enemy = app
        .world_mut()
        .spawn((
            Enemy,
            Agent {
                faction_id: 2,
                ..default()
            },
            PatrolRoute::new(vec![
                Vec3::new(6.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 6.0),
                Vec3::new(-6.0, 0.0, 0.0),
            ]),
            Transform::from_xyz(6.0, 0.0, 0.0),
        ))
        .id();

    let mut commands_queue = app.world_mut().commands();
    let sword = spawn_weapon(&mut commands_queue, WeaponKind::OneHand, 20.0);
    app.world_mut().flush();
    app.world_mut().send_event(EquipIntent {
        agent: enemy,
        weapon: sword,
    });
    println!("Spawned hero {:?}, armed enemy {:?}", hero, enemy);

    // 1000 тиков @ 60Hz ≈ 16.7 секунд игрового времени
    for tick in 0..1000 {
        step_fixed(&mut app);

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {}: {} entities", tick, entity_count);
        }
    }

    println!("--- snapshot ---");
    println!("{}", world_snapshot(app.world_mut()));
    println!("Simulation complete!");
}
