//! Headless симуляция Emberfall
//!
//! Дуэль player vs grunt без рендера: scripted input, proximity overlaps,
//! fixed step. Первый аргумент = seed.

use bevy::prelude::*;
use emberfall_simulation::{
    create_headless_app, fixed_now, read_events, run_fixed_ticks, spawn_enemy, spawn_player, ActionKind,
    ActionRequest, EncounterTracker, EnemyArchetypeConfig, EntityDied, HitLanded, Motor, PlayerConfig,
    ProximityHostPlugin, SimulationPlugin, StatBlock, WaveCleared,
};

/// 2 минуты fixed time при 60 Hz
const MAX_TICKS: u32 = 60 * 120;
/// Player жмёт атаку раз в столько тиков
const ATTACK_INTERVAL: u32 = 12;

fn main() {
    let seed = std::env::args().nth(1).and_then(|arg| arg.parse().ok()).unwrap_or(42);
    println!("Starting Emberfall headless duel (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins((SimulationPlugin, ProximityHostPlugin));

    let player = spawn_player(app.world_mut(), &PlayerConfig::default(), Vec3::ZERO);
    let grunt = spawn_enemy(app.world_mut(), &EnemyArchetypeConfig::grunt(), Vec3::new(0.0, 0.0, 6.0));
    app.world_mut().resource_mut::<EncounterTracker>().begin_wave();

    for tick in 0..MAX_TICKS {
        script_player(&mut app, player, grunt, tick);
        run_fixed_ticks(&mut app, 1);

        if tick % 60 == 0 {
            println!(
                "t={:>5.2}s  player hp {:>6.1}  grunt hp {:>6.1}",
                fixed_now(&app),
                hp(&app, player),
                hp(&app, grunt)
            );
        }

        if !read_events::<WaveCleared>(&app).is_empty() || hp(&app, player) <= 0.0 {
            break;
        }
    }

    let hits = read_events::<HitLanded>(&app);
    let deaths = read_events::<EntityDied>(&app);
    println!(
        "Duel over at {:.2}s: {} hits landed, {} deaths, player hp {:.1}",
        fixed_now(&app),
        hits.len(),
        deaths.len(),
        hp(&app, player)
    );
}

/// Поворот к grunt'у + периодическая атака.
fn script_player(app: &mut App, player: Entity, grunt: Entity, tick: u32) {
    let Some(target) = app.world().get::<Transform>(grunt).map(|transform| transform.translation) else {
        return;
    };
    let Some(position) = app.world().get::<Transform>(player).map(|transform| transform.translation) else {
        return;
    };

    if let Some(mut motor) = app.world_mut().get_mut::<Motor>(player) {
        motor.face(target - position);
    }

    if tick % ATTACK_INTERVAL == 0 {
        app.world_mut().send_event(ActionRequest {
            entity: player,
            action: ActionKind::NormalAttack,
        });
    }
}

fn hp(app: &App, entity: Entity) -> f32 {
    app.world().get::<StatBlock>(entity).map_or(0.0, StatBlock::hp)
}
