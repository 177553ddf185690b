//! Emberfall Simulation Core
//!
//! Combat-resolution ядро action-RPG на Bevy 0.16 ECS (headless, fixed step).
//!
//! - `fsm`: per-character state machine (states = trait objects, timers = данные)
//! - `states`: Idle / Move / Jump / Attack (combo + skill) / Dodge / Hit / Death
//! - `combat`: hit / hurt volumes, DamageInfo pipeline, cooldowns, input buffer
//! - `ai`: weighted attack selection, interrupt / evade rolls, Chase, boss phases
//! - `config`: RON archetypes + spawn helpers
//! - `host`: reference sphere-proximity overlaps (headless runs, тесты)
//!
//! Host (движок) отвечает за collision overlaps, clip lengths, floor probe и
//! проигрывание анимаций; общение через events и `animation` traits.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

// Публичные модули
pub mod ai;
pub mod animation;
pub mod combat;
pub mod components;
pub mod config;
pub mod fsm;
pub mod host;
pub mod logger;
pub mod states;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, AttackSpec, BossConfig, BossPhases, ComboStep, EnemyBrain, Perception};
pub use animation::{AnimationClips, AnimationTimeline, ClipLibrary, Floor, FloorProbe};
pub use combat::{
    ActionKind, ActionRequest, AnimationNotify, AnimationRequested, Combat, CombatPlugin, CombatSet, DamageDealt,
    DamageEvaded, DamageInfo, DamageRequest, DamageType, EncounterTracker, EntityDied, HitLanded, HitReaction,
    HitVolumeRegistry, HurtVolumeSet, LootGranted, VolumeOverlap, WaveCleared,
};
pub use components::*;
pub use config::{spawn_enemy, spawn_player, ConfigError, EnemyArchetypeConfig, PlayerConfig};
pub use fsm::{state_names, StateMachine, StateTimers};
pub use host::ProximityHostPlugin;
pub use logger::{init_logger, set_log_level, set_logger, LogLevel, LogPrinter};

/// Global simulation knobs.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// FixedUpdate rate
    pub fixed_hz: f64,
    pub seed: u64,
    /// Seconds a dead enemy stays before despawn
    pub corpse_lifetime: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_hz: 60.0,
            seed: 42,
            corpse_lifetime: 10.0,
        }
    }
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Читает `SimulationConfig`, если host вставил его до plugin'а.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = app.world().get_resource::<SimulationConfig>().cloned().unwrap_or_default();

        app
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(config.fixed_hz))
            // Детерминистичный RNG
            .insert_resource(DeterministicRng::new(config.seed))
            .insert_resource(config)
            // Подсистемы
            .add_plugins((CombatPlugin, AIPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Все боевые броски (crit, weighted pick, jitter, interrupt, evade) идут
/// отсюда: один seed = один и тот же бой.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(SimulationConfig::default().seed)
    }
}

/// Создаёт minimal Bevy App для headless симуляции (без SimulationPlugin)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins).insert_resource(SimulationConfig {
        seed,
        ..Default::default()
    });

    app
}

/// Прогоняет `ticks` fixed steps вручную (без wall clock).
///
/// Events не свапаются между тиками, поэтому `read_events` видит всё, что
/// было отправлено с момента старта.
pub fn run_fixed_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        let step = app.world().resource::<Time<Fixed>>().timestep();
        app.world_mut().resource_mut::<Time<Fixed>>().advance_by(step);
        app.world_mut().run_schedule(FixedUpdate);
    }
}

/// Fixed world clock (секунды).
pub fn fixed_now(app: &App) -> f64 {
    app.world().resource::<Time<Fixed>>().elapsed_secs_f64()
}

/// All events of type `E` still buffered in the world.
pub fn read_events<E: Event + Clone>(app: &App) -> Vec<E> {
    let events = app.world().resource::<Events<E>>();
    events.get_cursor().read(events).cloned().collect()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    let mut snapshot = Vec::new();
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
