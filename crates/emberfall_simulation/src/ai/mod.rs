//! Enemy AI module
//!
//! - `attack_spec`: data-driven attack описания (окна, interrupt, cooldown, range)
//! - `selection`: weighted pick, pacing jitter, interrupt / evade rolls
//! - `brain`: EnemyBrain + Perception polling
//! - `chase` / `enemy_attack`: enemy-only FSM states
//! - `boss`: two-phase boss (PhaseChange state)
//!
//! Все решения принимаются в FixedUpdate через `DeterministicRng`.

use bevy::prelude::*;

pub mod attack_spec;
pub mod boss;
pub mod brain;
pub mod chase;
pub mod enemy_attack;
pub mod selection;

// Re-export основных типов
pub use attack_spec::{AttackSpec, ComboStep};
pub use boss::{BossConfig, BossPhases, PhaseChangeState, PhaseTwoConfig};
pub use brain::{find_nearest_hostile, poll_perception, EnemyBrain, Perception, PerceptionConfig};
pub use chase::ChaseState;
pub use enemy_attack::EnemyAttackState;
pub use selection::{
    attack_candidates, next_attack_time, roll_evade, select_attack, should_interrupt_current_attack, AttackPacing,
    EvadeConfig, MIN_ATTACK_WEIGHT,
};

use crate::combat::CombatSet;

/// AI Plugin
///
/// Perception polling идёт до damage pipeline и character driver'а,
/// чтобы Chase / Attack видели свежую цель в том же тике.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, poll_perception.in_set(CombatSet::Perception));
    }
}
