//! Encounter / wave tracking.

use bevy::prelude::*;

use crate::ai::BossPhases;
use crate::combat::events::WaveCleared;
use crate::components::{Dead, Enemy, StatBlock};

/// Current wave. Host calls `begin_wave` after spawning the wave's enemies.
#[derive(Resource, Debug, Clone, Default)]
pub struct EncounterTracker {
    wave: u32,
    active: bool,
}

impl EncounterTracker {
    /// Starts the next wave; returns its number (1-based).
    pub fn begin_wave(&mut self) -> u32 {
        self.wave += 1;
        self.active = true;
        self.wave
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Boss в phase transition считается живым (HP может быть на floor).
pub fn counts_as_alive(stats: &StatBlock, boss: Option<&BossPhases>) -> bool {
    stats.is_alive() || boss.is_some_and(|boss| boss.in_transition)
}

/// Система: все враги волны мертвы → WaveCleared (один раз на волну).
pub fn track_encounter(
    mut tracker: ResMut<EncounterTracker>,
    enemies: Query<(&StatBlock, Option<&BossPhases>), (With<Enemy>, Without<Dead>)>,
    mut cleared: EventWriter<WaveCleared>,
) {
    if !tracker.active {
        return;
    }

    if enemies.iter().any(|(stats, boss)| counts_as_alive(stats, boss)) {
        return;
    }

    tracker.active = false;
    crate::logger::log_info(&format!("🏁 Wave {} cleared", tracker.wave));
    cleared.write(WaveCleared { wave: tracker.wave });
}
