//! Boss two-phase fight: BossPhases component + PhaseChange state.
//!
//! # Phase transition chain (timer-driven)
//!
//! ```text
//! enter: lock → stop + movement off → in_transition = true → death clip
//!   PhaseStep(1): hold
//!   PhaseStep(2): death clip reversed
//!   PhaseStep(3): energize clip
//!   PhaseStep(4): phase-2 stats / attacks → unlock → movement on → Idle
//! ```
//!
//! Отсутствующий clip даёт нулевую длительность, цепочка просто идёт дальше.
//! Phase 1 держит HP floor = 1, поэтому босс не может умереть до смены фазы.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::attack_spec::AttackSpec;
use crate::ai::selection::AttackPacing;
use crate::animation::ClipRequest;
use crate::components::{StatBlock, StatBlockConfig};
use crate::fsm::{state_names, ActorContext, CharacterState, TimerEvent};
use crate::states::end_attack;

/// What the boss becomes after the transition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTwoConfig {
    pub stats: StatBlockConfig,
    /// Empty = keep the phase-1 table
    pub attacks: Vec<AttackSpec>,
    pub pacing: AttackPacing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// HP fraction that triggers the transition
    pub phase_threshold: f32,
    pub death_clip: String,
    pub energize_clip: String,
    pub hold_seconds: f32,
    pub phase_two: PhaseTwoConfig,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            phase_threshold: 0.5,
            death_clip: "Death".to_string(),
            energize_clip: "Energize".to_string(),
            hold_seconds: 1.0,
            phase_two: PhaseTwoConfig::default(),
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct BossPhases {
    pub phase: u8,
    pub threshold: f32,
    /// Alive for wave-clear checks while set
    pub in_transition: bool,
    pub phase_two: PhaseTwoConfig,
}

impl BossPhases {
    pub fn new(config: &BossConfig) -> Self {
        Self {
            phase: 1,
            threshold: config.phase_threshold,
            in_transition: false,
            phase_two: config.phase_two.clone(),
        }
    }

    /// Phase 1 ends at the threshold, or when HP is pinned on the floor
    /// (threshold ниже 1 HP на малом max_hp).
    pub fn wants_transition(&self, stats: &StatBlock) -> bool {
        if self.phase != 1 || self.in_transition || !stats.is_alive() {
            return false;
        }
        let pinned = stats.hp_floor() > 0.0 && stats.hp() <= stats.hp_floor();
        pinned || stats.hp_fraction() <= self.threshold
    }
}

#[derive(Debug)]
pub struct PhaseChangeState {
    death_clip: String,
    energize_clip: String,
    hold_seconds: f32,
    finished: bool,
}

impl PhaseChangeState {
    pub fn new(config: &BossConfig) -> Self {
        Self {
            death_clip: config.death_clip.clone(),
            energize_clip: config.energize_clip.clone(),
            hold_seconds: config.hold_seconds.max(0.0),
            finished: false,
        }
    }

    fn apply_phase_two(&mut self, ctx: &mut ActorContext) {
        let Some(phase_two) = ctx.boss.as_deref().map(|boss| boss.phase_two.clone()) else {
            crate::logger::log_warning(&format!("{}: PhaseChange without BossPhases", ctx.name));
            return;
        };

        ctx.stats.apply_config(&phase_two.stats);
        ctx.stats.set_hp_floor(0.0);

        if let Some(brain) = ctx.brain.as_deref_mut() {
            if !phase_two.attacks.is_empty() {
                brain.attacks = phase_two.attacks;
            }
            brain.pacing = phase_two.pacing;
            brain.next_attack_time = ctx.now;
        }

        if let Some(boss) = ctx.boss.as_deref_mut() {
            boss.phase = 2;
            boss.in_transition = false;
        }
    }
}

impl CharacterState for PhaseChangeState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        self.finished = false;

        ctx.combat.lock();
        ctx.combat.clear_actions();
        end_attack(ctx);
        ctx.motor.stop();
        ctx.motor.movement_enabled = false;
        if let Some(boss) = ctx.boss.as_deref_mut() {
            boss.in_transition = true;
        }

        crate::logger::log_info(&format!("🔥 {} enters phase transition", ctx.name));
        let duration = ctx.play_clip(ClipRequest::new(self.death_clip.clone()));
        ctx.schedule(duration, TimerEvent::PhaseStep(1));
    }

    fn on_timer(&mut self, ctx: &mut ActorContext, event: TimerEvent) {
        let TimerEvent::PhaseStep(step) = event else {
            return;
        };

        match step {
            1 => ctx.schedule(self.hold_seconds, TimerEvent::PhaseStep(2)),
            2 => {
                let duration = ctx.play_clip(ClipRequest::new(self.death_clip.clone()).reversed());
                ctx.schedule(duration, TimerEvent::PhaseStep(3));
            }
            3 => {
                let duration = ctx.play_clip(ClipRequest::new(self.energize_clip.clone()));
                ctx.schedule(duration, TimerEvent::PhaseStep(4));
            }
            _ => {
                self.apply_phase_two(ctx);
                ctx.combat.unlock();
                ctx.motor.movement_enabled = true;
                self.finished = true;
                crate::logger::log_info(&format!("🔥 {} phase 2", ctx.name));
                ctx.request_transition(state_names::IDLE);
            }
        }
    }

    fn on_exit(&mut self, ctx: &mut ActorContext) {
        if !self.finished {
            if let Some(boss) = ctx.boss.as_deref_mut() {
                boss.in_transition = false;
            }
        }
    }

    fn can_transition_to(&self, next: &str) -> bool {
        next == state_names::DEATH || self.finished
    }
}
