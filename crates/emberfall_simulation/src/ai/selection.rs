//! Enemy attack selection, pacing and interrupt policy.
//!
//! Все броски идут через переданный RNG (`DeterministicRng` в системах),
//! поэтому один seed воспроизводит один и тот же бой.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::attack_spec::AttackSpec;
use crate::combat::{Combat, InterruptProfile, EVADE_COOLDOWN_KEY};

/// Weight floor: zero-weight specs still get picked occasionally.
pub const MIN_ATTACK_WEIGHT: f32 = 0.01;

/// Global inter-attack pacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackPacing {
    pub interval: f32,
    pub deviation: f32,
}

impl Default for AttackPacing {
    fn default() -> Self {
        Self {
            interval: 1.5,
            deviation: 0.3,
        }
    }
}

/// Evade-on-hit tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvadeConfig {
    pub chance: f32,
    pub cooldown: f32,
}

impl Default for EvadeConfig {
    fn default() -> Self {
        Self {
            chance: 0.25,
            cooldown: 3.0,
        }
    }
}

/// Indices of specs usable at `distance` right now.
pub fn attack_candidates(specs: &[AttackSpec], distance: f32, combat: &Combat, now: f64) -> Vec<usize> {
    specs
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.in_range(distance) && combat.is_cooldown_ready(spec.cooldown_key(), now))
        .map(|(index, _)| index)
        .collect()
}

/// Weighted random pick among candidates.
///
/// Draw uniformly in `[0, total)`, subtract weights in order until the draw
/// is exhausted. Float drift falls back to the last candidate.
pub fn select_attack<R: Rng + ?Sized>(
    specs: &[AttackSpec],
    distance: f32,
    combat: &Combat,
    now: f64,
    rng: &mut R,
) -> Option<usize> {
    let candidates = attack_candidates(specs, distance, combat, now);
    let last = *candidates.last()?;

    let weight = |index: usize| specs[index].weight.max(MIN_ATTACK_WEIGHT);
    let total: f32 = candidates.iter().map(|&index| weight(index)).sum();

    let mut draw = rng.gen_range(0.0..total);
    for &index in &candidates {
        draw -= weight(index);
        if draw < 0.0 {
            return Some(index);
        }
    }
    Some(last)
}

/// `now + interval + uniform(-deviation, +deviation)`, never in the past.
pub fn next_attack_time<R: Rng + ?Sized>(now: f64, pacing: &AttackPacing, rng: &mut R) -> f64 {
    let deviation = pacing.deviation.abs();
    let jitter = if deviation > 0.0 {
        rng.gen_range(-deviation..=deviation)
    } else {
        0.0
    };
    now + (pacing.interval + jitter).max(0.0) as f64
}

/// Does an incoming hit preempt the attack in progress?
pub fn should_interrupt_current_attack<R: Rng + ?Sized>(
    profile: Option<&InterruptProfile>,
    heavy: bool,
    rng: &mut R,
) -> bool {
    let Some(profile) = profile else {
        crate::logger::log_warning("should_interrupt_current_attack: no active attack context, interrupting");
        return true;
    };

    if !profile.interruptible {
        return false;
    }

    let chance = if heavy {
        profile.chance_on_heavy
    } else {
        profile.chance
    };

    rng.gen::<f32>() < chance.clamp(0.0, 1.0)
}

/// Pre-damage evade roll; commits the evade cooldown on success.
pub fn roll_evade<R: Rng + ?Sized>(evade: &EvadeConfig, combat: &mut Combat, now: f64, rng: &mut R) -> bool {
    if !combat.is_cooldown_ready(EVADE_COOLDOWN_KEY, now) {
        return false;
    }
    if rng.gen::<f32>() >= evade.chance.clamp(0.0, 1.0) {
        return false;
    }
    combat.commit_cooldown(EVADE_COOLDOWN_KEY, evade.cooldown, now);
    true
}
