//! EnemyBrain (attack table + pacing + evade) и Perception polling.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::attack_spec::AttackSpec;
use crate::ai::selection::{attack_candidates, AttackPacing, EvadeConfig};
use crate::combat::Combat;
use crate::components::{planar_distance, Actor, Dead, StatBlock};

/// Chase stops closing in at this distance when no spec declares a range.
const DEFAULT_ENGAGE_RANGE: f32 = 1.5;

/// Текущая цель удерживается до aggro_range * LEASH_FACTOR.
const LEASH_FACTOR: f32 = 1.5;

#[derive(Component, Debug, Clone, Default)]
pub struct EnemyBrain {
    pub attacks: Vec<AttackSpec>,
    pub pacing: AttackPacing,
    /// Global pacing gate (world seconds)
    pub next_attack_time: f64,
    pub evade: Option<EvadeConfig>,
}

impl EnemyBrain {
    pub fn new(attacks: Vec<AttackSpec>, pacing: AttackPacing) -> Self {
        Self {
            attacks,
            pacing,
            next_attack_time: 0.0,
            evade: None,
        }
    }

    pub fn with_evade(mut self, evade: Option<EvadeConfig>) -> Self {
        self.evade = evade;
        self
    }

    /// Closest `max_range` among specs: Chase closes to here.
    pub fn engage_range(&self) -> f32 {
        self.attacks
            .iter()
            .map(|spec| spec.max_range)
            .filter(|range| *range > 0.0)
            .reduce(f32::min)
            .unwrap_or(DEFAULT_ENGAGE_RANGE)
    }

    pub fn pacing_ready(&self, now: f64) -> bool {
        now >= self.next_attack_time
    }

    /// Pacing allows an attack and at least one spec is usable.
    pub fn can_attack(&self, distance: f32, combat: &Combat, now: f64) -> bool {
        self.pacing_ready(now) && !attack_candidates(&self.attacks, distance, combat, now).is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub aggro_range: f32,
    pub poll_interval: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            aggro_range: 12.0,
            poll_interval: 0.25,
        }
    }
}

/// Polled target acquisition (не каждый тик).
#[derive(Component, Debug, Clone)]
pub struct Perception {
    pub aggro_range: f32,
    pub poll_interval: f32,
    next_poll_at: f64,
    pub target_in_range: bool,
}

impl Perception {
    pub fn new(config: &PerceptionConfig) -> Self {
        Self {
            aggro_range: config.aggro_range,
            poll_interval: config.poll_interval.max(0.0),
            next_poll_at: 0.0,
            target_in_range: false,
        }
    }

    pub fn due(&self, now: f64) -> bool {
        now >= self.next_poll_at
    }

    fn polled(&mut self, now: f64) {
        self.next_poll_at = now + self.poll_interval as f64;
    }
}

/// Nearest living hostile within `max_range` (XZ distance).
pub fn find_nearest_hostile(
    self_entity: Entity,
    self_actor: &Actor,
    self_position: Vec3,
    candidates: &Query<(Entity, &Actor, &Transform, &StatBlock)>,
    max_range: f32,
) -> Option<(Entity, f32)> {
    let mut nearest: Option<(Entity, f32)> = None;

    for (entity, actor, transform, stats) in candidates.iter() {
        // Не атакуем себя, своих и мёртвых
        if entity == self_entity || !self_actor.is_hostile_to(actor) || !stats.is_alive() {
            continue;
        }

        let distance = planar_distance(self_position, transform.translation);
        if distance > max_range {
            continue;
        }

        match nearest {
            Some((_, best)) if best <= distance => {}
            _ => nearest = Some((entity, distance)),
        }
    }

    nearest
}

/// Система: perception polling → `Combat::target`.
pub fn poll_perception(
    time: Res<Time<Fixed>>,
    mut perceivers: Query<(Entity, &Actor, &Transform, &mut Perception, &mut Combat), Without<Dead>>,
    candidates: Query<(Entity, &Actor, &Transform, &StatBlock)>,
) {
    let now = time.elapsed_secs_f64();

    for (entity, actor, transform, mut perception, mut combat) in perceivers.iter_mut() {
        if !perception.due(now) {
            continue;
        }
        perception.polled(now);

        let position = transform.translation;
        let nearest = find_nearest_hostile(entity, actor, position, &candidates, perception.aggro_range);

        // Текущая живая цель держится в leash радиусе
        let kept = combat.target.and_then(|target| {
            let (_, target_actor, target_transform, target_stats) = candidates.get(target).ok()?;
            let distance = planar_distance(position, target_transform.translation);
            let valid = target_stats.is_alive()
                && actor.is_hostile_to(target_actor)
                && distance <= perception.aggro_range * LEASH_FACTOR;
            valid.then_some((target, distance))
        });

        let acquired = kept.or(nearest);
        let previous = combat.target;
        combat.target = acquired.map(|(target, _)| target);
        perception.target_in_range = acquired.is_some_and(|(_, distance)| distance <= perception.aggro_range);

        if previous != combat.target {
            match combat.target {
                Some(target) => crate::logger::log(&format!("👁️ {} spotted {:?}", actor.name, target)),
                None => crate::logger::log(&format!("👁️ {} lost its target", actor.name)),
            }
        }
    }
}
