//! Attacker-side hit volumes (weapon / fist / tail collision shapes).
//!
//! # Architecture
//!
//! Каждый volume живёт в одном из двух состояний:
//! - **Inactive**: no collision
//! - **Active**: query-only, движок репортит overlaps (`VolumeOverlap`)
//!
//! Volume создаётся один раз (create-on-first-use по таблице определений)
//! и дальше только переключается на время attack window.
//!
//! # Hit flow
//!
//! ```text
//! Attack state → activate_by_names(["RightHand"], params)
//!   ↓
//! Host overlap callback → VolumeOverlap (attacker, volume, victim)
//!   ↓
//! register_hit(): self-hit / dedup → DamageInfo
//!   ↓
//! Victim intake (hurt volume → StatBlock::apply_damage)
//! ```

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::damage::{DamageInfo, DamageType, ElementType, HitReaction};
use crate::components::flatten;

/// Name of the fallback definition every registry carries.
pub const DEFAULT_VOLUME: &str = "Default";

/// Static-ish configuration of one named hit volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitVolumeDefinition {
    pub name: String,
    /// Skeleton socket (движок крепит shape к кости)
    pub attach_point: String,
    pub extents: [f32; 3],
    pub offset: [f32; 3],
    pub damage_scale: f32,
    pub additive_damage: f32,
    /// Fixed base damage instead of the attacker's attack stat
    pub base_damage_override: Option<f32>,
    pub damage_type: DamageType,
    pub element: ElementType,
    pub default_reaction: HitReaction,
    pub knockback_strength: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
}

impl Default for HitVolumeDefinition {
    fn default() -> Self {
        Self {
            name: DEFAULT_VOLUME.to_string(),
            attach_point: "root".to_string(),
            extents: [0.4, 0.4, 0.6],
            offset: [0.0, 1.0, 0.8],
            damage_scale: 1.0,
            additive_damage: 0.0,
            base_damage_override: None,
            damage_type: DamageType::Melee,
            element: ElementType::Physical,
            default_reaction: HitReaction::None,
            knockback_strength: 0.0,
            crit_chance: 0.0,
            crit_multiplier: 1.5,
        }
    }
}

impl HitVolumeDefinition {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn extents(&self) -> Vec3 {
        Vec3::from_array(self.extents)
    }

    pub fn offset(&self) -> Vec3 {
        Vec3::from_array(self.offset)
    }
}

/// Hit dedup granularity for one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DedupPolicy {
    /// Key (volume, target): каждый volume бьёт цель до max_hits раз
    #[default]
    PerWindow,
    /// Key (target): все volumes делят один счётчик на цель. Записи живут
    /// всю атаку: reset срабатывает только на первом окне атаки
    PerAttack,
    /// Без записей, каждый overlap = удар
    None,
}

/// Per-activation overrides, owned by the attack state for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitBoxActivationParams {
    pub multiplier: f32,
    pub reaction_override: Option<HitReaction>,
    pub max_hits_per_target: u32,
    pub dedup: DedupPolicy,
    /// Clear hit records on open (PerAttack: только первое окно атаки)
    pub reset_hit_records: bool,
}

impl Default for HitBoxActivationParams {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            reaction_override: None,
            max_hits_per_target: 1,
            dedup: DedupPolicy::PerWindow,
            reset_hit_records: true,
        }
    }
}

/// Explicit hit-window value: what to open, with which params.
///
/// Создаётся attack state'ом и едет через timer continuation / animation
/// notify. `id` отсекает stale notify после preemption.
#[derive(Debug, Clone, PartialEq)]
pub struct HitWindow {
    pub id: u64,
    pub volumes: Vec<String>,
    pub params: HitBoxActivationParams,
}

#[derive(Debug, Clone)]
struct HitVolume {
    definition: String,
    active: bool,
    params: HitBoxActivationParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HitKey {
    target: Entity,
    volume: Option<String>,
}

/// One overlap reported by the host, with the positions the pipeline needs.
#[derive(Debug, Clone)]
pub struct HitAttempt<'a> {
    pub attacker: Entity,
    pub attacker_attack: f32,
    pub attacker_position: Vec3,
    pub victim: Entity,
    pub victim_position: Vec3,
    pub hurt_volume: Option<&'a str>,
    pub location: Vec3,
    pub normal: Vec3,
}

#[derive(Component, Debug, Clone)]
pub struct HitVolumeRegistry {
    definitions: HashMap<String, HitVolumeDefinition>,
    volumes: HashMap<String, HitVolume>,
    hit_records: HashMap<HitKey, u32>,
    /// Window ids opened since the last `deactivate_all` (одна атака)
    opened_windows: HashSet<u64>,
}

impl Default for HitVolumeRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HitVolumeRegistry {
    pub fn new(definitions: Vec<HitVolumeDefinition>) -> Self {
        let mut registry = Self {
            definitions: HashMap::new(),
            volumes: HashMap::new(),
            hit_records: HashMap::new(),
            opened_windows: HashSet::new(),
        };
        registry.define(HitVolumeDefinition::default());
        for definition in definitions {
            registry.define(definition);
        }
        registry
    }

    /// Register (or replace) a definition. Must happen before first activation.
    pub fn define(&mut self, definition: HitVolumeDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    pub fn definition(&self, name: &str) -> Option<&HitVolumeDefinition> {
        self.definitions.get(name)
    }

    pub fn has_volume(&self, name: &str) -> bool {
        self.volumes.contains_key(name)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.volumes.get(name).is_some_and(|volume| volume.active)
    }

    pub fn active_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .volumes
            .iter()
            .filter(|(_, volume)| volume.active)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn any_active(&self) -> bool {
        self.volumes.values().any(|volume| volume.active)
    }

    pub fn activate_by_names(&mut self, names: &[String], params: &HitBoxActivationParams) {
        if params.reset_hit_records {
            self.hit_records.clear();
        }

        for name in names {
            let definition = self.resolve_definition(name);
            let volume = self.volumes.entry(name.clone()).or_insert_with(|| HitVolume {
                definition: definition.clone(),
                active: false,
                params: params.clone(),
            });
            volume.definition = definition;
            volume.params = params.clone();
            volume.active = true;
        }
    }

    pub fn deactivate_by_names(&mut self, names: &[String]) {
        for name in names {
            if let Some(volume) = self.volumes.get_mut(name) {
                volume.active = false;
            }
        }
    }

    /// Timer continuation и animation notify могут открыть одно окно дважды:
    /// повторный open того же id ничего не делает.
    pub fn open_window(&mut self, window: &HitWindow) {
        if !self.opened_windows.insert(window.id) {
            return;
        }

        let mut params = window.params.clone();
        if params.dedup == DedupPolicy::PerAttack && self.opened_windows.len() > 1 {
            params.reset_hit_records = false;
        }
        self.activate_by_names(&window.volumes, &params);
    }

    pub fn close_window(&mut self, window: &HitWindow) {
        self.deactivate_by_names(&window.volumes);
    }

    /// Safety net: state exit / death never leaves a volume armed.
    pub fn deactivate_all(&mut self) {
        for volume in self.volumes.values_mut() {
            volume.active = false;
        }
        self.opened_windows.clear();
    }

    pub fn clear_hit_records(&mut self) {
        self.hit_records.clear();
    }

    /// Hits already recorded against `target` (summed over volumes).
    pub fn hit_count(&self, target: Entity) -> u32 {
        self.hit_records
            .iter()
            .filter(|(key, _)| key.target == target)
            .map(|(_, count)| *count)
            .sum()
    }

    fn resolve_definition(&self, name: &str) -> String {
        if self.definitions.contains_key(name) {
            name.to_string()
        } else {
            crate::logger::log_warning(&format!(
                "HitVolumeRegistry: no definition for '{}', falling back to '{}'",
                name, DEFAULT_VOLUME
            ));
            DEFAULT_VOLUME.to_string()
        }
    }

    /// Overlap → DamageInfo.
    ///
    /// None when the volume is not armed, the hit is a self hit, or dedup
    /// says this target was already struck enough times.
    pub fn register_hit<R: Rng + ?Sized>(
        &mut self,
        volume_name: &str,
        attempt: &HitAttempt<'_>,
        rng: &mut R,
    ) -> Option<DamageInfo> {
        if attempt.attacker == attempt.victim {
            return None;
        }

        let volume = self.volumes.get(volume_name)?;
        if !volume.active {
            return None;
        }
        let params = volume.params.clone();
        let definition = self
            .definitions
            .get(&volume.definition)
            .or_else(|| self.definitions.get(DEFAULT_VOLUME))?
            .clone();

        let key = match params.dedup {
            DedupPolicy::PerWindow => Some(HitKey {
                target: attempt.victim,
                volume: Some(volume_name.to_string()),
            }),
            DedupPolicy::PerAttack => Some(HitKey {
                target: attempt.victim,
                volume: None,
            }),
            DedupPolicy::None => None,
        };

        if let Some(key) = key {
            let max_hits = params.max_hits_per_target.max(1);
            let count = self.hit_records.entry(key).or_insert(0);
            if *count >= max_hits {
                return None;
            }
            *count += 1;
        }

        let base = definition.base_damage_override.unwrap_or(attempt.attacker_attack);
        let mut value = (base * definition.damage_scale + definition.additive_damage) * params.multiplier;

        let is_critical = definition.crit_chance > 0.0 && rng.gen::<f32>() < definition.crit_chance.min(1.0);
        if is_critical {
            value *= definition.crit_multiplier;
        }

        let push_direction = flatten(attempt.victim_position - attempt.attacker_position).normalize_or_zero();

        Some(DamageInfo {
            instigator: Some(attempt.attacker),
            target: Some(attempt.victim),
            damage_value: value,
            raw_damage_value: value,
            damage_type: definition.damage_type,
            element: definition.element,
            is_critical,
            hit_reaction: params.reaction_override.unwrap_or(definition.default_reaction),
            knockback: push_direction * definition.knockback_strength,
            hit_location: attempt.location,
            hit_normal: attempt.normal,
            hurt_volume: attempt.hurt_volume.map(str::to_string),
            source_volume: Some(volume_name.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn attempt(attacker: Entity, victim: Entity) -> HitAttempt<'static> {
        HitAttempt {
            attacker,
            attacker_attack: 20.0,
            attacker_position: Vec3::ZERO,
            victim,
            victim_position: Vec3::new(0.0, 0.0, 1.0),
            hurt_volume: None,
            location: Vec3::new(0.0, 1.0, 0.9),
            normal: Vec3::NEG_Z,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_inactive_volume_never_hits() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));

        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_none());
    }

    #[test]
    fn test_self_hit_ignored() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let a = Entity::from_raw(1);
        registry.activate_by_names(&names(&["Default"]), &HitBoxActivationParams::default());

        assert!(registry.register_hit("Default", &attempt(a, a), &mut rng).is_none());
    }

    #[test]
    fn test_unknown_name_falls_back_to_default_definition() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));

        registry.activate_by_names(&names(&["Tail"]), &HitBoxActivationParams::default());
        assert!(registry.is_active("Tail"));

        let info = registry.register_hit("Tail", &attempt(a, b), &mut rng).expect("hit");
        assert_eq!(info.damage_value, 20.0);
        assert_eq!(info.source_volume.as_deref(), Some("Tail"));
    }

    #[test]
    fn test_damage_uses_scale_additive_and_multiplier() {
        let mut registry = HitVolumeRegistry::new(vec![HitVolumeDefinition {
            damage_scale: 1.5,
            additive_damage: 5.0,
            knockback_strength: 2.0,
            element: ElementType::Fire,
            ..HitVolumeDefinition::named("Claw")
        }]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));
        let params = HitBoxActivationParams {
            multiplier: 2.0,
            reaction_override: Some(HitReaction::KnockDown),
            ..Default::default()
        };

        registry.activate_by_names(&names(&["Claw"]), &params);
        let info = registry.register_hit("Claw", &attempt(a, b), &mut rng).expect("hit");

        // (20 * 1.5 + 5) * 2 = 70
        assert_eq!(info.damage_value, 70.0);
        assert_eq!(info.raw_damage_value, 70.0);
        assert_eq!(info.element, ElementType::Fire);
        assert_eq!(info.hit_reaction, HitReaction::KnockDown);
        assert_eq!(info.knockback, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(info.instigator, Some(a));
        assert_eq!(info.target, Some(b));
    }

    #[test]
    fn test_base_damage_override() {
        let mut registry = HitVolumeRegistry::new(vec![HitVolumeDefinition {
            base_damage_override: Some(12.0),
            ..HitVolumeDefinition::named("Trap")
        }]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        registry.activate_by_names(&names(&["Trap"]), &HitBoxActivationParams::default());

        let info = registry
            .register_hit("Trap", &attempt(Entity::from_raw(1), Entity::from_raw(2)), &mut rng)
            .expect("hit");
        assert_eq!(info.damage_value, 12.0);
    }

    #[test]
    fn test_per_window_dedup_and_reset() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));
        let params = HitBoxActivationParams::default();

        registry.activate_by_names(&names(&["Default"]), &params);
        let landed = (0..10)
            .filter(|_| registry.register_hit("Default", &attempt(a, b), &mut rng).is_some())
            .count();
        assert_eq!(landed, 1);

        registry.activate_by_names(&names(&["Default"]), &params);
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_none());
    }

    #[test]
    fn test_reactivation_without_reset_keeps_records() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));

        registry.activate_by_names(&names(&["Default"]), &HitBoxActivationParams::default());
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());

        let keep = HitBoxActivationParams {
            reset_hit_records: false,
            ..Default::default()
        };
        registry.activate_by_names(&names(&["Default"]), &keep);
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_none());
    }

    #[test]
    fn test_per_attack_shares_count_across_volumes() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));
        let params = HitBoxActivationParams {
            dedup: DedupPolicy::PerAttack,
            ..Default::default()
        };

        registry.activate_by_names(&names(&["LeftHand", "RightHand"]), &params);
        assert!(registry.register_hit("LeftHand", &attempt(a, b), &mut rng).is_some());
        assert!(registry.register_hit("RightHand", &attempt(a, b), &mut rng).is_none());
    }

    #[test]
    fn test_per_window_counts_each_volume() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));

        registry.activate_by_names(&names(&["LeftHand", "RightHand"]), &HitBoxActivationParams::default());
        assert!(registry.register_hit("LeftHand", &attempt(a, b), &mut rng).is_some());
        assert!(registry.register_hit("RightHand", &attempt(a, b), &mut rng).is_some());
        assert_eq!(registry.hit_count(b), 2);
    }

    #[test]
    fn test_no_dedup_policy() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));
        let params = HitBoxActivationParams {
            dedup: DedupPolicy::None,
            ..Default::default()
        };

        registry.activate_by_names(&names(&["Default"]), &params);
        for _ in 0..5 {
            assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());
        }
    }

    fn window(id: u64, params: HitBoxActivationParams) -> HitWindow {
        HitWindow {
            id,
            volumes: names(&["Default"]),
            params,
        }
    }

    #[test]
    fn test_reopening_same_window_keeps_records() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));
        let first = window(1, HitBoxActivationParams::default());

        registry.open_window(&first);
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());

        // Timer уже открыл окно, notify с тем же id приходит следом
        registry.open_window(&first);
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_none());
        assert_eq!(registry.hit_count(b), 1);

        // Следующая атака: новый id, записи сбрасываются
        registry.deactivate_all();
        registry.open_window(&window(2, HitBoxActivationParams::default()));
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());
    }

    #[test]
    fn test_per_attack_records_span_windows() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));
        let params = HitBoxActivationParams {
            dedup: DedupPolicy::PerAttack,
            ..Default::default()
        };

        let first = window(1, params.clone());
        registry.open_window(&first);
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());
        registry.close_window(&first);

        // Второе окно той же атаки: reset_hit_records игнорируется
        registry.open_window(&window(2, params.clone()));
        assert!(registry.is_active("Default"));
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_none());

        registry.deactivate_all();
        registry.open_window(&window(3, params));
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());
    }

    #[test]
    fn test_per_window_resets_between_windows() {
        let mut registry = HitVolumeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, b) = (Entity::from_raw(1), Entity::from_raw(2));

        registry.open_window(&window(1, HitBoxActivationParams::default()));
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());
        registry.open_window(&window(2, HitBoxActivationParams::default()));
        assert!(registry.register_hit("Default", &attempt(a, b), &mut rng).is_some());
    }

    #[test]
    fn test_deactivate_all_disarms() {
        let mut registry = HitVolumeRegistry::default();
        registry.activate_by_names(&names(&["A", "B"]), &HitBoxActivationParams::default());
        assert_eq!(registry.active_names(), vec!["A", "B"]);

        registry.deactivate_by_names(&names(&["A"]));
        assert_eq!(registry.active_names(), vec!["B"]);

        registry.deactivate_all();
        assert!(!registry.any_active());
        assert!(registry.has_volume("A"));
    }

    #[test]
    fn test_guaranteed_crit() {
        let mut registry = HitVolumeRegistry::new(vec![HitVolumeDefinition {
            crit_chance: 1.0,
            crit_multiplier: 2.0,
            ..HitVolumeDefinition::named("Dagger")
        }]);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        registry.activate_by_names(&names(&["Dagger"]), &HitBoxActivationParams::default());

        let info = registry
            .register_hit("Dagger", &attempt(Entity::from_raw(1), Entity::from_raw(2)), &mut rng)
            .expect("hit");
        assert!(info.is_critical);
        assert_eq!(info.damage_value, 40.0);
    }
}
