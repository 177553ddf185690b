//! DamageInfo: единица боевой коммуникации.
//!
//! Жизненный цикл одной попытки удара:
//! 1. `HitVolumeRegistry` строит DamageInfo из определения hit volume
//! 2. `HurtVolume` жертвы модифицирует урон (multiplier, weakness/resistance)
//! 3. `StatBlock::apply_damage` применяет mitigation и пишет фактический урон
//! 4. Логика состояний читает заполненный DamageInfo (Hit / Death / Dodge)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Тип урона. `TrueDamage` игнорирует defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Melee,
    Ranged,
    Magic,
    Dot,
    TrueDamage,
}

/// Стихия урона (для weakness/resistance на hurt volumes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElementType {
    #[default]
    Physical,
    Fire,
    Ice,
    Lightning,
    Poison,
}

/// Suggested hit reaction for the victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HitReaction {
    #[default]
    None,
    Light,
    Heavy,
    KnockDown,
    Airborne,
    Dead,
}

impl HitReaction {
    /// Heavy-class reactions use `interrupt_chance_on_heavy`.
    pub fn is_heavy(self) -> bool {
        matches!(self, HitReaction::Heavy | HitReaction::KnockDown | HitReaction::Airborne)
    }
}

/// Transient record for one hit attempt.
///
/// `damage_value` мутирует по ходу пайплайна; после `apply_damage` в нём
/// лежит фактически вычтенный HP. Читать надо post-call значение.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageInfo {
    pub instigator: Option<Entity>,
    pub target: Option<Entity>,
    pub damage_value: f32,
    pub raw_damage_value: f32,
    pub damage_type: DamageType,
    pub element: ElementType,
    pub is_critical: bool,
    pub hit_reaction: HitReaction,
    pub knockback: Vec3,
    pub hit_location: Vec3,
    pub hit_normal: Vec3,
    /// Bodypart hurt volume that was struck (None = любой/первый)
    pub hurt_volume: Option<String>,
    /// Attacker hit volume that produced the hit
    pub source_volume: Option<String>,
}

impl Default for DamageInfo {
    fn default() -> Self {
        Self {
            instigator: None,
            target: None,
            damage_value: 0.0,
            raw_damage_value: 0.0,
            damage_type: DamageType::Melee,
            element: ElementType::Physical,
            is_critical: false,
            hit_reaction: HitReaction::None,
            knockback: Vec3::ZERO,
            hit_location: Vec3::ZERO,
            hit_normal: Vec3::Z,
            hurt_volume: None,
            source_volume: None,
        }
    }
}

impl DamageInfo {
    /// Simple damage record (scripted damage, DOT ticks, tests).
    pub fn new(instigator: Option<Entity>, target: Option<Entity>, value: f32, damage_type: DamageType) -> Self {
        Self {
            instigator,
            target,
            damage_value: value,
            raw_damage_value: value,
            damage_type,
            ..Default::default()
        }
    }
}

/// Defense mitigation curve: `raw * (1 - defense / (100 + defense))`.
///
/// Без clamp сверху: defense → ∞ асимптотически приближается к 100%.
/// Отрицательный defense трактуется как 0 (иначе деление на ноль при -100).
pub fn mitigate(raw: f32, defense: f32) -> f32 {
    let defense = defense.max(0.0);
    raw * (1.0 - defense / (100.0 + defense))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mitigation_zero_defense() {
        assert_eq!(mitigate(40.0, 0.0), 40.0);
    }

    #[test]
    fn test_mitigation_hundred_defense_is_half() {
        assert!((mitigate(40.0, 100.0) - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_mitigation_never_reaches_full() {
        let mitigated = mitigate(100.0, 100_000.0);
        assert!(mitigated > 0.0);
        assert!(mitigated < 0.2);
    }

    #[test]
    fn test_heavy_reactions() {
        assert!(HitReaction::Heavy.is_heavy());
        assert!(HitReaction::KnockDown.is_heavy());
        assert!(!HitReaction::Light.is_heavy());
        assert!(!HitReaction::None.is_heavy());
    }
}
