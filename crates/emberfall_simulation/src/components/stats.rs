//! StatBlock: HP / MP / stamina / attack / defense персонажа.
//!
//! Инвариант: 0 ≤ hp ≤ max_hp (то же для mp, stamina) в любой точке наблюдения.
//! HP меняется только через `apply_damage` и явные setters (level-up, revive,
//! phase swap). Смерть производная (`hp <= 0`), но death notice уходит ровно
//! один раз за жизнь благодаря `death_broadcast`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::damage::{mitigate, DamageInfo, DamageType};

/// One-shot death notice (killer handle), drained by the damage pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathNotice {
    pub killer: Option<Entity>,
}

/// Authored base stats (archetype / player config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlockConfig {
    pub max_hp: f32,
    pub max_mp: f32,
    pub max_stamina: f32,
    pub attack: f32,
    pub defense: f32,
    pub move_speed: f32,
    pub stamina_regen: f32,
}

impl Default for StatBlockConfig {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            max_mp: 50.0,
            max_stamina: 100.0,
            attack: 10.0,
            defense: 0.0,
            move_speed: 4.0,
            stamina_regen: 20.0,
        }
    }
}

/// Per-level growth applied on spawn and on level-up.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatCurve {
    pub hp_per_level: f32,
    pub attack_per_level: f32,
    pub defense_per_level: f32,
}

/// Persisted subset of a StatBlock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub hp: f32,
    pub mp: f32,
    pub stamina: f32,
}

#[derive(Component, Debug, Clone)]
pub struct StatBlock {
    max_hp: f32,
    hp: f32,
    max_mp: f32,
    mp: f32,
    max_stamina: f32,
    stamina: f32,
    pub attack: f32,
    pub defense: f32,
    pub move_speed: f32,
    /// units per second
    pub stamina_regen: f32,
    /// Buff flag: все входящие удары обнуляются
    pub invulnerable: bool,
    /// HP не опускается ниже (boss phase 1 держит 1 HP до phase change)
    hp_floor: f32,
    death_broadcast: bool,
    pending_death: Option<DeathNotice>,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::from_config(&StatBlockConfig::default())
    }
}

impl StatBlock {
    pub fn from_config(config: &StatBlockConfig) -> Self {
        let max_hp = config.max_hp.max(1.0);
        let max_mp = config.max_mp.max(0.0);
        let max_stamina = config.max_stamina.max(0.0);
        Self {
            max_hp,
            hp: max_hp,
            max_mp,
            mp: max_mp,
            max_stamina,
            stamina: max_stamina,
            attack: config.attack,
            defense: config.defense,
            move_speed: config.move_speed,
            stamina_regen: config.stamina_regen,
            invulnerable: false,
            hp_floor: 0.0,
            death_broadcast: false,
            pending_death: None,
        }
    }

    /// Quick constructor for tests and scripted actors.
    pub fn new(max_hp: f32, attack: f32, defense: f32) -> Self {
        Self::from_config(&StatBlockConfig {
            max_hp,
            attack,
            defense,
            ..Default::default()
        })
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    pub fn mp(&self) -> f32 {
        self.mp
    }

    pub fn max_mp(&self) -> f32 {
        self.max_mp
    }

    pub fn stamina(&self) -> f32 {
        self.stamina
    }

    pub fn max_stamina(&self) -> f32 {
        self.max_stamina
    }

    pub fn hp_fraction(&self) -> f32 {
        self.hp / self.max_hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// The single authoritative damage application point.
    ///
    /// Returns the HP actually subtracted and writes the same value back into
    /// `info.damage_value`.
    pub fn apply_damage(&mut self, info: &mut DamageInfo) -> f32 {
        if self.is_dead() || self.invulnerable {
            info.damage_value = 0.0;
            return 0.0;
        }

        if info.damage_value <= 0.0 {
            info.damage_value = 0.0;
            return 0.0;
        }

        let requested = if info.damage_type == DamageType::TrueDamage {
            info.damage_value
        } else {
            mitigate(info.damage_value, self.defense)
        };

        let floor = self.hp_floor.clamp(0.0, self.max_hp);
        let before = self.hp;
        self.hp = (self.hp - requested).clamp(floor.min(before), self.max_hp);
        let applied = before - self.hp;
        info.damage_value = applied;

        if self.hp <= 0.0 && !self.death_broadcast {
            self.death_broadcast = true;
            self.pending_death = Some(DeathNotice { killer: info.instigator });
        }

        applied
    }

    /// Drain the one-shot death notice (Some ровно один раз за жизнь).
    pub fn take_death_notice(&mut self) -> Option<DeathNotice> {
        self.pending_death.take()
    }

    pub fn can_afford_stamina(&self, cost: f32) -> bool {
        self.stamina >= cost
    }

    pub fn can_afford_mp(&self, cost: f32) -> bool {
        self.mp >= cost
    }

    /// All-or-nothing spend.
    pub fn try_consume_stamina(&mut self, cost: f32) -> bool {
        if cost <= 0.0 {
            return true;
        }
        if !self.can_afford_stamina(cost) {
            return false;
        }
        self.stamina -= cost;
        true
    }

    pub fn try_consume_mp(&mut self, cost: f32) -> bool {
        if cost <= 0.0 {
            return true;
        }
        if !self.can_afford_mp(cost) {
            return false;
        }
        self.mp -= cost;
        true
    }

    pub fn regenerate_stamina(&mut self, delta: f32) {
        if self.is_dead() {
            return;
        }
        self.stamina = (self.stamina + self.stamina_regen * delta).clamp(0.0, self.max_stamina);
    }

    pub fn heal(&mut self, amount: f32) {
        if self.is_dead() || amount <= 0.0 {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Persistence setter; не трогает death guard.
    pub fn set_hp(&mut self, hp: f32) {
        self.hp = hp.clamp(0.0, self.max_hp);
    }

    pub fn set_mp(&mut self, mp: f32) {
        self.mp = mp.clamp(0.0, self.max_mp);
    }

    pub fn set_stamina(&mut self, stamina: f32) {
        self.stamina = stamina.clamp(0.0, self.max_stamina);
    }

    /// Changes max HP; current HP is clamped into the new range.
    pub fn set_max_hp(&mut self, max_hp: f32) {
        self.max_hp = max_hp.max(1.0);
        self.hp = self.hp.clamp(0.0, self.max_hp);
    }

    pub fn set_max_mp(&mut self, max_mp: f32) {
        self.max_mp = max_mp.max(0.0);
        self.mp = self.mp.clamp(0.0, self.max_mp);
    }

    pub fn set_max_stamina(&mut self, max_stamina: f32) {
        self.max_stamina = max_stamina.max(0.0);
        self.stamina = self.stamina.clamp(0.0, self.max_stamina);
    }

    pub fn set_hp_floor(&mut self, floor: f32) {
        self.hp_floor = floor.max(0.0);
    }

    pub fn hp_floor(&self) -> f32 {
        self.hp_floor
    }

    /// Back to life with `hp` (clamped to (0, max]); re-arms the death guard.
    pub fn revive(&mut self, hp: f32) {
        self.hp = hp.clamp(1.0_f32.min(self.max_hp), self.max_hp);
        self.death_broadcast = false;
        self.pending_death = None;
    }

    /// Level-up: grow by `levels` steps of the curve, refill HP to the new max.
    pub fn apply_level_up(&mut self, curve: &StatCurve, levels: u32) {
        if levels == 0 {
            return;
        }
        let steps = levels as f32;
        self.set_max_hp(self.max_hp + curve.hp_per_level * steps);
        self.attack += curve.attack_per_level * steps;
        self.defense += curve.defense_per_level * steps;
        if self.is_alive() {
            self.hp = self.max_hp;
        }
    }

    /// Replace the authored base (boss phase swap). HP refills to the new max.
    pub fn apply_config(&mut self, config: &StatBlockConfig) {
        self.set_max_hp(config.max_hp);
        self.set_max_mp(config.max_mp);
        self.set_max_stamina(config.max_stamina);
        self.attack = config.attack;
        self.defense = config.defense;
        self.move_speed = config.move_speed;
        self.stamina_regen = config.stamina_regen;
        self.hp = self.max_hp;
    }

    pub fn snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            hp: self.hp,
            mp: self.mp,
            stamina: self.stamina,
        }
    }

    pub fn restore(&mut self, snapshot: &StatSnapshot) {
        self.set_hp(snapshot.hp);
        self.set_mp(snapshot.mp);
        self.set_stamina(snapshot.stamina);
        if self.is_alive() {
            self.death_broadcast = false;
        }
    }
}
