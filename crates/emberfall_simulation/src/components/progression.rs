//! Progression (level / XP / currency / items) и LootDrop.
//!
//! Persistence boundary: getters/setters + `ProgressionSnapshot` для внешнего
//! save system. Своего file format у симуляции нет.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// XP за уровень: level * XP_PER_LEVEL до следующего.
pub const XP_PER_LEVEL: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: String,
    pub count: u32,
}

/// What an actor drops for its killer.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootDrop {
    pub xp: u32,
    pub currency: u64,
    pub items: Vec<ItemStack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    pub level: u32,
    pub xp: u32,
    pub currency: u64,
    pub items: Vec<ItemStack>,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Progression {
    level: u32,
    xp: u32,
    currency: u64,
    items: Vec<ItemStack>,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            currency: 0,
            items: Vec::new(),
        }
    }
}

impl Progression {
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    pub fn currency(&self) -> u64 {
        self.currency
    }

    pub fn items(&self) -> &[ItemStack] {
        &self.items
    }

    pub fn set_level(&mut self, level: u32) {
        self.level = level.max(1);
    }

    pub fn set_xp(&mut self, xp: u32) {
        self.xp = xp;
    }

    pub fn set_currency(&mut self, currency: u64) {
        self.currency = currency;
    }

    pub fn xp_to_next_level(&self) -> u32 {
        self.level * XP_PER_LEVEL
    }

    /// Adds XP, returns how many levels were gained.
    pub fn grant_xp(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= self.xp_to_next_level() {
            self.xp -= self.xp_to_next_level();
            self.level += 1;
            gained += 1;
        }
        gained
    }

    pub fn add_item(&mut self, item_id: &str, count: u32) {
        if count == 0 {
            return;
        }
        match self.items.iter_mut().find(|stack| stack.item_id == item_id) {
            Some(stack) => stack.count = stack.count.saturating_add(count),
            None => self.items.push(ItemStack {
                item_id: item_id.to_string(),
                count,
            }),
        }
    }

    /// Grant a whole loot drop; returns levels gained.
    pub fn grant_loot(&mut self, loot: &LootDrop) -> u32 {
        self.currency = self.currency.saturating_add(loot.currency);
        for stack in &loot.items {
            self.add_item(&stack.item_id, stack.count);
        }
        self.grant_xp(loot.xp)
    }

    pub fn snapshot(&self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            level: self.level,
            xp: self.xp,
            currency: self.currency,
            items: self.items.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: &ProgressionSnapshot) {
        self.level = snapshot.level.max(1);
        self.xp = snapshot.xp;
        self.currency = snapshot.currency;
        self.items = snapshot.items.clone();
    }
}
