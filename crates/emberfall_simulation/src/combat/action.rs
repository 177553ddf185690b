//! Combat: action gating, input buffer, cooldowns, hit-window context.
//!
//! Один компонент на персонажа. Owning character'а state logic читает
//! input buffer (FIFO) и пишет lock / published windows; damage pipeline
//! пишет pending state request (Hit / Dodge / PhaseChange / Death), который
//! character driver применяет в начале следующего тика.

use std::collections::VecDeque;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::cooldown::CooldownTable;
use crate::combat::damage::HitReaction;
use crate::combat::hit_volume::{HitBoxActivationParams, HitWindow};
use crate::components::StatBlock;
use crate::fsm::state_names;

/// Max buffered action requests; extra requests are rejected.
pub const INPUT_BUFFER_CAPACITY: usize = 4;

/// Cooldown key shared by every dodge.
pub const DODGE_COOLDOWN_KEY: &str = "dodge";

/// Cooldown key for evade-on-hit rolls.
pub const EVADE_COOLDOWN_KEY: &str = "evade";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    NormalAttack,
    /// Skill by id (lookup в skill table игрока)
    Skill(String),
    Dodge,
}

/// Interruptibility of the attack that is currently playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterruptProfile {
    pub interruptible: bool,
    pub chance: f32,
    pub chance_on_heavy: f32,
}

/// State change requested by the damage pipeline.
///
/// Порядок вариантов = приоритет (Death перебивает всё).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StateRequest {
    Hit,
    Dodge,
    PhaseChange,
    Death,
}

impl StateRequest {
    pub fn state_name(self) -> &'static str {
        match self {
            StateRequest::Hit => state_names::HIT,
            StateRequest::Dodge => state_names::DODGE,
            StateRequest::PhaseChange => state_names::PHASE_CHANGE,
            StateRequest::Death => state_names::DEATH,
        }
    }
}

/// Dodge tuning (player roll / enemy evade share it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DodgeConfig {
    pub distance: f32,
    pub duration: f32,
    pub stamina_cost: f32,
    pub cooldown: f32,
    pub clip: String,
}

impl Default for DodgeConfig {
    fn default() -> Self {
        Self {
            distance: 4.0,
            duration: 0.5,
            stamina_cost: 25.0,
            cooldown: 0.8,
            clip: "Dodge".to_string(),
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Combat {
    pub action_locked: bool,
    /// Combo carve-out: NormalAttack принимается даже при lock
    pub buffer_while_locked: bool,
    action_queue: VecDeque<ActionKind>,
    cooldowns: CooldownTable,
    /// Windows armed by the playing attack state (animation notify lookup)
    windows: Vec<HitWindow>,
    next_window_id: u64,
    /// Актор в attack state (interrupt check применяется)
    pub attacking: bool,
    pub active_attack: Option<InterruptProfile>,
    pub target: Option<Entity>,
    pub last_instigator: Option<Entity>,
    pub last_reaction: HitReaction,
    pub last_knockback: Vec3,
    pub dodge: DodgeConfig,
    requested_state: Option<StateRequest>,
}

impl Default for Combat {
    fn default() -> Self {
        Self {
            action_locked: false,
            buffer_while_locked: true,
            action_queue: VecDeque::with_capacity(INPUT_BUFFER_CAPACITY),
            cooldowns: CooldownTable::default(),
            windows: Vec::new(),
            next_window_id: 1,
            attacking: false,
            active_attack: None,
            target: None,
            last_instigator: None,
            last_reaction: HitReaction::None,
            last_knockback: Vec3::ZERO,
            dodge: DodgeConfig::default(),
            requested_state: None,
        }
    }
}

impl Combat {
    pub fn with_dodge(dodge: DodgeConfig) -> Self {
        Self {
            dodge,
            ..Default::default()
        }
    }

    pub fn lock(&mut self) {
        self.action_locked = true;
    }

    pub fn unlock(&mut self) {
        self.action_locked = false;
    }

    pub fn can_perform_action(&self, action: &ActionKind) -> bool {
        if !self.action_locked {
            return true;
        }
        self.buffer_while_locked && *action == ActionKind::NormalAttack
    }

    /// Queue an action for the owning character; false = silently dropped.
    pub fn request_action(&mut self, action: ActionKind) -> bool {
        if !self.can_perform_action(&action) {
            return false;
        }
        if self.action_queue.len() >= INPUT_BUFFER_CAPACITY {
            return false;
        }
        self.action_queue.push_back(action);
        true
    }

    pub fn peek_action(&self) -> Option<&ActionKind> {
        self.action_queue.front()
    }

    pub fn pop_action(&mut self) -> Option<ActionKind> {
        self.action_queue.pop_front()
    }

    pub fn pending_actions(&self) -> usize {
        self.action_queue.len()
    }

    pub fn is_queued(&self, action: &ActionKind) -> bool {
        self.action_queue.contains(action)
    }

    /// Drop everything buffered ahead of the first `action`; false if it is not queued.
    pub fn skip_to_action(&mut self, action: &ActionKind) -> bool {
        let Some(index) = self.action_queue.iter().position(|queued| queued == action) else {
            return false;
        };
        self.action_queue.drain(..index);
        true
    }

    /// Remove the first `action` only, keeping the rest in order.
    pub fn remove_action(&mut self, action: &ActionKind) -> bool {
        let Some(index) = self.action_queue.iter().position(|queued| queued == action) else {
            return false;
        };
        self.action_queue.remove(index);
        true
    }

    pub fn clear_actions(&mut self) {
        self.action_queue.clear();
    }

    // === Cooldowns ===

    pub fn is_cooldown_ready(&self, key: &str, now: f64) -> bool {
        self.cooldowns.is_ready(key, now)
    }

    pub fn commit_cooldown(&mut self, key: &str, seconds: f32, now: f64) {
        self.cooldowns.commit(key, seconds as f64, now);
    }

    pub fn try_commit_cooldown(&mut self, key: &str, seconds: f32, now: f64) -> bool {
        self.cooldowns.try_commit(key, seconds as f64, now)
    }

    pub fn cooldown_remaining(&self, key: &str, now: f64) -> f64 {
        self.cooldowns.remaining(key, now)
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    /// Dodge gate: cooldown ready и хватает stamina (без списания).
    pub fn can_dodge(&self, stats: &StatBlock, now: f64) -> bool {
        self.is_cooldown_ready(DODGE_COOLDOWN_KEY, now) && stats.can_afford_stamina(self.dodge.stamina_cost)
    }

    // === Hit-window context ===

    /// Allocate a window id and publish the window for notify lookup.
    pub fn publish_window(&mut self, volumes: Vec<String>, params: HitBoxActivationParams) -> HitWindow {
        let window = HitWindow {
            id: self.next_window_id,
            volumes,
            params,
        };
        self.next_window_id += 1;
        self.windows.push(window.clone());
        window
    }

    pub fn published_window(&self, id: u64) -> Option<&HitWindow> {
        self.windows.iter().find(|window| window.id == id)
    }

    pub fn published_windows(&self) -> &[HitWindow] {
        &self.windows
    }

    pub fn clear_windows(&mut self) {
        self.windows.clear();
    }

    /// Attack context teardown (state exit).
    pub fn end_attack(&mut self) {
        self.attacking = false;
        self.active_attack = None;
        self.windows.clear();
    }

    // === Pending state request ===

    /// Keeps the highest-priority request until the driver takes it.
    pub fn request_state(&mut self, request: StateRequest) {
        self.requested_state = Some(match self.requested_state {
            Some(existing) => existing.max(request),
            None => request,
        });
    }

    pub fn requested_state(&self) -> Option<StateRequest> {
        self.requested_state
    }

    pub fn take_state_request(&mut self) -> Option<StateRequest> {
        self.requested_state.take()
    }
}
