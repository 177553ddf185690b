//! Victim-side hurt volumes (per-bodypart).
//!
//! Модификация урона до глобальной mitigation:
//! bodypart multiplier → weakness (×1.25) / resistance (×0.75) → reaction.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::damage::{DamageInfo, ElementType, HitReaction};

pub const WEAKNESS_FACTOR: f32 = 1.25;
pub const RESISTANCE_FACTOR: f32 = 0.75;

/// Bodypart multiplier при котором реакция считается Heavy.
pub const HEAVY_MULTIPLIER_THRESHOLD: f32 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HurtVolume {
    pub bodypart: String,
    pub extents: [f32; 3],
    pub offset: [f32; 3],
    pub damage_multiplier: f32,
    pub weaknesses: Vec<ElementType>,
    pub resistances: Vec<ElementType>,
    pub enabled: bool,
}

impl Default for HurtVolume {
    fn default() -> Self {
        Self {
            bodypart: "Body".to_string(),
            extents: [0.4, 0.9, 0.3],
            offset: [0.0, 0.9, 0.0],
            damage_multiplier: 1.0,
            weaknesses: Vec::new(),
            resistances: Vec::new(),
            enabled: true,
        }
    }
}

impl HurtVolume {
    pub fn new(bodypart: impl Into<String>, damage_multiplier: f32) -> Self {
        Self {
            bodypart: bodypart.into(),
            damage_multiplier,
            ..Default::default()
        }
    }

    pub fn modify_incoming_damage(&self, info: &mut DamageInfo) {
        info.damage_value *= self.damage_multiplier;

        if self.weaknesses.contains(&info.element) {
            info.damage_value *= WEAKNESS_FACTOR;
        }
        if self.resistances.contains(&info.element) {
            info.damage_value *= RESISTANCE_FACTOR;
        }

        if info.hit_reaction == HitReaction::None {
            info.hit_reaction = if self.damage_multiplier >= HEAVY_MULTIPLIER_THRESHOLD {
                HitReaction::Heavy
            } else {
                HitReaction::Light
            };
        }
    }
}

/// All hurt volumes of one character.
#[derive(Component, Debug, Clone, Default)]
pub struct HurtVolumeSet {
    parts: Vec<HurtVolume>,
}

impl HurtVolumeSet {
    pub fn new(parts: Vec<HurtVolume>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[HurtVolume] {
        &self.parts
    }

    /// Global toggle (dodge i-frames, death).
    pub fn set_hurt_box_enabled(&mut self, enabled: bool) {
        for part in &mut self.parts {
            part.enabled = enabled;
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.parts.iter().any(|part| part.enabled)
    }

    /// Enabled part matching `bodypart` (None = first enabled part).
    pub fn resolve(&self, bodypart: Option<&str>) -> Option<&HurtVolume> {
        match bodypart {
            Some(name) => self.parts.iter().find(|part| part.enabled && part.bodypart == name),
            None => self.parts.iter().find(|part| part.enabled),
        }
    }
}
