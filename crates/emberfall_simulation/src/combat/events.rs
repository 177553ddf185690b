//! Combat events.
//!
//! Input (host → ECS): `VolumeOverlap`, `AnimationNotify`, `ActionRequest`,
//! `DamageRequest`.
//! Output (ECS → host, fire-and-forget): `DamageDealt`, `HitLanded`,
//! `DamageEvaded`, `EntityDied`, `LootGranted`, `AnimationRequested`,
//! `WaveCleared`.

use bevy::prelude::*;

use crate::combat::action::ActionKind;
use crate::combat::damage::DamageInfo;
use crate::components::LootDrop;

/// Host collision layer: attacker's hit volume overlaps victim's hurt volume.
#[derive(Event, Debug, Clone)]
pub struct VolumeOverlap {
    pub attacker: Entity,
    pub volume: String,
    pub victim: Entity,
    /// Struck bodypart (None = любой enabled part)
    pub hurt_volume: Option<String>,
    pub location: Vec3,
    pub normal: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPhase {
    Open,
    Close,
}

/// Animation-embedded notify for a published hit window.
#[derive(Event, Debug, Clone)]
pub struct AnimationNotify {
    pub entity: Entity,
    pub window_id: u64,
    pub phase: NotifyPhase,
}

/// Input layer / AI script: queue an action on a character.
#[derive(Event, Debug, Clone)]
pub struct ActionRequest {
    pub entity: Entity,
    pub action: ActionKind,
}

/// Scripted damage (traps, DOT ticks) routed through the same intake.
#[derive(Event, Debug, Clone)]
pub struct DamageRequest {
    pub info: DamageInfo,
}

/// Every resolved intake, with the post-mitigation DamageInfo.
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub damage: f32,
    pub info: DamageInfo,
}

/// Non-zero applied damage (camera shake / VFX hooks).
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub damage: f32,
    pub is_critical: bool,
    pub location: Vec3,
}

#[derive(Event, Debug, Clone)]
pub struct DamageEvaded {
    pub entity: Entity,
    pub instigator: Option<Entity>,
}

#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

#[derive(Event, Debug, Clone)]
pub struct LootGranted {
    pub recipient: Entity,
    pub source: Entity,
    pub loot: LootDrop,
    pub levels_gained: u32,
}

/// Core → animation collaborator: play this clip.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct AnimationRequested {
    pub entity: Entity,
    pub clip: String,
    pub rate: f32,
    pub start: f32,
    pub reverse: bool,
    /// Effective play duration (0 when the clip is unknown)
    pub duration: f32,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveCleared {
    pub wave: u32,
}
