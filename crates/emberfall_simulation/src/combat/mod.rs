//! Combat system module
//!
//! ECS ответственность:
//! - Game state: StatBlock, Combat (lock / input buffer / cooldowns), hit & hurt volumes
//! - Combat rules: hit registration, mitigation, death handshake, interrupt / evade
//! - Events: DamageDealt, HitLanded, EntityDied, LootGranted, WaveCleared
//!
//! Host ответственность (через events / traits):
//! - Collision layer: VolumeOverlap (hit volume ∩ hurt volume)
//! - Animation: clip lengths (`AnimationTimeline`), AnimationNotify, playback
//! - Floor probe (`FloorProbe`)

use bevy::prelude::*;

pub mod action;
pub mod cooldown;
pub mod damage;
pub mod events;
pub mod hit_volume;
pub mod hurt_volume;
pub mod pipeline;
pub mod systems;

// Re-export основных типов
pub use action::{
    ActionKind, Combat, DodgeConfig, InterruptProfile, StateRequest, DODGE_COOLDOWN_KEY, EVADE_COOLDOWN_KEY,
    INPUT_BUFFER_CAPACITY,
};
pub use cooldown::CooldownTable;
pub use damage::{mitigate, DamageInfo, DamageType, ElementType, HitReaction};
pub use events::{
    ActionRequest, AnimationNotify, AnimationRequested, DamageDealt, DamageEvaded, DamageRequest, EntityDied,
    HitLanded, LootGranted, NotifyPhase, VolumeOverlap, WaveCleared,
};
pub use hit_volume::{
    DedupPolicy, HitAttempt, HitBoxActivationParams, HitVolumeDefinition, HitVolumeRegistry, HitWindow,
    DEFAULT_VOLUME,
};
pub use hurt_volume::{HurtVolume, HurtVolumeSet};
pub use pipeline::{receive_damage, resolve_overlap, CombatantQuery, DamageIntake, IntakeOutcome};
pub use systems::{counts_as_alive, EncounterTracker};

use crate::animation::{AnimationClips, Floor};
use crate::fsm::drive_characters;
use crate::{DeterministicRng, SimulationConfig};

/// Fixed-step phases, выполняются строго по порядку.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// ActionRequest → input buffer
    Input,
    /// Target acquisition (AIPlugin)
    Perception,
    /// Overlaps + scripted damage → intake
    Damage,
    /// Animation notifies → hit windows
    Notify,
    /// Character driver (state machines + timers)
    Drive,
    /// Stamina regeneration
    Upkeep,
    /// Dead marker, loot, corpse despawn
    Death,
    /// Wave clear
    Encounter,
}

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate.
///
/// Порядок выполнения:
/// 1. route_action_requests: ActionRequest → Combat input buffer
/// 2. (AIPlugin) poll_perception: цель врагов
/// 3. process_overlaps / process_damage_requests: damage pipeline
/// 4. process_animation_notifies: open / close опубликованных окон
/// 5. drive_characters: state requests, timers, `on_update`
/// 6. regenerate_stamina
/// 7. mark_dead / grant_loot / despawn_after_timeout
/// 8. track_encounter: WaveCleared
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<VolumeOverlap>()
            .add_event::<AnimationNotify>()
            .add_event::<ActionRequest>()
            .add_event::<DamageRequest>()
            .add_event::<DamageDealt>()
            .add_event::<HitLanded>()
            .add_event::<DamageEvaded>()
            .add_event::<EntityDied>()
            .add_event::<LootGranted>()
            .add_event::<AnimationRequested>()
            .add_event::<WaveCleared>();

        // Host может заменить до / после добавления plugin'а
        app.init_resource::<SimulationConfig>()
            .init_resource::<DeterministicRng>()
            .init_resource::<AnimationClips>()
            .init_resource::<Floor>()
            .init_resource::<EncounterTracker>();

        app.configure_sets(
            FixedUpdate,
            (
                CombatSet::Input,
                CombatSet::Perception,
                CombatSet::Damage,
                CombatSet::Notify,
                CombatSet::Drive,
                CombatSet::Upkeep,
                CombatSet::Death,
                CombatSet::Encounter,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::route_action_requests.in_set(CombatSet::Input),
                (systems::process_overlaps, systems::process_damage_requests)
                    .chain()
                    .in_set(CombatSet::Damage),
                systems::process_animation_notifies.in_set(CombatSet::Notify),
                drive_characters.in_set(CombatSet::Drive),
                systems::regenerate_stamina.in_set(CombatSet::Upkeep),
                (systems::mark_dead, systems::grant_loot, systems::despawn_after_timeout)
                    .chain()
                    .in_set(CombatSet::Death),
                systems::track_encounter.in_set(CombatSet::Encounter),
            ),
        );
    }
}
