//! Базовые компоненты акторов: Actor, маркеры Player / Enemy.

use bevy::prelude::*;

/// Актор (игрок, враг, босс): базовый компонент для живых существ.
#[derive(Component, Debug, Clone, Default)]
pub struct Actor {
    /// Stable ID фракции (враги = другая фракция)
    pub faction_id: u64,
    /// Archetype / display name (логи)
    pub name: String,
}

impl Actor {
    pub fn new(faction_id: u64, name: impl Into<String>) -> Self {
        Self {
            faction_id,
            name: name.into(),
        }
    }

    pub fn is_hostile_to(&self, other: &Actor) -> bool {
        self.faction_id != other.faction_id
    }
}

/// Marker: player-controlled character.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Marker: AI-controlled character (counts for wave clear).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Enemy;

/// Маркер: entity мертв (выставляется после EntityDied).
///
/// Деспавн не автоматический, см. `DespawnAfter`.
#[derive(Component, Debug, Clone, Copy)]
pub struct Dead;

/// Деспавн entity после указанного времени (секунды world clock).
#[derive(Component, Debug, Clone, Copy)]
pub struct DespawnAfter {
    pub despawn_time: f64,
}
