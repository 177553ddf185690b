//! ECS компоненты персонажей
//!
//! Организация по доменам:
//! - actor: фракция, маркеры Player / Enemy / Dead, DespawnAfter
//! - stats: StatBlock (HP / MP / stamina / attack / defense), StatCurve
//! - motor: locomotion (input, facing, airborne, path following)
//! - progression: level / XP / currency / items, LootDrop

pub mod actor;
pub mod motor;
pub mod progression;
pub mod stats;

// Re-exports для удобного импорта
pub use actor::*;
pub use motor::*;
pub use progression::*;
pub use stats::*;
