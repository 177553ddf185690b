//! Combat systems (FixedUpdate)

pub mod damage;
pub mod death;
pub mod encounter;
pub mod input;
pub mod notify;
pub mod stamina;

#[cfg(test)]
mod encounter_tests;

// Re-export all systems
pub use damage::*;
pub use death::*;
pub use encounter::*;
pub use input::*;
pub use notify::*;
pub use stamina::*;
