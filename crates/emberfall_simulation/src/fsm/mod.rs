//! Character state machine.
//!
//! # Architecture
//!
//! - `CharacterState`: trait object per declared state (Idle, Move, Attack…)
//! - `StateMachine`: arena `Vec<Box<dyn CharacterState>>` + name index,
//!   машина держит `StateId`, не указатель
//! - `StateTimers`: явный список (deadline, continuation) вместо engine timers
//! - `ActorContext`: компоненты entity + world snapshot на время callback'а
//!
//! Guards живут в source state (`can_transition_to`), не в глобальной
//! таблице переходов. Так Attack может принять Hit/Death, а Dodge только Death.

pub mod context;
pub mod driver;
pub mod machine;
pub mod timers;

pub use context::{ActorContext, ActorView, WorldView};
pub use driver::{drive_character, drive_characters, CharacterQuery};
pub use machine::StateMachine;
pub use timers::{StateTimers, TimerEvent};

/// Index into a machine's state arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub usize);

/// Canonical state names.
pub mod state_names {
    pub const IDLE: &str = "Idle";
    pub const MOVE: &str = "Move";
    pub const JUMP: &str = "Jump";
    pub const ATTACK: &str = "Attack";
    pub const DODGE: &str = "Dodge";
    pub const HIT: &str = "Hit";
    pub const DEATH: &str = "Death";
    pub const CHASE: &str = "Chase";
    pub const PHASE_CHANGE: &str = "PhaseChange";
}

/// One state of one character.
///
/// Каждый callback получает `ActorContext`; transitions запрашиваются через
/// `ctx.request_transition` и применяются машиной после возврата.
pub trait CharacterState: Send + Sync {
    fn on_enter(&mut self, _ctx: &mut ActorContext) {}

    fn on_update(&mut self, _ctx: &mut ActorContext, _dt: f32) {}

    /// Must leave nothing armed (volumes, locks). Timers are cleared by the machine.
    fn on_exit(&mut self, _ctx: &mut ActorContext) {}

    fn on_timer(&mut self, _ctx: &mut ActorContext, _event: TimerEvent) {}

    fn can_transition_to(&self, next: &str) -> bool;
}
