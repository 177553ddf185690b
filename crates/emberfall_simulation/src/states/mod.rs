//! Character states (player + shared).
//!
//! Enemy-only states (Chase, enemy Attack, boss PhaseChange) живут в `ai`.

pub mod attack;
pub mod death;
pub mod dodge;
pub mod hit;
pub mod idle;
pub mod jump;
pub mod movement;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod attack_tests;

pub use attack::{AttackPhase, AttackState};
pub use death::DeathState;
pub use dodge::DodgeState;
pub use hit::HitState;
pub use idle::IdleState;
pub use jump::{JumpConfig, JumpState};
pub use movement::MoveState;

use crate::ai::AttackSpec;
use crate::combat::ActionKind;
use crate::fsm::{state_names, ActorContext, TimerEvent};

/// Idle / Move dispatch of the front buffered action.
///
/// Attack state consumes attack / skill requests itself; Dodge state consumes
/// the dodge. A dodge that cannot be afforded right now is dropped here.
pub(crate) fn dispatch_buffered_action(ctx: &mut ActorContext) -> Option<&'static str> {
    let is_dodge = match ctx.combat.peek_action()? {
        ActionKind::NormalAttack | ActionKind::Skill(_) => false,
        ActionKind::Dodge => true,
    };

    if !is_dodge {
        return Some(state_names::ATTACK);
    }

    if ctx.combat.can_dodge(ctx.stats, ctx.now) {
        Some(state_names::DODGE)
    } else {
        ctx.combat.pop_action();
        crate::logger::log(&format!("{}: dodge rejected (cooldown / stamina)", ctx.name));
        None
    }
}

/// Publish the attack's hit windows and arm open / close continuations.
pub(crate) fn arm_hit_windows(ctx: &mut ActorContext, spec: &AttackSpec, duration: f32) {
    for (start, end) in spec.windows(duration) {
        let window = ctx
            .combat
            .publish_window(spec.hit_volumes.clone(), spec.activation.clone());
        let id = window.id;
        ctx.schedule(start, TimerEvent::OpenHitWindow(window));
        ctx.schedule(end, TimerEvent::CloseHitWindow(id));
    }
}

/// Handles window continuations; false for every other event.
pub(crate) fn handle_window_timer(ctx: &mut ActorContext, event: &TimerEvent) -> bool {
    match event {
        TimerEvent::OpenHitWindow(window) => {
            ctx.hit_volumes.open_window(window);
            true
        }
        TimerEvent::CloseHitWindow(id) => {
            if let Some(window) = ctx.combat.published_window(*id) {
                ctx.hit_volumes.close_window(window);
            }
            true
        }
        _ => false,
    }
}

/// Mark the character as attacking with `spec`'s interrupt profile.
pub(crate) fn begin_attack(ctx: &mut ActorContext, spec: &AttackSpec) {
    ctx.combat.attacking = true;
    ctx.combat.active_attack = Some(spec.interrupt_profile());
}

/// Disarm every volume and drop the published attack context.
pub(crate) fn end_attack(ctx: &mut ActorContext) {
    ctx.hit_volumes.deactivate_all();
    ctx.combat.end_attack();
}
