use crate::fsm::{state_names, ActorContext, CharacterState};
use crate::states::dispatch_buffered_action;

/// Idle: dispatch buffered actions, locomotion input, enemy aggro.
#[derive(Debug, Default)]
pub struct IdleState;

impl CharacterState for IdleState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        ctx.combat.unlock();
        ctx.motor.following_path = false;
    }

    fn on_update(&mut self, ctx: &mut ActorContext, _dt: f32) {
        if let Some(next) = dispatch_buffered_action(ctx) {
            ctx.request_transition(next);
            return;
        }

        if ctx.brain.is_some() {
            if ctx.live_target().is_some() {
                ctx.request_transition(state_names::CHASE);
            }
            return;
        }

        if !ctx.motor.movement_enabled {
            return;
        }
        if ctx.motor.jump_requested && !ctx.motor.airborne {
            ctx.request_transition(state_names::JUMP);
        } else if ctx.motor.has_move_input() {
            ctx.request_transition(state_names::MOVE);
        }
    }

    fn can_transition_to(&self, _next: &str) -> bool {
        true
    }
}
