use crate::components::flatten;
use crate::fsm::{state_names, ActorContext, CharacterState};
use crate::states::dispatch_buffered_action;

/// Move: `move_speed * dt` along the (clamped) input, probed against the floor.
#[derive(Debug, Default)]
pub struct MoveState;

impl CharacterState for MoveState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        ctx.combat.unlock();
    }

    fn on_update(&mut self, ctx: &mut ActorContext, dt: f32) {
        if let Some(next) = dispatch_buffered_action(ctx) {
            ctx.request_transition(next);
            return;
        }

        if ctx.motor.jump_requested && !ctx.motor.airborne && ctx.motor.movement_enabled {
            ctx.request_transition(state_names::JUMP);
            return;
        }

        if !ctx.motor.movement_enabled || !ctx.motor.has_move_input() {
            ctx.request_transition(state_names::IDLE);
            return;
        }

        let input = flatten(ctx.motor.move_input).clamp_length_max(1.0);
        ctx.motor.face(input);
        let step = input * ctx.stats.move_speed * dt;
        ctx.try_step(step);
    }

    fn can_transition_to(&self, _next: &str) -> bool {
        true
    }
}
