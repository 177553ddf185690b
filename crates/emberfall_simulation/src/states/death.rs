use crate::animation::ClipRequest;
use crate::fsm::{ActorContext, CharacterState};
use crate::states::end_attack;

/// Death: terminal. Movement / collision off, every volume disarmed.
#[derive(Debug)]
pub struct DeathState {
    clip: String,
}

impl Default for DeathState {
    fn default() -> Self {
        Self::new("Death")
    }
}

impl DeathState {
    pub fn new(clip: impl Into<String>) -> Self {
        Self { clip: clip.into() }
    }
}

impl CharacterState for DeathState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        ctx.combat.lock();
        ctx.combat.clear_actions();
        end_attack(ctx);

        ctx.motor.stop();
        ctx.motor.movement_enabled = false;
        ctx.motor.collision_enabled = false;
        ctx.set_hurt_enabled(false);

        ctx.play_clip(ClipRequest::new(self.clip.clone()));
        crate::logger::log_info(&format!("💀 {} died", ctx.name));
    }

    fn can_transition_to(&self, _next: &str) -> bool {
        false
    }
}
