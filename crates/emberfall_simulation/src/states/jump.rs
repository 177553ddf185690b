use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animation::ClipRequest;
use crate::components::flatten;
use crate::fsm::{state_names, ActorContext, CharacterState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub jump_speed: f32,
    pub gravity: f32,
    /// Fraction of move_speed available in the air
    pub air_control: f32,
    pub clip: String,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            jump_speed: 6.0,
            gravity: 18.0,
            air_control: 0.6,
            clip: "Jump".to_string(),
        }
    }
}

/// Jump: ballistic arc, lands back into Move / Idle.
///
/// Re-entry while already airborne (после Hit в воздухе) продолжает падение
/// без нового импульса.
#[derive(Debug, Default)]
pub struct JumpState {
    config: JumpConfig,
    landed: bool,
}

impl JumpState {
    pub fn new(config: JumpConfig) -> Self {
        Self { config, landed: false }
    }
}

impl CharacterState for JumpState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        self.landed = false;
        ctx.motor.jump_requested = false;

        if !ctx.motor.airborne {
            ctx.motor.airborne = true;
            ctx.motor.ground_height = ctx.transform.translation.y;
            ctx.motor.vertical_velocity = self.config.jump_speed;
            ctx.play_clip(ClipRequest::new(self.config.clip.clone()));
        }
    }

    fn on_update(&mut self, ctx: &mut ActorContext, dt: f32) {
        if self.landed {
            return;
        }

        ctx.motor.vertical_velocity -= self.config.gravity * dt;
        ctx.transform.translation.y += ctx.motor.vertical_velocity * dt;

        if ctx.motor.movement_enabled && ctx.motor.has_move_input() {
            let input = flatten(ctx.motor.move_input).clamp_length_max(1.0);
            ctx.motor.face(input);
            let step = input * ctx.stats.move_speed * self.config.air_control * dt;
            ctx.try_step(Vec3::new(step.x, 0.0, step.z));
        }

        if ctx.transform.translation.y <= ctx.motor.ground_height && ctx.motor.vertical_velocity <= 0.0 {
            ctx.transform.translation.y = ctx.motor.ground_height;
            ctx.motor.vertical_velocity = 0.0;
            ctx.motor.airborne = false;
            self.landed = true;

            let next = if ctx.motor.has_move_input() {
                state_names::MOVE
            } else {
                state_names::IDLE
            };
            ctx.request_transition(next);
        }
    }

    fn can_transition_to(&self, next: &str) -> bool {
        match next {
            state_names::DEATH | state_names::HIT => true,
            _ => self.landed,
        }
    }
}
