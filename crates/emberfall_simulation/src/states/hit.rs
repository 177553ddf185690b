use bevy::prelude::*;

use crate::animation::ClipRequest;
use crate::combat::HitReaction;
use crate::fsm::{state_names, ActorContext, CharacterState, TimerEvent};

/// Reaction clip by severity.
pub fn reaction_clip(reaction: HitReaction) -> &'static str {
    match reaction {
        HitReaction::None | HitReaction::Light => "HitLight",
        HitReaction::Heavy | HitReaction::Dead => "HitHeavy",
        HitReaction::KnockDown => "KnockDown",
        HitReaction::Airborne => "Launched",
    }
}

/// Hit: stagger clip + knockback slide, then back to locomotion.
#[derive(Debug, Default)]
pub struct HitState {
    knockback: Vec3,
    duration: f32,
    elapsed: f32,
    finished: bool,
}

impl CharacterState for HitState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        self.finished = false;
        self.elapsed = 0.0;

        ctx.combat.lock();
        ctx.motor.following_path = false;

        let clip = reaction_clip(ctx.combat.last_reaction);
        self.duration = ctx.play_clip(ClipRequest::new(clip));
        self.knockback = std::mem::take(&mut ctx.combat.last_knockback);

        // Нулевая длительность: весь knockback сразу
        if self.duration <= 0.0 {
            ctx.try_step(std::mem::take(&mut self.knockback));
        }

        ctx.schedule(self.duration, TimerEvent::ActionFinished);
    }

    fn on_update(&mut self, ctx: &mut ActorContext, dt: f32) {
        if self.finished || self.duration <= 0.0 || self.knockback == Vec3::ZERO {
            return;
        }

        let step_time = dt.min(self.duration - self.elapsed).max(0.0);
        self.elapsed += dt;
        ctx.try_step(self.knockback * (step_time / self.duration));
    }

    fn on_timer(&mut self, ctx: &mut ActorContext, event: TimerEvent) {
        if event != TimerEvent::ActionFinished {
            return;
        }
        self.finished = true;
        ctx.combat.unlock();
        ctx.request_transition(ctx.resume_state());
    }

    fn on_exit(&mut self, ctx: &mut ActorContext) {
        ctx.combat.unlock();
    }

    fn can_transition_to(&self, next: &str) -> bool {
        match next {
            state_names::DEATH | state_names::HIT | state_names::PHASE_CHANGE => true,
            _ => self.finished,
        }
    }
}
