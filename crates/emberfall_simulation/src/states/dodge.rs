use bevy::prelude::*;

use crate::animation::ClipRequest;
use crate::combat::{ActionKind, DODGE_COOLDOWN_KEY};
use crate::components::flatten;
use crate::fsm::{state_names, ActorContext, CharacterState, TimerEvent};

/// Minimal dodge duration (avoids division by zero in speed).
const MIN_DODGE_DURATION: f32 = 0.05;

/// Dodge: i-frames + locked-direction dash.
///
/// Направление фиксируется на входе: от последнего instigator'а, иначе от
/// цели, иначе назад. Прерывает только Death.
#[derive(Debug, Default)]
pub struct DodgeState {
    direction: Vec3,
    speed: f32,
    duration: f32,
    elapsed: f32,
    finished: bool,
}

impl DodgeState {
    fn resolve_direction(ctx: &ActorContext) -> Vec3 {
        let position = ctx.position();
        let away_from = |point: Vec3| flatten(position - point).normalize_or_zero();

        let from_instigator = ctx
            .combat
            .last_instigator
            .and_then(|instigator| ctx.world.position_of(instigator))
            .map(away_from);
        let from_target = ctx.target_position().map(away_from);

        from_instigator
            .filter(|direction| *direction != Vec3::ZERO)
            .or(from_target.filter(|direction| *direction != Vec3::ZERO))
            .unwrap_or(-ctx.motor.facing)
    }

    fn abort(&mut self, ctx: &mut ActorContext) {
        self.finished = true;
        ctx.request_transition(ctx.resume_state());
    }
}

impl CharacterState for DodgeState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        self.finished = false;
        self.elapsed = 0.0;

        let config = ctx.combat.dodge.clone();

        // Player roll платит stamina + cooldown; evade-on-hit уже оплачен pipeline'ом
        if ctx.combat.peek_action() == Some(&ActionKind::Dodge) {
            ctx.combat.pop_action();
            if !ctx.combat.can_dodge(ctx.stats, ctx.now) {
                self.abort(ctx);
                return;
            }
            ctx.stats.try_consume_stamina(config.stamina_cost);
            ctx.combat.commit_cooldown(DODGE_COOLDOWN_KEY, config.cooldown, ctx.now);
        }

        ctx.combat.lock();
        ctx.motor.following_path = false;
        ctx.set_hurt_enabled(false);

        self.direction = Self::resolve_direction(ctx);
        self.duration = config.duration.max(MIN_DODGE_DURATION);
        self.speed = config.distance / self.duration;

        ctx.play_clip(ClipRequest::new(config.clip).with_max_play(self.duration));
        ctx.schedule(self.duration, TimerEvent::ActionFinished);
    }

    fn on_update(&mut self, ctx: &mut ActorContext, dt: f32) {
        if self.finished {
            return;
        }

        let step_time = dt.min(self.duration - self.elapsed).max(0.0);
        self.elapsed += dt;
        // Уступ / стена: шаг отменяется, dodge продолжается на месте
        ctx.try_step(self.direction * self.speed * step_time);
    }

    fn on_timer(&mut self, ctx: &mut ActorContext, event: TimerEvent) {
        if event != TimerEvent::ActionFinished {
            return;
        }
        self.finished = true;
        ctx.set_hurt_enabled(true);
        ctx.combat.unlock();
        ctx.request_transition(ctx.resume_state());
    }

    fn on_exit(&mut self, ctx: &mut ActorContext) {
        ctx.set_hurt_enabled(true);
        ctx.combat.unlock();
    }

    fn can_transition_to(&self, next: &str) -> bool {
        next == state_names::DEATH || self.finished
    }
}
