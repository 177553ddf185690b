use crate::ai::selection::{next_attack_time, select_attack};
use crate::components::planar_distance;
use crate::fsm::{state_names, ActorContext, CharacterState, TimerEvent};
use crate::states::{arm_hit_windows, begin_attack, end_attack, handle_window_timer};

/// Enemy Attack: one weighted pick from the brain's table, then back to Chase.
///
/// Hit проходит через gate всегда; прервёт ли он атаку, решает interrupt
/// roll в damage pipeline.
#[derive(Debug, Default)]
pub struct EnemyAttackState {
    finished: bool,
}

impl EnemyAttackState {
    fn bail(&mut self, ctx: &mut ActorContext) {
        self.finished = true;
        ctx.request_transition(ctx.resume_state());
    }
}

impl CharacterState for EnemyAttackState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        self.finished = false;

        let Some(target_position) = ctx.target_position() else {
            self.bail(ctx);
            return;
        };

        let distance = planar_distance(ctx.position(), target_position);
        let now = ctx.now;
        let chosen = ctx.brain.as_deref().and_then(|brain| {
            select_attack(&brain.attacks, distance, &*ctx.combat, now, &mut *ctx.rng)
                .map(|index| brain.attacks[index].clone())
        });

        let Some(spec) = chosen else {
            self.bail(ctx);
            return;
        };

        ctx.combat.lock();
        ctx.motor.stop();
        if spec.snap_to_target {
            ctx.face_towards(target_position);
        }

        begin_attack(ctx, &spec);
        let duration = ctx.play_clip(spec.clip_request());
        arm_hit_windows(ctx, &spec, duration);

        if let Some(brain) = ctx.brain.as_deref_mut() {
            brain.next_attack_time = next_attack_time(now, &brain.pacing, &mut *ctx.rng);
        }
        ctx.combat.commit_cooldown(spec.cooldown_key(), spec.cooldown, now);
        ctx.schedule(duration, TimerEvent::ActionFinished);

        crate::logger::log(&format!("⚔️ {} uses '{}' ({:.2}s)", ctx.name, spec.id, duration));
    }

    fn on_timer(&mut self, ctx: &mut ActorContext, event: TimerEvent) {
        if handle_window_timer(ctx, &event) {
            return;
        }
        if event == TimerEvent::ActionFinished {
            self.finished = true;
            end_attack(ctx);
            ctx.combat.unlock();
            ctx.request_transition(ctx.resume_state());
        }
    }

    fn on_exit(&mut self, ctx: &mut ActorContext) {
        end_attack(ctx);
        ctx.combat.unlock();
    }

    fn can_transition_to(&self, next: &str) -> bool {
        match next {
            state_names::DEATH | state_names::HIT | state_names::DODGE | state_names::PHASE_CHANGE => true,
            _ => self.finished,
        }
    }
}
