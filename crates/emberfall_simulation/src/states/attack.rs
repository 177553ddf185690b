//! Player Attack state: normal-attack combo sequencer + skills.
//!
//! # Combo timeline (one step)
//!
//! ```text
//! 0 ──── hit windows ──── [link open ── link close] ── duration
//!                           ↑ NormalAttack здесь → queued_next
//! StepFinished: queued_next && есть следующий step → next step
//!               иначе → recovery clip → Idle
//! ```
//!
//! Ввод опрашивается раз в тик. NormalAttack вне link window сбрасывается.
//! Во время recovery actions разблокированы: Dodge может отменить recovery.

use crate::ai::{AttackSpec, ComboStep};
use crate::animation::ClipRequest;
use crate::combat::ActionKind;
use crate::fsm::{state_names, ActorContext, CharacterState, TimerEvent};
use crate::states::{arm_hit_windows, begin_attack, end_attack, handle_window_timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttackPhase {
    #[default]
    Starting,
    Combo,
    Recovery,
    Skill,
    Finished,
}

#[derive(Debug, Default)]
pub struct AttackState {
    combo: Vec<ComboStep>,
    skills: Vec<AttackSpec>,
    phase: AttackPhase,
    step: usize,
    link_open: bool,
    queued_next: bool,
}

impl AttackState {
    pub fn new(combo: Vec<ComboStep>, skills: Vec<AttackSpec>) -> Self {
        Self {
            combo,
            skills,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    fn finish(&mut self, ctx: &mut ActorContext) {
        self.phase = AttackPhase::Finished;
        end_attack(ctx);
        ctx.combat.unlock();
        ctx.request_transition(ctx.resume_state());
    }

    /// Plays combo step `index`; false if it could not be paid for.
    fn start_step(&mut self, ctx: &mut ActorContext, index: usize) -> bool {
        let Some(step) = self.combo.get(index).cloned() else {
            return false;
        };
        let spec = &step.attack;

        if !ctx.stats.try_consume_stamina(spec.stamina_cost) {
            crate::logger::log(&format!("{}: not enough stamina for '{}'", ctx.name, spec.id));
            return false;
        }

        self.step = index;
        self.phase = AttackPhase::Combo;
        self.link_open = false;
        self.queued_next = false;

        begin_attack(ctx, spec);
        if spec.snap_to_target {
            if let Some(target) = ctx.target_position() {
                ctx.face_towards(target);
            }
        }

        let duration = ctx.play_clip(spec.clip_request());
        arm_hit_windows(ctx, spec, duration);

        let (open, close) = step.link_window_bounds(duration);
        ctx.schedule(open, TimerEvent::LinkWindowOpen);
        ctx.schedule(close, TimerEvent::LinkWindowClose);
        ctx.schedule(duration, TimerEvent::StepFinished);
        true
    }

    fn start_recovery(&mut self, ctx: &mut ActorContext) {
        self.phase = AttackPhase::Recovery;
        self.link_open = false;
        end_attack(ctx);
        ctx.combat.unlock();

        let clip = self
            .combo
            .get(self.step)
            .map(|step| step.recovery_clip.clone())
            .unwrap_or_default();
        let duration = ctx.play_clip(ClipRequest::new(clip));
        ctx.schedule(duration, TimerEvent::RecoveryFinished);
    }

    fn start_skill(&mut self, ctx: &mut ActorContext, id: &str) {
        let Some(spec) = self.skills.iter().find(|skill| skill.id == id).cloned() else {
            crate::logger::log_warning(&format!("{}: unknown skill '{}'", ctx.name, id));
            self.finish(ctx);
            return;
        };

        // Все проверки до списания: никаких частичных трат
        let ready = ctx.combat.is_cooldown_ready(spec.cooldown_key(), ctx.now);
        let affordable = ctx.stats.can_afford_stamina(spec.stamina_cost) && ctx.stats.can_afford_mp(spec.mp_cost);
        if !ready || !affordable {
            crate::logger::log(&format!(
                "{}: skill '{}' rejected (ready: {}, affordable: {})",
                ctx.name, spec.id, ready, affordable
            ));
            self.finish(ctx);
            return;
        }

        ctx.stats.try_consume_stamina(spec.stamina_cost);
        ctx.stats.try_consume_mp(spec.mp_cost);

        self.phase = AttackPhase::Skill;
        begin_attack(ctx, &spec);
        if spec.snap_to_target {
            if let Some(target) = ctx.target_position() {
                ctx.face_towards(target);
            }
        }

        let duration = ctx.play_clip(spec.clip_request());
        arm_hit_windows(ctx, &spec, duration);
        ctx.combat.commit_cooldown(spec.cooldown_key(), spec.cooldown, ctx.now);
        ctx.schedule(duration, TimerEvent::ActionFinished);
    }

    fn on_step_finished(&mut self, ctx: &mut ActorContext) {
        end_attack(ctx);

        let next = self.step + 1;
        if self.queued_next && next < self.combo.len() && self.start_step(ctx, next) {
            return;
        }
        self.start_recovery(ctx);
    }
}

impl CharacterState for AttackState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        self.phase = AttackPhase::Starting;
        self.step = 0;
        self.link_open = false;
        self.queued_next = false;

        ctx.combat.lock();
        ctx.motor.following_path = false;

        match ctx.combat.pop_action() {
            Some(ActionKind::NormalAttack) => {
                if !self.start_step(ctx, 0) {
                    self.finish(ctx);
                }
            }
            Some(ActionKind::Skill(id)) => self.start_skill(ctx, &id),
            other => {
                crate::logger::log_warning(&format!("{}: Attack entered with {:?}", ctx.name, other));
                self.finish(ctx);
            }
        }
    }

    fn on_update(&mut self, ctx: &mut ActorContext, _dt: f32) {
        match self.phase {
            AttackPhase::Combo => {
                if ctx.combat.peek_action() == Some(&ActionKind::NormalAttack) {
                    ctx.combat.pop_action();
                    if self.link_open {
                        self.queued_next = true;
                    }
                }
            }
            AttackPhase::Recovery => {
                // Dodge может стоять за атакой, нажатой во время recovery
                if ctx.combat.is_queued(&ActionKind::Dodge) {
                    if ctx.combat.can_dodge(ctx.stats, ctx.now) {
                        ctx.combat.skip_to_action(&ActionKind::Dodge);
                        ctx.request_transition(state_names::DODGE);
                    } else {
                        ctx.combat.remove_action(&ActionKind::Dodge);
                    }
                }
            }
            _ => {}
        }
    }

    fn on_timer(&mut self, ctx: &mut ActorContext, event: TimerEvent) {
        if handle_window_timer(ctx, &event) {
            return;
        }

        match event {
            TimerEvent::LinkWindowOpen => self.link_open = true,
            TimerEvent::LinkWindowClose => self.link_open = false,
            TimerEvent::StepFinished => self.on_step_finished(ctx),
            TimerEvent::RecoveryFinished | TimerEvent::ActionFinished => self.finish(ctx),
            _ => {}
        }
    }

    fn on_exit(&mut self, ctx: &mut ActorContext) {
        end_attack(ctx);
        ctx.combat.unlock();
        self.link_open = false;
        self.queued_next = false;
    }

    fn can_transition_to(&self, next: &str) -> bool {
        match next {
            state_names::DEATH | state_names::HIT => true,
            state_names::DODGE => matches!(self.phase, AttackPhase::Recovery | AttackPhase::Finished),
            _ => self.phase == AttackPhase::Finished,
        }
    }
}
