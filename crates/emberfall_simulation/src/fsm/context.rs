//! ActorContext: всё, что state видит и может менять за один callback.
//!
//! Собирается character driver'ом на каждый тик из компонентов entity плюс
//! read-only snapshot мира (позиции / alive остальных акторов). Transition
//! requests и animation requests копятся здесь и применяются после
//! возврата из callback'а.

use std::collections::HashMap;

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::ai::{BossPhases, EnemyBrain};
use crate::animation::{effective_duration, AnimationTimeline, ClipRequest, FloorProbe};
use crate::combat::events::AnimationRequested;
use crate::combat::{Combat, HitVolumeRegistry, HurtVolumeSet};
use crate::components::{flatten, Motor, StatBlock};
use crate::fsm::timers::{StateTimers, TimerEvent};
use crate::fsm::{state_names, StateId};

/// Snapshot of another actor, taken before states run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorView {
    pub position: Vec3,
    pub alive: bool,
    pub faction_id: u64,
}

/// Read-only world as seen by states.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    actors: &'a HashMap<Entity, ActorView>,
    pub timeline: &'a dyn AnimationTimeline,
    pub floor: &'a dyn FloorProbe,
}

impl<'a> WorldView<'a> {
    pub fn new(
        actors: &'a HashMap<Entity, ActorView>,
        timeline: &'a dyn AnimationTimeline,
        floor: &'a dyn FloorProbe,
    ) -> Self {
        Self {
            actors,
            timeline,
            floor,
        }
    }

    /// None for despawned / unknown handles.
    pub fn actor(&self, entity: Entity) -> Option<&ActorView> {
        self.actors.get(&entity)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.actor(entity).is_some_and(|view| view.alive)
    }

    pub fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.actor(entity).map(|view| view.position)
    }
}

pub struct ActorContext<'a> {
    pub entity: Entity,
    pub name: &'a str,
    /// World clock, seconds
    pub now: f64,
    pub stats: &'a mut StatBlock,
    pub combat: &'a mut Combat,
    pub hit_volumes: &'a mut HitVolumeRegistry,
    pub hurt_volumes: Option<&'a mut HurtVolumeSet>,
    pub motor: &'a mut Motor,
    pub transform: &'a mut Transform,
    pub timers: &'a mut StateTimers,
    pub brain: Option<&'a mut EnemyBrain>,
    pub boss: Option<&'a mut BossPhases>,
    pub world: WorldView<'a>,
    pub rng: &'a mut ChaCha8Rng,
    pub animations: &'a mut Vec<AnimationRequested>,
    pending_transition: Option<&'static str>,
    active_state: Option<StateId>,
}

impl<'a> ActorContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity: Entity,
        name: &'a str,
        now: f64,
        stats: &'a mut StatBlock,
        combat: &'a mut Combat,
        hit_volumes: &'a mut HitVolumeRegistry,
        motor: &'a mut Motor,
        transform: &'a mut Transform,
        timers: &'a mut StateTimers,
        world: WorldView<'a>,
        rng: &'a mut ChaCha8Rng,
        animations: &'a mut Vec<AnimationRequested>,
    ) -> Self {
        Self {
            entity,
            name,
            now,
            stats,
            combat,
            hit_volumes,
            hurt_volumes: None,
            motor,
            transform,
            timers,
            brain: None,
            boss: None,
            world,
            rng,
            animations,
            pending_transition: None,
            active_state: None,
        }
    }

    pub fn with_hurt_volumes(mut self, hurt_volumes: Option<&'a mut HurtVolumeSet>) -> Self {
        self.hurt_volumes = hurt_volumes;
        self
    }

    pub fn with_brain(mut self, brain: Option<&'a mut EnemyBrain>) -> Self {
        self.brain = brain;
        self
    }

    pub fn with_boss(mut self, boss: Option<&'a mut BossPhases>) -> Self {
        self.boss = boss;
        self
    }

    // === Transitions ===

    /// Ask the machine to switch after the current callback returns.
    /// The target is still gated by the current state's `can_transition_to`.
    pub fn request_transition(&mut self, name: &'static str) {
        self.pending_transition = Some(name);
    }

    pub fn pending_transition(&self) -> Option<&'static str> {
        self.pending_transition
    }

    pub(crate) fn take_transition(&mut self) -> Option<&'static str> {
        self.pending_transition.take()
    }

    pub(crate) fn set_active_state(&mut self, state: Option<StateId>) {
        self.active_state = state;
    }

    pub fn active_state(&self) -> Option<StateId> {
        self.active_state
    }

    // === Timers ===

    /// Arm a continuation owned by the state currently being dispatched.
    pub fn schedule(&mut self, delay: f32, event: TimerEvent) {
        let Some(owner) = self.active_state else {
            crate::logger::log_warning(&format!(
                "{}: schedule({:?}) outside of a state callback, dropped",
                self.name, event
            ));
            return;
        };
        self.timers.schedule(owner, self.now + delay.max(0.0) as f64, event);
    }

    // === Animation ===

    /// Emit an animation request; returns the effective duration.
    pub fn play_clip(&mut self, request: ClipRequest) -> f32 {
        let duration = effective_duration(self.world.timeline, &request);
        if duration <= 0.0 {
            crate::logger::log(&format!("{}: clip '{}' unavailable, zero duration", self.name, request.clip));
        }
        self.animations.push(AnimationRequested {
            entity: self.entity,
            clip: request.clip,
            rate: request.rate,
            start: request.start,
            reverse: request.reverse,
            duration,
        });
        duration
    }

    // === Spatial helpers ===

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    /// Current target if it is still alive.
    pub fn live_target(&self) -> Option<Entity> {
        self.combat.target.filter(|target| self.world.is_alive(*target))
    }

    pub fn target_position(&self) -> Option<Vec3> {
        self.live_target().and_then(|target| self.world.position_of(target))
    }

    /// Move by `delta` if the floor probe allows it.
    pub fn try_step(&mut self, delta: Vec3) -> bool {
        let from = self.transform.translation;
        let to = from + delta;
        if !self.world.floor.is_walkable(from, to) {
            return false;
        }
        self.transform.translation = to;
        true
    }

    pub fn face_towards(&mut self, point: Vec3) {
        let direction = flatten(point - self.transform.translation);
        self.motor.face(direction);
    }

    pub fn set_hurt_enabled(&mut self, enabled: bool) {
        if let Some(hurt_volumes) = self.hurt_volumes.as_deref_mut() {
            hurt_volumes.set_hurt_box_enabled(enabled);
        }
    }

    /// Where to go when an action ends.
    pub fn resume_state(&self) -> &'static str {
        if self.motor.airborne {
            state_names::JUMP
        } else if self.brain.is_some() {
            if self.live_target().is_some() {
                state_names::CHASE
            } else {
                state_names::IDLE
            }
        } else if self.motor.has_move_input() {
            state_names::MOVE
        } else {
            state_names::IDLE
        }
    }
}

/// Owned component set for unit tests that drive states without an App.
#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use rand::SeedableRng;

    use crate::animation::{ClipLibrary, FlatGround};
    use crate::combat::HurtVolume;
    use crate::fsm::StateMachine;

    /// Fixed step used by `run_until`.
    pub const STEP: f32 = 0.05;

    pub struct TestActor {
        pub entity: Entity,
        pub now: f64,
        pub stats: StatBlock,
        pub combat: Combat,
        pub hit_volumes: HitVolumeRegistry,
        pub hurt_volumes: Option<HurtVolumeSet>,
        pub motor: Motor,
        pub transform: Transform,
        pub timers: StateTimers,
        pub brain: Option<EnemyBrain>,
        pub boss: Option<BossPhases>,
        pub actors: HashMap<Entity, ActorView>,
        pub clips: ClipLibrary,
        pub floor: FlatGround,
        pub rng: ChaCha8Rng,
        pub animations: Vec<AnimationRequested>,
    }

    impl TestActor {
        pub fn new(clips: ClipLibrary) -> Self {
            Self {
                entity: Entity::from_raw(1),
                now: 0.0,
                stats: StatBlock::default(),
                combat: Combat::default(),
                hit_volumes: HitVolumeRegistry::default(),
                hurt_volumes: Some(HurtVolumeSet::new(vec![HurtVolume::default()])),
                motor: Motor::default(),
                transform: Transform::default(),
                timers: StateTimers::default(),
                brain: None,
                boss: None,
                actors: HashMap::new(),
                clips,
                floor: FlatGround,
                rng: ChaCha8Rng::seed_from_u64(7),
                animations: Vec::new(),
            }
        }

        pub fn ctx(&mut self) -> ActorContext<'_> {
            let world = WorldView::new(&self.actors, &self.clips, &self.floor);
            ActorContext::new(
                self.entity,
                "test-actor",
                self.now,
                &mut self.stats,
                &mut self.combat,
                &mut self.hit_volumes,
                &mut self.motor,
                &mut self.transform,
                &mut self.timers,
                world,
                &mut self.rng,
                &mut self.animations,
            )
            .with_hurt_volumes(self.hurt_volumes.as_mut())
            .with_brain(self.brain.as_mut())
            .with_boss(self.boss.as_mut())
        }

        /// Another live actor visible to states.
        pub fn add_actor(&mut self, entity: Entity, position: Vec3, faction_id: u64) {
            self.actors.insert(
                entity,
                ActorView {
                    position,
                    alive: true,
                    faction_id,
                },
            );
        }

        /// Fixed steps up to `until`: due timers first, then `on_update`.
        pub fn run_until(&mut self, machine: &mut StateMachine, until: f64) {
            while self.now + 1e-9 < until {
                self.now += STEP as f64;
                let mut ctx = self.ctx();
                while let Some((owner, event)) = ctx.timers.pop_due(ctx.now) {
                    machine.dispatch_timer(&mut ctx, owner, event);
                }
                machine.tick_state(&mut ctx, STEP);
            }
        }

        pub fn clips_played(&self) -> Vec<&str> {
            self.animations.iter().map(|request| request.clip.as_str()).collect()
        }
    }
}
