//! Character driver: the fixed-step system that runs every state machine.
//!
//! Порядок на каждого персонажа:
//! 1. initial state (первый тик после spawn)
//! 2. pending state request из damage pipeline (Death > PhaseChange > Dodge > Hit)
//! 3. due timers (continuations текущего state)
//! 4. `tick_state(dt)`

use std::collections::HashMap;

use bevy::ecs::query::QueryData;
use bevy::prelude::*;

use crate::ai::{BossPhases, EnemyBrain};
use crate::animation::{AnimationClips, Floor};
use crate::combat::events::AnimationRequested;
use crate::combat::{Combat, HitVolumeRegistry, HurtVolumeSet, StateRequest};
use crate::components::{Actor, Motor, StatBlock};
use crate::fsm::{ActorContext, ActorView, StateMachine, StateTimers, WorldView};
use crate::DeterministicRng;

/// Guard against zero-delay timer loops.
const MAX_TIMERS_PER_TICK: usize = 32;

#[derive(QueryData)]
#[query_data(mutable)]
pub struct CharacterQuery {
    pub entity: Entity,
    pub actor: &'static Actor,
    pub machine: &'static mut StateMachine,
    pub timers: &'static mut StateTimers,
    pub stats: &'static mut StatBlock,
    pub combat: &'static mut Combat,
    pub hit_volumes: &'static mut HitVolumeRegistry,
    pub hurt_volumes: Option<&'static mut HurtVolumeSet>,
    pub motor: &'static mut Motor,
    pub transform: &'static mut Transform,
    pub brain: Option<&'static mut EnemyBrain>,
    pub boss: Option<&'static mut BossPhases>,
}

/// One character, one tick.
pub fn drive_character(machine: &mut StateMachine, ctx: &mut ActorContext, dt: f32) {
    machine.start(ctx);

    if ctx.boss.as_deref().is_some_and(|boss| boss.wants_transition(&*ctx.stats)) {
        ctx.combat.request_state(StateRequest::PhaseChange);
    }

    if let Some(request) = ctx.combat.take_state_request() {
        machine.change_state_by_name(request.state_name(), ctx);
    }

    for _ in 0..MAX_TIMERS_PER_TICK {
        let Some((owner, event)) = ctx.timers.pop_due(ctx.now) else {
            break;
        };
        machine.dispatch_timer(ctx, owner, event);
    }

    machine.tick_state(ctx, dt);
}

/// Система: tick всех state machines (FixedUpdate).
pub fn drive_characters(
    time: Res<Time<Fixed>>,
    clips: Res<AnimationClips>,
    floor: Res<Floor>,
    mut rng: ResMut<DeterministicRng>,
    mut characters: Query<CharacterQuery>,
    mut animation_events: EventWriter<AnimationRequested>,
) {
    let now = time.elapsed_secs_f64();
    let dt = time.delta_secs();

    // Snapshot до запуска states: все видят позиции начала тика
    let snapshot: HashMap<Entity, ActorView> = characters
        .iter()
        .map(|item| {
            (
                item.entity,
                ActorView {
                    position: item.transform.translation,
                    alive: item.stats.is_alive(),
                    faction_id: item.actor.faction_id,
                },
            )
        })
        .collect();
    let world = WorldView::new(&snapshot, clips.0.as_ref(), floor.0.as_ref());

    let rng = &mut rng.rng;
    let mut outbox = Vec::new();

    for mut item in characters.iter_mut() {
        let machine = &mut *item.machine;
        let mut ctx = ActorContext::new(
            item.entity,
            &item.actor.name,
            now,
            &mut *item.stats,
            &mut *item.combat,
            &mut *item.hit_volumes,
            &mut *item.motor,
            &mut *item.transform,
            &mut *item.timers,
            world,
            rng,
            &mut outbox,
        )
        .with_hurt_volumes(item.hurt_volumes.as_deref_mut())
        .with_brain(item.brain.as_deref_mut())
        .with_boss(item.boss.as_deref_mut());

        drive_character(machine, &mut ctx, dt);
    }

    animation_events.write_batch(outbox);
}
