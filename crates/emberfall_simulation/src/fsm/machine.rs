//! StateMachine: named-state arena + current state.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::fsm::{ActorContext, CharacterState, StateId, TimerEvent};

/// Max chained transitions per dispatch (enter → request → enter …).
const MAX_CHAINED_TRANSITIONS: usize = 8;

#[derive(Component, Default)]
pub struct StateMachine {
    states: Vec<Box<dyn CharacterState>>,
    names: Vec<String>,
    index: HashMap<String, StateId>,
    current: Option<StateId>,
    initial: Option<String>,
    transitions: u64,
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("states", &self.names)
            .field("current", &self.current_state_name())
            .field("transitions", &self.transitions)
            .finish()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a state under `name`.
    pub fn register_state(&mut self, name: &str, state: Box<dyn CharacterState>) -> StateId {
        if let Some(&id) = self.index.get(name) {
            self.states[id.0] = state;
            return id;
        }
        let id = StateId(self.states.len());
        self.states.push(state);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// State entered on the first driver tick.
    pub fn set_initial_state(&mut self, name: &str) {
        self.initial = Some(name.to_string());
    }

    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current.map(|id| self.names[id.0].as_str())
    }

    pub fn is_in(&self, name: &str) -> bool {
        self.current_state_name() == Some(name)
    }

    /// Completed transitions since spawn.
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Enter the initial state if nothing is current yet.
    pub fn start(&mut self, ctx: &mut ActorContext) {
        if self.current.is_some() {
            return;
        }
        if let Some(initial) = self.initial.take() {
            self.change_state_by_name(&initial, ctx);
        }
    }

    /// Gated switch; false = unknown name or the current state refused.
    pub fn change_state_by_name(&mut self, name: &str, ctx: &mut ActorContext) -> bool {
        let changed = self.try_change(name, ctx);
        if changed {
            self.flush_requests(ctx);
        }
        changed
    }

    /// Forward to the current state's `on_update`; no-op without a state.
    pub fn tick_state(&mut self, ctx: &mut ActorContext, dt: f32) {
        let Some(current) = self.current else {
            return;
        };
        ctx.set_active_state(Some(current));
        self.states[current.0].on_update(ctx, dt);
        self.flush_requests(ctx);
    }

    /// Deliver a timer; continuations of states that are no longer current are dropped.
    pub fn dispatch_timer(&mut self, ctx: &mut ActorContext, owner: StateId, event: TimerEvent) {
        if self.current != Some(owner) {
            return;
        }
        ctx.set_active_state(Some(owner));
        self.states[owner.0].on_timer(ctx, event);
        self.flush_requests(ctx);
    }

    fn try_change(&mut self, name: &str, ctx: &mut ActorContext) -> bool {
        let Some(&next) = self.index.get(name) else {
            crate::logger::log_warning(&format!("{}: state '{}' is not registered", ctx.name, name));
            return false;
        };

        if let Some(current) = self.current {
            if !self.states[current.0].can_transition_to(name) {
                return false;
            }

            ctx.set_active_state(Some(current));
            self.states[current.0].on_exit(ctx);
            ctx.timers.clear_owner(current);
            // requests made while leaving are void
            ctx.take_transition();
        }

        crate::logger::log(&format!(
            "{}: {} → {}",
            ctx.name,
            self.current_state_name().unwrap_or("<none>"),
            name
        ));

        self.current = Some(next);
        self.transitions += 1;
        ctx.set_active_state(Some(next));
        self.states[next.0].on_enter(ctx);
        true
    }

    fn flush_requests(&mut self, ctx: &mut ActorContext) {
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            let Some(next) = ctx.take_transition() else {
                return;
            };
            self.try_change(next, ctx);
        }

        if let Some(dropped) = ctx.take_transition() {
            crate::logger::log_warning(&format!(
                "{}: transition chain too long, dropped request to '{}'",
                ctx.name, dropped
            ));
        }
    }
}
