//! Per-character timer list (deadline → continuation).
//!
//! Замена engine scheduler'а: state планирует `TimerEvent` через
//! `ActorContext::schedule`, character driver дренирует due timers перед
//! `tick_state`. Каждый timer помечен состоянием-владельцем; при выходе из
//! состояния машина чистит его timers, поэтому stale continuation не может
//! вернуться в покинутый state.

use bevy::prelude::*;

use crate::combat::hit_volume::HitWindow;
use crate::fsm::StateId;

/// Continuation payload. Данные, не closures.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    OpenHitWindow(HitWindow),
    CloseHitWindow(u64),
    LinkWindowOpen,
    LinkWindowClose,
    StepFinished,
    RecoveryFinished,
    ActionFinished,
    PhaseStep(u8),
}

#[derive(Debug, Clone)]
struct ScheduledTimer {
    deadline: f64,
    seq: u64,
    owner: StateId,
    event: TimerEvent,
}

#[derive(Component, Debug, Clone, Default)]
pub struct StateTimers {
    entries: Vec<ScheduledTimer>,
    next_seq: u64,
}

impl StateTimers {
    pub fn schedule(&mut self, owner: StateId, deadline: f64, event: TimerEvent) {
        self.entries.push(ScheduledTimer {
            deadline,
            seq: self.next_seq,
            owner,
            event,
        });
        self.next_seq += 1;
    }

    /// Earliest due timer (deadline, then scheduling order).
    pub fn pop_due(&mut self, now: f64) -> Option<(StateId, TimerEvent)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= now)
            .min_by(|(_, a), (_, b)| a.deadline.total_cmp(&b.deadline).then(a.seq.cmp(&b.seq)))
            .map(|(index, _)| index)?;

        let timer = self.entries.remove(index);
        Some((timer.owner, timer.event))
    }

    pub fn clear_owner(&mut self, owner: StateId) {
        self.entries.retain(|timer| timer.owner != owner);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending_for(&self, owner: StateId) -> bool {
        self.entries.iter().any(|timer| timer.owner == owner)
    }
}
