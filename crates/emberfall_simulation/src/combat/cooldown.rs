//! CooldownTable: cooldown key → ready-at timestamp (world seconds).
//!
//! Отсутствие ключа = ready. Записи создаются лениво при первом commit и не
//! удаляются (устаревшие записи безвредны).

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CooldownTable {
    ready_at: HashMap<String, f64>,
}

impl CooldownTable {
    pub fn is_ready(&self, key: &str, now: f64) -> bool {
        self.ready_at.get(key).map_or(true, |ready_at| now >= *ready_at)
    }

    /// Seconds until ready (0 if ready or unknown).
    pub fn remaining(&self, key: &str, now: f64) -> f64 {
        self.ready_at.get(key).map_or(0.0, |ready_at| (ready_at - now).max(0.0))
    }

    /// ready_at = now + seconds. Zero / negative durations are no-ops.
    pub fn commit(&mut self, key: &str, seconds: f64, now: f64) {
        if seconds <= 0.0 {
            return;
        }
        self.ready_at.insert(key.to_string(), now + seconds);
    }

    /// Check + commit in one call; false leaves the table untouched.
    pub fn try_commit(&mut self, key: &str, seconds: f64, now: f64) -> bool {
        if !self.is_ready(key, now) {
            return false;
        }
        self.commit(key, seconds, now);
        true
    }

    pub fn len(&self) -> usize {
        self.ready_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready_at.is_empty()
    }
}
