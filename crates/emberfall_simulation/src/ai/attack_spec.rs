//! Authored attack data: AttackSpec (enemy attack / player skill / combo step).

use serde::{Deserialize, Serialize};

use crate::animation::ClipRequest;
use crate::combat::hit_volume::HitBoxActivationParams;
use crate::combat::InterruptProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackSpec {
    pub id: String,
    pub clip: String,
    pub play_rate: f32,
    /// Hit windows, seconds from clip start. Empty = whole clip
    pub hit_windows: Vec<[f32; 2]>,
    pub hit_volumes: Vec<String>,
    pub activation: HitBoxActivationParams,
    pub interruptible: bool,
    pub interrupt_chance: f32,
    pub interrupt_chance_on_heavy: f32,
    /// Empty = use `id`
    pub cooldown_id: String,
    pub cooldown: f32,
    pub min_range: f32,
    pub max_range: f32,
    pub weight: f32,
    pub snap_to_target: bool,
    pub stamina_cost: f32,
    pub mp_cost: f32,
}

impl Default for AttackSpec {
    fn default() -> Self {
        Self {
            id: "attack".to_string(),
            clip: "Attack1".to_string(),
            play_rate: 1.0,
            hit_windows: Vec::new(),
            hit_volumes: vec!["Default".to_string()],
            activation: HitBoxActivationParams::default(),
            interruptible: true,
            interrupt_chance: 1.0,
            interrupt_chance_on_heavy: 1.0,
            cooldown_id: String::new(),
            cooldown: 0.0,
            min_range: 0.0,
            max_range: 2.0,
            weight: 1.0,
            snap_to_target: true,
            stamina_cost: 0.0,
            mp_cost: 0.0,
        }
    }
}

impl AttackSpec {
    pub fn new(id: impl Into<String>, clip: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            clip: clip.into(),
            ..Default::default()
        }
    }

    pub fn cooldown_key(&self) -> &str {
        if self.cooldown_id.is_empty() {
            &self.id
        } else {
            &self.cooldown_id
        }
    }

    pub fn in_range(&self, distance: f32) -> bool {
        distance >= self.min_range && distance <= self.max_range
    }

    pub fn interrupt_profile(&self) -> InterruptProfile {
        InterruptProfile {
            interruptible: self.interruptible,
            chance: self.interrupt_chance,
            chance_on_heavy: self.interrupt_chance_on_heavy,
        }
    }

    pub fn clip_request(&self) -> ClipRequest {
        ClipRequest::new(self.clip.clone()).with_rate(self.play_rate)
    }

    /// Wall-clock windows for a clip playing `duration` seconds at `play_rate`,
    /// clamped into `[0, duration]`.
    pub fn windows(&self, duration: f32) -> Vec<(f32, f32)> {
        if self.hit_windows.is_empty() {
            return vec![(0.0, duration)];
        }

        // Тот же порог, что в effective_duration: почти нулевой rate не масштабирует
        let rate = self.play_rate.abs();
        let scale = if rate < 1e-4 { 1.0 } else { rate.recip() };

        self.hit_windows
            .iter()
            .map(|[start, end]| {
                let start = (start * scale).clamp(0.0, duration);
                (start, (end * scale).clamp(start, duration))
            })
            .collect()
    }
}

/// One step of the player's normal-attack combo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboStep {
    pub attack: AttackSpec,
    /// Link window length at the tail of the clip
    pub link_window: f32,
    /// Link window closes this long before the clip ends
    pub link_window_end_offset: f32,
    pub recovery_clip: String,
}

impl Default for ComboStep {
    fn default() -> Self {
        Self {
            attack: AttackSpec::default(),
            link_window: 0.3,
            link_window_end_offset: 0.0,
            recovery_clip: "Attack1Recover".to_string(),
        }
    }
}

impl ComboStep {
    /// `[duration - link, duration - end_offset]`, clamped into the clip.
    pub fn link_window_bounds(&self, duration: f32) -> (f32, f32) {
        let open = (duration - self.link_window.max(0.0)).clamp(0.0, duration);
        let close = (duration - self.link_window_end_offset.max(0.0)).clamp(open, duration);
        (open, close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_key_falls_back_to_id() {
        let mut spec = AttackSpec::new("slam", "Slam");
        assert_eq!(spec.cooldown_key(), "slam");
        spec.cooldown_id = "heavy".into();
        assert_eq!(spec.cooldown_key(), "heavy");
    }

    #[test]
    fn test_windows_default_to_whole_clip_and_clamp() {
        let mut spec = AttackSpec::new("slash", "Slash");
        assert_eq!(spec.windows(0.9), vec![(0.0, 0.9)]);

        spec.hit_windows = vec![[0.2, 0.4], [0.7, 2.0]];
        assert_eq!(spec.windows(0.9), vec![(0.2, 0.4), (0.7, 0.9)]);
    }

    #[test]
    fn test_windows_follow_play_rate() {
        let spec = AttackSpec {
            play_rate: 2.0,
            hit_windows: vec![[0.6, 0.8]],
            ..AttackSpec::new("slash", "Slash")
        };

        // 1.0s clip на 2x играет 0.5s
        let windows = spec.windows(0.5);
        assert_eq!(windows.len(), 1);
        assert!((windows[0].0 - 0.3).abs() < 1e-6);
        assert!((windows[0].1 - 0.4).abs() < 1e-6);

        let slow = AttackSpec {
            play_rate: 0.5,
            ..spec
        };
        let windows = slow.windows(2.0);
        assert!((windows[0].0 - 1.2).abs() < 1e-6);
        assert!((windows[0].1 - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_link_window_bounds() {
        let step = ComboStep {
            link_window: 0.3,
            link_window_end_offset: 0.1,
            ..Default::default()
        };
        let (open, close) = step.link_window_bounds(1.0);
        assert!((open - 0.7).abs() < 1e-6);
        assert!((close - 0.9).abs() < 1e-6);

        // Link longer than the clip opens immediately
        let greedy = ComboStep {
            link_window: 5.0,
            ..Default::default()
        };
        assert_eq!(greedy.link_window_bounds(0.5), (0.0, 0.5));
    }
}
