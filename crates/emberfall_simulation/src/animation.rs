//! Narrow contracts to the host engine: clip timing and floor probing.
//!
//! Симуляция не проигрывает анимации сама. Она спрашивает "сколько длится
//! clip" (`AnimationTimeline`), считает effective duration для таймеров и
//! шлёт `AnimationRequested` хосту. Ходьба по полу проверяется через
//! `FloorProbe` перед каждым шагом (dodge / knockback / chase).

use std::collections::HashMap;

use bevy::prelude::*;

/// Clip length source (host animation library).
pub trait AnimationTimeline: Send + Sync {
    /// Full clip length in seconds at rate 1.0; None = clip unknown.
    fn clip_length(&self, clip: &str) -> Option<f32>;
}

/// Walkability probe (ledges, walls).
pub trait FloorProbe: Send + Sync {
    fn is_walkable(&self, from: Vec3, to: Vec3) -> bool;
}

/// One clip playback request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub clip: String,
    pub rate: f32,
    pub start: f32,
    /// Cap on played seconds (clip time), None = whole clip
    pub max_play: Option<f32>,
    pub reverse: bool,
}

impl ClipRequest {
    pub fn new(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            rate: 1.0,
            start: 0.0,
            max_play: None,
            reverse: false,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_max_play(mut self, seconds: f32) -> Self {
        self.max_play = Some(seconds);
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// Effective wall-clock duration of a clip request.
///
/// `min(length - start, max_play) / |rate|`. Unknown clips give 0 so timer
/// chains fall through to their next step.
pub fn effective_duration(timeline: &dyn AnimationTimeline, request: &ClipRequest) -> f32 {
    let Some(length) = timeline.clip_length(&request.clip) else {
        return 0.0;
    };

    let mut played = (length - request.start.max(0.0)).max(0.0);
    if let Some(max_play) = request.max_play {
        if max_play > 0.0 {
            played = played.min(max_play);
        }
    }

    let rate = request.rate.abs();
    if rate < 1e-4 {
        return played;
    }
    played / rate
}

/// In-memory clip table (tests, headless runs, RON-authored lengths).
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, f32>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, clip: impl Into<String>, seconds: f32) -> Self {
        self.insert(clip, seconds);
        self
    }

    pub fn insert(&mut self, clip: impl Into<String>, seconds: f32) {
        self.clips.insert(clip.into(), seconds.max(0.0));
    }

    /// Clip set used by the built-in presets.
    pub fn standard() -> Self {
        Self::new()
            .with_clip("Jump", 0.8)
            .with_clip("Attack1", 0.6)
            .with_clip("Attack2", 0.6)
            .with_clip("Attack3", 0.8)
            .with_clip("Attack1Recover", 0.3)
            .with_clip("Attack2Recover", 0.3)
            .with_clip("Attack3Recover", 0.4)
            .with_clip("SkillSpin", 1.0)
            .with_clip("Dodge", 0.5)
            .with_clip("HitLight", 0.3)
            .with_clip("HitHeavy", 0.6)
            .with_clip("KnockDown", 1.2)
            .with_clip("Launched", 1.0)
            .with_clip("Death", 1.5)
            .with_clip("Energize", 1.0)
            .with_clip("Slash", 0.9)
            .with_clip("Lunge", 1.1)
            .with_clip("Slam", 1.4)
            .with_clip("Sweep", 1.2)
    }
}

impl AnimationTimeline for ClipLibrary {
    fn clip_length(&self, clip: &str) -> Option<f32> {
        self.clips.get(clip).copied()
    }
}

/// Infinite flat ground.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGround;

impl FloorProbe for FlatGround {
    fn is_walkable(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// Rectangular arena (XZ); stepping outside is refused.
#[derive(Debug, Clone, Copy)]
pub struct ArenaBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl ArenaBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

impl FloorProbe for ArenaBounds {
    fn is_walkable(&self, _from: Vec3, to: Vec3) -> bool {
        to.x >= self.min.x && to.x <= self.max.x && to.z >= self.min.y && to.z <= self.max.y
    }
}

/// Resource wrapper for the host's timeline.
#[derive(Resource)]
pub struct AnimationClips(pub Box<dyn AnimationTimeline>);

impl Default for AnimationClips {
    fn default() -> Self {
        Self(Box::new(ClipLibrary::standard()))
    }
}

/// Resource wrapper for the host's floor probe.
#[derive(Resource)]
pub struct Floor(pub Box<dyn FloorProbe>);

impl Default for Floor {
    fn default() -> Self {
        Self(Box::new(FlatGround))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_duration_rate_and_start() {
        let library = ClipLibrary::new().with_clip("Slash", 1.2);

        assert!((effective_duration(&library, &ClipRequest::new("Slash")) - 1.2).abs() < 1e-6);
        assert!((effective_duration(&library, &ClipRequest::new("Slash").with_rate(2.0)) - 0.6).abs() < 1e-6);

        let request = ClipRequest {
            start: 0.2,
            ..ClipRequest::new("Slash").with_max_play(0.5)
        };
        assert!((effective_duration(&library, &request) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_clip_is_zero() {
        let library = ClipLibrary::new();
        assert_eq!(effective_duration(&library, &ClipRequest::new("Nope")), 0.0);
    }

    #[test]
    fn test_arena_bounds() {
        let arena = ArenaBounds::new(Vec2::splat(-5.0), Vec2::splat(5.0));
        assert!(arena.is_walkable(Vec3::ZERO, Vec3::new(4.9, 0.0, -4.9)));
        assert!(!arena.is_walkable(Vec3::ZERO, Vec3::new(5.1, 0.0, 0.0)));
    }
}
