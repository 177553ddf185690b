//! Motor: locomotion state персонажа.
//!
//! Движок (navigation / CharacterBody) читает `following_path`, `facing`,
//! позицию из `Transform`. Input layer пишет `move_input` / `jump_requested`.

use bevy::prelude::*;

#[derive(Component, Debug, Clone)]
pub struct Motor {
    /// Movement input (XZ plane), нормализуется при движении
    pub move_input: Vec3,
    pub jump_requested: bool,
    /// Forward direction (XZ, unit)
    pub facing: Vec3,
    pub movement_enabled: bool,
    pub collision_enabled: bool,
    pub airborne: bool,
    pub vertical_velocity: f32,
    /// Ground height под актором
    pub ground_height: f32,
    /// Path following toward `Combat::target` (enemy chase)
    pub following_path: bool,
}

impl Default for Motor {
    fn default() -> Self {
        Self {
            move_input: Vec3::ZERO,
            jump_requested: false,
            facing: Vec3::Z,
            movement_enabled: true,
            collision_enabled: true,
            airborne: false,
            vertical_velocity: 0.0,
            ground_height: 0.0,
            following_path: false,
        }
    }
}

impl Motor {
    pub fn has_move_input(&self) -> bool {
        flatten(self.move_input).length_squared() > 1e-4
    }

    /// Turn toward `direction` (XZ only); zero vectors keep the old facing.
    pub fn face(&mut self, direction: Vec3) {
        let flat = flatten(direction);
        if flat.length_squared() > 1e-6 {
            self.facing = flat.normalize();
        }
    }

    pub fn stop(&mut self) {
        self.move_input = Vec3::ZERO;
        self.following_path = false;
    }
}

/// Project onto the XZ plane.
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// 2D (XZ) distance, used for attack range gating.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}
