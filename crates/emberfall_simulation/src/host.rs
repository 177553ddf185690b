//! Reference collision host: sphere-proximity overlaps.
//!
//! Настоящий движок репортит overlaps из своей физики. Для headless runner'а
//! и тестов хватает sphere check: центр volume = позиция + offset (по facing),
//! радиус = наибольший extent + `VICTIM_RADIUS`.

use bevy::prelude::*;

use crate::combat::{CombatSet, HitVolumeRegistry, HurtVolumeSet, VolumeOverlap, DEFAULT_VOLUME};
use crate::components::{Actor, Dead, Motor};

/// Capsule radius assumed for every victim.
pub const VICTIM_RADIUS: f32 = 0.5;

/// World-space center of a volume, offset rotated into the facing frame.
pub fn volume_center(position: Vec3, facing: Vec3, offset: Vec3) -> Vec3 {
    let forward = facing.normalize_or_zero();
    let right = Vec3::Y.cross(forward).normalize_or_zero();
    position + right * offset.x + Vec3::Y * offset.y + forward * offset.z
}

/// Система: active hit volumes × hostile actors → VolumeOverlap.
///
/// Дедупликация не здесь: overlap приходит каждый тик, registry решает.
pub fn proximity_overlaps(
    attackers: Query<(Entity, &Actor, &Transform, &Motor, &HitVolumeRegistry), Without<Dead>>,
    victims: Query<(Entity, &Actor, &Transform), (With<HurtVolumeSet>, Without<Dead>)>,
    mut overlaps: EventWriter<VolumeOverlap>,
) {
    for (attacker, actor, transform, motor, volumes) in attackers.iter() {
        if !volumes.any_active() {
            continue;
        }

        for name in volumes.active_names() {
            let Some(definition) = volumes.definition(name).or_else(|| volumes.definition(DEFAULT_VOLUME)) else {
                continue;
            };
            let center = volume_center(transform.translation, motor.facing, definition.offset());
            let reach = definition.extents().max_element() + VICTIM_RADIUS;

            for (victim, victim_actor, victim_transform) in victims.iter() {
                if victim == attacker || !actor.is_hostile_to(victim_actor) {
                    continue;
                }

                let to_victim = victim_transform.translation - center;
                let planar = Vec3::new(to_victim.x, 0.0, to_victim.z);
                if planar.length() > reach {
                    continue;
                }

                overlaps.write(VolumeOverlap {
                    attacker,
                    volume: name.to_string(),
                    victim,
                    hurt_volume: None,
                    location: victim_transform.translation + Vec3::Y,
                    normal: -planar.normalize_or_zero(),
                });
            }
        }
    }
}

/// Adds `proximity_overlaps` right before the damage pipeline.
pub struct ProximityHostPlugin;

impl Plugin for ProximityHostPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            proximity_overlaps.after(CombatSet::Perception).before(CombatSet::Damage),
        );
    }
}
