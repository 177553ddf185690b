//! Death bookkeeping: Dead marker, loot, corpse despawn.

use bevy::prelude::*;

use crate::combat::events::{EntityDied, LootGranted};
use crate::components::{DespawnAfter, Enemy, LootDrop, Progression, StatBlock, StatCurve};
use crate::SimulationConfig;

/// Система: EntityDied → маркер Dead (+ DespawnAfter для врагов)
///
/// Player не деспавнится: его труп остаётся до respawn / game over у host'а.
pub fn mark_dead(
    mut commands: Commands,
    mut deaths: EventReader<EntityDied>,
    enemies: Query<(), With<Enemy>>,
    config: Res<SimulationConfig>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs_f64();

    for event in deaths.read() {
        let Ok(mut entity_commands) = commands.get_entity(event.entity) else {
            continue;
        };

        entity_commands.insert(crate::components::Dead);
        if enemies.contains(event.entity) {
            entity_commands.insert(DespawnAfter {
                despawn_time: now + config.corpse_lifetime as f64,
            });
        }
    }
}

/// Система: loot жертвы → Progression убийцы, level-up по StatCurve.
pub fn grant_loot(
    mut deaths: EventReader<EntityDied>,
    drops: Query<&LootDrop>,
    mut recipients: Query<(&mut Progression, &mut StatBlock, Option<&StatCurve>)>,
    mut granted: EventWriter<LootGranted>,
) {
    for event in deaths.read() {
        let Some(killer) = event.killer.filter(|killer| *killer != event.entity) else {
            continue;
        };
        let Ok(loot) = drops.get(event.entity) else {
            continue;
        };
        let Ok((mut progression, mut stats, curve)) = recipients.get_mut(killer) else {
            continue;
        };

        let levels_gained = progression.grant_loot(loot);
        if levels_gained > 0 {
            if let Some(curve) = curve {
                stats.apply_level_up(curve, levels_gained);
            }
            crate::logger::log_info(&format!(
                "⭐ {:?} reached level {} (+{})",
                killer,
                progression.level(),
                levels_gained
            ));
        }

        granted.write(LootGranted {
            recipient: killer,
            source: event.entity,
            loot: loot.clone(),
            levels_gained,
        });
    }
}

/// Система: деспавн entities с истёкшим DespawnAfter timeout
pub fn despawn_after_timeout(mut commands: Commands, query: Query<(Entity, &DespawnAfter)>, time: Res<Time<Fixed>>) {
    let now = time.elapsed_secs_f64();

    for (entity, despawn_after) in query.iter() {
        if now >= despawn_after.despawn_time {
            crate::logger::log(&format!("⚰️ Despawning entity {:?} (timeout)", entity));
            commands.entity(entity).despawn();
        }
    }
}
