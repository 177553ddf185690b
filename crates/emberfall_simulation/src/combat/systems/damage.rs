//! Damage systems: host overlaps + scripted damage → victim intake → events.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::combat::events::{DamageDealt, DamageEvaded, DamageRequest, EntityDied, HitLanded, VolumeOverlap};
use crate::combat::pipeline::{receive_damage, resolve_overlap, CombatantQuery, DamageIntake, IntakeOutcome};
use crate::DeterministicRng;

/// Fan-out of one intake to the notification events.
#[derive(SystemParam)]
pub struct DamageOutbox<'w> {
    dealt: EventWriter<'w, DamageDealt>,
    landed: EventWriter<'w, HitLanded>,
    evaded: EventWriter<'w, DamageEvaded>,
    died: EventWriter<'w, EntityDied>,
}

impl DamageOutbox<'_> {
    pub fn publish(&mut self, target: Entity, outcome: &IntakeOutcome) {
        let info = &outcome.info;

        if outcome.evaded {
            crate::logger::log(&format!("💨 {:?} evaded a hit from {:?}", target, info.instigator));
            self.evaded.write(DamageEvaded {
                entity: target,
                instigator: info.instigator,
            });
            return;
        }

        self.dealt.write(DamageDealt {
            attacker: info.instigator,
            target,
            damage: outcome.applied,
            info: info.clone(),
        });

        if outcome.applied > 0.0 {
            crate::logger::log(&format!(
                "💥 {:?} → {:?}: {:.1} damage{} ({:?})",
                info.instigator,
                target,
                outcome.applied,
                if info.is_critical { " CRIT" } else { "" },
                info.hit_reaction
            ));
            self.landed.write(HitLanded {
                attacker: info.instigator,
                target,
                damage: outcome.applied,
                is_critical: info.is_critical,
                location: info.hit_location,
            });
        }

        if let Some(notice) = outcome.died {
            crate::logger::log_info(&format!("💀 {:?} killed by {:?}", target, notice.killer));
            self.died.write(EntityDied {
                entity: target,
                killer: notice.killer,
            });
        }
    }
}

/// Система: VolumeOverlap → hit registration → intake.
pub fn process_overlaps(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut overlaps: EventReader<VolumeOverlap>,
    mut combatants: Query<CombatantQuery>,
    mut outbox: DamageOutbox,
) {
    let now = time.elapsed_secs_f64();

    for overlap in overlaps.read() {
        if let Some(outcome) = resolve_overlap(overlap, &mut combatants, now, &mut rng.rng) {
            outbox.publish(overlap.victim, &outcome);
        }
    }
}

/// Система: scripted damage (ловушки, DOT) через тот же intake.
pub fn process_damage_requests(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut requests: EventReader<DamageRequest>,
    mut combatants: Query<CombatantQuery>,
    mut outbox: DamageOutbox,
) {
    let now = time.elapsed_secs_f64();

    for request in requests.read() {
        let Some(target) = request.info.target else {
            crate::logger::log_warning("DamageRequest without target, dropped");
            continue;
        };
        let Ok(victim) = combatants.get_mut(target) else {
            crate::logger::log_warning(&format!("DamageRequest: {:?} has no StatBlock / Combat", target));
            continue;
        };

        let intake = DamageIntake {
            stats: victim.stats.into_inner(),
            combat: victim.combat.into_inner(),
            hurt_volumes: victim.hurt_volumes,
            evade: victim.brain.and_then(|brain| brain.evade.as_ref()),
            boss: victim.boss,
        };
        let outcome = receive_damage(request.info.clone(), intake, now, &mut rng.rng);
        outbox.publish(target, &outcome);
    }
}
