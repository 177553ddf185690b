//! Damage pipeline: overlap → DamageInfo → victim intake.
//!
//! ```text
//! VolumeOverlap ─► resolve_overlap
//!                    self hit? victim без StatBlock/Combat? hurt part disabled?
//!                    HitVolumeRegistry::register_hit (dedup, crit)
//!                  ─► receive_damage
//!                    evade roll ─► Dodge (apply_damage не вызывается)
//!                    HurtVolume::modify_incoming_damage
//!                    StatBlock::apply_damage
//!                    death notice ─► Death | boss threshold ─► PhaseChange
//!                    applied > 0 ─► Hit (interrupt roll, если актор атакует)
//! ```
//!
//! Функции чистые относительно ECS: система собирает компоненты, pipeline
//! возвращает `IntakeOutcome`, система рассылает events.

use bevy::ecs::query::QueryData;
use bevy::prelude::*;
use rand::Rng;

use crate::ai::{roll_evade, should_interrupt_current_attack, BossPhases, EnemyBrain, EvadeConfig};
use crate::combat::action::{Combat, StateRequest};
use crate::combat::damage::{DamageInfo, HitReaction};
use crate::combat::events::VolumeOverlap;
use crate::combat::hit_volume::{HitAttempt, HitVolumeRegistry};
use crate::combat::hurt_volume::HurtVolumeSet;
use crate::components::{DeathNotice, StatBlock};

/// Everything the overlap pipeline reads or writes on one combatant.
#[derive(QueryData)]
#[query_data(mutable)]
pub struct CombatantQuery {
    pub entity: Entity,
    pub stats: &'static mut StatBlock,
    pub combat: &'static mut Combat,
    pub hit_volumes: &'static mut HitVolumeRegistry,
    pub hurt_volumes: Option<&'static HurtVolumeSet>,
    pub transform: &'static Transform,
    pub brain: Option<&'static EnemyBrain>,
    pub boss: Option<&'static BossPhases>,
}

/// Victim side of one intake.
pub struct DamageIntake<'a> {
    pub stats: &'a mut StatBlock,
    pub combat: &'a mut Combat,
    pub hurt_volumes: Option<&'a HurtVolumeSet>,
    pub evade: Option<&'a EvadeConfig>,
    pub boss: Option<&'a BossPhases>,
}

#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    /// Post-intake record (`damage_value` = applied)
    pub info: DamageInfo,
    pub applied: f32,
    pub evaded: bool,
    pub died: Option<DeathNotice>,
    pub request: Option<StateRequest>,
}

/// Victim intake. Requests are also written into `intake.combat`.
pub fn receive_damage<R: Rng + ?Sized>(
    mut info: DamageInfo,
    intake: DamageIntake<'_>,
    now: f64,
    rng: &mut R,
) -> IntakeOutcome {
    let DamageIntake {
        stats,
        combat,
        hurt_volumes,
        evade,
        boss,
    } = intake;

    // 1. Evade-on-hit (до урона)
    if let Some(evade) = evade {
        if stats.is_alive() && roll_evade(evade, combat, now, rng) {
            info.damage_value = 0.0;
            combat.last_instigator = info.instigator;
            combat.request_state(StateRequest::Dodge);
            return IntakeOutcome {
                info,
                applied: 0.0,
                evaded: true,
                died: None,
                request: Some(StateRequest::Dodge),
            };
        }
    }

    // 2. Bodypart modifiers
    let part = info
        .hurt_volume
        .as_deref()
        .and_then(|name| hurt_volumes.and_then(|set| set.resolve(Some(name))));
    match part {
        Some(part) => part.modify_incoming_damage(&mut info),
        None if info.hit_reaction == HitReaction::None => info.hit_reaction = HitReaction::Light,
        None => {}
    }

    // 3. Mitigation + HP
    let applied = stats.apply_damage(&mut info);

    if applied > 0.0 {
        combat.last_instigator = info.instigator;
        combat.last_reaction = info.hit_reaction;
        combat.last_knockback = info.knockback;
    }

    // 4. Transition request
    let died = stats.take_death_notice();
    let request = if died.is_some() {
        info.hit_reaction = HitReaction::Dead;
        Some(StateRequest::Death)
    } else if boss.is_some_and(|boss| boss.wants_transition(stats)) {
        Some(StateRequest::PhaseChange)
    } else if applied > 0.0 {
        let interrupts = !combat.attacking
            || should_interrupt_current_attack(combat.active_attack.as_ref(), info.hit_reaction.is_heavy(), rng);
        interrupts.then_some(StateRequest::Hit)
    } else {
        None
    };

    if let Some(request) = request {
        combat.request_state(request);
    }

    IntakeOutcome {
        info,
        applied,
        evaded: false,
        died,
        request,
    }
}

/// One overlap end to end; None when the overlap is ignored.
pub fn resolve_overlap<R: Rng + ?Sized>(
    overlap: &VolumeOverlap,
    combatants: &mut Query<CombatantQuery>,
    now: f64,
    rng: &mut R,
) -> Option<IntakeOutcome> {
    if overlap.attacker == overlap.victim {
        return None;
    }

    // Нет StatBlock / Combat у одной из сторон → не участник боя
    let [mut attacker, victim] = combatants.get_many_mut([overlap.attacker, overlap.victim]).ok()?;

    if !victim.stats.is_alive() {
        return None;
    }

    let struck_part = match victim.hurt_volumes {
        Some(set) if !set.parts().is_empty() => Some(set.resolve(overlap.hurt_volume.as_deref())?.bodypart.clone()),
        _ => overlap.hurt_volume.clone(),
    };

    let attempt = HitAttempt {
        attacker: overlap.attacker,
        attacker_attack: attacker.stats.attack,
        attacker_position: attacker.transform.translation,
        victim: overlap.victim,
        victim_position: victim.transform.translation,
        hurt_volume: struck_part.as_deref(),
        location: overlap.location,
        normal: overlap.normal,
    };

    let info = attacker.hit_volumes.register_hit(&overlap.volume, &attempt, rng)?;

    let CombatantQueryItem {
        stats,
        combat,
        hurt_volumes,
        brain,
        boss,
        ..
    } = victim;

    let intake = DamageIntake {
        stats: stats.into_inner(),
        combat: combat.into_inner(),
        hurt_volumes,
        evade: brain.and_then(|brain| brain.evade.as_ref()),
        boss,
    };

    Some(receive_damage(info, intake, now, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::ai::{BossConfig, EvadeConfig};
    use crate::combat::action::InterruptProfile;
    use crate::combat::damage::DamageType;
    use crate::combat::hurt_volume::HurtVolume;

    fn hit(value: f32) -> DamageInfo {
        DamageInfo::new(Some(Entity::from_raw(9)), Some(Entity::from_raw(1)), value, DamageType::Melee)
    }

    fn intake<'a>(stats: &'a mut StatBlock, combat: &'a mut Combat) -> DamageIntake<'a> {
        DamageIntake {
            stats,
            combat,
            hurt_volumes: None,
            evade: None,
            boss: None,
        }
    }

    #[test]
    fn test_plain_hit_requests_hit_with_light_reaction() {
        let mut stats = StatBlock::new(100.0, 10.0, 0.0);
        let mut combat = Combat::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = receive_damage(hit(30.0), intake(&mut stats, &mut combat), 0.0, &mut rng);

        assert_eq!(outcome.applied, 30.0);
        assert_eq!(outcome.request, Some(StateRequest::Hit));
        assert_eq!(combat.take_state_request(), Some(StateRequest::Hit));
        assert_eq!(combat.last_reaction, HitReaction::Light);
        assert_eq!(combat.last_instigator, Some(Entity::from_raw(9)));
        assert_eq!(stats.hp(), 70.0);
    }

    #[test]
    fn test_lethal_true_damage_requests_death_once() {
        let mut stats = StatBlock::new(50.0, 10.0, 100.0);
        let mut combat = Combat::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lethal = DamageInfo {
            damage_type: DamageType::TrueDamage,
            ..hit(80.0)
        };

        let outcome = receive_damage(lethal.clone(), intake(&mut stats, &mut combat), 0.0, &mut rng);
        assert_eq!(outcome.applied, 50.0);
        assert_eq!(outcome.info.hit_reaction, HitReaction::Dead);
        assert_eq!(outcome.request, Some(StateRequest::Death));
        assert_eq!(outcome.died.and_then(|notice| notice.killer), Some(Entity::from_raw(9)));

        // Повторный удар по трупу: ноль, без второго death notice
        let again = receive_damage(lethal, intake(&mut stats, &mut combat), 0.1, &mut rng);
        assert_eq!(again.applied, 0.0);
        assert!(again.died.is_none());
    }

    #[test]
    fn test_evade_skips_apply_damage() {
        let mut stats = StatBlock::new(100.0, 10.0, 0.0);
        let mut combat = Combat::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let evade = EvadeConfig {
            chance: 1.0,
            cooldown: 3.0,
        };

        let outcome = receive_damage(
            hit(30.0),
            DamageIntake {
                evade: Some(&evade),
                ..intake(&mut stats, &mut combat)
            },
            0.0,
            &mut rng,
        );

        assert!(outcome.evaded);
        assert_eq!(outcome.info.damage_value, 0.0);
        assert_eq!(outcome.request, Some(StateRequest::Dodge));
        assert_eq!(stats.hp(), 100.0);

        // Cooldown: второй удар проходит
        let outcome = receive_damage(
            hit(30.0),
            DamageIntake {
                evade: Some(&evade),
                ..intake(&mut stats, &mut combat)
            },
            1.0,
            &mut rng,
        );
        assert!(!outcome.evaded);
        assert_eq!(stats.hp(), 70.0);
    }

    #[test]
    fn test_uninterruptible_attack_keeps_going() {
        let mut stats = StatBlock::new(100.0, 10.0, 0.0);
        let mut combat = Combat::default();
        combat.attacking = true;
        combat.active_attack = Some(InterruptProfile {
            interruptible: false,
            chance: 1.0,
            chance_on_heavy: 1.0,
        });
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for _ in 0..20 {
            let outcome = receive_damage(hit(1.0), intake(&mut stats, &mut combat), 0.0, &mut rng);
            assert_eq!(outcome.request, None);
        }
        assert_eq!(stats.hp(), 80.0);
    }

    #[test]
    fn test_named_hurt_volume_modifies_damage() {
        let mut stats = StatBlock::new(100.0, 10.0, 0.0);
        let mut combat = Combat::default();
        let parts = HurtVolumeSet::new(vec![HurtVolume::new("Head", 2.0), HurtVolume::new("Body", 1.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let info = DamageInfo {
            hurt_volume: Some("Head".to_string()),
            ..hit(10.0)
        };

        let outcome = receive_damage(
            info,
            DamageIntake {
                hurt_volumes: Some(&parts),
                ..intake(&mut stats, &mut combat)
            },
            0.0,
            &mut rng,
        );

        assert_eq!(outcome.applied, 20.0);
        assert_eq!(combat.last_reaction, HitReaction::Heavy);
    }

    #[test]
    fn test_boss_threshold_requests_phase_change() {
        let mut stats = StatBlock::new(100.0, 10.0, 0.0);
        stats.set_hp_floor(1.0);
        let mut combat = Combat::default();
        let boss = BossPhases::new(&BossConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = receive_damage(
            hit(500.0),
            DamageIntake {
                boss: Some(&boss),
                ..intake(&mut stats, &mut combat)
            },
            0.0,
            &mut rng,
        );

        // HP floor держит босса живым до смены фазы
        assert_eq!(stats.hp(), 1.0);
        assert!(outcome.died.is_none());
        assert_eq!(outcome.request, Some(StateRequest::PhaseChange));
    }

    #[test]
    fn test_tiny_threshold_still_reaches_phase_change() {
        let mut stats = StatBlock::new(100.0, 10.0, 0.0);
        stats.set_hp_floor(1.0);
        let mut combat = Combat::default();
        let boss = BossPhases::new(&BossConfig {
            phase_threshold: 0.001,
            ..Default::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = receive_damage(
            DamageInfo::new(None, Some(Entity::from_raw(1)), 1000.0, DamageType::TrueDamage),
            DamageIntake {
                boss: Some(&boss),
                ..intake(&mut stats, &mut combat)
            },
            0.0,
            &mut rng,
        );

        // 0.001 * 100 < 1 HP floor: сработать может только floor
        assert_eq!(stats.hp(), 1.0);
        assert_eq!(outcome.applied, 99.0);
        assert_eq!(outcome.request, Some(StateRequest::PhaseChange));
    }
}
