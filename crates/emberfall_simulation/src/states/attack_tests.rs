//! Tests for the player Attack state (combo, recovery cancel, skills).

#[cfg(test)]
mod tests {
    use crate::animation::ClipLibrary;
    use crate::combat::{ActionKind, Combat, HitVolumeRegistry};
    use crate::components::StatBlock;
    use crate::config::PlayerConfig;
    use crate::fsm::context::fixture::TestActor;
    use crate::fsm::{state_names, StateMachine};
    use crate::states::{AttackState, DeathState, DodgeState, HitState, IdleState, MoveState};

    /// Player with the default combo (Attack1 0.6s, link window 0.3..0.05 before the end).
    fn player() -> (TestActor, StateMachine) {
        let config = PlayerConfig::default();
        let mut actor = TestActor::new(ClipLibrary::standard());
        actor.stats = StatBlock::from_config(&config.stats);
        actor.hit_volumes = HitVolumeRegistry::new(config.hit_volumes.clone());
        actor.combat = Combat::with_dodge(config.dodge.clone());

        let mut machine = StateMachine::new();
        machine.register_state(state_names::IDLE, Box::new(IdleState));
        machine.register_state(state_names::MOVE, Box::new(MoveState));
        machine.register_state(
            state_names::ATTACK,
            Box::new(AttackState::new(config.combo.clone(), config.skills.clone())),
        );
        machine.register_state(state_names::DODGE, Box::new(DodgeState::default()));
        machine.register_state(state_names::HIT, Box::new(HitState::default()));
        machine.register_state(state_names::DEATH, Box::new(DeathState::default()));
        {
            let mut ctx = actor.ctx();
            machine.change_state_by_name(state_names::IDLE, &mut ctx);
        }
        (actor, machine)
    }

    #[test]
    fn test_single_attack_recovers_to_idle() {
        let (mut actor, mut machine) = player();
        assert!(actor.combat.request_action(ActionKind::NormalAttack));

        // Idle забирает action на первом тике
        actor.run_until(&mut machine, 0.05);
        assert!(machine.is_in(state_names::ATTACK));
        assert!(actor.combat.action_locked);
        assert!(actor.combat.attacking);
        assert_eq!(actor.clips_played(), vec!["Attack1"]);

        // Hit window [0.15, 0.35] от начала клипа
        actor.run_until(&mut machine, 0.25);
        assert!(actor.hit_volumes.is_active("Sword"));
        actor.run_until(&mut machine, 0.5);
        assert!(!actor.hit_volumes.is_active("Sword"));

        // Step закончился: recovery, actions уже разблокированы
        actor.run_until(&mut machine, 0.75);
        assert!(machine.is_in(state_names::ATTACK));
        assert!(!actor.combat.action_locked);
        assert!(!actor.combat.attacking);

        actor.run_until(&mut machine, 1.1);
        assert!(machine.is_in(state_names::IDLE));
        assert_eq!(actor.clips_played(), vec!["Attack1", "Attack1Recover"]);
    }

    #[test]
    fn test_input_in_link_window_chains_next_step() {
        let (mut actor, mut machine) = player();
        actor.combat.request_action(ActionKind::NormalAttack);
        actor.run_until(&mut machine, 0.45);

        // Locked, но NormalAttack буферизуется
        assert!(actor.combat.request_action(ActionKind::NormalAttack));
        actor.run_until(&mut machine, 0.75);

        assert!(machine.is_in(state_names::ATTACK));
        assert!(actor.combat.action_locked);
        assert_eq!(actor.clips_played(), vec!["Attack1", "Attack2"]);
    }

    #[test]
    fn test_input_before_link_window_is_dropped() {
        let (mut actor, mut machine) = player();
        actor.combat.request_action(ActionKind::NormalAttack);
        actor.run_until(&mut machine, 0.1);

        assert!(actor.combat.request_action(ActionKind::NormalAttack));
        actor.run_until(&mut machine, 0.15);
        assert_eq!(actor.combat.pending_actions(), 0);

        actor.run_until(&mut machine, 1.2);
        assert!(machine.is_in(state_names::IDLE));
        assert_eq!(actor.clips_played(), vec!["Attack1", "Attack1Recover"]);
    }

    #[test]
    fn test_full_combo_ends_in_last_recovery() {
        let (mut actor, mut machine) = player();
        actor.combat.request_action(ActionKind::NormalAttack);

        // Жмём каждые 0.1s до 1.8s: в link window каждого шага попадает нажатие
        for i in 0..19 {
            actor.combat.request_action(ActionKind::NormalAttack);
            actor.run_until(&mut machine, 0.05 + 0.1 * (i + 1) as f64);
        }
        actor.run_until(&mut machine, 3.0);

        assert!(machine.is_in(state_names::IDLE));
        assert_eq!(
            actor.clips_played(),
            vec!["Attack1", "Attack2", "Attack3", "Attack3Recover"]
        );
    }

    #[test]
    fn test_dodge_rejected_mid_step_but_cancels_recovery() {
        let (mut actor, mut machine) = player();
        actor.combat.request_action(ActionKind::NormalAttack);
        actor.run_until(&mut machine, 0.3);

        // Locked: dodge не попадает в буфер
        assert!(!actor.combat.request_action(ActionKind::Dodge));

        actor.run_until(&mut machine, 0.75);
        assert!(actor.combat.request_action(ActionKind::Dodge));
        actor.run_until(&mut machine, 0.8);

        assert!(machine.is_in(state_names::DODGE));
        assert_eq!(actor.stats.stamina(), 75.0);
        assert_eq!(actor.clips_played().last().copied(), Some("Dodge"));
        assert!(!actor.hurt_volumes.as_ref().is_some_and(|set| set.any_enabled()));
    }

    #[test]
    fn test_dodge_behind_buffered_attack_still_cancels_recovery() {
        let (mut actor, mut machine) = player();
        actor.combat.request_action(ActionKind::NormalAttack);
        actor.run_until(&mut machine, 0.75);

        // Атака в буфере первой, dodge за ней
        assert!(actor.combat.request_action(ActionKind::NormalAttack));
        assert!(actor.combat.request_action(ActionKind::Dodge));
        actor.run_until(&mut machine, 0.8);

        assert!(machine.is_in(state_names::DODGE));
        assert_eq!(actor.stats.stamina(), 75.0);
        assert_eq!(actor.combat.pending_actions(), 0);
    }

    #[test]
    fn test_attack_gate_accepts_hit_only() {
        let (mut actor, mut machine) = player();
        actor.combat.request_action(ActionKind::NormalAttack);
        actor.run_until(&mut machine, 0.2);

        let mut ctx = actor.ctx();
        assert!(!machine.change_state_by_name(state_names::IDLE, &mut ctx));
        assert!(!machine.change_state_by_name(state_names::DODGE, &mut ctx));
        assert!(machine.change_state_by_name(state_names::HIT, &mut ctx));
        drop(ctx);

        // Exit разоружает всё
        assert!(!actor.hit_volumes.any_active());
        assert!(!actor.combat.attacking);
    }

    #[test]
    fn test_skill_pays_once_and_respects_cooldown() {
        let (mut actor, mut machine) = player();
        actor.combat.request_action(ActionKind::Skill("spin".to_string()));
        actor.run_until(&mut machine, 0.05);

        assert!(machine.is_in(state_names::ATTACK));
        assert_eq!(actor.clips_played(), vec!["SkillSpin"]);
        assert_eq!(actor.stats.stamina(), 70.0);
        assert_eq!(actor.stats.mp(), 40.0);
        assert!(actor.combat.cooldown_remaining("spin", actor.now) > 5.0);

        actor.run_until(&mut machine, 1.2);
        assert!(machine.is_in(state_names::IDLE));

        // Второй раз: cooldown не готов, ничего не списывается
        actor.combat.request_action(ActionKind::Skill("spin".to_string()));
        actor.run_until(&mut machine, 1.25);

        assert!(machine.is_in(state_names::IDLE));
        assert_eq!(actor.clips_played(), vec!["SkillSpin"]);
        assert_eq!(actor.stats.stamina(), 70.0);
        assert_eq!(actor.stats.mp(), 40.0);
    }

    #[test]
    fn test_unaffordable_skill_spends_nothing() {
        let (mut actor, mut machine) = player();
        actor.stats.set_mp(10.0);
        actor.combat.request_action(ActionKind::Skill("spin".to_string()));
        actor.run_until(&mut machine, 0.05);

        assert!(machine.is_in(state_names::IDLE));
        assert!(actor.clips_played().is_empty());
        assert_eq!(actor.stats.stamina(), 100.0);
        assert_eq!(actor.stats.mp(), 10.0);
        assert!(actor.combat.is_cooldown_ready("spin", actor.now));
    }
}
