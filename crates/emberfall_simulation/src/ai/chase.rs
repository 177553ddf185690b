use crate::components::{flatten, planar_distance};
use crate::fsm::{state_names, ActorContext, CharacterState};

/// Chase: path toward `Combat::target`, Attack once pacing + a candidate allow.
#[derive(Debug, Default)]
pub struct ChaseState;

impl CharacterState for ChaseState {
    fn on_enter(&mut self, ctx: &mut ActorContext) {
        ctx.combat.unlock();
        ctx.motor.following_path = true;
    }

    fn on_update(&mut self, ctx: &mut ActorContext, dt: f32) {
        let Some(target_position) = ctx.target_position() else {
            // Цель потеряна / мертва → Idle (perception найдёт новую)
            ctx.combat.target = None;
            ctx.motor.stop();
            ctx.request_transition(state_names::IDLE);
            return;
        };

        let position = ctx.position();
        let distance = planar_distance(position, target_position);
        let now = ctx.now;

        let Some((can_attack, engage_range)) = ctx
            .brain
            .as_deref()
            .map(|brain| (brain.can_attack(distance, &*ctx.combat, now), brain.engage_range()))
        else {
            crate::logger::log_warning(&format!("{}: Chase without EnemyBrain", ctx.name));
            ctx.request_transition(state_names::IDLE);
            return;
        };

        ctx.face_towards(target_position);

        if can_attack {
            ctx.request_transition(state_names::ATTACK);
            return;
        }

        if distance <= engage_range || !ctx.motor.movement_enabled {
            ctx.motor.following_path = false;
            return;
        }

        ctx.motor.following_path = true;
        let direction = flatten(target_position - position).normalize_or_zero();
        let advance = (ctx.stats.move_speed * dt).min(distance - engage_range);
        ctx.try_step(direction * advance);
    }

    fn on_exit(&mut self, ctx: &mut ActorContext) {
        ctx.motor.following_path = false;
    }

    fn can_transition_to(&self, _next: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;
    use crate::ai::{AttackPacing, AttackSpec, EnemyAttackState, EnemyBrain};
    use crate::animation::ClipLibrary;
    use crate::fsm::context::fixture::TestActor;
    use crate::fsm::StateMachine;
    use crate::states::IdleState;

    fn enemy(target_at: Vec3) -> (TestActor, StateMachine, Entity) {
        let mut actor = TestActor::new(ClipLibrary::standard());
        let slash = AttackSpec {
            max_range: 2.0,
            ..AttackSpec::new("slash", "Slash")
        };
        actor.brain = Some(EnemyBrain::new(
            vec![slash],
            AttackPacing {
                interval: 1.0,
                deviation: 0.0,
            },
        ));

        let player = Entity::from_raw(2);
        actor.add_actor(player, target_at, 0);
        actor.combat.target = Some(player);

        let mut machine = StateMachine::new();
        machine.register_state(state_names::IDLE, Box::new(IdleState));
        machine.register_state(state_names::CHASE, Box::new(ChaseState));
        machine.register_state(state_names::ATTACK, Box::new(EnemyAttackState::default()));
        {
            let mut ctx = actor.ctx();
            machine.change_state_by_name(state_names::IDLE, &mut ctx);
        }
        (actor, machine, player)
    }

    #[test]
    fn test_chase_stops_at_engage_range() {
        let (mut actor, mut machine, _) = enemy(Vec3::new(0.0, 0.0, 10.0));
        if let Some(brain) = actor.brain.as_mut() {
            brain.next_attack_time = 100.0;
        }

        actor.run_until(&mut machine, 0.05);
        assert!(machine.is_in(state_names::CHASE));
        assert!(actor.motor.following_path);

        actor.run_until(&mut machine, 3.0);
        assert!(machine.is_in(state_names::CHASE));
        assert!((actor.transform.translation.z - 8.0).abs() < 1e-3);
        assert!(!actor.motor.following_path);
        assert_eq!(actor.motor.facing, Vec3::Z);
    }

    #[test]
    fn test_dead_target_drops_back_to_idle() {
        let (mut actor, mut machine, player) = enemy(Vec3::new(0.0, 0.0, 10.0));
        actor.run_until(&mut machine, 0.1);
        assert!(machine.is_in(state_names::CHASE));

        if let Some(view) = actor.actors.get_mut(&player) {
            view.alive = false;
        }
        actor.run_until(&mut machine, 0.15);

        assert!(machine.is_in(state_names::IDLE));
        assert_eq!(actor.combat.target, None);
        assert!(!actor.motor.following_path);
    }

    #[test]
    fn test_in_range_and_paced_hands_off_to_attack() {
        let (mut actor, mut machine, _) = enemy(Vec3::new(0.0, 0.0, 1.5));

        // 0.05 → Chase, 0.1 → Attack
        actor.run_until(&mut machine, 0.1);
        assert!(machine.is_in(state_names::ATTACK));
        assert_eq!(actor.clips_played(), vec!["Slash"]);
        assert!(actor.combat.action_locked);

        let next = actor.brain.as_ref().map_or(0.0, |brain| brain.next_attack_time);
        assert!((next - (actor.now + 1.0)).abs() < 1e-6, "next attack at {}", next);

        // Slash 0.9s, потом снова Chase до следующего pacing окна
        actor.run_until(&mut machine, 1.05);
        assert!(machine.is_in(state_names::CHASE));
        assert!(!actor.combat.action_locked);
        assert_eq!(actor.clips_played(), vec!["Slash"]);
    }
}
