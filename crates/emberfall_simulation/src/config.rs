//! Archetype configuration (RON) + spawn helpers.
//!
//! Враги и игрок описываются данными, не наследованием: `EnemyArchetypeConfig`
//! несёт stats, volumes, attack table, pacing, evade, loot и опциональный
//! `BossConfig`. `spawn_*` собирает компоненты и регистрирует states.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{
    AttackPacing, AttackSpec, BossConfig, BossPhases, ChaseState, ComboStep, EnemyAttackState, EnemyBrain,
    EvadeConfig, Perception, PerceptionConfig, PhaseChangeState, PhaseTwoConfig,
};
use crate::combat::{
    Combat, DedupPolicy, DodgeConfig, ElementType, HitBoxActivationParams, HitReaction, HitVolumeDefinition,
    HitVolumeRegistry, HurtVolume, HurtVolumeSet, DEFAULT_VOLUME,
};
use crate::components::{Actor, Enemy, LootDrop, ItemStack, Motor, Player, Progression, StatBlock, StatBlockConfig, StatCurve};
use crate::fsm::{state_names, StateMachine, StateTimers};
use crate::states::{AttackState, DeathState, DodgeState, HitState, IdleState, JumpConfig, JumpState, MoveState};

/// Faction of the player and its allies.
pub const PLAYER_FACTION: u64 = 1;
/// Default hostile faction.
pub const ENEMY_FACTION: u64 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("archetype '{archetype}' is invalid: {reason}")]
    Invalid { archetype: String, reason: String },
}

impl ConfigError {
    fn invalid(archetype: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            archetype: archetype.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub name: String,
    pub faction_id: u64,
    pub stats: StatBlockConfig,
    pub curve: StatCurve,
    pub hit_volumes: Vec<HitVolumeDefinition>,
    pub hurt_volumes: Vec<HurtVolume>,
    pub combo: Vec<ComboStep>,
    pub skills: Vec<AttackSpec>,
    pub dodge: DodgeConfig,
    pub jump: JumpConfig,
    pub death_clip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyArchetypeConfig {
    pub name: String,
    pub faction_id: u64,
    pub stats: StatBlockConfig,
    pub hit_volumes: Vec<HitVolumeDefinition>,
    pub hurt_volumes: Vec<HurtVolume>,
    pub attacks: Vec<AttackSpec>,
    pub pacing: AttackPacing,
    pub evade: Option<EvadeConfig>,
    pub perception: PerceptionConfig,
    pub dodge: DodgeConfig,
    pub loot: LootDrop,
    pub death_clip: String,
    pub boss: Option<BossConfig>,
}

// === Presets ===

fn combo_step(id: &str, clip: &str, recovery_clip: &str, window: [f32; 2], multiplier: f32) -> ComboStep {
    ComboStep {
        attack: AttackSpec {
            hit_windows: vec![window],
            hit_volumes: vec!["Sword".to_string()],
            activation: HitBoxActivationParams {
                multiplier,
                ..Default::default()
            },
            cooldown_id: String::new(),
            ..AttackSpec::new(id, clip)
        },
        link_window: 0.3,
        link_window_end_offset: 0.05,
        recovery_clip: recovery_clip.to_string(),
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
            faction_id: PLAYER_FACTION,
            stats: StatBlockConfig {
                max_hp: 200.0,
                max_mp: 60.0,
                max_stamina: 100.0,
                attack: 20.0,
                defense: 10.0,
                move_speed: 5.0,
                stamina_regen: 25.0,
            },
            curve: StatCurve {
                hp_per_level: 20.0,
                attack_per_level: 2.0,
                defense_per_level: 1.0,
            },
            hit_volumes: vec![HitVolumeDefinition {
                attach_point: "hand_r".to_string(),
                knockback_strength: 0.5,
                crit_chance: 0.1,
                crit_multiplier: 1.5,
                ..HitVolumeDefinition::named("Sword")
            }],
            hurt_volumes: default_hurt_volumes(),
            combo: vec![
                combo_step("combo1", "Attack1", "Attack1Recover", [0.15, 0.35], 1.0),
                combo_step("combo2", "Attack2", "Attack2Recover", [0.15, 0.35], 1.1),
                combo_step("combo3", "Attack3", "Attack3Recover", [0.25, 0.5], 1.5),
            ],
            skills: vec![AttackSpec {
                hit_windows: vec![[0.2, 0.8]],
                hit_volumes: vec!["Sword".to_string()],
                activation: HitBoxActivationParams {
                    multiplier: 1.8,
                    reaction_override: Some(HitReaction::KnockDown),
                    max_hits_per_target: 2,
                    dedup: DedupPolicy::PerAttack,
                    reset_hit_records: true,
                },
                cooldown: 6.0,
                stamina_cost: 30.0,
                mp_cost: 20.0,
                ..AttackSpec::new("spin", "SkillSpin")
            }],
            dodge: DodgeConfig::default(),
            jump: JumpConfig::default(),
            death_clip: "Death".to_string(),
        }
    }
}

fn default_hurt_volumes() -> Vec<HurtVolume> {
    vec![
        HurtVolume::new("Body", 1.0),
        HurtVolume {
            extents: [0.2, 0.2, 0.2],
            offset: [0.0, 1.7, 0.0],
            ..HurtVolume::new("Head", 1.5)
        },
    ]
}

impl Default for EnemyArchetypeConfig {
    fn default() -> Self {
        Self::grunt()
    }
}

impl EnemyArchetypeConfig {
    /// Melee grunt: slash + lunge.
    pub fn grunt() -> Self {
        Self {
            name: "Grunt".to_string(),
            faction_id: ENEMY_FACTION,
            stats: StatBlockConfig {
                max_hp: 80.0,
                max_mp: 0.0,
                max_stamina: 50.0,
                attack: 12.0,
                defense: 5.0,
                move_speed: 3.5,
                stamina_regen: 10.0,
            },
            hit_volumes: vec![HitVolumeDefinition {
                attach_point: "hand_r".to_string(),
                extents: [0.4, 0.4, 0.8],
                offset: [0.0, 1.0, 1.0],
                knockback_strength: 0.3,
                ..HitVolumeDefinition::named("Claw")
            }],
            hurt_volumes: default_hurt_volumes(),
            attacks: vec![
                AttackSpec {
                    hit_windows: vec![[0.3, 0.5]],
                    hit_volumes: vec!["Claw".to_string()],
                    interrupt_chance: 0.8,
                    interrupt_chance_on_heavy: 1.0,
                    cooldown: 1.0,
                    max_range: 2.0,
                    weight: 3.0,
                    ..AttackSpec::new("slash", "Slash")
                },
                AttackSpec {
                    hit_windows: vec![[0.5, 0.7]],
                    hit_volumes: vec!["Claw".to_string()],
                    activation: HitBoxActivationParams {
                        multiplier: 1.4,
                        ..Default::default()
                    },
                    interrupt_chance: 0.4,
                    interrupt_chance_on_heavy: 0.9,
                    cooldown: 4.0,
                    min_range: 2.0,
                    max_range: 5.0,
                    weight: 1.0,
                    ..AttackSpec::new("lunge", "Lunge")
                },
            ],
            pacing: AttackPacing::default(),
            evade: None,
            perception: PerceptionConfig::default(),
            dodge: DodgeConfig {
                stamina_cost: 0.0,
                ..Default::default()
            },
            loot: LootDrop {
                xp: 40,
                currency: 5,
                items: Vec::new(),
            },
            death_clip: "Death".to_string(),
            boss: None,
        }
    }

    /// Two-phase boss: heavy slam + sweep, evades, fire-weak.
    pub fn warden_boss() -> Self {
        let slam = AttackSpec {
            hit_windows: vec![[0.7, 0.9]],
            hit_volumes: vec!["Maul".to_string()],
            activation: HitBoxActivationParams {
                multiplier: 1.5,
                reaction_override: Some(HitReaction::KnockDown),
                ..Default::default()
            },
            interruptible: false,
            cooldown: 5.0,
            max_range: 3.0,
            weight: 1.0,
            ..AttackSpec::new("slam", "Slam")
        };
        let slash = AttackSpec {
            hit_windows: vec![[0.3, 0.5]],
            hit_volumes: vec!["Maul".to_string()],
            interrupt_chance: 0.3,
            interrupt_chance_on_heavy: 0.6,
            cooldown: 1.5,
            max_range: 3.0,
            weight: 2.0,
            ..AttackSpec::new("slash", "Slash")
        };
        let sweep = AttackSpec {
            hit_windows: vec![[0.3, 0.9]],
            hit_volumes: vec!["Maul".to_string(), "Tail".to_string()],
            activation: HitBoxActivationParams {
                multiplier: 1.2,
                reaction_override: Some(HitReaction::Heavy),
                dedup: DedupPolicy::PerAttack,
                ..Default::default()
            },
            interruptible: false,
            cooldown: 3.0,
            max_range: 4.0,
            weight: 2.0,
            ..AttackSpec::new("sweep", "Sweep")
        };

        Self {
            name: "Warden".to_string(),
            faction_id: ENEMY_FACTION,
            stats: StatBlockConfig {
                max_hp: 400.0,
                max_mp: 0.0,
                max_stamina: 100.0,
                attack: 18.0,
                defense: 20.0,
                move_speed: 3.0,
                stamina_regen: 10.0,
            },
            hit_volumes: vec![
                HitVolumeDefinition {
                    attach_point: "hand_r".to_string(),
                    extents: [0.6, 0.6, 1.2],
                    offset: [0.0, 1.2, 1.5],
                    knockback_strength: 1.5,
                    ..HitVolumeDefinition::named("Maul")
                },
                HitVolumeDefinition {
                    attach_point: "tail_03".to_string(),
                    damage_scale: 0.6,
                    knockback_strength: 2.0,
                    ..HitVolumeDefinition::named("Tail")
                },
            ],
            hurt_volumes: vec![
                HurtVolume {
                    weaknesses: vec![ElementType::Fire],
                    resistances: vec![ElementType::Ice],
                    ..HurtVolume::new("Body", 1.0)
                },
                HurtVolume {
                    extents: [0.3, 0.3, 0.3],
                    offset: [0.0, 2.4, 0.2],
                    weaknesses: vec![ElementType::Fire],
                    ..HurtVolume::new("Head", 1.5)
                },
            ],
            attacks: vec![slam.clone(), slash.clone()],
            pacing: AttackPacing {
                interval: 2.0,
                deviation: 0.5,
            },
            evade: Some(EvadeConfig {
                chance: 0.15,
                cooldown: 6.0,
            }),
            perception: PerceptionConfig {
                aggro_range: 15.0,
                poll_interval: 0.25,
            },
            dodge: DodgeConfig {
                stamina_cost: 0.0,
                distance: 3.0,
                ..Default::default()
            },
            loot: LootDrop {
                xp: 500,
                currency: 250,
                items: vec![ItemStack {
                    item_id: "warden_core".to_string(),
                    count: 1,
                }],
            },
            death_clip: "Death".to_string(),
            boss: Some(BossConfig {
                phase_threshold: 0.5,
                death_clip: "Death".to_string(),
                energize_clip: "Energize".to_string(),
                hold_seconds: 1.0,
                phase_two: PhaseTwoConfig {
                    stats: StatBlockConfig {
                        max_hp: 300.0,
                        max_mp: 0.0,
                        max_stamina: 100.0,
                        attack: 26.0,
                        defense: 10.0,
                        move_speed: 4.5,
                        stamina_regen: 10.0,
                    },
                    attacks: vec![slam, sweep, slash],
                    pacing: AttackPacing {
                        interval: 1.2,
                        deviation: 0.3,
                    },
                },
            }),
        }
    }
}

// === Parsing + validation ===

impl PlayerConfig {
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_stats(&self.name, &self.stats)?;
        if self.combo.is_empty() {
            return Err(ConfigError::invalid(&self.name, "combo has no steps"));
        }
        for step in &self.combo {
            validate_spec(&self.name, &step.attack, &self.hit_volumes)?;
            if step.link_window < 0.0 || step.link_window_end_offset < 0.0 {
                return Err(ConfigError::invalid(
                    &self.name,
                    format!("combo step '{}' has a negative link window", step.attack.id),
                ));
            }
        }
        for skill in &self.skills {
            validate_spec(&self.name, skill, &self.hit_volumes)?;
        }
        validate_dodge(&self.name, &self.dodge)
    }
}

impl EnemyArchetypeConfig {
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_stats(&self.name, &self.stats)?;
        if self.attacks.is_empty() {
            return Err(ConfigError::invalid(&self.name, "attack table is empty"));
        }
        for spec in &self.attacks {
            validate_spec(&self.name, spec, &self.hit_volumes)?;
        }
        if self.pacing.interval < 0.0 {
            return Err(ConfigError::invalid(&self.name, "pacing interval is negative"));
        }
        if self.perception.aggro_range <= 0.0 {
            return Err(ConfigError::invalid(&self.name, "aggro range must be positive"));
        }
        validate_dodge(&self.name, &self.dodge)?;

        if let Some(boss) = &self.boss {
            if !(boss.phase_threshold > 0.0 && boss.phase_threshold < 1.0) {
                return Err(ConfigError::invalid(&self.name, "boss phase threshold must be in (0, 1)"));
            }
            if boss.hold_seconds < 0.0 {
                return Err(ConfigError::invalid(&self.name, "boss hold is negative"));
            }
            validate_stats(&self.name, &boss.phase_two.stats)?;
            for spec in &boss.phase_two.attacks {
                validate_spec(&self.name, spec, &self.hit_volumes)?;
            }
        }
        Ok(())
    }
}

fn validate_stats(archetype: &str, stats: &StatBlockConfig) -> Result<(), ConfigError> {
    if stats.max_hp <= 0.0 {
        return Err(ConfigError::invalid(archetype, "max_hp must be positive"));
    }
    if stats.max_mp < 0.0 || stats.max_stamina < 0.0 || stats.move_speed < 0.0 {
        return Err(ConfigError::invalid(archetype, "resources and move speed must be non-negative"));
    }
    Ok(())
}

fn validate_spec(archetype: &str, spec: &AttackSpec, volumes: &[HitVolumeDefinition]) -> Result<(), ConfigError> {
    let fail = |reason: String| Err(ConfigError::invalid(archetype, format!("attack '{}': {}", spec.id, reason)));

    if spec.play_rate <= 0.0 {
        return fail("play_rate must be positive".to_string());
    }
    if spec.min_range > spec.max_range {
        return fail(format!("min_range {} > max_range {}", spec.min_range, spec.max_range));
    }
    if spec.weight < 0.0 || spec.cooldown < 0.0 {
        return fail("weight and cooldown must be non-negative".to_string());
    }
    if let Some([start, end]) = spec.hit_windows.iter().find(|[start, end]| *start < 0.0 || end < start) {
        return fail(format!("bad hit window [{}, {}]", start, end));
    }
    for name in &spec.hit_volumes {
        let known = name == DEFAULT_VOLUME || volumes.iter().any(|definition| &definition.name == name);
        if !known {
            return fail(format!("unknown hit volume '{}'", name));
        }
    }
    Ok(())
}

fn validate_dodge(archetype: &str, dodge: &DodgeConfig) -> Result<(), ConfigError> {
    if dodge.duration <= 0.0 || dodge.distance < 0.0 {
        return Err(ConfigError::invalid(archetype, "dodge needs a positive duration"));
    }
    Ok(())
}

// === Spawning ===

fn hurt_set(parts: &[HurtVolume]) -> HurtVolumeSet {
    if parts.is_empty() {
        HurtVolumeSet::new(vec![HurtVolume::default()])
    } else {
        HurtVolumeSet::new(parts.to_vec())
    }
}

/// Player character: combo / skill Attack, Move, Jump, Dodge, Hit, Death.
pub fn spawn_player(world: &mut World, config: &PlayerConfig, position: Vec3) -> Entity {
    let mut machine = StateMachine::new();
    machine.register_state(state_names::IDLE, Box::new(IdleState));
    machine.register_state(state_names::MOVE, Box::new(MoveState));
    machine.register_state(state_names::JUMP, Box::new(JumpState::new(config.jump.clone())));
    machine.register_state(
        state_names::ATTACK,
        Box::new(AttackState::new(config.combo.clone(), config.skills.clone())),
    );
    machine.register_state(state_names::DODGE, Box::new(DodgeState::default()));
    machine.register_state(state_names::HIT, Box::new(HitState::default()));
    machine.register_state(state_names::DEATH, Box::new(DeathState::new(config.death_clip.clone())));
    machine.set_initial_state(state_names::IDLE);

    let entity = world
        .spawn((
            Transform::from_translation(position),
            Actor::new(config.faction_id, config.name.clone()),
            Player,
            StatBlock::from_config(&config.stats),
            config.curve,
            Progression::default(),
            Combat::with_dodge(config.dodge.clone()),
            HitVolumeRegistry::new(config.hit_volumes.clone()),
            hurt_set(&config.hurt_volumes),
            Motor::default(),
            machine,
            StateTimers::default(),
        ))
        .id();

    crate::logger::log_info(&format!("🧍 Spawned player '{}' {:?} at {:?}", config.name, entity, position));
    entity
}

/// Enemy (or boss, when `config.boss` is set) from an archetype.
pub fn spawn_enemy(world: &mut World, config: &EnemyArchetypeConfig, position: Vec3) -> Entity {
    let mut machine = StateMachine::new();
    machine.register_state(state_names::IDLE, Box::new(IdleState));
    machine.register_state(state_names::CHASE, Box::new(ChaseState));
    machine.register_state(state_names::ATTACK, Box::new(EnemyAttackState::default()));
    machine.register_state(state_names::DODGE, Box::new(DodgeState::default()));
    machine.register_state(state_names::HIT, Box::new(HitState::default()));
    machine.register_state(state_names::DEATH, Box::new(DeathState::new(config.death_clip.clone())));
    if let Some(boss) = &config.boss {
        machine.register_state(state_names::PHASE_CHANGE, Box::new(PhaseChangeState::new(boss)));
    }
    machine.set_initial_state(state_names::IDLE);

    let mut stats = StatBlock::from_config(&config.stats);
    if config.boss.is_some() {
        // Phase 1 не может умереть: смерть только после смены фазы
        stats.set_hp_floor(1.0);
    }

    let mut entity = world.spawn((
        Transform::from_translation(position),
        Actor::new(config.faction_id, config.name.clone()),
        Enemy,
        stats,
        Combat::with_dodge(config.dodge.clone()),
        HitVolumeRegistry::new(config.hit_volumes.clone()),
        hurt_set(&config.hurt_volumes),
        Motor::default(),
        machine,
        StateTimers::default(),
        EnemyBrain::new(config.attacks.clone(), config.pacing).with_evade(config.evade),
        Perception::new(&config.perception),
        config.loot.clone(),
    ));
    if let Some(boss) = &config.boss {
        entity.insert(BossPhases::new(boss));
    }
    let entity = entity.id();

    crate::logger::log_info(&format!("👹 Spawned '{}' {:?} at {:?}", config.name, entity, position));
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(PlayerConfig::default().validate().is_ok());
        assert!(EnemyArchetypeConfig::grunt().validate().is_ok());
        assert!(EnemyArchetypeConfig::warden_boss().validate().is_ok());
    }

    #[test]
    fn test_unknown_hit_volume_rejected() {
        let mut config = EnemyArchetypeConfig::grunt();
        config.attacks[0].hit_volumes = vec!["Tentacle".to_string()];

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("Tentacle"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut config = EnemyArchetypeConfig::grunt();
        config.attacks[1].min_range = 6.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enemy_from_ron_with_defaults() {
        let source = r#"(
            name: "Skitter",
            stats: (max_hp: 30.0, attack: 6.0),
            attacks: [
                (id: "bite", clip: "Slash", hit_windows: [(0.1, 0.3)], max_range: 1.5, weight: 2.0),
            ],
            evade: Some((chance: 0.5, cooldown: 2.0)),
            loot: (xp: 10),
        )"#;

        let config = EnemyArchetypeConfig::from_ron(source).expect("valid archetype");
        assert_eq!(config.name, "Skitter");
        assert_eq!(config.stats.max_hp, 30.0);
        assert_eq!(config.attacks[0].hit_volumes, vec![DEFAULT_VOLUME.to_string()]);
        assert_eq!(config.evade.map(|evade| evade.chance), Some(0.5));
        assert_eq!(config.loot.xp, 10);
        assert!(config.boss.is_none());
    }

    #[test]
    fn test_bundled_archetypes_match_presets() {
        let grunt = EnemyArchetypeConfig::from_ron(include_str!("../../../assets/archetypes/grunt.ron"))
            .expect("grunt.ron");
        assert_eq!(grunt.attacks, EnemyArchetypeConfig::grunt().attacks);

        let warden = EnemyArchetypeConfig::from_ron(include_str!("../../../assets/archetypes/warden.ron"))
            .expect("warden.ron");
        let boss = warden.boss.expect("boss section");
        assert_eq!(boss.phase_two.attacks.len(), 2);
        assert_eq!(boss.phase_two.attacks[0].activation.dedup, DedupPolicy::PerAttack);
        assert_eq!(warden.loot.items[0].item_id, "warden_core");
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = EnemyArchetypeConfig::from_ron("(name: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_spawn_boss_registers_phase_change() {
        let mut world = World::new();
        let boss = spawn_enemy(&mut world, &EnemyArchetypeConfig::warden_boss(), Vec3::ZERO);

        let machine = world.get::<StateMachine>(boss).expect("machine");
        assert!(machine.has_state(state_names::PHASE_CHANGE));
        assert!(machine.has_state(state_names::CHASE));
        assert!(world.get::<BossPhases>(boss).is_some());
        assert_eq!(world.get::<StatBlock>(boss).map(|stats| stats.hp_floor()), Some(1.0));

        let grunt = spawn_enemy(&mut world, &EnemyArchetypeConfig::grunt(), Vec3::X);
        let machine = world.get::<StateMachine>(grunt).expect("machine");
        assert!(!machine.has_state(state_names::PHASE_CHANGE));
        assert!(world.get::<BossPhases>(grunt).is_none());
    }
}
