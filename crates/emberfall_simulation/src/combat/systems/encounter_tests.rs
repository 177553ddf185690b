//! Tests for wave tracking.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::ai::{BossConfig, BossPhases};
    use crate::combat::systems::{counts_as_alive, track_encounter, EncounterTracker};
    use crate::combat::{DamageInfo, DamageType, WaveCleared};
    use crate::components::{Dead, Enemy, StatBlock};
    use crate::{read_events, run_fixed_ticks};

    fn encounter_app() -> App {
        let mut app = App::new();
        app.insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<EncounterTracker>()
            .add_event::<WaveCleared>()
            .add_systems(FixedUpdate, track_encounter);
        app
    }

    fn kill(stats: &mut StatBlock) {
        let mut info = DamageInfo::new(None, None, 10_000.0, DamageType::TrueDamage);
        stats.apply_damage(&mut info);
    }

    #[test]
    fn test_inactive_tracker_never_clears() {
        let mut app = encounter_app();
        run_fixed_ticks(&mut app, 3);

        assert!(read_events::<WaveCleared>(&app).is_empty());
    }

    #[test]
    fn test_wave_clears_once_when_all_enemies_dead() {
        let mut app = encounter_app();
        let a = app.world_mut().spawn((Enemy, StatBlock::new(30.0, 5.0, 0.0))).id();
        let b = app.world_mut().spawn((Enemy, StatBlock::new(30.0, 5.0, 0.0))).id();
        let wave = app.world_mut().resource_mut::<EncounterTracker>().begin_wave();
        assert_eq!(wave, 1);

        kill(&mut app.world_mut().get_mut::<StatBlock>(a).expect("stats"));
        run_fixed_ticks(&mut app, 2);
        assert!(read_events::<WaveCleared>(&app).is_empty());

        // Dead marker тоже считается: враг исключается из query
        app.world_mut().entity_mut(b).insert(Dead);
        run_fixed_ticks(&mut app, 5);

        let cleared = read_events::<WaveCleared>(&app);
        assert_eq!(cleared, vec![WaveCleared { wave: 1 }]);
        assert!(!app.world().resource::<EncounterTracker>().is_active());
    }

    #[test]
    fn test_next_wave_has_its_own_number() {
        let mut app = encounter_app();
        app.world_mut().resource_mut::<EncounterTracker>().begin_wave();
        run_fixed_ticks(&mut app, 1);

        app.world_mut().spawn((Enemy, StatBlock::new(30.0, 5.0, 0.0)));
        app.world_mut().resource_mut::<EncounterTracker>().begin_wave();
        run_fixed_ticks(&mut app, 1);

        let cleared = read_events::<WaveCleared>(&app);
        assert_eq!(cleared, vec![WaveCleared { wave: 1 }]);
        assert_eq!(app.world().resource::<EncounterTracker>().wave(), 2);
    }

    #[test]
    fn test_boss_in_transition_counts_as_alive() {
        let mut phases = BossPhases::new(&BossConfig::default());
        let mut stats = StatBlock::new(100.0, 10.0, 0.0);
        kill(&mut stats);

        assert!(!counts_as_alive(&stats, Some(&phases)));
        phases.in_transition = true;
        assert!(counts_as_alive(&stats, Some(&phases)));
        assert!(!counts_as_alive(&stats, None));
    }
}
