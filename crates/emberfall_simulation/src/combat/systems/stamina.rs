//! Stamina regeneration.

use bevy::prelude::*;

use crate::components::{Dead, StatBlock};

/// Система: regenerate stamina для всех живых
///
/// Rate берётся из `StatBlock::stamina_regen` (units/sec).
pub fn regenerate_stamina(mut query: Query<&mut StatBlock, Without<Dead>>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut stats in query.iter_mut() {
        stats.regenerate_stamina(delta);
    }
}
