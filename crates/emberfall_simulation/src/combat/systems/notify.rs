//! Animation notify → published hit window.

use bevy::prelude::*;

use crate::combat::action::Combat;
use crate::combat::events::{AnimationNotify, NotifyPhase};
use crate::combat::hit_volume::HitVolumeRegistry;

/// Система: AnimationNotify open / close по window id.
///
/// Окно ищется среди опубликованных текущим attack state; устаревший id
/// (state уже вышел) игнорируется.
pub fn process_animation_notifies(
    mut notifies: EventReader<AnimationNotify>,
    mut characters: Query<(&Combat, &mut HitVolumeRegistry)>,
) {
    for notify in notifies.read() {
        let Ok((combat, mut volumes)) = characters.get_mut(notify.entity) else {
            continue;
        };

        let Some(window) = combat.published_window(notify.window_id) else {
            crate::logger::log(&format!(
                "{:?}: notify for stale window #{}, ignored",
                notify.entity, notify.window_id
            ));
            continue;
        };

        match notify.phase {
            NotifyPhase::Open => volumes.open_window(window),
            NotifyPhase::Close => volumes.close_window(window),
        }
    }
}
