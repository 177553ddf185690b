//! Action routing: input layer / AI scripts → Combat input buffer.

use bevy::prelude::*;

use crate::combat::action::Combat;
use crate::combat::events::ActionRequest;
use crate::components::Dead;

/// Система: ActionRequest → `Combat::request_action`.
///
/// Отказ (lock, полный буфер) молча отбрасывает запрос, только debug лог.
pub fn route_action_requests(mut requests: EventReader<ActionRequest>, mut combatants: Query<&mut Combat, Without<Dead>>) {
    for request in requests.read() {
        let Ok(mut combat) = combatants.get_mut(request.entity) else {
            continue;
        };

        if !combat.request_action(request.action.clone()) {
            crate::logger::log(&format!("{:?}: {:?} rejected (locked / buffer full)", request.entity, request.action));
        }
    }
}
