//! AI reaction systems (damage).

use bevy::prelude::*;
use tracing::info;

use crate::ai::{AiAgent, CurrentTarget, StateMachine, TargetChanged};
use crate::combat::DamageDealt;
use crate::components::Actor;

/// System: AI реакция на полученный урон
///
/// Ударили в спину, а цели нет → атакующий становится целью.
/// FSM перейдёт в Chase на следующем тике (селектор удержит цель в chase radius).
pub fn react_to_damage(
    mut damage_events: EventReader<DamageDealt>,
    mut agents: Query<(&Actor, &StateMachine, &mut CurrentTarget), With<AiAgent>>,
    attackers: Query<&Actor>,
    mut target_events: EventWriter<TargetChanged>,
) {
    for damage_event in damage_events.read() {
        let Ok((victim, machine, mut target)) = agents.get_mut(damage_event.target) else {
            continue;
        };
        if machine.is_dead() || target.get().is_some() {
            continue;
        }

        let Ok(attacker) = attackers.get(damage_event.attacker) else {
            continue;
        };
        // Friendly fire игнорируем
        if !victim.is_hostile_to(attacker.faction_id) {
            continue;
        }

        target.0 = Some(damage_event.attacker);
        target_events.write(TargetChanged {
            agent: damage_event.target,
            target: Some(damage_event.attacker),
        });
        info!(
            "🔥 {:?} hit by {:?} → target acquired",
            damage_event.target, damage_event.attacker
        );
    }
}
