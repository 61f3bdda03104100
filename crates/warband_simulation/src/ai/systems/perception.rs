//! Perception: выбор цели через SpatialQuery + общая цель группы.

use bevy::prelude::*;
use tracing::debug;

use crate::ai::target_selector::{select_target, SelectionParams, TargetCandidate};
use crate::ai::{AIConfig, AiAgent, CurrentTarget, PerceptionThrottle, StateMachine, TargetChanged};
use crate::components::{Actor, Position};
use crate::group::{Group, GroupMember};
use crate::spatial::{active_spatial, SpatialHit, SpatialIndex, SpatialService};

/// Система: target acquisition (TargetSelector поверх SpatialQuery)
///
/// Performance mode: при perception_interval > 0 полный пересчёт идёт не каждый тик.
/// В пропущенных тиках только инвалидируем мёртвую/despawned цель.
pub fn acquire_targets(
    mut agents: Query<
        (
            Entity,
            &Actor,
            &Position,
            &AIConfig,
            &StateMachine,
            &mut CurrentTarget,
            &mut PerceptionThrottle,
            Option<&GroupMember>,
        ),
        With<AiAgent>,
    >,
    groups: Query<&Group>,
    index: Res<SpatialIndex>,
    service: Option<Res<SpatialService>>,
    time: Res<Time<Fixed>>,
    mut target_events: EventWriter<TargetChanged>,
) {
    let delta = time.delta_secs();
    let spatial = active_spatial(&index, service.as_deref());

    for (entity, actor, position, config, machine, mut target, mut throttle, member) in agents.iter_mut() {
        if machine.is_dead() {
            continue;
        }

        let to_candidate = |hit: SpatialHit| TargetCandidate {
            entity: hit.entity,
            distance: position.distance(hit.position),
            health_fraction: hit.health_fraction,
            alive: hit.alive,
            valid: hit.entity != entity
                && actor.is_hostile_to(hit.faction_id)
                && hit.category.intersects(config.target_categories),
        };

        // Despawned цель → lookup None → "нет цели" (InvalidTarget не фатален)
        let current = target.get().and_then(|t| spatial.lookup(t)).map(to_candidate);

        let next = if throttle.tick(delta, config.perception_interval) {
            let candidates: Vec<TargetCandidate> = spatial
                .query_nearby(position.0, config.detection_radius, config.target_categories)
                .into_iter()
                .map(to_candidate)
                .collect();

            let group_target = member
                .and_then(|m| groups.get(m.group).ok())
                .and_then(|group| group.shared_target())
                .and_then(|shared| spatial.lookup(shared))
                .map(to_candidate);

            select_target(current, &candidates, group_target, &SelectionParams::from(config))
        } else {
            current.filter(|c| c.alive && c.valid).map(|c| c.entity)
        };

        if next != target.get() {
            target.0 = next;
            target_events.write(TargetChanged { agent: entity, target: next });
            debug!("🎯 {:?} target → {:?}", entity, next);
        }
    }
}
