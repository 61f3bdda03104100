//! GroupCoordinator systems
//!
//! Порядок внутри Coordination:
//! 1. prune_group_members — мёртвые/despawned выходят из группы (offsets пересчитаны)
//! 2. coordinate_groups — угроза у центроида → Engage / Release директивы
//! 3. advance_group_anchor — anchor идёт по маршруту группы (или к цели при hold_in_combat)
//! 4. steer_formation — члены вне боя идут в свой слот anchor + offset

use bevy::prelude::*;
use tracing::{debug, info, warn};

use crate::ai::patrol;
use crate::ai::{AIConfig, AiAgent, AiState, CurrentTarget, Directive, PatrolCursor, PatrolRoute, StateMachine};
use crate::components::{MovementCommand, Position};
use crate::group::coordinator::{centroid, Group, GroupMember};
use crate::spatial::{active_spatial, SpatialIndex, SpatialService, TargetCategory};
use crate::DeterministicRng;

/// Шаг к точке не дальше `step`
fn move_towards(from: Vec2, to: Vec2, step: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= step || distance <= f32::EPSILON {
        to
    } else {
        from + delta / distance * step
    }
}

/// Система: выход мёртвых/despawned членов из группы
pub fn prune_group_members(
    mut commands: Commands,
    mut groups: Query<(Entity, &mut Group)>,
    agents: Query<&StateMachine>,
) {
    for (group_entity, mut group) in groups.iter_mut() {
        let gone: Vec<Entity> = group
            .members()
            .iter()
            .copied()
            .filter(|member| agents.get(*member).map_or(true, |machine| machine.is_dead()))
            .collect();

        for member in gone {
            group.remove_member(member);
            if let Ok(mut entity_commands) = commands.get_entity(member) {
                entity_commands.remove::<GroupMember>();
            }
            debug!("group {:?}: member {:?} left ({} remain)", group_entity, member, group.members().len());
        }
    }
}

/// Система: обнаружение общей угрозы вокруг центроида
///
/// - нашли цель, группа не в бою → Engage всем членам, in_combat = true
/// - в бою, цель сменилась → Engage на новую
/// - в бою, целей нет → Release всем, in_combat = false
///
/// Кандидаты фильтруются так же, как у членов: враждебная фракция и
/// объединённая маска `target_categories` живых членов. Если общую цель
/// не держит ни один живой член, она снимается и выбирается следующая.
pub fn coordinate_groups(
    mut groups: Query<(Entity, &mut Group)>,
    mut members: Query<(&Position, &mut StateMachine, Option<&AIConfig>, Option<&CurrentTarget>), With<AiAgent>>,
    index: Res<SpatialIndex>,
    service: Option<Res<SpatialService>>,
) {
    let spatial = active_spatial(&index, service.as_deref());

    for (group_entity, mut group) in groups.iter_mut() {
        if let Err(error) = group.ensure_offsets(group_entity) {
            warn!("{}", error);
        }

        let mut positions = Vec::with_capacity(group.members().len());
        let mut categories = TargetCategory::empty();
        let mut holders = 0usize;
        let mut holding = false;
        for (position, machine, config, target) in group.members().iter().filter_map(|m| members.get(*m).ok()) {
            if machine.is_dead() {
                continue;
            }
            positions.push(position.0);
            categories |= config.map_or_else(TargetCategory::default, |c| c.target_categories);
            if let Some(target) = target {
                holders += 1;
                holding |= target.get().is_some() && target.get() == group.shared_target();
            }
        }

        let Some(center) = centroid(positions) else {
            continue;
        };

        let in_range: Vec<Entity> = spatial
            .query_nearby(center, group.config.detection_radius, categories)
            .into_iter()
            .filter(|hit| hit.alive && hit.faction_id != group.faction_id && !group.members().contains(&hit.entity))
            .map(|hit| hit.entity)
            .collect();

        // Отвергнутая цель забывается, когда уходит из радиуса
        group.retain_dismissed(&in_range);

        if let Some(shared) = group.shared_target() {
            if group.in_combat() && holders > 0 && !holding && in_range.contains(&shared) {
                debug!("group {:?}: no member holds {:?} → dismissed", group_entity, shared);
                group.dismiss(shared);
            }
        }

        let hostiles: Vec<Entity> = in_range
            .into_iter()
            .filter(|hit| !group.dismissed().contains(hit))
            .collect();

        // Текущая общая цель липкая, пока она в радиусе
        let target = group
            .shared_target()
            .filter(|current| hostiles.contains(current))
            .or_else(|| hostiles.first().copied());

        let directive = match target {
            Some(target) if !group.in_combat() || group.shared_target() != Some(target) => {
                group.engage(target);
                info!("⚔️ group {:?} engages {:?}", group_entity, target);
                Directive::Engage(target)
            }
            None if group.in_combat() => {
                group.release();
                info!("group {:?} out of combat → members released", group_entity);
                Directive::Release
            }
            _ => continue,
        };

        for member in group.members() {
            if let Ok((_, mut machine, _, _)) = members.get_mut(*member) {
                machine.issue(directive);
            }
        }
    }
}

/// Система: движение anchor группы
pub fn advance_group_anchor(
    mut groups: Query<(&mut Group, Option<&PatrolRoute>, Option<&mut PatrolCursor>)>,
    targets: Query<&Position>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut group, route, cursor) in groups.iter_mut() {
        let step = group.config.move_speed * delta;

        if group.in_combat() {
            if !group.config.hold_in_combat {
                continue;
            }
            let Some(target_position) = group.shared_target().and_then(|t| targets.get(t).ok()) else {
                continue;
            };
            // Строй подходит к цели на дистанцию spacing
            if group.anchor.distance(target_position.0) > group.config.spacing {
                group.anchor = move_towards(group.anchor, target_position.0, step);
            }
            continue;
        }

        let (Some(route), Some(mut cursor)) = (route, cursor) else {
            continue;
        };

        let mut destination = patrol::current_destination(route, &mut cursor, &mut rng.rng);
        if destination.is_some_and(|point| group.anchor.distance(point) <= route.arrival_tolerance) {
            destination = patrol::advance(route, &mut cursor, &mut rng.rng);
        }
        if let Some(point) = destination {
            group.anchor = move_towards(group.anchor, point, step);
        }
    }
}

/// Система: члены вне боя (или в Chase при hold_in_combat) идут в слот формации
pub fn steer_formation(
    groups: Query<&Group>,
    mut members: Query<(Entity, &StateMachine, &mut GroupMember, Option<&mut MovementCommand>)>,
) {
    for (entity, machine, mut membership, movement) in members.iter_mut() {
        let Ok(group) = groups.get(membership.group) else {
            if membership.steered {
                membership.steered = false;
            }
            continue;
        };

        let steered = match machine.current() {
            AiState::Idle | AiState::Patrol => true,
            AiState::Chase => group.in_combat() && group.config.hold_in_combat,
            _ => false,
        };
        if membership.steered != steered {
            membership.steered = steered;
        }
        if !steered {
            continue;
        }

        let (Some(slot), Some(mut command)) = (group.slot_position(entity), movement) else {
            continue;
        };
        command.set_if_changed(MovementCommand::MoveToPosition {
            target: slot,
            speed: group.config.move_speed,
        });
    }
}
