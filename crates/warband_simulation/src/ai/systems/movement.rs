//! AI movement systems (Execute фаза состояний).

use std::collections::HashSet;

use bevy::prelude::*;
use tracing::{debug, warn};

use crate::ai::patrol;
use crate::ai::{AIConfig, AiAgent, AiState, CurrentTarget, PatrolCursor, PatrolRoute, RepositionGoal, StateMachine};
use crate::components::{MovementCommand, NavigationStatus, Position};
use crate::error::AiError;
use crate::group::GroupMember;
use crate::DeterministicRng;

/// Система: AI state execution
///
/// Конвертирует AiState → MovementCommand для pathfinding collaborator.
/// MovementCommand пишем только при изменении (иначе Changed<MovementCommand> спамит).
///
/// Деградация:
/// - нет MovementCommand → warn один раз на агента, агент стоит
/// - агент вне navigable surface → движение пропускаем (no-op)
/// - агент под управлением формации → движение решает GroupCoordinator
pub fn ai_state_execution(
    mut agents: Query<
        (
            Entity,
            &Position,
            &AIConfig,
            &StateMachine,
            &CurrentTarget,
            &mut RepositionGoal,
            Option<&mut MovementCommand>,
            Option<&NavigationStatus>,
            Option<&PatrolRoute>,
            Option<&mut PatrolCursor>,
            Option<&GroupMember>,
        ),
        With<AiAgent>,
    >,
    targets: Query<&Position>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut warned: Local<HashSet<Entity>>,
) {
    let delta = time.delta_secs();

    for (entity, position, config, machine, target, mut reposition, movement, nav, route, cursor, member) in
        agents.iter_mut()
    {
        let state = machine.current();
        if state.is_dead() {
            continue;
        }

        if state == AiState::Reposition {
            reposition.remaining -= delta;
        }

        let Some(mut command) = movement else {
            if warned.insert(entity) {
                warn!("{}", AiError::MissingCollaborator { entity, collaborator: "MovementCommand" });
            }
            continue;
        };

        if nav.is_some_and(|status| !status.on_navigable_surface) {
            debug!("{}", AiError::OffNavigableSurface { entity });
            continue;
        }

        if member.is_some_and(|m| m.steered) {
            continue;
        }

        let next = match state {
            AiState::Idle => MovementCommand::Idle,
            AiState::Patrol => match (route, cursor) {
                (Some(route), Some(mut cursor)) => patrol_step(position.0, config, route, &mut cursor, &mut rng.rng),
                _ => MovementCommand::Idle,
            },
            AiState::Chase => match target.get().and_then(|t| targets.get(t).ok()) {
                Some(target_position) => MovementCommand::MoveToPosition {
                    target: target_position.0,
                    speed: config.chase_speed,
                },
                None => MovementCommand::Stop,
            },
            AiState::Attack => MovementCommand::Stop,
            AiState::Reposition => match reposition.point {
                Some(point) => MovementCommand::MoveToPosition {
                    target: point,
                    speed: config.chase_speed,
                },
                None => MovementCommand::Stop,
            },
            AiState::Dead => continue,
        };

        command.set_if_changed(next);
    }
}

/// Система: маршрут заменён целиком → курсор начинает его с начала
pub fn reset_replaced_routes(mut cursors: Query<&mut PatrolCursor, Changed<PatrolRoute>>) {
    for mut cursor in cursors.iter_mut() {
        cursor.set_if_neq(PatrolCursor::default());
    }
}

/// Один шаг PatrolController: прибыли → следующая точка
fn patrol_step(
    position: Vec2,
    config: &AIConfig,
    route: &PatrolRoute,
    cursor: &mut PatrolCursor,
    rng: &mut impl rand::Rng,
) -> MovementCommand {
    let mut destination = patrol::current_destination(route, cursor, rng);

    if destination.is_some_and(|point| position.distance(point) <= route.arrival_tolerance) {
        destination = patrol::advance(route, cursor, rng);
    }

    match destination {
        Some(target) => MovementCommand::MoveToPosition {
            target,
            speed: config.patrol_speed,
        },
        // Once маршрут завершён
        None => MovementCommand::Stop,
    }
}
