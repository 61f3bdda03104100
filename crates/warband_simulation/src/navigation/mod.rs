//! Kinematic navigation stand-in (PathfindingAgent collaborator)
//!
//! Прямолинейное движение к MovementCommand цели без pathfinding.
//! Используется headless бинарником и тестами; хост с настоящим navmesh
//! просто не подключает NavigationPlugin и пишет NavigationStatus сам.

use bevy::prelude::*;

use crate::components::{MovementCommand, NavigationStatus, Position};
use crate::SimulationSet;

/// Проходимая область (axis-aligned). Нет ресурса → проходимо всё.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct NavigableArea {
    pub min: Vec2,
    pub max: Vec2,
}

impl NavigableArea {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Параметры kinematic навигатора
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
#[require(NavigationStatus)]
pub struct KinematicNavigator {
    /// Дистанция, на которой считаем что прибыли
    pub arrival_tolerance: f32,
}

impl Default for KinematicNavigator {
    fn default() -> Self {
        Self { arrival_tolerance: 0.05 }
    }
}

/// Один шаг движения к цели. Возвращает (новая позиция, velocity, прибыли).
pub fn step_towards(position: Vec2, target: Vec2, speed: f32, delta: f32, tolerance: f32) -> (Vec2, Vec2, bool) {
    let offset = target - position;
    let distance = offset.length();
    if distance <= tolerance {
        return (position, Vec2::ZERO, true);
    }

    let step = speed.max(0.0) * delta;
    if step >= distance {
        let velocity = if delta > 0.0 { offset / delta } else { Vec2::ZERO };
        return (target, velocity, true);
    }

    let direction = offset / distance;
    (position + direction * step, direction * speed, false)
}

/// Система: исполнение MovementCommand
///
/// - MoveToPosition → шаг к цели (если цель и агент на проходимой области)
/// - Stop → velocity = 0
/// - Idle → не трогаем позицию
pub fn apply_movement_commands(
    mut agents: Query<(&MovementCommand, &KinematicNavigator, &mut Position, &mut NavigationStatus)>,
    area: Option<Res<NavigableArea>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (command, navigator, mut position, mut status) in agents.iter_mut() {
        let on_surface = area.as_deref().is_none_or(|a| a.contains(position.0));
        if status.on_navigable_surface != on_surface {
            status.on_navigable_surface = on_surface;
        }

        match *command {
            MovementCommand::MoveToPosition { target, speed } => {
                let reachable = area.as_deref().is_none_or(|a| a.contains(target));
                if !on_surface || !reachable {
                    status.velocity = Vec2::ZERO;
                    status.has_arrived = false;
                    continue;
                }

                let (next, velocity, arrived) =
                    step_towards(position.0, target, speed, delta, navigator.arrival_tolerance);
                if next != position.0 {
                    position.0 = next;
                }
                status.velocity = velocity;
                status.has_arrived = arrived;
            }
            MovementCommand::Stop | MovementCommand::Idle => {
                if status.velocity != Vec2::ZERO {
                    status.velocity = Vec2::ZERO;
                }
            }
        }
    }
}

/// Navigation Plugin
///
/// SimulationSet::Resolution, до резолва атак: reach проверяется по позициям после шага.
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<KinematicNavigator>().add_systems(
            FixedUpdate,
            apply_movement_commands
                .in_set(SimulationSet::Resolution)
                .before(crate::combat::resolve_attack_intents),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_towards_partial() {
        let (next, velocity, arrived) = step_towards(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0, 0.5, 0.05);

        assert_eq!(next, Vec2::new(1.0, 0.0));
        assert_eq!(velocity, Vec2::new(2.0, 0.0));
        assert!(!arrived);
    }

    #[test]
    fn test_step_towards_arrives_without_overshoot() {
        let (next, _, arrived) = step_towards(Vec2::ZERO, Vec2::new(0.5, 0.0), 2.0, 0.5, 0.05);

        assert_eq!(next, Vec2::new(0.5, 0.0));
        assert!(arrived);
    }

    #[test]
    fn test_navigable_area() {
        let area = NavigableArea::new(Vec2::new(10.0, 10.0), Vec2::new(-10.0, -10.0));

        assert!(area.contains(Vec2::ZERO));
        assert!(area.contains(Vec2::new(10.0, -10.0)));
        assert!(!area.contains(Vec2::new(10.5, 0.0)));
    }
}
