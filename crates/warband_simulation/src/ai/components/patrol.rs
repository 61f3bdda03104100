//! Patrol components: маршрут и курсор по нему.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Режим обхода маршрута
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatrolMode {
    /// После последней точки — снова первая
    #[default]
    Loop,
    /// Разворот на концах
    PingPong,
    /// Случайная точка в радиусе вокруг anchor (waypoints[0])
    RandomAroundAnchor,
    /// Остановка на последней точке
    Once,
}

/// Маршрут патруля
///
/// Waypoints копируются при назначении и не мутируются пока агент патрулирует:
/// публичного API для изменения точек нет, маршрут заменяется только целиком.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct PatrolRoute {
    waypoints: Vec<Vec2>,
    pub mode: PatrolMode,
    /// Радиус для RandomAroundAnchor
    pub anchor_radius: f32,
    /// Дистанция на которой точка считается достигнутой
    pub arrival_tolerance: f32,
}

impl PatrolRoute {
    pub fn new(waypoints: &[Vec2], mode: PatrolMode) -> Self {
        Self {
            waypoints: waypoints.to_vec(),
            mode,
            anchor_radius: 6.0,
            arrival_tolerance: 0.5,
        }
    }

    pub fn random_around(anchor: Vec2, radius: f32) -> Self {
        Self {
            waypoints: vec![anchor],
            mode: PatrolMode::RandomAroundAnchor,
            anchor_radius: radius,
            arrival_tolerance: 0.5,
        }
    }

    pub fn with_arrival_tolerance(mut self, tolerance: f32) -> Self {
        self.arrival_tolerance = tolerance.max(0.01);
        self
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn anchor(&self) -> Option<Vec2> {
        self.waypoints.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Позиция агента на маршруте
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PatrolCursor {
    pub index: usize,
    /// +1 / -1 для PingPong
    pub direction: i8,
    pub destination: Option<Vec2>,
    /// Once-маршрут пройден
    pub finished: bool,
}

impl Default for PatrolCursor {
    fn default() -> Self {
        Self {
            index: 0,
            direction: 1,
            destination: None,
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_takes_defensive_copy() {
        let mut source = vec![Vec2::ZERO, Vec2::X];
        let route = PatrolRoute::new(&source, PatrolMode::Loop);

        source.push(Vec2::Y);
        source[0] = Vec2::splat(99.0);

        assert_eq!(route.waypoints(), &[Vec2::ZERO, Vec2::X]);
    }
}
