//! World positioning: Position (top-down 2D)

use bevy::prelude::*;

/// Позиция актора на плоскости (ECS authoritative для AI decisions)
///
/// Navigation слой (pathfinding/physics) двигает актора и пишет сюда результат.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect, Deref, DerefMut)]
#[reflect(Component)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn distance(&self, other: Vec2) -> f32 {
        self.0.distance(other)
    }
}

impl From<Vec2> for Position {
    fn from(value: Vec2) -> Self {
        Self(value)
    }
}
