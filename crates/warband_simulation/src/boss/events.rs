//! Boss events (fire-and-forget)

use std::sync::Arc;

use bevy::prelude::*;

use crate::boss::telegraph::{TelegraphId, TelegraphShape, TelegraphTiming};

/// Босс перешёл в новую фазу
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChanged {
    pub boss: Entity,
    pub phase: u32,
}

/// Запрос призыва (spawning — забота хоста)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SummonRequested {
    pub boss: Entity,
    pub position: Vec2,
    pub count: u32,
}

/// Telegraph создан (для отрисовки формы)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct TelegraphSpawned {
    pub boss: Entity,
    pub id: TelegraphId,
    pub skill: Arc<str>,
    pub shape: TelegraphShape,
    pub timing: TelegraphTiming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegraphOutcome {
    /// Execute отработал; сколько целей задето
    Executed { hits: usize },
    /// ClearAll / cancel — без урона
    Cancelled,
}

/// Telegraph завершён
#[derive(Event, Debug, Clone, PartialEq)]
pub struct TelegraphResolved {
    pub boss: Entity,
    pub id: TelegraphId,
    pub outcome: TelegraphOutcome,
}
