//! Movement компоненты: контракт с PathfindingAgent collaborator

use bevy::prelude::*;

/// Команда движения для актора (выполняется pathfinding слоем)
///
/// Архитектура:
/// - ECS система пишет MovementCommand (high-level intent: SetDestination / Stop)
/// - Navigation слой читает и прокладывает путь
/// - Navigation слой пишет результат в NavigationStatus и Position
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub enum MovementCommand {
    /// Стоять на месте (не трогать текущий путь)
    #[default]
    Idle,
    /// Двигаться к позиции со скоростью speed (m/s)
    MoveToPosition { target: Vec2, speed: f32 },
    /// Остановиться немедленно (сбросить velocity)
    Stop,
}

impl MovementCommand {
    /// Записывает новую команду только если она отличается от текущей
    /// (иначе Changed<MovementCommand> спамит navigation слой)
    pub fn set_if_changed(&mut self, next: MovementCommand) -> bool {
        if *self == next {
            return false;
        }
        *self = next;
        true
    }

    pub fn destination(&self) -> Option<Vec2> {
        match self {
            MovementCommand::MoveToPosition { target, .. } => Some(*target),
            _ => None,
        }
    }
}

/// Состояние навигации (пишет PathfindingAgent collaborator, core только читает)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct NavigationStatus {
    pub velocity: Vec2,
    /// Достигли последней цели MoveToPosition
    pub has_arrived: bool,
    /// Актор стоит на проходимой поверхности (false → movement запросы no-op)
    pub on_navigable_surface: bool,
}

impl Default for NavigationStatus {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            has_arrived: true,
            on_navigable_surface: true,
        }
    }
}
