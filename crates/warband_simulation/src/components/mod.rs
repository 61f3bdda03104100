//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (faction, health, target category)
//! - movement: контракт с pathfinding (MovementCommand, NavigationStatus)
//! - world: позиционирование (Position)
//!
//! AI/group/boss компоненты живут в своих модулях (crate::ai, crate::group, crate::boss).

pub mod actor;
pub mod movement;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
pub use world::*;
