//! Ошибки AI core
//!
//! Ни одна из них не фатальна: агент деградирует на текущий тик
//! и самовосстанавливается на следующем.

use bevy::prelude::Entity;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    /// Нет collaborator компонента (например, PathfindingAgent) — движение пропускаем
    #[error("agent {entity:?} has no {collaborator} collaborator")]
    MissingCollaborator {
        entity: Entity,
        collaborator: &'static str,
    },

    /// Цель despawned / мертва — эквивалентно "нет цели"
    #[error("target {0:?} is stale or destroyed")]
    InvalidTarget(Entity),

    /// Запрос движения с/в непроходимую точку — no-op на этот тик
    #[error("agent {entity:?} is off the navigable surface")]
    OffNavigableSurface { entity: Entity },

    /// Количество formation offsets ≠ количество членов группы
    #[error("group {group:?} has {offsets} offsets for {members} members")]
    GroupMembershipInconsistency {
        group: Entity,
        offsets: usize,
        members: usize,
    },
}
