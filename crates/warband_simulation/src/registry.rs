//! AgentRegistry — явный реестр живых AI агентов
//!
//! Регистрация при спавне (Added<AiAgent>), разрегистрация при смерти.
//! Передаётся системам как Resource (никакого глобального singleton).

use std::collections::BTreeMap;

use bevy::prelude::*;
use tracing::debug;

use crate::ai::AiAgent;
use crate::components::{Actor, Position};

/// Запись реестра: последний известный снимок агента
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentRecord {
    pub faction_id: u64,
    pub position: Vec2,
}

/// Реестр агентов (BTreeMap → детерминированный порядок обхода)
#[derive(Resource, Debug, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<Entity, AgentRecord>,
}

impl AgentRegistry {
    /// Возвращает false если агент уже зарегистрирован
    pub fn register(&mut self, entity: Entity, faction_id: u64, position: Vec2) -> bool {
        if self.agents.contains_key(&entity) {
            return false;
        }
        self.agents.insert(entity, AgentRecord { faction_id, position });
        true
    }

    pub fn unregister(&mut self, entity: Entity) -> bool {
        self.agents.remove(&entity).is_some()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.agents.contains_key(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&AgentRecord> {
        self.agents.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &AgentRecord)> {
        self.agents.iter().map(|(entity, record)| (*entity, record))
    }

    pub fn update_position(&mut self, entity: Entity, position: Vec2) {
        if let Some(record) = self.agents.get_mut(&entity) {
            record.position = position;
        }
    }

    /// Союзники (та же фракция) в радиусе, исключая `exclude`
    pub fn allies_within(&self, faction_id: u64, position: Vec2, radius: f32, exclude: Entity) -> Vec<Entity> {
        self.agents
            .iter()
            .filter(|(entity, record)| {
                **entity != exclude
                    && record.faction_id == faction_id
                    && record.position.distance(position) <= radius
            })
            .map(|(entity, _)| *entity)
            .collect()
    }

    /// Ближайший агент, удовлетворяющий предикату
    pub fn nearest(
        &self,
        position: Vec2,
        mut predicate: impl FnMut(Entity, &AgentRecord) -> bool,
    ) -> Option<(Entity, f32)> {
        self.agents
            .iter()
            .filter(|(entity, record)| predicate(**entity, record))
            .map(|(entity, record)| (*entity, record.position.distance(position)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Система: регистрация только что заспавненных агентов
pub fn register_spawned_agents(
    mut registry: ResMut<AgentRegistry>,
    spawned: Query<(Entity, &Actor, &Position), Added<AiAgent>>,
) {
    for (entity, actor, position) in spawned.iter() {
        if registry.register(entity, actor.faction_id, position.0) {
            debug!("registry: agent {:?} registered (faction {})", entity, actor.faction_id);
        }
    }
}

/// Система: синхронизация позиций реестра (для crowding/nearest запросов)
pub fn sync_registry_positions(
    mut registry: ResMut<AgentRegistry>,
    agents: Query<(Entity, &Position), With<AiAgent>>,
) {
    for (entity, position) in agents.iter() {
        registry.update_position(entity, position.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = AgentRegistry::default();
        let agent = Entity::from_raw(1);

        assert!(registry.register(agent, 1, Vec2::ZERO));
        assert!(!registry.register(agent, 1, Vec2::ONE));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(agent).map(|r| r.position), Some(Vec2::ZERO));

        assert!(registry.unregister(agent));
        assert!(!registry.unregister(agent));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_allies_within_excludes_self_and_enemies() {
        let mut registry = AgentRegistry::default();
        let me = Entity::from_raw(1);
        let ally = Entity::from_raw(2);
        let far_ally = Entity::from_raw(3);
        let enemy = Entity::from_raw(4);

        registry.register(me, 1, Vec2::ZERO);
        registry.register(ally, 1, Vec2::new(0.5, 0.0));
        registry.register(far_ally, 1, Vec2::new(10.0, 0.0));
        registry.register(enemy, 2, Vec2::new(0.2, 0.0));

        assert_eq!(registry.allies_within(1, Vec2::ZERO, 1.0, me), vec![ally]);
    }

    #[test]
    fn test_nearest_with_predicate() {
        let mut registry = AgentRegistry::default();
        registry.register(Entity::from_raw(1), 1, Vec2::new(5.0, 0.0));
        registry.register(Entity::from_raw(2), 2, Vec2::new(3.0, 0.0));
        registry.register(Entity::from_raw(3), 2, Vec2::new(9.0, 0.0));

        let nearest = registry.nearest(Vec2::ZERO, |_, record| record.faction_id == 2);
        assert_eq!(nearest.map(|(e, _)| e.index()), Some(2));
    }
}
