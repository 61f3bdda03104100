//! SpatialQuery collaborator: поиск кандидатов в радиусе
//!
//! Core потребляет только контракт `SpatialQuery`. По умолчанию используется
//! `SpatialIndex` — uniform grid, перестраивается каждый тик из Position/Health.
//! Host может подменить реализацию через ресурс `SpatialService`.

use std::collections::HashMap;

use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::components::{Actor, Health, Position, Targetable};

bitflags! {
    /// Категории целей (фильтр для SpatialQuery)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TargetCategory: u8 {
        const PLAYER = 1 << 0;
        const NPC = 1 << 1;
        const SUMMON = 1 << 2;
        const STRUCTURE = 1 << 3;
    }
}

impl Default for TargetCategory {
    fn default() -> Self {
        TargetCategory::PLAYER | TargetCategory::NPC | TargetCategory::SUMMON
    }
}

/// Результат SpatialQuery: снимок кандидата на момент перестройки индекса
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHit {
    pub entity: Entity,
    pub position: Vec2,
    pub faction_id: u64,
    pub category: TargetCategory,
    pub health_fraction: f32,
    pub alive: bool,
}

/// Контракт SpatialQuery collaborator
pub trait SpatialQuery: Send + Sync + 'static {
    /// Все кандидаты в радиусе `radius` от `center`, чья категория пересекается с `filter`.
    /// Порядок: по возрастанию дистанции, затем по Entity (детерминизм).
    fn query_nearby(&self, center: Vec2, radius: f32, filter: TargetCategory) -> Vec<SpatialHit>;

    /// Снимок конкретной entity (None → despawned / не индексирована)
    fn lookup(&self, entity: Entity) -> Option<SpatialHit>;

    fn has_line_of_sight(&self, _from: Vec2, _to: Vec2) -> bool {
        true
    }
}

/// Host-override: внешняя реализация SpatialQuery (physics broadphase и т.п.)
#[derive(Resource)]
pub struct SpatialService(pub Box<dyn SpatialQuery>);

/// Выбирает активную реализацию: override если есть, иначе встроенный индекс
pub fn active_spatial<'a>(
    index: &'a SpatialIndex,
    service: Option<&'a SpatialService>,
) -> &'a dyn SpatialQuery {
    match service {
        Some(service) => service.0.as_ref(),
        None => index,
    }
}

const DEFAULT_CELL_SIZE: f32 = 8.0;

/// Uniform grid spatial hash (встроенная реализация SpatialQuery)
#[derive(Resource, Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    entries: Vec<SpatialHit>,
    cells: HashMap<IVec2, Vec<usize>>,
    by_entity: HashMap<Entity, usize>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::with_cell_size(DEFAULT_CELL_SIZE)
    }
}

impl SpatialIndex {
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.5),
            entries: Vec::new(),
            cells: HashMap::new(),
            by_entity: HashMap::new(),
        }
    }

    fn cell_of(&self, position: Vec2) -> IVec2 {
        (position / self.cell_size).floor().as_ivec2()
    }

    /// Полная перестройка индекса (раз в тик, до любых AI решений)
    pub fn rebuild(&mut self, hits: impl IntoIterator<Item = SpatialHit>) {
        self.entries.clear();
        self.cells.clear();
        self.by_entity.clear();

        for hit in hits {
            let slot = self.entries.len();
            let cell = self.cell_of(hit.position);
            self.cells.entry(cell).or_default().push(slot);
            self.by_entity.insert(hit.entity, slot);
            self.entries.push(hit);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SpatialQuery for SpatialIndex {
    fn query_nearby(&self, center: Vec2, radius: f32, filter: TargetCategory) -> Vec<SpatialHit> {
        if radius < 0.0 {
            return Vec::new();
        }

        let min = self.cell_of(center - Vec2::splat(radius));
        let max = self.cell_of(center + Vec2::splat(radius));
        let radius_sq = radius * radius;

        let mut found = Vec::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                let Some(slots) = self.cells.get(&IVec2::new(x, y)) else {
                    continue;
                };
                for &slot in slots {
                    let hit = self.entries[slot];
                    if !hit.category.intersects(filter) {
                        continue;
                    }
                    if hit.position.distance_squared(center) <= radius_sq {
                        found.push(hit);
                    }
                }
            }
        }

        found.sort_by(|a, b| {
            a.position
                .distance_squared(center)
                .total_cmp(&b.position.distance_squared(center))
                .then_with(|| a.entity.cmp(&b.entity))
        });
        found
    }

    fn lookup(&self, entity: Entity) -> Option<SpatialHit> {
        self.by_entity.get(&entity).map(|&slot| self.entries[slot])
    }
}

/// Система: перестройка SpatialIndex из актуальных позиций
pub fn rebuild_spatial_index(
    mut index: ResMut<SpatialIndex>,
    actors: Query<(Entity, &Actor, &Position, &Targetable, &Health)>,
) {
    let hits = actors.iter().map(|(entity, actor, position, targetable, health)| SpatialHit {
        entity,
        position: position.0,
        faction_id: actor.faction_id,
        category: targetable.category,
        health_fraction: health.fraction(),
        alive: health.is_alive(),
    });
    index.rebuild(hits);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(index: u32, x: f32, y: f32, category: TargetCategory) -> SpatialHit {
        SpatialHit {
            entity: Entity::from_raw(index),
            position: Vec2::new(x, y),
            faction_id: 1,
            category,
            health_fraction: 1.0,
            alive: true,
        }
    }

    #[test]
    fn test_query_nearby_filters_radius_and_category() {
        let mut index = SpatialIndex::default();
        index.rebuild([
            hit(1, 1.0, 0.0, TargetCategory::PLAYER),
            hit(2, 5.0, 0.0, TargetCategory::NPC),
            hit(3, 30.0, 0.0, TargetCategory::PLAYER),
            hit(4, -2.0, -2.0, TargetCategory::STRUCTURE),
        ]);

        let found = index.query_nearby(Vec2::ZERO, 10.0, TargetCategory::PLAYER | TargetCategory::NPC);
        let entities: Vec<_> = found.iter().map(|h| h.entity.index()).collect();

        // Отсортировано по дистанции, STRUCTURE отфильтрован, дальний за радиусом
        assert_eq!(entities, vec![1, 2]);
    }

    #[test]
    fn test_query_spans_negative_cells() {
        let mut index = SpatialIndex::with_cell_size(4.0);
        index.rebuild([hit(7, -9.0, -9.0, TargetCategory::NPC)]);

        let found = index.query_nearby(Vec2::new(-7.0, -7.0), 3.0, TargetCategory::NPC);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_lookup_after_rebuild() {
        let mut index = SpatialIndex::default();
        index.rebuild([hit(1, 1.0, 1.0, TargetCategory::NPC)]);
        assert!(index.lookup(Entity::from_raw(1)).is_some());

        index.rebuild([]);
        assert!(index.lookup(Entity::from_raw(1)).is_none());
        assert!(index.is_empty());
    }
}
