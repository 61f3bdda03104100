//! Базовые компоненты акторов: Actor, Health, Targetable

use bevy::prelude::*;

use crate::spatial::TargetCategory;

/// Актор (NPC, игрок, босс) — базовый компонент для живых существ
///
/// Автоматически добавляет Health, Position, Targetable через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, crate::components::Position, Targetable)]
pub struct Actor {
    /// Stable ID фракции (враждебность = разные faction_id)
    pub faction_id: u64,
}

impl Actor {
    pub fn new(faction_id: u64) -> Self {
        Self { faction_id }
    }

    pub fn is_hostile_to(&self, other_faction: u64) -> bool {
        self.faction_id != other_faction
    }
}

/// Здоровье актора (Character collaborator)
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Доля оставшегося HP в [0, 1] (max == 0 считаем мёртвым)
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.current as f32 / self.max as f32
    }
}

/// Категория цели для SpatialQuery фильтра
#[derive(Component, Debug, Clone, Copy)]
pub struct Targetable {
    pub category: TargetCategory,
}

impl Default for Targetable {
    fn default() -> Self {
        Self {
            category: TargetCategory::NPC,
        }
    }
}

impl Targetable {
    pub fn new(category: TargetCategory) -> Self {
        Self { category }
    }
}
