//! Skill descriptors: неизменяемые шаблоны атак босса + runtime слоты

use std::sync::Arc;

use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Типы ответа игрока, которые атака допускает
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CounterplaySet: u8 {
        const DODGE = 1 << 0;
        const BLOCK = 1 << 1;
        const INTERRUPT = 1 << 2;
        const POSITIONING = 1 << 3;
        const RESOURCE = 1 << 4;
        const COOPERATIVE = 1 << 5;

        /// "Skill-based" ответы (требуются политикой валидатора)
        const SKILL_BASED = Self::DODGE.bits() | Self::POSITIONING.bits();
    }
}

impl CounterplaySet {
    /// Количество отдельных типов ответа
    pub fn option_count(self) -> u32 {
        self.bits().count_ones()
    }
}

/// Категория атаки → форма telegraph + follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    MeleeCleave,
    LinearCharge,
    Summon,
    AreaDenial,
    Shield,
    Reposition,
    Projectile,
}

impl SkillCategory {
    /// Threat type по умолчанию (если шаблон не задал явно)
    pub fn default_threat_type(self) -> ThreatType {
        match self {
            SkillCategory::MeleeCleave | SkillCategory::LinearCharge | SkillCategory::Projectile => {
                ThreatType::Immediate
            }
            SkillCategory::AreaDenial | SkillCategory::Summon => ThreatType::Persistent,
            SkillCategory::Shield | SkillCategory::Reposition => ThreatType::Delayed,
        }
    }
}

/// Как угроза атаки разворачивается во времени (множитель веса от threat level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    Immediate,
    Persistent,
    Delayed,
}

/// Допустимый диапазон дистанции до цели
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBand {
    pub min: f32,
    pub max: f32,
}

impl RangeBand {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, distance: f32) -> bool {
        distance >= self.min && distance <= self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min >= 0.0 && self.min <= self.max
    }
}

impl Default for RangeBand {
    fn default() -> Self {
        Self::new(0.0, 6.0)
    }
}

/// Шаблон атаки (immutable после загрузки)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    pub category: SkillCategory,
    #[serde(default)]
    pub threat_type: Option<ThreatType>,
    #[serde(default)]
    pub base_damage: u32,
    /// Базовая длительность warning (до масштабирования)
    pub telegraph_duration: f32,
    pub cooldown: f32,
    #[serde(default)]
    pub range: RangeBand,
    pub counterplay: CounterplaySet,
    #[serde(default)]
    pub requires_line_of_sight: bool,
    /// Множитель сложности паттерна для warning duration
    #[serde(default = "default_complexity")]
    pub complexity: f32,
    /// Размер области (радиус круга / ширина линии / половина квадрата)
    #[serde(default = "default_area")]
    pub area: f32,
    /// Количество фигур в паттерне (area denial) или призываемых (summon)
    #[serde(default = "default_count")]
    pub count: u32,
    /// Длительность follow-up (charge / hazard / shield)
    #[serde(default = "default_effect_duration")]
    pub effect_duration: f32,
}

fn default_complexity() -> f32 {
    1.0
}

fn default_area() -> f32 {
    3.0
}

fn default_count() -> u32 {
    1
}

fn default_effect_duration() -> f32 {
    1.0
}

impl SkillDescriptor {
    pub fn new(name: impl Into<String>, category: SkillCategory, counterplay: CounterplaySet) -> Self {
        Self {
            name: name.into(),
            category,
            threat_type: None,
            base_damage: 20,
            telegraph_duration: 1.5,
            cooldown: 4.0,
            range: RangeBand::default(),
            counterplay,
            requires_line_of_sight: false,
            complexity: default_complexity(),
            area: default_area(),
            count: default_count(),
            effect_duration: default_effect_duration(),
        }
    }

    pub fn threat_type(&self) -> ThreatType {
        self.threat_type.unwrap_or_else(|| self.category.default_threat_type())
    }
}

/// Runtime слот: шаблон + время последнего использования
#[derive(Debug, Clone)]
pub struct SkillSlot {
    pub descriptor: Arc<SkillDescriptor>,
    pub last_used: Option<f32>,
}

impl SkillSlot {
    pub fn new(descriptor: Arc<SkillDescriptor>) -> Self {
        Self {
            descriptor,
            last_used: None,
        }
    }

    pub fn is_ready(&self, now: f32) -> bool {
        self.last_used
            .is_none_or(|used| now - used >= self.descriptor.cooldown)
    }
}

/// Набор скиллов босса
#[derive(Component, Debug, Clone, Default)]
pub struct SkillRoster {
    pub slots: Vec<SkillSlot>,
}

impl SkillRoster {
    pub fn new(descriptors: impl IntoIterator<Item = Arc<SkillDescriptor>>) -> Self {
        Self {
            slots: descriptors.into_iter().map(SkillSlot::new).collect(),
        }
    }

    pub fn mark_used(&mut self, slot: usize, now: f32) {
        if let Some(slot) = self.slots.get_mut(slot) {
            slot.last_used = Some(now);
        }
    }
}

/// Архетип босса: склонность к категориям + множитель telegraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossArchetype {
    #[default]
    Balanced,
    /// Ближний бой и рывки, короче предупреждения
    Berserker,
    /// Щиты и контроль зоны, длиннее предупреждения
    Warden,
    /// Призыв и дальние атаки
    Summoner,
}

impl BossArchetype {
    pub fn affinity(self, category: SkillCategory) -> f32 {
        use SkillCategory::*;
        match (self, category) {
            (BossArchetype::Balanced, _) => 1.0,
            (BossArchetype::Berserker, MeleeCleave | LinearCharge) => 1.6,
            (BossArchetype::Berserker, Summon | Shield) => 0.5,
            (BossArchetype::Warden, Shield | AreaDenial) => 1.6,
            (BossArchetype::Warden, LinearCharge) => 0.6,
            (BossArchetype::Summoner, Summon | Projectile) => 1.6,
            (BossArchetype::Summoner, MeleeCleave) => 0.6,
            _ => 1.0,
        }
    }

    pub fn telegraph_multiplier(self) -> f32 {
        match self {
            BossArchetype::Balanced | BossArchetype::Summoner => 1.0,
            BossArchetype::Berserker => 0.85,
            BossArchetype::Warden => 1.15,
        }
    }
}
