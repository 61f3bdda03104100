//! FSM AI components (state kind, config, target, throttling).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::spatial::TargetCategory;

/// Маркер: entity управляется AI core (регистрируется в AgentRegistry)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AiAgent;

/// Поведенческое состояние агента. Ровно одно активно в каждый момент.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum AiState {
    /// Idle — стоим, ждём цель
    #[default]
    Idle,
    /// Patrol — движемся по PatrolRoute
    Patrol,
    /// Chase — преследуем CurrentTarget
    Chase,
    /// Attack — цель в attack radius, бьём
    Attack,
    /// Reposition — уходим на фланг (толкучка у цели)
    Reposition,
    /// Dead — терминальное, Execute no-op
    Dead,
}

impl AiState {
    pub fn is_dead(self) -> bool {
        matches!(self, AiState::Dead)
    }

    /// Состояния в которых агент сражается с целью
    pub fn is_engaged(self) -> bool {
        matches!(self, AiState::Chase | AiState::Attack | AiState::Reposition)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AiState::Idle => "Idle",
            AiState::Patrol => "Patrol",
            AiState::Chase => "Chase",
            AiState::Attack => "Attack",
            AiState::Reposition => "Reposition",
            AiState::Dead => "Dead",
        }
    }
}

/// Параметры AI (радиусы, скорости, throttling)
///
/// Инвариант (проверяется при загрузке templates): attack_radius ≤ chase_radius,
/// detection_radius ≤ chase_radius.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct AIConfig {
    /// Радиус обнаружения новых целей (метры)
    pub detection_radius: f32,
    /// Радиус удержания цели (дальше — цель потеряна)
    pub chase_radius: f32,
    /// Радиус атаки
    pub attack_radius: f32,
    /// Hysteresis: Attack → Chase только когда distance > attack_radius + margin
    pub attack_hysteresis: f32,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    /// Интервал пересчёта target/state (0 = каждый тик; performance mode > 0)
    pub perception_interval: f32,
    /// Задержка перед despawn после смерти (death effects)
    pub death_grace_delay: f32,
    /// Союзник ближе этого радиуса в Attack → Reposition
    pub crowding_radius: f32,
    /// Максимальное время Reposition
    pub reposition_timeout: f32,
    /// Бонус "липкости" текущей цели при скоринге
    pub retention_bonus: f32,
    /// Вес бонуса за низкое HP кандидата
    pub health_bonus_weight: f32,
    #[reflect(ignore)]
    pub target_categories: TargetCategory,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            detection_radius: 10.0,
            chase_radius: 20.0,
            attack_radius: 2.0,
            attack_hysteresis: 0.5,
            patrol_speed: 2.5,
            chase_speed: 4.5,
            perception_interval: 0.0,
            death_grace_delay: 2.0,
            crowding_radius: 0.8,
            reposition_timeout: 2.0,
            retention_bonus: 1.0,
            health_bonus_weight: 2.0,
            target_categories: TargetCategory::default(),
        }
    }
}

/// Текущая цель (weak reference: только lookup, lifetime цели не владеем)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrentTarget(pub Option<Entity>);

impl CurrentTarget {
    pub fn get(&self) -> Option<Entity> {
        self.0
    }
}

/// Throttling пересчёта target/state (performance mode)
///
/// Health/death проверки НЕ throttled — см. ai_fsm_transitions.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PerceptionThrottle {
    pub remaining: f32,
    /// true если в этом тике target/state пересчитывались
    pub fresh: bool,
}

impl PerceptionThrottle {
    /// Продвигает таймер. Возвращает true если пора пересчитывать.
    pub fn tick(&mut self, delta: f32, interval: f32) -> bool {
        self.remaining -= delta;
        if self.remaining <= 0.0 {
            self.remaining = interval.max(0.0);
            self.fresh = true;
        } else {
            self.fresh = false;
        }
        self.fresh
    }
}

/// Точка фланга для Reposition state
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RepositionGoal {
    pub point: Option<Vec2>,
    pub remaining: f32,
}
