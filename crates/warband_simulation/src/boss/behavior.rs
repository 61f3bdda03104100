//! BossBehavior: capability, которую можно повесить на любого агента
//!
//! Обычный AiAgent + BossBehavior = босс. Никакой отдельной иерархии.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::boss::continuation::ActiveEffects;
use crate::boss::counterplay::ValidatorPolicy;
use crate::boss::phases::{BossPhase, PhaseTuning};
use crate::boss::skill::{BossArchetype, SkillRoster};
use crate::boss::telegraph::{TelegraphSequencer, TelegraphTuning};
use crate::boss::threat::{PlayerPerformance, ThreatBalancer, ThreatTuning};

/// Настройки boss capability (шаблон)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub archetype: BossArchetype,
    /// Интервал между точками решения (секунды)
    pub decision_interval: f32,
    pub max_validation_attempts: usize,
    pub validator: ValidatorPolicy,
    pub threat: ThreatTuning,
    pub telegraph: TelegraphTuning,
    pub phases: PhaseTuning,
    /// Период пульса persistent hazard
    pub hazard_interval: f32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            archetype: BossArchetype::Balanced,
            decision_interval: 1.5,
            max_validation_attempts: 3,
            validator: ValidatorPolicy::default(),
            threat: ThreatTuning::default(),
            telegraph: TelegraphTuning::default(),
            phases: PhaseTuning::default(),
            hazard_interval: 0.5,
        }
    }
}

/// Boss capability
#[derive(Component, Debug, Clone)]
#[require(SkillRoster, ThreatBalancer, PlayerPerformance, TelegraphSequencer, ActiveEffects, BossPhase)]
pub struct BossBehavior {
    pub tuning: BossTuning,
    /// Текущий интервал (сокращается с фазами)
    pub decision_interval: f32,
    pub decision_timer: f32,
}

impl Default for BossBehavior {
    fn default() -> Self {
        Self::new(BossTuning::default())
    }
}

impl BossBehavior {
    pub fn new(tuning: BossTuning) -> Self {
        Self {
            decision_interval: tuning.decision_interval,
            decision_timer: tuning.decision_interval,
            tuning,
        }
    }

    /// Тикает таймер; true — наступила точка решения
    pub fn decision_due(&mut self, dt: f32) -> bool {
        self.decision_timer -= dt;
        if self.decision_timer > 1e-4 {
            return false;
        }
        self.decision_timer = self.decision_interval;
        true
    }

    pub fn shorten_interval(&mut self) {
        self.decision_interval = (self.decision_interval * self.tuning.phases.interval_scale).max(0.1);
        self.decision_timer = self.decision_timer.min(self.decision_interval);
    }
}
