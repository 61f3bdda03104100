//! Фазы босса по порогам здоровья

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Пороги и последствия смены фазы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTuning {
    /// Доли HP, по убыванию (0.66 → фаза 1, 0.33 → фаза 2)
    pub thresholds: Vec<f32>,
    /// Множитель decision interval за каждую новую фазу
    pub interval_scale: f32,
}

impl Default for PhaseTuning {
    fn default() -> Self {
        Self {
            thresholds: vec![0.66, 0.33],
            interval_scale: 0.75,
        }
    }
}

/// Текущая фаза (0 — стартовая)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BossPhase(pub u32);

impl BossPhase {
    /// Фаза для доли HP: количество пройденных порогов
    pub fn for_health(fraction: f32, tuning: &PhaseTuning) -> u32 {
        tuning.thresholds.iter().filter(|threshold| fraction <= **threshold).count() as u32
    }

    /// Переход вперёд (фазы не откатываются при лечении). Some(новая фаза) при смене.
    pub fn advance(&mut self, fraction: f32, tuning: &PhaseTuning) -> Option<u32> {
        let phase = Self::for_health(fraction, tuning);
        if phase > self.0 {
            self.0 = phase;
            Some(phase)
        } else {
            None
        }
    }
}
