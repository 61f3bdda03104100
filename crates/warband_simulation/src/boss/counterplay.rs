//! CounterplayValidator: атака должна оставлять игроку достаточно вариантов ответа
//!
//! Rejection — не ошибка исполнения: навык просто не используется в этой точке решения.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boss::skill::{CounterplaySet, SkillDescriptor};
use crate::boss::telegraph::TelegraphTuning;

/// Политика валидатора
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorPolicy {
    pub min_counter_options: u32,
    /// Требовать хотя бы один skill-based ответ (Dodge / Positioning)
    pub require_skill_based: bool,
    /// Допустимое отклонение intrinsic difficulty от threat level
    pub difficulty_tolerance: f32,
}

impl Default for ValidatorPolicy {
    fn default() -> Self {
        Self {
            min_counter_options: 2,
            require_skill_based: true,
            difficulty_tolerance: 0.35,
        }
    }
}

/// Что игрок сейчас способен сделать (нет компонента → всё)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CounterplayCapabilities(pub CounterplaySet);

impl Default for CounterplayCapabilities {
    fn default() -> Self {
        Self(CounterplaySet::all())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("offers {offered} counterplay options, policy requires {required}")]
    TooFewCounters { offered: u32, required: u32 },

    #[error("no skill-based counter (dodge / positioning)")]
    NoSkillBasedCounter,

    #[error("intrinsic difficulty {difficulty:.2} too far from threat level {threat:.2}")]
    DifficultyMismatch { difficulty: f32, threat: f32 },

    #[error("player cannot exercise any of the offered counters")]
    NoExercisableCounter,
}

/// Сложность атаки [0,1]: короткий warning и бедный набор ответов → сложнее
///
/// Warning нормируется на тот же диапазон [min_warning, max_warning], которым его clamp'ит sequencer.
pub fn intrinsic_difficulty(descriptor: &SkillDescriptor, warning_duration: f32, telegraph: &TelegraphTuning) -> f32 {
    let span = telegraph.max_warning - telegraph.min_warning;
    let timing = if span > f32::EPSILON {
        1.0 - ((warning_duration - telegraph.min_warning) / span).clamp(0.0, 1.0)
    } else {
        0.5
    };

    let options = descriptor.counterplay.option_count().saturating_sub(1) as f32;
    let variety = 1.0 - (options / 5.0).clamp(0.0, 1.0);

    (0.6 * timing + 0.4 * variety).clamp(0.0, 1.0)
}

/// Есть ли у игрока хоть один из предложенных ответов
pub fn has_exercisable_counter(descriptor: &SkillDescriptor, capabilities: Option<CounterplaySet>) -> bool {
    capabilities.is_none_or(|available| descriptor.counterplay.intersects(available))
}

/// Проверки по порядку: количество ответов → skill-based → доступность → сложность
pub fn validate(
    descriptor: &SkillDescriptor,
    warning_duration: f32,
    threat_level: f32,
    capabilities: Option<CounterplaySet>,
    policy: &ValidatorPolicy,
    telegraph: &TelegraphTuning,
) -> Result<(), Rejection> {
    let offered = descriptor.counterplay.option_count();
    if offered < policy.min_counter_options {
        return Err(Rejection::TooFewCounters {
            offered,
            required: policy.min_counter_options,
        });
    }

    if policy.require_skill_based && !descriptor.counterplay.intersects(CounterplaySet::SKILL_BASED) {
        return Err(Rejection::NoSkillBasedCounter);
    }

    if !has_exercisable_counter(descriptor, capabilities) {
        return Err(Rejection::NoExercisableCounter);
    }

    let difficulty = intrinsic_difficulty(descriptor, warning_duration, telegraph);
    if (difficulty - threat_level).abs() > policy.difficulty_tolerance {
        return Err(Rejection::DifficultyMismatch {
            difficulty,
            threat: threat_level,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boss::skill::SkillCategory;

    fn skill(counterplay: CounterplaySet) -> SkillDescriptor {
        SkillDescriptor::new("test", SkillCategory::MeleeCleave, counterplay)
    }

    #[test]
    fn test_single_counter_rejected() {
        let policy = ValidatorPolicy::default();
        let result = validate(&skill(CounterplaySet::DODGE), 1.5, 0.5, None, &policy, &TelegraphTuning::default());

        assert_eq!(result, Err(Rejection::TooFewCounters { offered: 1, required: 2 }));
    }

    #[test]
    fn test_requires_skill_based_counter() {
        let policy = ValidatorPolicy::default();
        let counters = CounterplaySet::BLOCK | CounterplaySet::INTERRUPT;

        assert_eq!(validate(&skill(counters), 1.5, 0.5, None, &policy, &TelegraphTuning::default()), Err(Rejection::NoSkillBasedCounter));

        let relaxed = ValidatorPolicy {
            require_skill_based: false,
            ..ValidatorPolicy::default()
        };
        assert!(validate(&skill(counters), 1.5, 0.5, None, &relaxed, &TelegraphTuning::default()).is_ok());
    }

    #[test]
    fn test_difficulty_mismatch() {
        let policy = ValidatorPolicy::default();
        let descriptor = skill(CounterplaySet::DODGE | CounterplaySet::BLOCK);

        // Короткий warning → сложная атака; при низком threat отклоняется
        let hard = intrinsic_difficulty(&descriptor, 0.3, &TelegraphTuning::default());
        assert!(hard > 0.9);
        assert!(matches!(
            validate(&descriptor, 0.3, 0.1, None, &policy, &TelegraphTuning::default()),
            Err(Rejection::DifficultyMismatch { .. })
        ));
        assert!(validate(&descriptor, 0.3, 0.9, None, &policy, &TelegraphTuning::default()).is_ok());
    }

    #[test]
    fn test_no_exercisable_counter() {
        let policy = ValidatorPolicy::default();
        let descriptor = skill(CounterplaySet::DODGE | CounterplaySet::BLOCK);

        assert_eq!(
            validate(&descriptor, 1.5, 0.5, Some(CounterplaySet::RESOURCE), &policy, &TelegraphTuning::default()),
            Err(Rejection::NoExercisableCounter)
        );
        assert!(has_exercisable_counter(&descriptor, Some(CounterplaySet::BLOCK)));
    }

    #[test]
    fn test_difficulty_monotonic_in_warning() {
        let tuning = TelegraphTuning::default();
        let descriptor = skill(CounterplaySet::DODGE | CounterplaySet::BLOCK);
        assert!(intrinsic_difficulty(&descriptor, 1.0, &tuning) > intrinsic_difficulty(&descriptor, 3.0, &tuning));
    }

    #[test]
    fn test_difficulty_follows_warning_bounds() {
        let descriptor = skill(CounterplaySet::DODGE | CounterplaySet::BLOCK);
        let wide = TelegraphTuning {
            min_warning: 0.5,
            max_warning: 10.0,
            ..TelegraphTuning::default()
        };

        // 5 с — потолок дефолтного диапазона, но середина расширенного
        let at_default_ceiling = intrinsic_difficulty(&descriptor, 5.0, &TelegraphTuning::default());
        let mid_wide = intrinsic_difficulty(&descriptor, 5.0, &wide);
        assert!(mid_wide > at_default_ceiling);
        assert!((intrinsic_difficulty(&descriptor, 10.0, &wide) - at_default_ceiling).abs() < 1e-5);
    }
}
