//! ThreatBalancer: threat level ∈ [0,1] с ограниченной скоростью изменения
//!
//! Цель (target) считается из PlayerPerformance; сам level идёт к цели не быстрее
//! `rate` в секунду. Скачков нет ни при смене фазы, ни при fairness сбросе.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::boss::skill::{BossArchetype, SkillDescriptor, ThreatType};

/// Настройки адаптации
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatTuning {
    /// Максимальное изменение level в секунду
    pub rate: f32,
    pub min_level: f32,
    pub max_level: f32,
    /// Стартовая/базовая цель
    pub baseline: f32,
    /// Рост цели за секунду без использования скиллов
    pub idle_weight: f32,
    pub idle_cap: f32,
    /// Вклад оценки скилла игрока (skill_rating − 0.5)
    pub rating_weight: f32,
    /// Снижение цели за каждый подряд пропущенный удар
    pub failure_weight: f32,
    /// Сколько подряд проверок "нет доступного контрплея" до fairness сброса
    pub fairness_streak: u32,
    /// Подъём нижней границы за фазу босса
    pub phase_floor_step: f32,
}

impl Default for ThreatTuning {
    fn default() -> Self {
        Self {
            rate: 0.2,
            min_level: 0.0,
            max_level: 1.0,
            baseline: 0.4,
            idle_weight: 0.05,
            idle_cap: 6.0,
            rating_weight: 0.4,
            failure_weight: 0.1,
            fairness_streak: 3,
            phase_floor_step: 0.15,
        }
    }
}

/// Наблюдаемая эффективность игрока против босса
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct PlayerPerformance {
    pub hits_taken: u32,
    pub avoided: u32,
    pub consecutive_failures: u32,
}

impl PlayerPerformance {
    /// Игрок попал под telegraph (провал ответа)
    pub fn record_hit(&mut self) {
        self.hits_taken += 1;
        self.consecutive_failures += 1;
    }

    /// Игрок избежал telegraph
    pub fn record_avoided(&mut self) {
        self.avoided += 1;
        self.consecutive_failures = 0;
    }

    /// Оценка скилла [0,1], Laplace smoothing (без данных → 0.5)
    pub fn skill_rating(&self) -> f32 {
        (self.avoided as f32 + 1.0) / ((self.hits_taken + self.avoided) as f32 + 2.0)
    }
}

/// Threat level босса
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ThreatBalancer {
    level: f32,
    target: f32,
    floor: f32,
    since_last_skill: f32,
    no_counter_streak: u32,
}

impl Default for ThreatBalancer {
    fn default() -> Self {
        Self::new(ThreatTuning::default().baseline)
    }
}

impl ThreatBalancer {
    pub fn new(initial: f32) -> Self {
        let level = initial.clamp(0.0, 1.0);
        Self {
            level,
            target: level,
            floor: 0.0,
            since_last_skill: 0.0,
            no_counter_streak: 0,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    pub fn no_counter_streak(&self) -> u32 {
        self.no_counter_streak
    }

    /// Fairness guarantee активна: игроку нечем ответить
    pub fn fairness_engaged(&self, tuning: &ThreatTuning) -> bool {
        self.no_counter_streak >= tuning.fairness_streak.max(1)
    }

    /// Цель по текущей эффективности игрока
    pub fn compute_target(&self, performance: &PlayerPerformance, tuning: &ThreatTuning) -> f32 {
        if self.fairness_engaged(tuning) {
            return tuning.min_level;
        }

        let idle = self.since_last_skill.min(tuning.idle_cap) * tuning.idle_weight;
        let rating = (performance.skill_rating() - 0.5) * tuning.rating_weight;
        let failures = performance.consecutive_failures as f32 * tuning.failure_weight;

        let lower = self.floor.max(tuning.min_level);
        let upper = tuning.max_level.max(lower);
        (tuning.baseline + idle + rating - failures).clamp(lower, upper)
    }

    /// Шаг интерполяции: |Δlevel| ≤ rate × dt
    pub fn update(&mut self, dt: f32, performance: &PlayerPerformance, tuning: &ThreatTuning) {
        self.since_last_skill += dt;
        self.target = self.compute_target(performance, tuning).clamp(0.0, 1.0);

        let max_step = (tuning.rate * dt).max(0.0);
        let step = (self.target - self.level).clamp(-max_step, max_step);
        self.level = (self.level + step).clamp(0.0, 1.0);
    }

    pub fn note_skill_used(&mut self) {
        self.since_last_skill = 0.0;
    }

    /// Валидатор: у игрока нет ни одного доступного ответа
    pub fn report_no_counterplay(&mut self) {
        self.no_counter_streak += 1;
    }

    pub fn report_counterplay_available(&mut self) {
        self.no_counter_streak = 0;
    }

    /// Новая фаза: нижняя граница цели поднимается (level догонит плавно)
    pub fn raise_floor(&mut self, step: f32) {
        self.floor = (self.floor + step).clamp(0.0, 1.0);
    }

    /// Множитель веса по threat type
    pub fn threat_multiplier(&self, threat_type: ThreatType) -> f32 {
        let t = self.level;
        match threat_type {
            ThreatType::Immediate => 0.5 + t,
            ThreatType::Persistent => 1.5 - t,
            ThreatType::Delayed => 0.8 + 0.4 * t,
        }
    }

    /// Вес кандидата: affinity архетипа × threat type множитель
    pub fn weight(&self, descriptor: &SkillDescriptor, archetype: BossArchetype) -> f32 {
        archetype.affinity(descriptor.category) * self.threat_multiplier(descriptor.threat_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_skill_rating() {
        let mut performance = PlayerPerformance::default();
        assert_eq!(performance.skill_rating(), 0.5);

        performance.record_avoided();
        performance.record_avoided();
        assert_eq!(performance.skill_rating(), 0.75);

        performance.record_hit();
        assert_eq!(performance.consecutive_failures, 1);
        assert!(performance.skill_rating() < 0.75);
    }

    #[test]
    fn test_level_moves_at_bounded_rate() {
        let tuning = ThreatTuning::default();
        let mut balancer = ThreatBalancer::new(0.0);
        let mut performance = PlayerPerformance::default();
        for _ in 0..10 {
            performance.record_avoided();
        }

        balancer.update(1.0, &performance, &tuning);

        assert!(balancer.target() > 0.2);
        assert!((balancer.level() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_failures_lower_target() {
        let tuning = ThreatTuning::default();
        let balancer = ThreatBalancer::new(0.5);
        let mut performance = PlayerPerformance::default();
        let neutral = balancer.compute_target(&performance, &tuning);

        performance.record_hit();
        performance.record_hit();
        assert!(balancer.compute_target(&performance, &tuning) < neutral);
    }

    #[test]
    fn test_fairness_floor_after_streak() {
        let tuning = ThreatTuning::default();
        let mut balancer = ThreatBalancer::new(0.8);
        let performance = PlayerPerformance::default();

        for _ in 0..tuning.fairness_streak {
            balancer.report_no_counterplay();
        }
        assert!(balancer.fairness_engaged(&tuning));

        for _ in 0..100 {
            balancer.update(0.1, &performance, &tuning);
        }
        assert_eq!(balancer.level(), tuning.min_level);

        balancer.report_counterplay_available();
        assert!(!balancer.fairness_engaged(&tuning));
    }

    #[test]
    fn test_phase_floor_raises_target() {
        let tuning = ThreatTuning::default();
        let mut balancer = ThreatBalancer::new(0.0);
        let mut performance = PlayerPerformance::default();
        for _ in 0..20 {
            performance.record_hit();
        }
        assert_eq!(balancer.compute_target(&performance, &tuning), 0.0);

        balancer.raise_floor(0.3);
        assert!((balancer.compute_target(&performance, &tuning) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_threat_multipliers() {
        let low = ThreatBalancer::new(0.0);
        let high = ThreatBalancer::new(1.0);

        assert!(high.threat_multiplier(ThreatType::Immediate) > low.threat_multiplier(ThreatType::Immediate));
        assert!(high.threat_multiplier(ThreatType::Persistent) < low.threat_multiplier(ThreatType::Persistent));
        assert!((high.threat_multiplier(ThreatType::Delayed) - 1.2).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_level_bounded_and_continuous(
            initial in 0.0f32..=1.0,
            steps in prop::collection::vec((0.0f32..0.5, 0u8..4), 1..200),
        ) {
            let tuning = ThreatTuning::default();
            let mut balancer = ThreatBalancer::new(initial);
            let mut performance = PlayerPerformance::default();

            for (dt, event) in steps {
                match event {
                    0 => performance.record_hit(),
                    1 => performance.record_avoided(),
                    2 => balancer.report_no_counterplay(),
                    _ => balancer.note_skill_used(),
                }
                let before = balancer.level();
                balancer.update(dt, &performance, &tuning);
                let after = balancer.level();

                prop_assert!((0.0..=1.0).contains(&after));
                prop_assert!((after - before).abs() <= tuning.rate * dt + 1e-5);
            }
        }
    }
}
