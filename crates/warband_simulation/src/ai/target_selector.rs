//! TargetSelector: выбор лучшей цели преследования
//!
//! Алгоритм:
//! 1. Текущая цель (жива, валидна, в chase radius) — baseline кандидат,
//!    её score = обычная формула + retention bonus ("липкость")
//! 2. Каждый кандидат: max(0, detection − distance) + health_bonus,
//!    ничья → ближе выигрывает
//! 3. Общая цель группы (в detection radius) сравнивается с лидером по дистанции
//!    и может его перебить
//! 4. Победитель дальше chase radius отбрасывается

use bevy::prelude::*;

/// Кандидат, уже приведённый к дистанции от агента
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub entity: Entity,
    pub distance: f32,
    /// Доля HP в [0, 1]
    pub health_fraction: f32,
    pub alive: bool,
    /// Враждебная фракция и категория проходит фильтр
    pub valid: bool,
}

impl TargetCandidate {
    fn usable(&self) -> bool {
        self.alive && self.valid
    }
}

/// Параметры скоринга (из AIConfig)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionParams {
    pub detection_radius: f32,
    pub chase_radius: f32,
    pub retention_bonus: f32,
    pub health_bonus_weight: f32,
}

impl From<&crate::ai::AIConfig> for SelectionParams {
    fn from(config: &crate::ai::AIConfig) -> Self {
        Self {
            detection_radius: config.detection_radius,
            chase_radius: config.chase_radius,
            retention_bonus: config.retention_bonus,
            health_bonus_weight: config.health_bonus_weight,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Scored {
    candidate: TargetCandidate,
    score: f32,
}

/// Бонус за низкое HP: слабых добиваем охотнее
pub fn health_bonus(candidate: &TargetCandidate, params: &SelectionParams) -> f32 {
    params.health_bonus_weight * (1.0 - candidate.health_fraction.clamp(0.0, 1.0))
}

pub fn score_candidate(candidate: &TargetCandidate, params: &SelectionParams) -> f32 {
    (params.detection_radius - candidate.distance).max(0.0) + health_bonus(candidate, params)
}

fn beats(challenger: &Scored, best: &Scored) -> bool {
    if challenger.score > best.score {
        return true;
    }
    challenger.score == best.score && challenger.candidate.distance < best.candidate.distance
}

/// Выбор цели. None → вызывающий откатывается в Patrol/Idle.
pub fn select_target(
    current: Option<TargetCandidate>,
    candidates: &[TargetCandidate],
    group_target: Option<TargetCandidate>,
    params: &SelectionParams,
) -> Option<Entity> {
    let mut best: Option<Scored> = current
        .filter(|c| c.usable() && c.distance <= params.chase_radius)
        .map(|c| Scored {
            candidate: c,
            score: score_candidate(&c, params) + params.retention_bonus,
        });

    for candidate in candidates.iter().filter(|c| c.usable()) {
        if candidate.distance > params.detection_radius {
            continue;
        }
        if best.is_some_and(|b| b.candidate.entity == candidate.entity) {
            continue;
        }

        let scored = Scored {
            candidate: *candidate,
            score: score_candidate(candidate, params),
        };
        match &best {
            Some(current_best) if !beats(&scored, current_best) => {}
            _ => best = Some(scored),
        }
    }

    if let Some(shared) = group_target.filter(|c| c.usable() && c.distance <= params.detection_radius) {
        let overrides = match &best {
            None => true,
            Some(current_best) => shared.distance <= current_best.candidate.distance,
        };
        if overrides {
            best = Some(Scored {
                candidate: shared,
                score: score_candidate(&shared, params),
            });
        }
    }

    best.filter(|b| b.candidate.distance <= params.chase_radius)
        .map(|b| b.candidate.entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SelectionParams {
        SelectionParams {
            detection_radius: 10.0,
            chase_radius: 20.0,
            retention_bonus: 1.0,
            health_bonus_weight: 2.0,
        }
    }

    fn candidate(index: u32, distance: f32, health_fraction: f32) -> TargetCandidate {
        TargetCandidate {
            entity: Entity::from_raw(index),
            distance,
            health_fraction,
            alive: true,
            valid: true,
        }
    }

    #[test]
    fn test_closer_candidate_beats_current_with_equal_health() {
        let current = candidate(1, 5.0, 1.0);
        let newcomer = candidate(2, 3.0, 1.0);

        let chosen = select_target(Some(current), &[newcomer], None, &params());
        assert_eq!(chosen, Some(newcomer.entity));
    }

    #[test]
    fn test_current_target_is_sticky_within_retention_margin() {
        let current = candidate(1, 5.0, 1.0);
        // На 0.5м ближе — меньше retention bonus, остаёмся на текущей
        let newcomer = candidate(2, 4.5, 1.0);

        let chosen = select_target(Some(current), &[newcomer], None, &params());
        assert_eq!(chosen, Some(current.entity));
    }

    #[test]
    fn test_weaker_candidate_preferred() {
        let healthy = candidate(1, 4.0, 1.0);
        let wounded = candidate(2, 5.0, 0.1); // score 5 + 1.8 = 6.8 > 6

        let chosen = select_target(None, &[healthy, wounded], None, &params());
        assert_eq!(chosen, Some(wounded.entity));
    }

    #[test]
    fn test_tie_broken_by_distance() {
        // 10 - 4 + 0 = 6 и 10 - 5 + 1 = 6 → ничья, ближний выигрывает
        let near = candidate(1, 4.0, 1.0);
        let far_wounded = candidate(2, 5.0, 0.5);

        let chosen = select_target(None, &[far_wounded, near], None, &params());
        assert_eq!(chosen, Some(near.entity));
    }

    #[test]
    fn test_current_outside_detection_but_inside_chase_is_retained() {
        let current = candidate(1, 15.0, 1.0);

        let chosen = select_target(Some(current), &[], None, &params());
        assert_eq!(chosen, Some(current.entity));
    }

    #[test]
    fn test_current_beyond_chase_radius_is_dropped() {
        let current = candidate(1, 25.0, 1.0);

        assert_eq!(select_target(Some(current), &[], None, &params()), None);
    }

    #[test]
    fn test_dead_or_invalid_candidates_ignored() {
        let mut dead = candidate(1, 1.0, 0.0);
        dead.alive = false;
        let mut friendly = candidate(2, 1.0, 1.0);
        friendly.valid = false;

        assert_eq!(select_target(None, &[dead, friendly], None, &params()), None);
    }

    #[test]
    fn test_candidate_outside_detection_not_acquired() {
        let far = candidate(1, 12.0, 1.0);
        assert_eq!(select_target(None, &[far], None, &params()), None);
    }

    #[test]
    fn test_group_target_overrides_when_closer_or_equal() {
        let own = candidate(1, 6.0, 1.0);
        let shared = candidate(2, 6.0, 1.0);

        let chosen = select_target(None, &[own], Some(shared), &params());
        assert_eq!(chosen, Some(shared.entity));
    }

    #[test]
    fn test_group_target_ignored_when_farther() {
        let own = candidate(1, 3.0, 1.0);
        let shared = candidate(2, 8.0, 1.0);

        let chosen = select_target(None, &[own], Some(shared), &params());
        assert_eq!(chosen, Some(own.entity));
    }

    #[test]
    fn test_group_target_outside_detection_ignored() {
        let shared = candidate(2, 11.0, 1.0);
        assert_eq!(select_target(None, &[], Some(shared), &params()), None);
    }
}
