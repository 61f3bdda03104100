//! Выбор скилла: кандидаты → weighted top-third порядок → валидация
//!
//! В одной точке решения пробуем не больше `max_attempts` кандидатов.
//! Все отклонены → босс ждёт следующей точки решения.

use rand::Rng;

use crate::boss::counterplay::{has_exercisable_counter, validate, Rejection, ValidatorPolicy};
use crate::boss::skill::{BossArchetype, CounterplaySet, SkillRoster};
use crate::boss::telegraph::{compute_warning_duration, TelegraphTuning};
use crate::boss::threat::ThreatBalancer;

/// Кандидат: индекс слота в roster + вес
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub slot: usize,
    pub weight: f32,
}

/// Готовые по cooldown, в range band и (если нужно) с line of sight
pub fn eligible_candidates(
    roster: &SkillRoster,
    now: f32,
    distance: f32,
    line_of_sight: bool,
    balancer: &ThreatBalancer,
    archetype: BossArchetype,
) -> Vec<Candidate> {
    roster
        .slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_ready(now))
        .filter(|(_, slot)| slot.descriptor.range.contains(distance))
        .filter(|(_, slot)| line_of_sight || !slot.descriptor.requires_line_of_sight)
        .map(|(index, slot)| Candidate {
            slot: index,
            weight: balancer.weight(&slot.descriptor, archetype),
        })
        .filter(|candidate| candidate.weight > 0.0)
        .collect()
}

/// Порядок попыток: weighted draw без возвращения из верхней трети по весу,
/// затем остальные по убыванию веса.
pub fn weighted_top_third_order(candidates: &[Candidate], rng: &mut impl Rng) -> Vec<usize> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| b.weight.total_cmp(&a.weight).then(a.slot.cmp(&b.slot)));

    let top = sorted.len().div_ceil(3);
    let (top_third, rest) = sorted.split_at(top);
    let mut pool = top_third.to_vec();
    let mut order = Vec::with_capacity(sorted.len());

    while !pool.is_empty() {
        let total: f32 = pool.iter().map(|c| c.weight).sum();
        let mut roll = rng.gen::<f32>() * total;
        let mut picked = pool.len() - 1;
        for (index, candidate) in pool.iter().enumerate() {
            if roll < candidate.weight {
                picked = index;
                break;
            }
            roll -= candidate.weight;
        }
        order.push(pool.remove(picked).slot);
    }

    order.extend(rest.iter().map(|c| c.slot));
    order
}

/// Вход одной точки решения
pub struct DecisionContext<'a> {
    pub roster: &'a SkillRoster,
    pub now: f32,
    pub distance: f32,
    pub line_of_sight: bool,
    pub balancer: &'a ThreatBalancer,
    pub archetype: BossArchetype,
    pub skill_rating: f32,
    pub capabilities: Option<CounterplaySet>,
    pub policy: &'a ValidatorPolicy,
    pub telegraph: &'a TelegraphTuning,
    pub max_attempts: usize,
}

/// Принятый скилл
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChosenSkill {
    pub slot: usize,
    pub warning_duration: f32,
}

/// Итог точки решения
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decision {
    pub chosen: Option<ChosenSkill>,
    /// (слот, причина) для каждой отклонённой попытки
    pub rejected: Vec<(usize, Rejection)>,
    /// None — кандидатов не было; Some(false) — ни один не даёт игроку доступного ответа
    pub counterplay_available: Option<bool>,
}

pub fn decide_skill(context: &DecisionContext<'_>, rng: &mut impl Rng) -> Decision {
    let candidates = eligible_candidates(
        context.roster,
        context.now,
        context.distance,
        context.line_of_sight,
        context.balancer,
        context.archetype,
    );
    if candidates.is_empty() {
        return Decision::default();
    }

    let counterplay_available = candidates.iter().any(|candidate| {
        has_exercisable_counter(&context.roster.slots[candidate.slot].descriptor, context.capabilities)
    });

    let mut decision = Decision {
        counterplay_available: Some(counterplay_available),
        ..Decision::default()
    };

    for slot in weighted_top_third_order(&candidates, rng)
        .into_iter()
        .take(context.max_attempts.max(1))
    {
        let descriptor = &context.roster.slots[slot].descriptor;
        let warning_duration = compute_warning_duration(
            descriptor.telegraph_duration,
            descriptor.complexity,
            context.skill_rating,
            context.archetype.telegraph_multiplier(),
            context.telegraph,
        );

        match validate(
            descriptor,
            warning_duration,
            context.balancer.level(),
            context.capabilities,
            context.policy,
            context.telegraph,
        ) {
            Ok(()) => {
                decision.chosen = Some(ChosenSkill { slot, warning_duration });
                break;
            }
            Err(rejection) => decision.rejected.push((slot, rejection)),
        }
    }

    decision
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::boss::skill::{SkillCategory, SkillDescriptor};

    fn roster(skills: Vec<SkillDescriptor>) -> SkillRoster {
        SkillRoster::new(skills.into_iter().map(Arc::new))
    }

    fn context<'a>(
        roster: &'a SkillRoster,
        balancer: &'a ThreatBalancer,
        policy: &'a ValidatorPolicy,
        telegraph: &'a TelegraphTuning,
    ) -> DecisionContext<'a> {
        DecisionContext {
            roster,
            now: 0.0,
            distance: 3.0,
            line_of_sight: true,
            balancer,
            archetype: BossArchetype::Balanced,
            skill_rating: 0.5,
            capabilities: None,
            policy,
            telegraph,
            max_attempts: 3,
        }
    }

    #[test]
    fn test_top_third_order_is_permutation() {
        let candidates: Vec<Candidate> = (0..7)
            .map(|slot| Candidate {
                slot,
                weight: 1.0 + slot as f32,
            })
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let order = weighted_top_third_order(&candidates, &mut rng);

        // top third (ceil(7/3) = 3) — самые тяжёлые слоты 6, 5, 4
        let mut head = order[..3].to_vec();
        head.sort();
        assert_eq!(head, vec![4, 5, 6]);
        assert_eq!(&order[3..], &[3, 2, 1, 0]);
    }

    #[test]
    fn test_top_third_order_deterministic_for_seed() {
        let candidates: Vec<Candidate> = (0..9).map(|slot| Candidate { slot, weight: 1.0 }).collect();

        let first = weighted_top_third_order(&candidates, &mut ChaCha8Rng::seed_from_u64(3));
        let second = weighted_top_third_order(&candidates, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejected_skill_falls_through_to_next_candidate() {
        // Единственный ответ → отклонён; второй кандидат проходит в этом же тике
        let mut weak = SkillDescriptor::new("stomp", SkillCategory::MeleeCleave, CounterplaySet::BLOCK);
        weak.threat_type = Some(crate::boss::skill::ThreatType::Immediate);
        let fair = SkillDescriptor::new(
            "sweep",
            SkillCategory::Shield,
            CounterplaySet::DODGE | CounterplaySet::BLOCK | CounterplaySet::POSITIONING,
        );
        let roster = roster(vec![weak, fair]);
        let balancer = ThreatBalancer::new(0.5);
        let policy = ValidatorPolicy::default();
        let telegraph = TelegraphTuning::default();

        let decision = decide_skill(&context(&roster, &balancer, &policy, &telegraph), &mut ChaCha8Rng::seed_from_u64(1));

        assert_eq!(decision.chosen.map(|c| c.slot), Some(1));
        assert_eq!(
            decision.rejected,
            vec![(0, Rejection::TooFewCounters { offered: 1, required: 2 })]
        );
    }

    #[test]
    fn test_all_rejected_waits() {
        let roster = roster(vec![
            SkillDescriptor::new("a", SkillCategory::MeleeCleave, CounterplaySet::BLOCK),
            SkillDescriptor::new("b", SkillCategory::MeleeCleave, CounterplaySet::INTERRUPT),
            SkillDescriptor::new("c", SkillCategory::MeleeCleave, CounterplaySet::RESOURCE),
            SkillDescriptor::new("d", SkillCategory::MeleeCleave, CounterplaySet::COOPERATIVE),
        ]);
        let balancer = ThreatBalancer::new(0.5);
        let policy = ValidatorPolicy::default();
        let telegraph = TelegraphTuning::default();

        let decision = decide_skill(&context(&roster, &balancer, &policy, &telegraph), &mut ChaCha8Rng::seed_from_u64(5));

        assert_eq!(decision.chosen, None);
        // Не больше max_attempts попыток за одну точку решения
        assert_eq!(decision.rejected.len(), 3);
    }

    #[test]
    fn test_cooldown_and_range_filter() {
        let mut far = SkillDescriptor::new("far", SkillCategory::Projectile, CounterplaySet::DODGE);
        far.range = crate::boss::skill::RangeBand::new(8.0, 20.0);
        let near = SkillDescriptor::new("near", SkillCategory::MeleeCleave, CounterplaySet::DODGE);
        let mut roster = roster(vec![far, near]);
        let balancer = ThreatBalancer::new(0.5);

        let candidates = eligible_candidates(&roster, 0.0, 3.0, true, &balancer, BossArchetype::Balanced);
        assert_eq!(candidates.iter().map(|c| c.slot).collect::<Vec<_>>(), vec![1]);

        roster.mark_used(1, 0.0);
        assert!(eligible_candidates(&roster, 1.0, 3.0, true, &balancer, BossArchetype::Balanced).is_empty());
    }
}
