//! Boss systems (SimulationSet::Boss)
//!
//! Порядок:
//! 1. track_boss_phases — пороги HP → PhaseChanged, подъём threat floor
//! 2. update_threat — level → target с ограниченной скоростью
//! 3. decide_boss_skills — точка решения: выбор + валидация + spawn telegraph
//! 4. advance_telegraphs — фазы продвигаются, затем Execute проверяет попадание
//! 5. tick_boss_effects — charge / hazard / shield continuations

use std::sync::Arc;

use bevy::prelude::*;
use tracing::{debug, info};

use crate::ai::{AiAgent, AnimationCue, CurrentTarget, StateMachine};
use crate::boss::behavior::BossBehavior;
use crate::boss::continuation::{
    ActiveEffects, BossEffect, ChargeMotion, Continuation, PersistentHazard, Progress, ShieldWindow,
};
use crate::boss::counterplay::CounterplayCapabilities;
use crate::boss::events::{PhaseChanged, SummonRequested, TelegraphOutcome, TelegraphResolved, TelegraphSpawned};
use crate::boss::patterns::plan_skill;
use crate::boss::phases::BossPhase;
use crate::boss::selection::{decide_skill, DecisionContext};
use crate::boss::skill::SkillRoster;
use crate::boss::telegraph::{FollowUp, TelegraphSequencer, TelegraphShape};
use crate::boss::threat::{PlayerPerformance, ThreatBalancer};
use crate::combat::{apply_damage, DamageDealt, EntityDied, Shielded};
use crate::components::{Actor, Health, MovementCommand, Position};
use crate::spatial::{active_spatial, SpatialIndex, SpatialService};
use crate::DeterministicRng;

/// Потенциальные жертвы атак по площади
type Victims<'w, 's> =
    Query<'w, 's, (Entity, &'static Actor, &'static Position, &'static mut Health, Option<&'static Shielded>)>;

/// Урон всем живым врагам внутри фигуры. Возвращает число задетых.
fn strike_area(
    attacker: Entity,
    faction_id: u64,
    shape: &TelegraphShape,
    damage: u32,
    victims: &mut Victims,
    damage_events: &mut EventWriter<DamageDealt>,
    died_events: &mut EventWriter<EntityDied>,
) -> usize {
    let mut hits = 0;

    for (entity, actor, position, mut health, shield) in victims.iter_mut() {
        if entity == attacker || !actor.is_hostile_to(faction_id) || !shape.contains(position.0) {
            continue;
        }
        let Some(outcome) = apply_damage(&mut health, shield, damage) else {
            continue;
        };
        hits += 1;

        damage_events.write(DamageDealt {
            attacker,
            target: entity,
            damage: outcome.damage,
            target_died: outcome.killed,
        });
        if outcome.killed {
            died_events.write(EntityDied {
                entity,
                killer: Some(attacker),
            });
            info!("☠️ Entity {:?} killed by boss {:?}", entity, attacker);
        }
    }

    hits
}

/// Система: фазы босса
pub fn track_boss_phases(
    mut bosses: Query<(Entity, &Health, &StateMachine, &mut BossBehavior, &mut BossPhase, &mut ThreatBalancer)>,
    mut phase_events: EventWriter<PhaseChanged>,
) {
    for (boss, health, machine, mut behavior, mut phase, mut balancer) in bosses.iter_mut() {
        if machine.is_dead() {
            continue;
        }

        let previous = phase.0;
        let Some(next) = phase.advance(health.fraction(), &behavior.tuning.phases) else {
            continue;
        };

        for _ in previous..next {
            balancer.raise_floor(behavior.tuning.threat.phase_floor_step);
            behavior.shorten_interval();
        }

        phase_events.write(PhaseChanged { boss, phase: next });
        info!(
            "👑 Boss {:?} → phase {} (threat floor {:.2}, decision interval {:.2}s)",
            boss,
            next,
            balancer.floor(),
            behavior.decision_interval
        );
    }
}

/// Система: threat level → target
pub fn update_threat(
    mut bosses: Query<(&StateMachine, &BossBehavior, &PlayerPerformance, &mut ThreatBalancer)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (machine, behavior, performance, mut balancer) in bosses.iter_mut() {
        if machine.is_dead() {
            continue;
        }
        balancer.update(delta, performance, &behavior.tuning.threat);
    }
}

/// Система: точка решения босса
///
/// Только в engaged состояниях (Chase / Attack / Reposition) и с живой целью.
pub fn decide_boss_skills(
    mut bosses: Query<
        (
            Entity,
            &Position,
            &StateMachine,
            &CurrentTarget,
            &mut BossBehavior,
            &mut SkillRoster,
            &mut ThreatBalancer,
            &PlayerPerformance,
            &mut TelegraphSequencer,
        ),
        With<AiAgent>,
    >,
    targets: Query<(&Position, &Health, Option<&CounterplayCapabilities>)>,
    index: Res<SpatialIndex>,
    service: Option<Res<SpatialService>>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut spawned_events: EventWriter<TelegraphSpawned>,
    mut cue_events: EventWriter<AnimationCue>,
) {
    let delta = time.delta_secs();
    let now = time.elapsed_secs();
    let spatial = active_spatial(&index, service.as_deref());

    for (boss, position, machine, target, mut behavior, mut roster, mut balancer, performance, mut sequencer) in
        bosses.iter_mut()
    {
        if !machine.current().is_engaged() {
            continue;
        }
        let Some(target_entity) = target.get() else {
            continue;
        };
        let Ok((target_position, target_health, capabilities)) = targets.get(target_entity) else {
            continue;
        };
        if !target_health.is_alive() || !behavior.decision_due(delta) {
            continue;
        }

        let decision = decide_skill(
            &DecisionContext {
                roster: &roster,
                now,
                distance: position.distance(target_position.0),
                line_of_sight: spatial.has_line_of_sight(position.0, target_position.0),
                balancer: &balancer,
                archetype: behavior.tuning.archetype,
                skill_rating: performance.skill_rating(),
                capabilities: capabilities.map(|c| c.0),
                policy: &behavior.tuning.validator,
                telegraph: &behavior.tuning.telegraph,
                max_attempts: behavior.tuning.max_validation_attempts,
            },
            &mut rng.rng,
        );

        match decision.counterplay_available {
            Some(true) => balancer.report_counterplay_available(),
            Some(false) => balancer.report_no_counterplay(),
            None => {}
        }
        for (slot, rejection) in &decision.rejected {
            debug!("👑 {:?} skill '{}' rejected: {}", boss, roster.slots[*slot].descriptor.name, rejection);
        }

        let Some(chosen) = decision.chosen else {
            continue;
        };
        let descriptor = roster.slots[chosen.slot].descriptor.clone();
        roster.mark_used(chosen.slot, now);
        balancer.note_skill_used();

        let plan = plan_skill(&descriptor, position.0, target_position.0);
        let skill: Arc<str> = Arc::from(descriptor.name.as_str());
        let ids = sequencer.spawn_pattern(
            skill.clone(),
            &plan.shapes,
            chosen.warning_duration,
            descriptor.base_damage,
            plan.follow_up,
            &behavior.tuning.telegraph,
        );

        for telegraph in sequencer.active().iter().filter(|t| ids.contains(&t.id)) {
            spawned_events.write(TelegraphSpawned {
                boss,
                id: telegraph.id,
                skill: skill.clone(),
                shape: telegraph.shape,
                timing: telegraph.timing,
            });
        }
        cue_events.write(AnimationCue::PlayTelegraph {
            agent: boss,
            skill: descriptor.name.clone(),
        });
        info!(
            "👑 Boss {:?} telegraphs '{}' ({} shapes, warning {:.2}s, threat {:.2})",
            boss,
            descriptor.name,
            ids.len(),
            chosen.warning_duration,
            balancer.level()
        );
    }
}

/// Система: продвижение telegraph фаз и Execute
///
/// Смерть босса → ClearAll (без урона) + отмена всех continuation.
pub fn advance_telegraphs(
    mut commands: Commands,
    mut bosses: Query<(
        Entity,
        &Actor,
        &Position,
        &StateMachine,
        &BossBehavior,
        &mut TelegraphSequencer,
        &mut ActiveEffects,
        &mut PlayerPerformance,
    )>,
    mut victims: Victims,
    time: Res<Time<Fixed>>,
    mut damage_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
    mut resolved_events: EventWriter<TelegraphResolved>,
    mut summon_events: EventWriter<SummonRequested>,
) {
    let delta = time.delta_secs();

    for (boss, actor, position, machine, behavior, mut sequencer, mut effects, mut performance) in bosses.iter_mut() {
        if machine.is_dead() {
            if sequencer.is_empty() && effects.is_empty() {
                continue;
            }
            let cancelled = sequencer.clear_all();
            for id in &cancelled {
                resolved_events.write(TelegraphResolved {
                    boss,
                    id: *id,
                    outcome: TelegraphOutcome::Cancelled,
                });
            }
            let continuations = effects.cancel_all();
            commands.entity(boss).remove::<Shielded>();
            info!(
                "👑 Boss {:?} dead → {} telegraphs cleared, {} continuations cancelled",
                boss,
                cancelled.len(),
                continuations
            );
            continue;
        }

        for strike in sequencer.tick(delta) {
            let hits = strike_area(
                boss,
                actor.faction_id,
                &strike.shape,
                strike.damage,
                &mut victims,
                &mut damage_events,
                &mut died_events,
            );

            if strike.damage > 0 {
                if hits > 0 {
                    performance.record_hit();
                } else {
                    performance.record_avoided();
                }
            }

            match strike.follow_up {
                Some(FollowUp::Charge { to, duration } | FollowUp::MoveAway { to, duration }) => {
                    effects.push(BossEffect::Motion(ChargeMotion::new(position.0, to, duration)));
                }
                Some(FollowUp::Hazard { shape, duration, damage }) => {
                    effects.push(BossEffect::Hazard(PersistentHazard::new(
                        shape,
                        damage,
                        duration,
                        behavior.tuning.hazard_interval,
                    )));
                }
                Some(FollowUp::Shield { duration, reduction }) => {
                    effects.push(BossEffect::Shield(ShieldWindow::new(reduction, duration)));
                    commands.entity(boss).insert(Shielded { reduction });
                }
                Some(FollowUp::Summon { at, count }) => {
                    summon_events.write(SummonRequested {
                        boss,
                        position: at,
                        count,
                    });
                }
                None => {}
            }

            resolved_events.write(TelegraphResolved {
                boss,
                id: strike.id,
                outcome: TelegraphOutcome::Executed { hits },
            });
            debug!("👑 {:?} '{}' executed: {} hits", boss, strike.skill, hits);
        }
    }
}

/// Система: charge / hazard / shield continuations
pub fn tick_boss_effects(
    mut commands: Commands,
    mut bosses: Query<(Entity, &Actor, &StateMachine, &mut ActiveEffects, Option<&mut MovementCommand>), With<BossBehavior>>,
    mut victims: Victims,
    time: Res<Time<Fixed>>,
    mut damage_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
) {
    let delta = time.delta_secs();

    for (boss, actor, machine, mut effects, mut movement) in bosses.iter_mut() {
        if machine.is_dead() || effects.is_empty() {
            continue;
        }

        let mut shield_ended = false;
        let mut remaining = Vec::with_capacity(effects.effects.len());

        for mut effect in effects.effects.drain(..) {
            let progress = effect.tick(delta);

            match &mut effect {
                BossEffect::Motion(motion) => {
                    if let Some(command) = movement.as_deref_mut() {
                        let next = match progress {
                            Progress::Continue => MovementCommand::MoveToPosition {
                                target: motion.to,
                                speed: motion.speed(),
                            },
                            Progress::Complete => MovementCommand::Stop,
                        };
                        command.set_if_changed(next);
                    }
                }
                BossEffect::Hazard(hazard) => {
                    for _ in 0..hazard.take_pulses() {
                        strike_area(
                            boss,
                            actor.faction_id,
                            &hazard.shape,
                            hazard.damage,
                            &mut victims,
                            &mut damage_events,
                            &mut died_events,
                        );
                    }
                }
                BossEffect::Shield(_) => {
                    shield_ended |= progress == Progress::Complete;
                }
            }

            if progress == Progress::Continue {
                remaining.push(effect);
            }
        }

        effects.effects = remaining;
        if shield_ended && !effects.has_shield() {
            commands.entity(boss).remove::<Shielded>();
            debug!("👑 {:?} shield window closed", boss);
        }
    }
}
