//! FSM AI systems (state transitions через StateMachine).

use std::collections::HashMap;

use bevy::prelude::*;
use tracing::{debug, info};

use crate::ai::state_machine::{next_state, Directive, StateHooks, TransitionInputs};
use crate::ai::{
    AIConfig, AgentDied, AiAgent, AiState, AnimationCue, CurrentTarget, PatrolCursor, PatrolRoute,
    PerceptionThrottle, RepositionGoal, StateChanged, StateMachine, TargetChanged,
};
use crate::combat::{DespawnAfter, EntityDied};
use crate::components::{Actor, Health, MovementCommand, Position};
use crate::registry::AgentRegistry;

/// Дистанция на которой точка фланга считается достигнутой
const REPOSITION_ARRIVAL: f32 = 0.5;
/// Угол ухода на фланг относительно линии цель→агент
const FLANK_ANGLE: f32 = std::f32::consts::FRAC_PI_3;

/// Side effects Enter/Exit, собираются в рамках одного перехода
struct TransitionEffects<'a> {
    agent: Entity,
    config: &'a AIConfig,
    movement: Option<&'a mut MovementCommand>,
    patrol: Option<&'a mut PatrolCursor>,
    cues: &'a mut Vec<AnimationCue>,
}

impl TransitionEffects<'_> {
    fn stop(&mut self) {
        if let Some(command) = self.movement.as_deref_mut() {
            command.set_if_changed(MovementCommand::Stop);
        }
    }

    fn move_speed(&mut self, speed: f32) {
        self.cues.push(AnimationCue::SetMoveSpeed { agent: self.agent, speed });
    }
}

impl StateHooks for TransitionEffects<'_> {
    fn exit(&mut self, state: AiState) {
        match state {
            AiState::Patrol => {
                // При возврате в Patrol точка пересчитается заново
                if let Some(cursor) = self.patrol.as_deref_mut() {
                    cursor.destination = None;
                }
            }
            AiState::Chase | AiState::Reposition => self.stop(),
            _ => {}
        }
    }

    fn enter(&mut self, state: AiState) {
        match state {
            AiState::Idle => {
                self.stop();
                self.move_speed(0.0);
            }
            AiState::Patrol => self.move_speed(self.config.patrol_speed),
            AiState::Chase | AiState::Reposition => self.move_speed(self.config.chase_speed),
            AiState::Attack => {
                self.stop();
                self.move_speed(0.0);
            }
            AiState::Dead => {
                self.stop();
                self.cues.push(AnimationCue::PlayDeath { agent: self.agent });
            }
        }
    }
}

/// Точка фланга: поворот линии цель→агент на ±60°, на дистанции атаки
pub fn flank_point(agent: Entity, agent_position: Vec2, target_position: Vec2, attack_radius: f32) -> Vec2 {
    let away = (agent_position - target_position).normalize_or_zero();
    let away = if away == Vec2::ZERO { Vec2::X } else { away };
    let side = if agent.index() % 2 == 0 { 1.0 } else { -1.0 };
    let rotated = Vec2::from_angle(FLANK_ANGLE * side).rotate(away);
    target_position + rotated * (attack_radius * 0.9)
}

/// Система: AI FSM transitions
///
/// Порядок внутри тика: target уже выбран (acquire_targets), здесь решаем переход.
/// Приоритеты:
/// 1. Dead (HP == 0 или EntityDied) — всегда, даже в throttled тике
/// 2. Directive от группы (Engage / Release)
/// 3. Таблица переходов (next_state)
pub fn ai_fsm_transitions(
    mut agents: Query<
        (
            Entity,
            &Actor,
            &Position,
            &Health,
            &AIConfig,
            &mut StateMachine,
            &mut CurrentTarget,
            &PerceptionThrottle,
            &mut RepositionGoal,
            Option<&mut MovementCommand>,
            Option<&mut PatrolCursor>,
            Option<&PatrolRoute>,
        ),
        With<AiAgent>,
    >,
    targets: Query<(&Position, &Health)>,
    mut died_events: EventReader<EntityDied>,
    mut state_events: EventWriter<StateChanged>,
    mut target_events: EventWriter<TargetChanged>,
    mut agent_died_events: EventWriter<AgentDied>,
    mut cue_events: EventWriter<AnimationCue>,
    mut registry: ResMut<AgentRegistry>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();
    // OnDeath notification от Character collaborator
    let killed: HashMap<Entity, Option<Entity>> =
        died_events.read().map(|event| (event.entity, event.killer)).collect();
    let mut cues = Vec::new();

    for (
        entity,
        actor,
        position,
        health,
        config,
        mut machine,
        mut target,
        throttle,
        mut reposition,
        mut movement,
        mut patrol_cursor,
        patrol_route,
    ) in agents.iter_mut()
    {
        machine.advance_time(delta);
        if machine.is_dead() {
            continue;
        }

        let alive = health.is_alive() && !killed.contains_key(&entity);
        let directive = machine.take_directive();

        // Throttled тик: только death check
        if alive && !throttle.fresh && directive.is_none() {
            continue;
        }

        match directive {
            Some(Directive::Engage(shared)) if target.get() != Some(shared) => {
                target.0 = Some(shared);
                target_events.write(TargetChanged { agent: entity, target: Some(shared) });
            }
            Some(Directive::Release) if target.get().is_some() => {
                target.0 = None;
                target_events.write(TargetChanged { agent: entity, target: None });
            }
            _ => {}
        }

        let target_snapshot = target
            .get()
            .and_then(|t| targets.get(t).ok())
            .filter(|(_, target_health)| target_health.is_alive())
            .map(|(target_position, _)| target_position.0);

        let crowded = machine.current() == AiState::Attack
            && !registry
                .allies_within(actor.faction_id, position.0, config.crowding_radius, entity)
                .is_empty();

        let reposition_complete = reposition.remaining <= 0.0
            || reposition
                .point
                .is_none_or(|point| position.distance(point) <= REPOSITION_ARRIVAL);

        let inputs = TransitionInputs {
            alive,
            target_distance: target_snapshot.map(|p| position.distance(p)),
            has_patrol: patrol_route.is_some_and(|route| !route.is_empty()),
            patrol_finished: patrol_cursor.as_deref().is_some_and(|cursor| cursor.finished),
            crowded,
            reposition_complete,
            directive,
        };

        let next = next_state(machine.current(), &inputs, config);

        let transition = {
            let mut effects = TransitionEffects {
                agent: entity,
                config,
                movement: movement.as_deref_mut(),
                patrol: patrol_cursor.as_deref_mut(),
                cues: &mut cues,
            };
            machine.change_state(next, &mut effects)
        };

        let Some(transition) = transition else {
            continue;
        };

        match transition.to {
            AiState::Reposition => {
                if let Some(target_position) = target_snapshot {
                    reposition.point = Some(flank_point(entity, position.0, target_position, config.attack_radius));
                    reposition.remaining = config.reposition_timeout;
                }
            }
            AiState::Dead => {
                if target.get().is_some() {
                    target.0 = None;
                    target_events.write(TargetChanged { agent: entity, target: None });
                }
                registry.unregister(entity);
                commands.entity(entity).insert(DespawnAfter::new(config.death_grace_delay));

                let killer = killed.get(&entity).copied().flatten();
                agent_died_events.write(AgentDied { agent: entity, killer });
                info!("💀 {:?} died (killer {:?}) → AI disabled", entity, killer);
            }
            AiState::Idle | AiState::Patrol => {
                // Цель потеряна (или Release) — сбрасываем ссылку
                if target.get().is_some() && target_snapshot.is_none() {
                    target.0 = None;
                    target_events.write(TargetChanged { agent: entity, target: None });
                }
                reposition.point = None;
            }
            AiState::Chase | AiState::Attack => {
                reposition.point = None;
            }
        }

        for cue in cues.drain(..) {
            cue_events.write(cue);
        }
        state_events.write(StateChanged {
            agent: entity,
            from: transition.from,
            to: transition.to,
        });
        debug!("AI: {:?} {} → {}", entity, transition.from.as_str(), transition.to.as_str());
    }
}
