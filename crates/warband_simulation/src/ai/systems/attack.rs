//! AI attack execution (Attack state → skill executor / AttackIntent).

use bevy::prelude::*;
use tracing::debug;

use crate::ai::{AIConfig, AiAgent, AiState, AnimationCue, AttackIntent, CurrentTarget, StateMachine};
use crate::combat::{BasicAttack, SkillExecutorService};
use crate::components::{Health, Position};

/// Система: AI attack execution
///
/// В Attack state с живой целью в радиусе:
/// - есть SkillExecutorService → делегируем ему базовую атаку
/// - нет → AttackIntent (резолвит combat::resolve_attack_intents)
pub fn ai_attack_execution(
    mut agents: Query<(Entity, &Position, &AIConfig, &StateMachine, &CurrentTarget, &mut BasicAttack), With<AiAgent>>,
    targets: Query<(&Position, &Health)>,
    mut executor: Option<ResMut<SkillExecutorService>>,
    mut intents: EventWriter<AttackIntent>,
    mut cues: EventWriter<AnimationCue>,
) {
    for (entity, position, config, machine, target, mut attack) in agents.iter_mut() {
        if machine.current() != AiState::Attack || !attack.can_attack() {
            continue;
        }

        let Some(target_entity) = target.get() else {
            continue;
        };
        let Ok((target_position, target_health)) = targets.get(target_entity) else {
            continue;
        };
        if !target_health.is_alive() {
            continue;
        }

        let reach = config.attack_radius + config.attack_hysteresis;
        if position.distance(target_position.0) > reach {
            continue;
        }

        match executor.as_deref_mut() {
            Some(service) => {
                if !service.0.can_execute(entity) {
                    continue;
                }
                service.0.execute(entity, target_position.0);
            }
            None => {
                intents.write(AttackIntent {
                    attacker: entity,
                    target: target_entity,
                    damage: attack.base_damage,
                    reach,
                });
            }
        }

        attack.start_cooldown();
        cues.write(AnimationCue::PlayAttack { agent: entity });
        debug!("⚔️ {:?} attacks {:?}", entity, target_entity);
    }
}
