//! Damage: применение урона, смерть, отложенный despawn
//!
//! Источники урона:
//! - AttackIntent (базовые атаки без SkillExecutor)
//! - Telegraph strikes босса (boss::systems)
//! Оба пути идут через `apply_damage`, чтобы DamageDealt/EntityDied были одинаковыми.

use bevy::prelude::*;
use tracing::{debug, info};

use crate::ai::AttackIntent;
use crate::components::{Health, Position};

/// Событие: урон нанесен
///
/// Генерируется после применения damage к Health.
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub target_died: bool,
}

/// Событие: entity умер (health == 0)
///
/// Это OnDeath нотификация Character collaborator; FSM переводит агента в Dead.
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Снижение входящего урона (ShieldWindow босса)
#[derive(Component, Debug, Clone, Copy)]
pub struct Shielded {
    /// Доля поглощаемого урона [0..1]
    pub reduction: f32,
}

/// Отложенный despawn (death grace delay)
#[derive(Component, Debug, Clone, Copy)]
pub struct DespawnAfter {
    pub remaining: f32,
}

impl DespawnAfter {
    pub fn new(delay: f32) -> Self {
        Self { remaining: delay.max(0.0) }
    }
}

/// Final damage с учётом щита
pub fn calculate_damage(base_damage: u32, shield: Option<&Shielded>) -> u32 {
    let reduction = shield.map_or(0.0, |s| s.reduction.clamp(0.0, 1.0));
    (base_damage as f32 * (1.0 - reduction)).round() as u32
}

/// Итог одного попадания
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    pub damage: u32,
    pub killed: bool,
}

/// Применяет урон к Health. Мёртвых не бьём повторно (None).
pub fn apply_damage(health: &mut Health, shield: Option<&Shielded>, base_damage: u32) -> Option<HitOutcome> {
    if !health.is_alive() {
        return None;
    }

    let damage = calculate_damage(base_damage, shield);
    health.take_damage(damage);

    Some(HitOutcome {
        damage,
        killed: !health.is_alive(),
    })
}

/// Система: резолв AttackIntent
///
/// 1. Проверяем reach (цель могла уйти за тик)
/// 2. Применяем damage к Health
/// 3. Генерируем DamageDealt и EntityDied события
pub fn resolve_attack_intents(
    mut intents: EventReader<AttackIntent>,
    positions: Query<&Position>,
    mut targets: Query<(&mut Health, Option<&Shielded>)>,
    mut damage_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
) {
    for intent in intents.read() {
        let (Ok(from), Ok(to)) = (positions.get(intent.attacker), positions.get(intent.target)) else {
            continue;
        };
        if from.distance(to.0) > intent.reach {
            debug!("attack {:?} → {:?} missed (out of reach)", intent.attacker, intent.target);
            continue;
        }

        let Ok((mut health, shield)) = targets.get_mut(intent.target) else {
            continue;
        };
        let Some(outcome) = apply_damage(&mut health, shield, intent.damage) else {
            continue;
        };

        damage_events.write(DamageDealt {
            attacker: intent.attacker,
            target: intent.target,
            damage: outcome.damage,
            target_died: outcome.killed,
        });

        if outcome.killed {
            died_events.write(EntityDied {
                entity: intent.target,
                killer: Some(intent.attacker),
            });
            info!("☠️ Entity {:?} killed by {:?}", intent.target, intent.attacker);
        }
    }
}

/// Система: despawn после grace delay
pub fn despawn_after_timeout(
    mut commands: Commands,
    mut pending: Query<(Entity, &mut DespawnAfter)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut timer) in pending.iter_mut() {
        timer.remaining -= delta;
        if timer.remaining <= 0.0 {
            commands.entity(entity).despawn();
            debug!("despawned {:?}", entity);
        }
    }
}
