//! Combat system module
//!
//! ECS ответственность:
//! - Game state: Health, BasicAttack cooldowns
//! - Combat rules: damage calculation, shield reduction
//! - Events: DamageDealt, EntityDied
//!
//! Хост ответственность (опционально):
//! - SkillExecutor: собственное применение атак вместо AttackIntent

use bevy::prelude::*;

pub mod attacker;
pub mod damage;
pub mod executor;

#[cfg(test)]
mod damage_tests;

// Re-export основных типов
pub use attacker::{tick_attack_cooldowns, BasicAttack};
pub use damage::{
    apply_damage, calculate_damage, despawn_after_timeout, resolve_attack_intents, DamageDealt, DespawnAfter,
    EntityDied, HitOutcome, Shielded,
};
pub use executor::{SkillExecutor, SkillExecutorService};

use crate::SimulationSet;

/// Combat Plugin
///
/// Порядок выполнения:
/// 1. tick_attack_cooldowns — до решения об атаке (Execution)
/// 2. resolve_attack_intents — после всех намерений тика (Resolution)
/// 3. despawn_after_timeout — в конце тика (Lifecycle)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .register_type::<BasicAttack>();

        app.add_systems(
            FixedUpdate,
            tick_attack_cooldowns
                .in_set(SimulationSet::Execution)
                .before(crate::ai::systems::ai_attack_execution),
        )
        .add_systems(
            FixedUpdate,
            resolve_attack_intents
                .in_set(SimulationSet::Resolution)
                .before(crate::ai::systems::react_to_damage),
        )
        .add_systems(FixedUpdate, despawn_after_timeout.in_set(SimulationSet::Lifecycle));
    }
}
