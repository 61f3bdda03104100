//! AI decision-making module
//!
//! Индивидуальный агент: perception (TargetSelector) → decision (StateMachine)
//! → execution (MovementCommand / атака). Чистая логика живёт в
//! `state_machine`, `target_selector`, `patrol`; ECS системы в `systems` только связывают.

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod patrol;
pub mod state_machine;
pub mod systems;
pub mod target_selector;

// Re-export основных типов
pub use components::*;
pub use events::{AgentDied, AnimationCue, AttackIntent, StateChanged, TargetChanged};
pub use state_machine::{Directive, StateHooks, StateMachine, Transition};

use crate::registry::{register_spawned_agents, sync_registry_positions, AgentRegistry};
use crate::spatial::{rebuild_spatial_index, SpatialIndex};
use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. Perception: register → sync registry → reset replaced routes → rebuild spatial index → acquire_targets
/// 2. Decision: ai_fsm_transitions (после GroupCoordinator директив)
/// 3. Execution: ai_state_execution → ai_attack_execution
/// 4. Resolution: react_to_damage (после применения урона)
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AgentRegistry>()
            .init_resource::<SpatialIndex>()
            .add_event::<TargetChanged>()
            .add_event::<StateChanged>()
            .add_event::<AgentDied>()
            .add_event::<AnimationCue>()
            .add_event::<AttackIntent>()
            .register_type::<AiState>()
            .register_type::<AIConfig>();

        app.add_systems(
            FixedUpdate,
            (
                register_spawned_agents,
                sync_registry_positions,
                systems::reset_replaced_routes,
                rebuild_spatial_index,
                systems::acquire_targets,
            )
                .chain()
                .in_set(SimulationSet::Perception),
        )
        .add_systems(FixedUpdate, systems::ai_fsm_transitions.in_set(SimulationSet::Decision))
        .add_systems(
            FixedUpdate,
            (systems::ai_state_execution, systems::ai_attack_execution)
                .chain()
                .in_set(SimulationSet::Execution),
        )
        .add_systems(FixedUpdate, systems::react_to_damage.in_set(SimulationSet::Resolution));
    }
}
