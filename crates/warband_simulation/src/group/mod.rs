//! GroupCoordinator: строй, общая цель, синхронный вход/выход из боя

use bevy::prelude::*;

pub mod coordinator;
pub mod formation;
pub mod systems;


pub use coordinator::{centroid, Group, GroupMember};
pub use formation::{formation_offsets, FormationConfig, FormationShape};

use crate::SimulationSet;

/// Group Plugin
///
/// Всё в SimulationSet::Coordination: после perception (spatial index свежий),
/// до decision (директивы Engage/Release потребляются FSM в этом же тике).
pub struct GroupPlugin;

impl Plugin for GroupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                systems::prune_group_members,
                systems::coordinate_groups,
                systems::advance_group_anchor,
                systems::steer_formation,
            )
                .chain()
                .in_set(SimulationSet::Coordination),
        );
    }
}
