//! Boss capability: skill roster + ThreatBalancer + CounterplayValidator + TelegraphSequencer
//!
//! Атака босса: ThreatBalancer (веса) → CounterplayValidator → TelegraphSequencer → урон.

use bevy::prelude::*;

pub mod behavior;
pub mod continuation;
pub mod counterplay;
pub mod events;
pub mod patterns;
pub mod phases;
pub mod selection;
pub mod skill;
pub mod systems;
pub mod telegraph;
pub mod threat;


pub use behavior::{BossBehavior, BossTuning};
pub use continuation::{ActiveEffects, BossEffect, ChargeMotion, Continuation, PersistentHazard, Progress, ShieldWindow};
pub use counterplay::{intrinsic_difficulty, validate, CounterplayCapabilities, Rejection, ValidatorPolicy};
pub use events::{PhaseChanged, SummonRequested, TelegraphOutcome, TelegraphResolved, TelegraphSpawned};
pub use phases::{BossPhase, PhaseTuning};
pub use skill::{
    BossArchetype, CounterplaySet, RangeBand, SkillCategory, SkillDescriptor, SkillRoster, SkillSlot, ThreatType,
};
pub use telegraph::{
    compute_warning_duration, FollowUp, Strike, Telegraph, TelegraphId, TelegraphPhase, TelegraphRequest,
    TelegraphSequencer, TelegraphShape, TelegraphTiming, TelegraphTuning,
};
pub use threat::{PlayerPerformance, ThreatBalancer, ThreatTuning};

use crate::SimulationSet;

/// Boss Plugin
///
/// Всё в SimulationSet::Boss: после Execution (цель и состояние уже решены),
/// до Resolution (DamageDealt от strikes читает react_to_damage).
pub struct BossPlugin;

impl Plugin for BossPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PhaseChanged>()
            .add_event::<SummonRequested>()
            .add_event::<TelegraphSpawned>()
            .add_event::<TelegraphResolved>();

        app.add_systems(
            FixedUpdate,
            (
                systems::track_boss_phases,
                systems::update_threat,
                systems::decide_boss_skills,
                systems::advance_telegraphs,
                systems::tick_boss_effects,
            )
                .chain()
                .in_set(SimulationSet::Boss),
        );
    }
}
