//! Tests for AI execution systems (movement + attack).

use std::sync::{Arc, Mutex};

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;

use super::attack::ai_attack_execution;
use super::movement::{ai_state_execution, reset_replaced_routes};
use crate::ai::state_machine::NoHooks;
use crate::ai::{
    AIConfig, AiAgent, AiState, AnimationCue, AttackIntent, CurrentTarget, PatrolCursor, PatrolMode, PatrolRoute,
    RepositionGoal, StateMachine,
};
use crate::combat::{BasicAttack, SkillExecutor, SkillExecutorService};
use crate::components::{Actor, Health, MovementCommand, NavigationStatus, Position};
use crate::group::GroupMember;
use crate::DeterministicRng;

fn setup_world() -> World {
    let mut world = World::new();
    world.insert_resource(Time::<Fixed>::default());
    world.insert_resource(DeterministicRng::new(1));
    world.init_resource::<Events<AttackIntent>>();
    world.init_resource::<Events<AnimationCue>>();
    world
}

fn spawn_in_state(world: &mut World, state: AiState, target: Option<Entity>) -> Entity {
    let mut machine = StateMachine::new(false);
    machine.change_state(state, &mut NoHooks);
    world
        .spawn((
            AiAgent,
            Actor::new(1),
            Position::new(0.0, 0.0),
            AIConfig::default(),
            machine,
            CurrentTarget(target),
            RepositionGoal::default(),
            MovementCommand::default(),
        ))
        .id()
}

fn command_of(world: &World, agent: Entity) -> MovementCommand {
    *world.get::<MovementCommand>(agent).expect("command")
}

#[test]
fn test_chase_moves_to_target() {
    let mut world = setup_world();
    let enemy = world.spawn((Actor::new(2), Position::new(6.0, 2.0))).id();
    let agent = spawn_in_state(&mut world, AiState::Chase, Some(enemy));

    world.run_system_once(ai_state_execution).expect("execution");

    assert_eq!(
        command_of(&world, agent),
        MovementCommand::MoveToPosition {
            target: Vec2::new(6.0, 2.0),
            speed: AIConfig::default().chase_speed,
        }
    );
}

#[test]
fn test_chase_with_stale_target_stops() {
    let mut world = setup_world();
    let enemy = world.spawn((Actor::new(2), Position::new(6.0, 2.0))).id();
    let agent = spawn_in_state(&mut world, AiState::Chase, Some(enemy));
    world.despawn(enemy);

    world.run_system_once(ai_state_execution).expect("execution");

    assert_eq!(command_of(&world, agent), MovementCommand::Stop);
}

#[test]
fn test_attack_holds_position() {
    let mut world = setup_world();
    let enemy = world.spawn((Actor::new(2), Position::new(1.0, 0.0))).id();
    let agent = spawn_in_state(&mut world, AiState::Attack, Some(enemy));
    world.entity_mut(agent).insert(MovementCommand::MoveToPosition {
        target: Vec2::ONE,
        speed: 1.0,
    });

    world.run_system_once(ai_state_execution).expect("execution");

    assert_eq!(command_of(&world, agent), MovementCommand::Stop);
}

#[test]
fn test_patrol_advances_on_arrival() {
    let mut world = setup_world();
    let agent = world
        .spawn((
            AiAgent,
            Actor::new(1),
            Position::new(0.0, 0.0),
            AIConfig::default(),
            StateMachine::new(true),
            CurrentTarget::default(),
            RepositionGoal::default(),
            MovementCommand::default(),
            PatrolRoute::new(&[Vec2::ZERO, Vec2::new(5.0, 0.0)], PatrolMode::Loop),
            PatrolCursor::default(),
        ))
        .id();

    // Стоим на waypoint 0 → сразу едем к waypoint 1
    world.run_system_once(ai_state_execution).expect("execution");

    assert_eq!(command_of(&world, agent).destination(), Some(Vec2::new(5.0, 0.0)));
    assert_eq!(world.get::<PatrolCursor>(agent).expect("cursor").index, 1);
}

#[test]
fn test_replaced_route_resets_cursor() {
    let mut world = setup_world();
    let agent = world
        .spawn((
            PatrolRoute::new(&[Vec2::ZERO, Vec2::X], PatrolMode::PingPong),
            PatrolCursor {
                index: 4,
                direction: -1,
                destination: Some(Vec2::new(4.0, 0.0)),
                finished: false,
            },
        ))
        .id();

    world.run_system_once(reset_replaced_routes).expect("reset");

    assert_eq!(*world.get::<PatrolCursor>(agent).expect("cursor"), PatrolCursor::default());
}

#[test]
fn test_missing_movement_command_degrades() {
    let mut world = setup_world();
    let agent = spawn_in_state(&mut world, AiState::Chase, None);
    world.entity_mut(agent).remove::<MovementCommand>();

    // Не паникует, повторный тик тоже (warn только один раз)
    world.run_system_once(ai_state_execution).expect("execution");
    world.run_system_once(ai_state_execution).expect("execution");

    assert_eq!(world.get::<StateMachine>(agent).expect("machine").current(), AiState::Chase);
}

#[test]
fn test_off_navigable_surface_is_noop() {
    let mut world = setup_world();
    let enemy = world.spawn((Actor::new(2), Position::new(6.0, 0.0))).id();
    let agent = spawn_in_state(&mut world, AiState::Chase, Some(enemy));
    world.entity_mut(agent).insert(NavigationStatus {
        on_navigable_surface: false,
        ..Default::default()
    });

    world.run_system_once(ai_state_execution).expect("execution");

    assert_eq!(command_of(&world, agent), MovementCommand::Idle);
}

#[test]
fn test_steered_member_left_to_formation() {
    let mut world = setup_world();
    let enemy = world.spawn((Actor::new(2), Position::new(6.0, 0.0))).id();
    let agent = spawn_in_state(&mut world, AiState::Chase, Some(enemy));
    let group = world.spawn_empty().id();
    world.entity_mut(agent).insert(GroupMember {
        group,
        steered: true,
    });

    world.run_system_once(ai_state_execution).expect("execution");

    assert_eq!(command_of(&world, agent), MovementCommand::Idle);
}

#[test]
fn test_reposition_timer_runs_down() {
    let mut world = setup_world();
    world
        .resource_mut::<Time<Fixed>>()
        .advance_by(std::time::Duration::from_millis(500));
    let agent = spawn_in_state(&mut world, AiState::Reposition, None);
    world.entity_mut(agent).insert(RepositionGoal {
        point: Some(Vec2::new(3.0, 3.0)),
        remaining: 2.0,
    });

    world.run_system_once(ai_state_execution).expect("execution");

    let goal = world.get::<RepositionGoal>(agent).expect("goal");
    assert!((goal.remaining - 1.5).abs() < 1e-4);
    assert_eq!(command_of(&world, agent).destination(), Some(Vec2::new(3.0, 3.0)));
}

// --- Attack execution ---

fn spawn_attacker(world: &mut World, target_position: Vec2) -> (Entity, Entity) {
    let enemy = world
        .spawn((Actor::new(2), Health::new(50), Position(target_position)))
        .id();
    let agent = spawn_in_state(world, AiState::Attack, Some(enemy));
    world.entity_mut(agent).insert(BasicAttack::new(12, 1.0));
    (agent, enemy)
}

#[test]
fn test_attack_emits_intent_and_starts_cooldown() {
    let mut world = setup_world();
    let (agent, enemy) = spawn_attacker(&mut world, Vec2::new(1.5, 0.0));

    world.run_system_once(ai_attack_execution).expect("attack");

    let intents: Vec<AttackIntent> = world
        .resource::<Events<AttackIntent>>()
        .iter_current_update_events()
        .copied()
        .collect();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].attacker, agent);
    assert_eq!(intents[0].target, enemy);
    assert_eq!(intents[0].damage, 12);
    assert!(!world.get::<BasicAttack>(agent).expect("attack").can_attack());

    // Cooldown не истёк → второй атаки нет
    world.run_system_once(ai_attack_execution).expect("attack");
    assert_eq!(world.resource::<Events<AttackIntent>>().len(), 1);
}

#[test]
fn test_attack_out_of_reach_skipped() {
    let mut world = setup_world();
    spawn_attacker(&mut world, Vec2::new(4.0, 0.0));

    world.run_system_once(ai_attack_execution).expect("attack");

    assert!(world.resource::<Events<AttackIntent>>().is_empty());
}

#[derive(Default)]
struct RecordingExecutor {
    calls: Arc<Mutex<Vec<(Entity, Vec2)>>>,
}

impl SkillExecutor for RecordingExecutor {
    fn can_execute(&self, _caster: Entity) -> bool {
        true
    }

    fn execute(&mut self, caster: Entity, target_position: Vec2) {
        self.calls.lock().expect("lock").push((caster, target_position));
    }
}

#[test]
fn test_attack_delegates_to_skill_executor() {
    let mut world = setup_world();
    let calls = Arc::new(Mutex::new(Vec::new()));
    world.insert_resource(SkillExecutorService::new(RecordingExecutor { calls: calls.clone() }));
    let (agent, _) = spawn_attacker(&mut world, Vec2::new(1.0, 1.0));

    world.run_system_once(ai_attack_execution).expect("attack");

    assert_eq!(*calls.lock().expect("lock"), vec![(agent, Vec2::new(1.0, 1.0))]);
    assert!(world.resource::<Events<AttackIntent>>().is_empty());
}
