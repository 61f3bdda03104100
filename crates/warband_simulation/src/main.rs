//! Headless симуляция WARBAND
//!
//! Демо-энкаунтер из config/encounter.toml: игрок-манекен против отряда
//! в строю и босса. Фиксированное число тиков, отчёт в лог.

use bevy::prelude::*;
use tracing::{error, info};

use warband_simulation::ai::AiState;
use warband_simulation::boss::{BossPhase, ThreatBalancer};
use warband_simulation::{
    advance_tick, create_headless_app, init_logger, spawn_group, ConfigError, Health, SimulationConfig, StateMachine,
};

const ENCOUNTER: &str = include_str!("../config/encounter.toml");
const TICKS: u32 = 1800;
const REPORT_EVERY: u32 = 300;

fn main() {
    init_logger();

    if let Err(err) = run() {
        error!("❌ encounter failed: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ConfigError> {
    let config = SimulationConfig::from_toml_str(ENCOUNTER)?;
    let templates = config.templates();
    info!("Starting WARBAND headless simulation (seed: {}, {} Hz)", config.seed, config.tick_hz);

    let mut app = create_headless_app(config.seed);
    app.insert_resource(Time::<Fixed>::from_hz(config.tick_hz))
        .insert_resource(templates.clone());
    if let Some(arena) = config.arena() {
        app.insert_resource(arena);
    }

    let world = app.world_mut();
    let player = templates.blueprint("player", Vec2::ZERO)?.spawn(world, Vec2::ZERO);

    let squad_anchor = Vec2::new(18.0, 0.0);
    let mut squad = Vec::new();
    for i in 0..4 {
        let position = squad_anchor + Vec2::new(i as f32 * 2.0 - 3.0, 0.0);
        squad.push(templates.blueprint("grunt", position)?.spawn(world, position));
    }
    let march = warband_simulation::ai::PatrolRoute::new(
        &[squad_anchor, Vec2::new(8.0, 0.0)],
        warband_simulation::ai::PatrolMode::PingPong,
    );
    spawn_group(world, 1, squad_anchor, templates.formation("shield_wall")?, &squad, Some(march));

    let boss_origin = Vec2::new(-14.0, 8.0);
    let boss = templates.blueprint("warlord", boss_origin)?.spawn(world, boss_origin);

    let dt = (1.0 / config.tick_hz) as f32;
    for tick in 0..TICKS {
        advance_tick(&mut app, dt);

        if tick % REPORT_EVERY == 0 {
            report(app.world_mut(), tick, player, boss);
        }
    }

    report(app.world_mut(), TICKS, player, boss);
    info!("Simulation complete!");
    Ok(())
}

fn report(world: &mut World, tick: u32, player: Entity, boss: Entity) {
    let mut states: std::collections::BTreeMap<&'static str, usize> = Default::default();
    let mut query = world.query::<&StateMachine>();
    for fsm in query.iter(world) {
        *states.entry(fsm.current().as_str()).or_default() += 1;
    }

    let player_hp = world.get::<Health>(player).map(|h| h.current).unwrap_or(0);
    let boss_state = world.get::<StateMachine>(boss).map(|fsm| fsm.current()).unwrap_or(AiState::Dead);
    let threat = world.get::<ThreatBalancer>(boss).map(|t| t.level()).unwrap_or(0.0);
    let phase = world.get::<BossPhase>(boss).map(|p| p.0).unwrap_or(0);

    info!(
        "Tick {}: states {:?} | player hp {} | boss {} (phase {}, threat {:.2})",
        tick,
        states,
        player_hp,
        boss_state.as_str(),
        phase,
        threat
    );
}
