//! WARBAND Simulation Core
//!
//! ECS-симуляция боевого AI на Bevy 0.16 (headless, без рендера)
//!
//! Слои:
//! - ai: индивидуальный агент (TargetSelector → StateMachine → execution)
//! - group: GroupCoordinator (строй, общая цель, синхронный вход в бой)
//! - boss: capability поверх агента (ThreatBalancer, CounterplayValidator, TelegraphSequencer)
//! - combat/navigation: минимальные collaborators (урон, kinematic движение)
//!
//! Host (движок/сервер) может подменить collaborators через ресурсы
//! `SpatialService`, `SkillExecutorService` и `NavigableArea`.

use bevy::ecs::component::Tick;
use bevy::ecs::event::EventRegistry;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod boss;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod group;
pub mod logger;
pub mod navigation;
pub mod registry;
pub mod spatial;
pub mod spawn;

// Re-export базовых типов для удобства
pub use ai::{AIConfig, AIPlugin, AiAgent, AiState, CurrentTarget, StateMachine};
pub use boss::{BossBehavior, BossPlugin, BossTuning, SkillDescriptor};
pub use combat::{calculate_damage, BasicAttack, CombatPlugin, DamageDealt, EntityDied};
pub use components::*;
pub use config::{AgentTemplates, ConfigError, SimulationConfig};
pub use error::AiError;
pub use group::{FormationConfig, FormationShape, Group, GroupMember, GroupPlugin};
pub use logger::init_logger;
pub use navigation::{KinematicNavigator, NavigableArea, NavigationPlugin};
pub use registry::AgentRegistry;
pub use spawn::{spawn_group, AgentBlueprint};

/// Частота simulation tick по умолчанию
pub const DEFAULT_TICK_HZ: f64 = 60.0;

/// Фазы тика (FixedUpdate), строго по порядку
///
/// Perception → Coordination → Decision → Execution → Boss → Resolution → Lifecycle
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Registry/spatial index + выбор целей
    Perception,
    /// GroupCoordinator: общая цель, директивы, строй
    Coordination,
    /// StateMachine переходы
    Decision,
    /// MovementCommand / атаки
    Execution,
    /// Boss decision points, телеграфы, continuations
    Boss,
    /// Применение движения и урона, реакции на урон
    Resolution,
    /// Despawn после death grace
    Lifecycle,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Seed мог выставить host (create_headless_app / конфиг) — не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.insert_resource(Time::<Fixed>::from_hz(DEFAULT_TICK_HZ))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Perception,
                    SimulationSet::Coordination,
                    SimulationSet::Decision,
                    SimulationSet::Execution,
                    SimulationSet::Boss,
                    SimulationSet::Resolution,
                    SimulationSet::Lifecycle,
                )
                    .chain(),
            )
            .add_plugins((AIPlugin, GroupPlugin, BossPlugin, CombatPlugin, NavigationPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Единственный источник случайности: patrol sampling, Random formation anchor,
/// weighted skill draw. Один seed + одни входы → одинаковый прогон.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    init_logger();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin);

    app
}

/// Change tick последней ротации event буферов (manual tick driver)
#[derive(Resource)]
struct EventRotationTick(Option<Tick>);

/// Прогоняет ровно один FixedUpdate тик длиной `dt` секунд
///
/// Не зависит от wall clock: тесты и binary получают одинаковую последовательность.
/// `First` здесь не запускается, поэтому event буферы ротируются в конце тика:
/// после вызова в `Events<E>` лежат только события этого тика (double buffer
/// сохраняет их для reader'ов следующего тика).
pub fn advance_tick(app: &mut App, dt: f32) {
    let world = app.world_mut();
    world
        .resource_mut::<Time<Fixed>>()
        .advance_by(Duration::from_secs_f32(dt.max(0.0)));
    world.run_schedule(FixedUpdate);
    rotate_events(world);
}

/// То же, что `event_update_system` в `First`, но без ожидания сигнала FixedMain
fn rotate_events(world: &mut World) {
    if !world.contains_resource::<EventRegistry>() {
        return;
    }
    let last_rotation = world
        .get_resource::<EventRotationTick>()
        .and_then(|rotation| rotation.0)
        .unwrap_or_else(|| Tick::new(0));

    world.resource_scope(|world, mut registry: Mut<EventRegistry>| {
        registry.run_updates(world, last_rotation);
    });

    let now = world.change_tick();
    world.insert_resource(EventRotationTick(Some(now)));
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
