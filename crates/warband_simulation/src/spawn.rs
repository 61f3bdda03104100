//! AgentBlueprint: явная сборка компонентов агента из шаблона
//!
//! Никакого глобального lookup при спавне: всё что нужно агенту
//! (AIConfig, атака, маршрут, boss capability) лежит в blueprint.

use std::sync::Arc;

use bevy::prelude::*;
use tracing::{info, warn};

use crate::ai::{AIConfig, AiAgent, CurrentTarget, PatrolCursor, PatrolRoute, PerceptionThrottle, RepositionGoal, StateMachine};
use crate::boss::{BossBehavior, BossTuning, CounterplayCapabilities, CounterplaySet, SkillDescriptor, SkillRoster, ThreatBalancer};
use crate::combat::BasicAttack;
use crate::components::{Actor, Health, MovementCommand, Position, Targetable};
use crate::group::{FormationConfig, Group, GroupMember};
use crate::navigation::KinematicNavigator;
use crate::spatial::TargetCategory;

/// Boss часть blueprint (skills уже resolved из каталога)
#[derive(Debug, Clone)]
pub struct BossBlueprint {
    pub tuning: BossTuning,
    pub skills: Vec<Arc<SkillDescriptor>>,
}

/// Шаблон спавна агента
#[derive(Debug, Clone)]
pub struct AgentBlueprint {
    pub faction_id: u64,
    pub health: u32,
    pub category: TargetCategory,
    pub ai: AIConfig,
    /// false → цель без AI (манекен/игрок под внешним управлением)
    pub ai_controlled: bool,
    pub attack: Option<BasicAttack>,
    pub patrol: Option<PatrolRoute>,
    pub boss: Option<BossBlueprint>,
    pub counterplay: Option<CounterplaySet>,
}

impl AgentBlueprint {
    pub fn new(faction_id: u64) -> Self {
        Self {
            faction_id,
            health: 100,
            category: TargetCategory::NPC,
            ai: AIConfig::default(),
            ai_controlled: true,
            attack: Some(BasicAttack::default()),
            patrol: None,
            boss: None,
            counterplay: None,
        }
    }

    /// Цель без AI: Actor + Health + Position + Targetable (+ movement контракт)
    pub fn target_dummy(faction_id: u64, category: TargetCategory) -> Self {
        Self {
            category,
            ai_controlled: false,
            attack: None,
            ..Self::new(faction_id)
        }
    }

    pub fn with_health(mut self, health: u32) -> Self {
        self.health = health;
        self
    }

    pub fn with_category(mut self, category: TargetCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_config(mut self, ai: AIConfig) -> Self {
        self.ai = ai;
        self
    }

    pub fn with_attack(mut self, attack: Option<BasicAttack>) -> Self {
        self.attack = attack;
        self
    }

    pub fn with_patrol(mut self, route: PatrolRoute) -> Self {
        self.patrol = Some(route);
        self
    }

    pub fn with_counterplay(mut self, counterplay: CounterplaySet) -> Self {
        self.counterplay = Some(counterplay);
        self
    }

    /// Boss capability поверх обычного агента
    pub fn as_boss(mut self, tuning: BossTuning, skills: Vec<Arc<SkillDescriptor>>) -> Self {
        self.boss = Some(BossBlueprint { tuning, skills });
        self
    }

    /// Спавн напрямую в World (тесты, headless binary)
    pub fn spawn(&self, world: &mut World, position: Vec2) -> Entity {
        let entity = world.spawn_empty().id();
        self.insert_into(world, entity, position);
        entity
    }

    /// Спавн через Commands: id сразу, компоненты при применении команд
    pub fn spawn_deferred(&self, commands: &mut Commands, position: Vec2) -> Entity {
        let entity = commands.spawn_empty().id();
        let blueprint = self.clone();
        commands.queue(move |world: &mut World| blueprint.insert_into(world, entity, position));
        entity
    }

    fn insert_into(&self, world: &mut World, entity: Entity, position: Vec2) {
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            warn!("spawn: entity {:?} vanished before blueprint insert", entity);
            return;
        };

        entity_mut.insert((
            Actor::new(self.faction_id),
            Health::new(self.health),
            Position(position),
            Targetable::new(self.category),
            MovementCommand::Idle,
            KinematicNavigator::default(),
        ));

        if let Some(counterplay) = self.counterplay {
            entity_mut.insert(CounterplayCapabilities(counterplay));
        }

        if !self.ai_controlled {
            return;
        }

        entity_mut.insert((
            AiAgent,
            self.ai.clone(),
            StateMachine::new(self.patrol.is_some()),
            CurrentTarget::default(),
            PerceptionThrottle::default(),
            RepositionGoal::default(),
        ));

        if let Some(attack) = &self.attack {
            entity_mut.insert(attack.clone());
        }

        if let Some(route) = &self.patrol {
            entity_mut.insert((route.clone(), PatrolCursor::default()));
        }

        if let Some(boss) = &self.boss {
            entity_mut.insert((
                BossBehavior::new(boss.tuning.clone()),
                SkillRoster::new(boss.skills.iter().cloned()),
                ThreatBalancer::new(boss.tuning.threat.baseline),
            ));
        }
    }
}

/// Создаёт группу и привязывает к ней агентов
///
/// Маршрут (если есть) ведёт anchor группы, а не отдельных членов.
pub fn spawn_group(
    world: &mut World,
    faction_id: u64,
    anchor: Vec2,
    config: FormationConfig,
    members: &[Entity],
    route: Option<PatrolRoute>,
) -> Entity {
    let group_entity = world.spawn_empty().id();
    let mut group = Group::new(faction_id, anchor, config);

    for &member in members {
        let Ok(mut member_mut) = world.get_entity_mut(member) else {
            warn!("spawn_group: member {:?} not found, skipped", member);
            continue;
        };
        if group.add_member(member) {
            member_mut.insert(GroupMember::new(group_entity));
        }
    }

    let mut group_mut = world.entity_mut(group_entity);
    group_mut.insert(group);
    if let Some(route) = route {
        group_mut.insert((route, PatrolCursor::default()));
    }

    info!("🛡️ group {:?} spawned: faction {}, {} members", group_entity, faction_id, members.len());
    group_entity
}
