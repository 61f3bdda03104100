//! Конфигурация: шаблоны агентов, каталог скиллов, формации (TOML)
//!
//! Загружается один раз при инициализации и дальше не мутирует:
//! агенты получают per-instance состояние из `AgentTemplates` (Arc внутри).

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{AIConfig, PatrolMode, PatrolRoute};
use crate::boss::{BossTuning, CounterplaySet, SkillDescriptor};
use crate::combat::BasicAttack;
use crate::group::FormationConfig;
use crate::navigation::NavigableArea;
use crate::spatial::TargetCategory;
use crate::spawn::AgentBlueprint;

/// Ошибки загрузки/валидации конфигурации
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown agent template '{0}'")]
    UnknownTemplate(String),

    #[error("unknown formation '{0}'")]
    UnknownFormation(String),

    #[error("template '{template}' references unknown skill '{skill}'")]
    UnknownSkill { template: String, skill: String },

    #[error("skill '{0}' is declared twice")]
    DuplicateSkill(String),

    #[error("skill '{skill}' has an empty range band")]
    EmptyRangeBand { skill: String },

    #[error("'{owner}' has negative {field}")]
    NegativeDuration { owner: String, field: &'static str },

    #[error("template '{template}': radii must satisfy attack <= chase and detection <= chase")]
    InvalidRadii { template: String },

    #[error("template '{template}' has a patrol without waypoints")]
    EmptyPatrol { template: String },

    #[error("tick rate must be positive, got {0}")]
    InvalidTickRate(f64),
}

/// Маршрут патруля в шаблоне
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolTemplate {
    pub waypoints: Vec<[f32; 2]>,
    #[serde(default)]
    pub mode: PatrolMode,
    #[serde(default = "default_anchor_radius")]
    pub anchor_radius: f32,
    #[serde(default = "default_arrival_tolerance")]
    pub arrival_tolerance: f32,
}

fn default_anchor_radius() -> f32 {
    6.0
}

fn default_arrival_tolerance() -> f32 {
    0.5
}

impl PatrolTemplate {
    /// Маршрут со смещением (waypoints шаблона относительно точки спавна)
    pub fn to_route(&self, origin: Vec2) -> PatrolRoute {
        let points: Vec<Vec2> = self.waypoints.iter().map(|p| origin + Vec2::from(*p)).collect();
        let mut route = PatrolRoute::new(&points, self.mode).with_arrival_tolerance(self.arrival_tolerance);
        route.anchor_radius = self.anchor_radius;
        route
    }
}

/// Boss часть шаблона: имена скиллов из каталога + tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BossTemplate {
    #[serde(default)]
    pub tuning: BossTuning,
    pub skills: Vec<String>,
}

/// Шаблон агента
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTemplate {
    pub faction: u64,
    pub health: u32,
    /// Собственная категория (как агента видят другие)
    pub category: TargetCategory,
    /// false → цель без AI (манекен игрока)
    pub ai_controlled: bool,
    pub ai: AIConfig,
    pub attack: Option<BasicAttack>,
    pub patrol: Option<PatrolTemplate>,
    pub boss: Option<BossTemplate>,
    pub counterplay: Option<CounterplaySet>,
}

impl Default for AgentTemplate {
    fn default() -> Self {
        Self {
            faction: 0,
            health: 100,
            category: TargetCategory::NPC,
            ai_controlled: true,
            ai: AIConfig::default(),
            attack: Some(BasicAttack::default()),
            patrol: None,
            boss: None,
            counterplay: None,
        }
    }
}

/// Границы арены (→ NavigableArea)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

/// Корневая конфигурация симуляции
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub tick_hz: f64,
    pub arena: Option<ArenaConfig>,
    pub agents: BTreeMap<String, AgentTemplate>,
    pub skills: Vec<SkillDescriptor>,
    pub formations: BTreeMap<String, FormationConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_hz: crate::DEFAULT_TICK_HZ,
            arena: None,
            agents: BTreeMap::new(),
            skills: Vec::new(),
            formations: BTreeMap::new(),
        }
    }
}

fn non_negative(owner: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value < 0.0 {
        return Err(ConfigError::NegativeDuration {
            owner: owner.to_string(),
            field,
        });
    }
    Ok(())
}

impl SimulationConfig {
    /// Парсинг + валидация
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz.is_nan() || self.tick_hz <= 0.0 {
            return Err(ConfigError::InvalidTickRate(self.tick_hz));
        }

        let mut seen = std::collections::BTreeSet::new();
        for skill in &self.skills {
            if !seen.insert(skill.name.as_str()) {
                return Err(ConfigError::DuplicateSkill(skill.name.clone()));
            }
            if !skill.range.is_valid() {
                return Err(ConfigError::EmptyRangeBand {
                    skill: skill.name.clone(),
                });
            }
            non_negative(&skill.name, "telegraph_duration", skill.telegraph_duration)?;
            non_negative(&skill.name, "cooldown", skill.cooldown)?;
            non_negative(&skill.name, "effect_duration", skill.effect_duration)?;
        }

        for (name, template) in &self.agents {
            let ai = &template.ai;
            if ai.attack_radius > ai.chase_radius || ai.detection_radius > ai.chase_radius {
                return Err(ConfigError::InvalidRadii {
                    template: name.clone(),
                });
            }
            non_negative(name, "perception_interval", ai.perception_interval)?;
            non_negative(name, "death_grace_delay", ai.death_grace_delay)?;
            non_negative(name, "reposition_timeout", ai.reposition_timeout)?;

            if let Some(attack) = &template.attack {
                non_negative(name, "attack cooldown", attack.cooldown)?;
            }

            if let Some(patrol) = &template.patrol {
                if patrol.waypoints.is_empty() {
                    return Err(ConfigError::EmptyPatrol {
                        template: name.clone(),
                    });
                }
            }

            if let Some(boss) = &template.boss {
                non_negative(name, "decision_interval", boss.tuning.decision_interval)?;
                non_negative(name, "hazard_interval", boss.tuning.hazard_interval)?;
                for skill in &boss.skills {
                    if !seen.contains(skill.as_str()) {
                        return Err(ConfigError::UnknownSkill {
                            template: name.clone(),
                            skill: skill.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    pub fn arena(&self) -> Option<NavigableArea> {
        self.arena
            .map(|arena| NavigableArea::new(Vec2::from(arena.min), Vec2::from(arena.max)))
    }

    /// Immutable каталог для спавна
    pub fn templates(&self) -> AgentTemplates {
        let skills = self
            .skills
            .iter()
            .map(|skill| (skill.name.clone(), Arc::new(skill.clone())))
            .collect();

        AgentTemplates {
            agents: Arc::new(self.agents.clone()),
            skills: Arc::new(skills),
            formations: Arc::new(self.formations.clone()),
        }
    }
}

/// Загруженные шаблоны (Resource, shared и неизменяемые)
#[derive(Resource, Debug, Clone, Default)]
pub struct AgentTemplates {
    agents: Arc<BTreeMap<String, AgentTemplate>>,
    skills: Arc<BTreeMap<String, Arc<SkillDescriptor>>>,
    formations: Arc<BTreeMap<String, FormationConfig>>,
}

impl AgentTemplates {
    pub fn template(&self, name: &str) -> Result<&AgentTemplate, ConfigError> {
        self.agents
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTemplate(name.to_string()))
    }

    pub fn skill(&self, name: &str) -> Option<Arc<SkillDescriptor>> {
        self.skills.get(name).cloned()
    }

    pub fn formation(&self, name: &str) -> Result<FormationConfig, ConfigError> {
        self.formations
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownFormation(name.to_string()))
    }

    /// Blueprint агента по шаблону; патруль строится относительно `origin`
    pub fn blueprint(&self, name: &str, origin: Vec2) -> Result<AgentBlueprint, ConfigError> {
        let template = self.template(name)?;

        let mut blueprint = AgentBlueprint::new(template.faction)
            .with_health(template.health)
            .with_category(template.category)
            .with_config(template.ai.clone())
            .with_attack(template.attack.clone());
        blueprint.ai_controlled = template.ai_controlled;
        blueprint.counterplay = template.counterplay;

        if let Some(patrol) = &template.patrol {
            blueprint = blueprint.with_patrol(patrol.to_route(origin));
        }

        if let Some(boss) = &template.boss {
            let skills = boss
                .skills
                .iter()
                .map(|skill| {
                    self.skill(skill).ok_or_else(|| ConfigError::UnknownSkill {
                        template: name.to_string(),
                        skill: skill.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            blueprint = blueprint.as_boss(boss.tuning.clone(), skills);
        }

        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boss::SkillCategory;
    use crate::group::FormationShape;

    const SAMPLE: &str = r#"
seed = 7

[arena]
min = [-20.0, -20.0]
max = [20.0, 20.0]

[[skills]]
name = "cleave"
category = "melee_cleave"
base_damage = 25
telegraph_duration = 1.2
cooldown = 3.0
counterplay = "DODGE | BLOCK"
range = { min = 0.0, max = 4.0 }

[agents.grunt]
faction = 1
health = 60
patrol = { waypoints = [[0.0, 0.0], [5.0, 0.0]], mode = "PingPong" }

[agents.grunt.ai]
attack_radius = 1.5
chase_radius = 15.0

[agents.warlord]
faction = 1
health = 400

[agents.warlord.boss]
skills = ["cleave"]

[agents.player]
faction = 2
category = "PLAYER"
ai_controlled = false
counterplay = "DODGE | POSITIONING"

[formations.wall]
spacing = 2.0
shape = { kind = "line" }
"#;

    #[test]
    fn test_parse_sample() {
        let config = SimulationConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.tick_hz, 60.0);
        assert_eq!(config.skills[0].category, SkillCategory::MeleeCleave);
        assert_eq!(config.skills[0].counterplay, CounterplaySet::DODGE | CounterplaySet::BLOCK);
        assert_eq!(config.agents["grunt"].ai.attack_radius, 1.5);
        // не заданные поля берут Default
        assert_eq!(config.agents["grunt"].ai.detection_radius, AIConfig::default().detection_radius);
        assert_eq!(config.agents["player"].category, TargetCategory::PLAYER);
        assert_eq!(config.formations["wall"].shape, FormationShape::Line);
        assert!(config.arena().unwrap().contains(Vec2::ZERO));
    }

    #[test]
    fn test_blueprint_resolves_skills_and_patrol() {
        let templates = SimulationConfig::from_toml_str(SAMPLE).unwrap().templates();

        let warlord = templates.blueprint("warlord", Vec2::ZERO).unwrap();
        let boss = warlord.boss.unwrap();
        assert_eq!(boss.skills.len(), 1);
        assert_eq!(boss.skills[0].name, "cleave");

        let grunt = templates.blueprint("grunt", Vec2::new(10.0, 0.0)).unwrap();
        let route = grunt.patrol.unwrap();
        assert_eq!(route.waypoints(), &[Vec2::new(10.0, 0.0), Vec2::new(15.0, 0.0)]);
        assert_eq!(route.mode, PatrolMode::PingPong);
    }

    #[test]
    fn test_unknown_template() {
        let templates = SimulationConfig::default().templates();
        assert!(matches!(
            templates.blueprint("ghost", Vec2::ZERO),
            Err(ConfigError::UnknownTemplate(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_unknown_boss_skill_rejected() {
        let source = r#"
[agents.warlord.boss]
skills = ["meteor"]
"#;
        assert!(matches!(
            SimulationConfig::from_toml_str(source),
            Err(ConfigError::UnknownSkill { skill, .. }) if skill == "meteor"
        ));
    }

    #[test]
    fn test_empty_range_band_rejected() {
        let source = r#"
[[skills]]
name = "bad"
category = "projectile"
telegraph_duration = 1.0
cooldown = 1.0
counterplay = "DODGE"
range = { min = 5.0, max = 2.0 }
"#;
        assert!(matches!(
            SimulationConfig::from_toml_str(source),
            Err(ConfigError::EmptyRangeBand { .. })
        ));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let source = r#"
[[skills]]
name = "bad"
category = "projectile"
telegraph_duration = -1.0
cooldown = 1.0
counterplay = "DODGE"
"#;
        assert!(matches!(
            SimulationConfig::from_toml_str(source),
            Err(ConfigError::NegativeDuration { field: "telegraph_duration", .. })
        ));
    }

    #[test]
    fn test_invalid_radii_rejected() {
        let source = r#"
[agents.sniper.ai]
attack_radius = 30.0
chase_radius = 20.0
"#;
        assert!(matches!(
            SimulationConfig::from_toml_str(source),
            Err(ConfigError::InvalidRadii { .. })
        ));
    }

    #[test]
    fn test_parse_error_wrapped() {
        assert!(matches!(
            SimulationConfig::from_toml_str("seed = \"nope\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
