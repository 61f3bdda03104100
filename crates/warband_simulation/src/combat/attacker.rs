//! BasicAttack — базовая атака рядового агента
//!
//! ECS хранит: base_damage, cooldown (game state).
//! Применение урона — SkillExecutor collaborator либо AttackIntent → resolve_attack_intents.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// BasicAttack — компонент для агентов которые могут атаковать
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct BasicAttack {
    /// Базовый урон (до shield reduction)
    pub base_damage: u32,

    /// Cooldown между атаками (секунды)
    pub cooldown: f32,

    /// Текущий cooldown таймер (уменьшается до 0)
    #[serde(skip)]
    pub cooldown_timer: f32,
}

impl Default for BasicAttack {
    fn default() -> Self {
        Self {
            base_damage: 10,
            cooldown: 1.0,
            cooldown_timer: 0.0,
        }
    }
}

impl BasicAttack {
    pub fn new(base_damage: u32, cooldown: f32) -> Self {
        Self {
            base_damage,
            cooldown,
            cooldown_timer: 0.0,
        }
    }

    /// Может ли атаковать (cooldown == 0)
    pub fn can_attack(&self) -> bool {
        self.cooldown_timer <= 0.0
    }

    /// Атака совершена → cooldown заново
    pub fn start_cooldown(&mut self) {
        self.cooldown_timer = self.cooldown;
    }
}

/// System: обновление attack cooldown таймеров
pub fn tick_attack_cooldowns(mut query: Query<&mut BasicAttack>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut attack in query.iter_mut() {
        if attack.cooldown_timer > 0.0 {
            attack.cooldown_timer = (attack.cooldown_timer - delta).max(0.0);
        }
    }
}
