//! AI Events — опубликованные события (fire-and-forget)
//!
//! Порядок: состояние/цель сначала обновляются внутри компонента, потом пишется событие.
//! Подписчики (UI, audio, analytics) читают через EventReader — отписка
//! происходит автоматически вместе с системой-читателем.

use bevy::prelude::*;

use crate::ai::AiState;

/// Цель агента сменилась (None → цель потеряна)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct TargetChanged {
    pub agent: Entity,
    pub target: Option<Entity>,
}

/// Агент сменил поведенческое состояние
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct StateChanged {
    pub agent: Entity,
    pub from: AiState,
    pub to: AiState,
}

/// Агент вошёл в Dead (AI отключен, despawn после grace delay)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AgentDied {
    pub agent: Entity,
    pub killer: Option<Entity>,
}

/// Уведомления AnimationController (fire-and-forget, ответ не читаем)
#[derive(Event, Debug, Clone, PartialEq)]
pub enum AnimationCue {
    PlayAttack { agent: Entity },
    PlayDeath { agent: Entity },
    SetMoveSpeed { agent: Entity, speed: f32 },
    PlayTelegraph { agent: Entity, skill: String },
}

/// Намерение атаки базовым оружием (резолвится в CombatPlugin)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackIntent {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    /// Максимальная дистанция на момент резолва
    pub reach: f32,
}
