//! StateMachine: единственная точка смены AiState
//!
//! Контракт `change_state`: Exit(текущее) → swap → Enter(новое).
//! Повторный вход в то же состояние — no-op. Dead терминально.

use bevy::prelude::*;

use crate::ai::{AIConfig, AiState};

/// Хуки Enter/Exit. Реализует тот, кто применяет side effects перехода.
pub trait StateHooks {
    fn exit(&mut self, state: AiState);
    fn enter(&mut self, state: AiState);
}

/// Хуки без side effects (для чистых пересчётов и тестов)
pub struct NoHooks;

impl StateHooks for NoHooks {
    fn exit(&mut self, _state: AiState) {}
    fn enter(&mut self, _state: AiState) {}
}

/// Приказ от GroupCoordinator (единственный внешний writer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Форсировать Chase на общую цель группы
    Engage(Entity),
    /// Группа вышла из боя → вернуться к индивидуальному Patrol/Idle
    Release,
}

/// Совершённый переход
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AiState,
    pub to: AiState,
}

/// State machine агента
#[derive(Component, Debug, Clone)]
pub struct StateMachine {
    current: AiState,
    previous: Option<AiState>,
    time_in_state: f32,
    pending: Option<Directive>,
}

impl StateMachine {
    /// Начальное состояние: Patrol если есть маршрут, иначе Idle
    pub fn new(has_patrol: bool) -> Self {
        Self {
            current: if has_patrol { AiState::Patrol } else { AiState::Idle },
            previous: None,
            time_in_state: 0.0,
            pending: None,
        }
    }

    pub fn current(&self) -> AiState {
        self.current
    }

    pub fn previous(&self) -> Option<AiState> {
        self.previous
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn advance_time(&mut self, delta: f32) {
        self.time_in_state += delta;
    }

    pub fn is_dead(&self) -> bool {
        self.current.is_dead()
    }

    pub fn issue(&mut self, directive: Directive) {
        if !self.is_dead() {
            self.pending = Some(directive);
        }
    }

    pub fn pending(&self) -> Option<Directive> {
        self.pending
    }

    pub fn take_directive(&mut self) -> Option<Directive> {
        self.pending.take()
    }

    /// Exit → swap → Enter. None если переход не произошёл (то же состояние / Dead).
    pub fn change_state(&mut self, next: AiState, hooks: &mut impl StateHooks) -> Option<Transition> {
        if next == self.current || self.current.is_dead() {
            return None;
        }

        let from = self.current;
        hooks.exit(from);
        self.previous = Some(from);
        self.current = next;
        self.time_in_state = 0.0;
        hooks.enter(next);

        Some(Transition { from, to: next })
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Вход для таблицы переходов (снимок на текущий тик)
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionInputs {
    pub alive: bool,
    /// Дистанция до валидной цели (None → цели нет)
    pub target_distance: Option<f32>,
    pub has_patrol: bool,
    pub patrol_finished: bool,
    /// Союзники толпятся рядом (Attack → Reposition)
    pub crowded: bool,
    pub reposition_complete: bool,
    pub directive: Option<Directive>,
}

impl TransitionInputs {
    fn fallback(&self) -> AiState {
        if self.has_patrol && !self.patrol_finished {
            AiState::Patrol
        } else {
            AiState::Idle
        }
    }
}

/// Таблица переходов. Чистая функция: решает, куда перейти, но не переходит.
pub fn next_state(current: AiState, inputs: &TransitionInputs, config: &AIConfig) -> AiState {
    if current.is_dead() {
        return AiState::Dead;
    }
    if !inputs.alive {
        return AiState::Dead;
    }

    match inputs.directive {
        Some(Directive::Engage(_)) if !matches!(current, AiState::Chase | AiState::Attack) => {
            return AiState::Chase;
        }
        Some(Directive::Release) => return inputs.fallback(),
        _ => {}
    }

    match current {
        AiState::Dead => AiState::Dead,

        AiState::Idle => match inputs.target_distance {
            Some(_) => AiState::Chase,
            None if inputs.has_patrol && !inputs.patrol_finished => AiState::Patrol,
            None => AiState::Idle,
        },

        AiState::Patrol => {
            if inputs.target_distance.is_some() {
                AiState::Chase
            } else if !inputs.has_patrol || inputs.patrol_finished {
                AiState::Idle
            } else {
                AiState::Patrol
            }
        }

        AiState::Chase => match inputs.target_distance {
            None => inputs.fallback(),
            Some(distance) if distance > config.chase_radius => inputs.fallback(),
            Some(distance) if distance <= config.attack_radius => AiState::Attack,
            Some(_) => AiState::Chase,
        },

        AiState::Attack => match inputs.target_distance {
            None => AiState::Idle,
            Some(distance) if distance > config.attack_radius + config.attack_hysteresis => AiState::Chase,
            Some(_) if inputs.crowded => AiState::Reposition,
            Some(_) => AiState::Attack,
        },

        AiState::Reposition => match inputs.target_distance {
            None => inputs.fallback(),
            Some(distance) if distance > config.chase_radius => inputs.fallback(),
            Some(_) if inputs.reposition_complete => AiState::Chase,
            Some(_) => AiState::Reposition,
        },
    }
}
