//! TelegraphSequencer: Assessment → Warning → FinalWarning → Execute → Dispose
//!
//! Фаза продвигается ДО проверки попадания: цель, ушедшая из области между
//! Warning и Execute, не получает урон. Strike выдаётся ровно один раз.

use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::boss::continuation::{Continuation, Progress};

/// Допуск сравнения фаз (накопление dt в f32)
const PHASE_EPSILON: f32 = 1e-4;

/// Геометрия предупреждения
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelegraphShape {
    Circle { center: Vec2, radius: f32 },
    /// Отрезок с шириной (charge / projectile)
    Line { start: Vec2, end: Vec2, width: f32 },
    /// Axis-aligned квадрат
    Square { center: Vec2, half_extent: f32 },
}

impl TelegraphShape {
    pub fn contains(&self, point: Vec2) -> bool {
        match *self {
            TelegraphShape::Circle { center, radius } => center.distance_squared(point) <= radius * radius,
            TelegraphShape::Line { start, end, width } => {
                let segment = end - start;
                let length_squared = segment.length_squared();
                let t = if length_squared <= f32::EPSILON {
                    0.0
                } else {
                    ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0)
                };
                let closest = start + segment * t;
                closest.distance(point) <= width * 0.5
            }
            TelegraphShape::Square { center, half_extent } => {
                let delta = (point - center).abs();
                delta.x <= half_extent && delta.y <= half_extent
            }
        }
    }

    pub fn center(&self) -> Vec2 {
        match *self {
            TelegraphShape::Circle { center, .. } | TelegraphShape::Square { center, .. } => center,
            TelegraphShape::Line { start, end, .. } => (start + end) * 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelegraphPhase {
    /// Ожидание stagger задержки внутри паттерна
    Pending,
    Assessment,
    Warning,
    FinalWarning,
    Execute,
    Disposed,
}

/// Настройки telegraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegraphTuning {
    /// Доля warning duration под Assessment preview
    pub assessment_fraction: f32,
    pub final_warning: f32,
    /// Задержка между фигурами паттерна
    pub pattern_stagger: f32,
    pub min_warning: f32,
    pub max_warning: f32,
}

impl Default for TelegraphTuning {
    fn default() -> Self {
        Self {
            assessment_fraction: 0.15,
            final_warning: 0.5,
            pattern_stagger: 0.1,
            min_warning: 0.3,
            max_warning: 5.0,
        }
    }
}

/// warning = base × complexity × (2 − skill) × archetype, clamp [min, max]
pub fn compute_warning_duration(
    base: f32,
    complexity: f32,
    skill_rating: f32,
    archetype_multiplier: f32,
    tuning: &TelegraphTuning,
) -> f32 {
    let skill = skill_rating.clamp(0.0, 1.0);
    (base * complexity * (2.0 - skill) * archetype_multiplier).clamp(tuning.min_warning, tuning.max_warning)
}

/// Расписание фаз одного telegraph (секунды от spawn)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelegraphTiming {
    pub delay: f32,
    pub assessment: f32,
    pub warning: f32,
    pub final_warning: f32,
}

impl TelegraphTiming {
    /// Assessment вырезается из начала warning duration
    pub fn new(warning_duration: f32, delay: f32, tuning: &TelegraphTuning) -> Self {
        let warning_duration = warning_duration.max(0.0);
        let assessment = warning_duration * tuning.assessment_fraction.clamp(0.0, 1.0);
        Self {
            delay: delay.max(0.0),
            assessment,
            warning: warning_duration - assessment,
            final_warning: tuning.final_warning.max(0.0),
        }
    }

    pub fn execute_at(&self) -> f32 {
        self.delay + self.assessment + self.warning + self.final_warning
    }

    pub fn phase_at(&self, elapsed: f32) -> TelegraphPhase {
        let t = elapsed + PHASE_EPSILON;
        if t < self.delay {
            TelegraphPhase::Pending
        } else if t < self.delay + self.assessment {
            TelegraphPhase::Assessment
        } else if t < self.delay + self.assessment + self.warning {
            TelegraphPhase::Warning
        } else if t < self.execute_at() {
            TelegraphPhase::FinalWarning
        } else {
            TelegraphPhase::Execute
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TelegraphId(pub u64);

/// Что происходит после Execute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowUp {
    /// Рывок босса в точку
    Charge { to: Vec2, duration: f32 },
    /// Отход босса (reposition)
    MoveAway { to: Vec2, duration: f32 },
    /// Зона урона на время
    Hazard { shape: TelegraphShape, duration: f32, damage: u32 },
    /// Снижение входящего урона
    Shield { duration: f32, reduction: f32 },
    Summon { at: Vec2, count: u32 },
}

/// Результат Execute
#[derive(Debug, Clone, PartialEq)]
pub struct Strike {
    pub id: TelegraphId,
    pub skill: Arc<str>,
    pub shape: TelegraphShape,
    pub damage: u32,
    pub follow_up: Option<FollowUp>,
}

/// Экземпляр telegraph (принадлежит только своему sequencer)
#[derive(Debug, Clone)]
pub struct Telegraph {
    pub id: TelegraphId,
    pub skill: Arc<str>,
    pub shape: TelegraphShape,
    pub timing: TelegraphTiming,
    pub damage: u32,
    pub follow_up: Option<FollowUp>,
    elapsed: f32,
    phase: TelegraphPhase,
    strike_pending: bool,
}

impl Telegraph {
    pub fn phase(&self) -> TelegraphPhase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn take_strike(&mut self) -> Option<Strike> {
        if !std::mem::take(&mut self.strike_pending) {
            return None;
        }
        Some(Strike {
            id: self.id,
            skill: self.skill.clone(),
            shape: self.shape,
            damage: self.damage,
            follow_up: self.follow_up,
        })
    }
}

impl Continuation for Telegraph {
    fn tick(&mut self, dt: f32) -> Progress {
        if self.phase == TelegraphPhase::Disposed {
            return Progress::Complete;
        }

        self.elapsed += dt;
        self.phase = self.timing.phase_at(self.elapsed);

        if self.phase == TelegraphPhase::Execute {
            self.strike_pending = true;
            return Progress::Complete;
        }
        Progress::Continue
    }

    fn cancel(&mut self) {
        self.phase = TelegraphPhase::Disposed;
        self.strike_pending = false;
    }
}

/// Параметры запуска одной фигуры
#[derive(Debug, Clone)]
pub struct TelegraphRequest {
    pub skill: Arc<str>,
    pub shape: TelegraphShape,
    pub warning_duration: f32,
    pub damage: u32,
    pub follow_up: Option<FollowUp>,
}

/// Sequencer telegraph'ов одного босса
#[derive(Component, Debug, Clone, Default)]
pub struct TelegraphSequencer {
    active: Vec<Telegraph>,
    next_id: u64,
}

impl TelegraphSequencer {
    pub fn spawn(&mut self, request: TelegraphRequest, delay: f32, tuning: &TelegraphTuning) -> TelegraphId {
        let id = TelegraphId(self.next_id);
        self.next_id += 1;

        let timing = TelegraphTiming::new(request.warning_duration, delay, tuning);
        self.active.push(Telegraph {
            id,
            skill: request.skill,
            shape: request.shape,
            timing,
            damage: request.damage,
            follow_up: request.follow_up,
            elapsed: 0.0,
            phase: timing.phase_at(0.0),
            strike_pending: false,
        });
        id
    }

    /// Паттерн: N фигур со stagger между запусками.
    /// Follow-up привязан к последней фигуре.
    pub fn spawn_pattern(
        &mut self,
        skill: Arc<str>,
        shapes: &[TelegraphShape],
        warning_duration: f32,
        damage: u32,
        follow_up: Option<FollowUp>,
        tuning: &TelegraphTuning,
    ) -> Vec<TelegraphId> {
        let last = shapes.len().saturating_sub(1);
        shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| {
                let request = TelegraphRequest {
                    skill: skill.clone(),
                    shape: *shape,
                    warning_duration,
                    damage,
                    follow_up: if index == last { follow_up } else { None },
                };
                self.spawn(request, index as f32 * tuning.pattern_stagger, tuning)
            })
            .collect()
    }

    /// Продвигает все фазы; возвращает strikes этого тика и удаляет завершённые
    pub fn tick(&mut self, dt: f32) -> Vec<Strike> {
        let mut strikes = Vec::new();
        self.active.retain_mut(|telegraph| {
            let progress = telegraph.tick(dt);
            strikes.extend(telegraph.take_strike());
            progress == Progress::Continue
        });
        strikes
    }

    /// Немедленно убирает все telegraph'ы без урона. Возвращает отменённые id.
    pub fn clear_all(&mut self) -> Vec<TelegraphId> {
        self.active
            .drain(..)
            .map(|mut telegraph| {
                telegraph.cancel();
                telegraph.id
            })
            .collect()
    }

    pub fn cancel(&mut self, id: TelegraphId) -> bool {
        let before = self.active.len();
        self.active.retain(|telegraph| telegraph.id != id);
        self.active.len() != before
    }

    pub fn active(&self) -> &[Telegraph] {
        &self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn phase_of(&self, id: TelegraphId) -> Option<TelegraphPhase> {
        self.active.iter().find(|t| t.id == id).map(Telegraph::phase)
    }
}
