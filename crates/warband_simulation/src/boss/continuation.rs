//! Resumable continuations: долгие действия босса, продвигаемые тиком
//!
//! Каждая держит свой elapsed и возвращает управление каждый тик.
//! Отмена (смерть босса, прерывание) — `cancel()`, после неё `tick` → Complete.

use bevy::prelude::*;

use crate::boss::telegraph::TelegraphShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Complete,
}

pub trait Continuation {
    fn tick(&mut self, dt: f32) -> Progress;
    fn cancel(&mut self);
}

/// Таймер с отменой, общий для всех continuation ниже
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    duration: f32,
    elapsed: f32,
    cancelled: bool,
}

impl Span {
    fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            elapsed: 0.0,
            cancelled: false,
        }
    }

    fn advance(&mut self, dt: f32) -> Progress {
        if self.cancelled {
            return Progress::Complete;
        }
        self.elapsed += dt;
        if self.elapsed + 1e-4 >= self.duration {
            Progress::Complete
        } else {
            Progress::Continue
        }
    }

    fn fraction(&self) -> f32 {
        if self.duration <= f32::EPSILON {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Рывок / отход: движение по прямой за фиксированное время
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeMotion {
    pub from: Vec2,
    pub to: Vec2,
    span: Span,
}

impl ChargeMotion {
    pub fn new(from: Vec2, to: Vec2, duration: f32) -> Self {
        Self {
            from,
            to,
            span: Span::new(duration),
        }
    }

    /// Скорость, с которой навигация должна пройти путь за duration
    pub fn speed(&self) -> f32 {
        let distance = self.from.distance(self.to);
        if self.span.duration <= f32::EPSILON {
            distance
        } else {
            distance / self.span.duration
        }
    }

    pub fn expected_position(&self) -> Vec2 {
        self.from.lerp(self.to, self.span.fraction())
    }
}

impl Continuation for ChargeMotion {
    fn tick(&mut self, dt: f32) -> Progress {
        self.span.advance(dt)
    }

    fn cancel(&mut self) {
        self.span.cancelled = true;
    }
}

/// Зона урона: пульс каждые `interval` секунд
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistentHazard {
    pub shape: TelegraphShape,
    pub damage: u32,
    pub interval: f32,
    span: Span,
    since_pulse: f32,
    pulses_due: u32,
}

impl PersistentHazard {
    pub fn new(shape: TelegraphShape, damage: u32, duration: f32, interval: f32) -> Self {
        Self {
            shape,
            damage,
            interval: interval.max(0.05),
            span: Span::new(duration),
            since_pulse: 0.0,
            pulses_due: 0,
        }
    }

    /// Пульсы, накопленные с прошлого вызова
    pub fn take_pulses(&mut self) -> u32 {
        std::mem::take(&mut self.pulses_due)
    }
}

impl Continuation for PersistentHazard {
    fn tick(&mut self, dt: f32) -> Progress {
        if self.span.cancelled {
            self.pulses_due = 0;
            return Progress::Complete;
        }
        self.since_pulse += dt;
        while self.since_pulse + 1e-4 >= self.interval {
            self.since_pulse -= self.interval;
            self.pulses_due += 1;
        }
        self.span.advance(dt)
    }

    fn cancel(&mut self) {
        self.span.cancelled = true;
        self.pulses_due = 0;
    }
}

/// Окно щита: снижение входящего урона на время
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldWindow {
    pub reduction: f32,
    span: Span,
}

impl ShieldWindow {
    pub fn new(reduction: f32, duration: f32) -> Self {
        Self {
            reduction: reduction.clamp(0.0, 1.0),
            span: Span::new(duration),
        }
    }
}

impl Continuation for ShieldWindow {
    fn tick(&mut self, dt: f32) -> Progress {
        self.span.advance(dt)
    }

    fn cancel(&mut self) {
        self.span.cancelled = true;
    }
}

/// Активный эффект босса
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BossEffect {
    Motion(ChargeMotion),
    Hazard(PersistentHazard),
    Shield(ShieldWindow),
}

impl Continuation for BossEffect {
    fn tick(&mut self, dt: f32) -> Progress {
        match self {
            BossEffect::Motion(motion) => motion.tick(dt),
            BossEffect::Hazard(hazard) => hazard.tick(dt),
            BossEffect::Shield(shield) => shield.tick(dt),
        }
    }

    fn cancel(&mut self) {
        match self {
            BossEffect::Motion(motion) => motion.cancel(),
            BossEffect::Hazard(hazard) => hazard.cancel(),
            BossEffect::Shield(shield) => shield.cancel(),
        }
    }
}

/// Все активные continuation-эффекты босса
#[derive(Component, Debug, Clone, Default)]
pub struct ActiveEffects {
    pub effects: Vec<BossEffect>,
}

impl ActiveEffects {
    pub fn push(&mut self, effect: BossEffect) {
        self.effects.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn has_shield(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, BossEffect::Shield(_)))
    }

    pub fn has_motion(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, BossEffect::Motion(_)))
    }

    /// Отмена всех (смерть): возвращает количество отменённых
    pub fn cancel_all(&mut self) -> usize {
        let count = self.effects.len();
        for effect in &mut self.effects {
            effect.cancel();
        }
        self.effects.clear();
        count
    }
}
