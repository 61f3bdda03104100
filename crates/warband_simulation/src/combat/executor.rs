//! SkillExecutor collaborator (применение урона/эффектов для не-boss скиллов)

use bevy::prelude::*;

/// Хост-реализация применения скилла.
///
/// Ядро спрашивает `can_execute` перед каждой атакой и вызывает `execute`
/// с позицией цели на момент решения. Анимация/хитбоксы — забота хоста.
pub trait SkillExecutor: Send + Sync + 'static {
    fn can_execute(&self, caster: Entity) -> bool;
    fn execute(&mut self, caster: Entity, target_position: Vec2);
}

/// Опциональный resource: если вставлен, базовые атаки идут через него,
/// а не через AttackIntent.
#[derive(Resource)]
pub struct SkillExecutorService(pub Box<dyn SkillExecutor>);

impl SkillExecutorService {
    pub fn new(executor: impl SkillExecutor) -> Self {
        Self(Box::new(executor))
    }
}
