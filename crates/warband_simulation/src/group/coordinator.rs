//! Group: члены, anchor, formation offsets, общая цель
//!
//! Единственный writer общей цели/боевого статуса — системы GroupCoordinator
//! (`engage` / `release` доступны только внутри crate).

use bevy::prelude::*;

use crate::error::AiError;
use crate::group::formation::{formation_offsets, FormationConfig};

/// Группа агентов (отдельная entity)
#[derive(Component, Debug, Clone)]
pub struct Group {
    pub faction_id: u64,
    pub anchor: Vec2,
    pub config: FormationConfig,
    members: Vec<Entity>,
    offsets: Vec<Vec2>,
    shared_target: Option<Entity>,
    in_combat: bool,
    /// Цели, от которых отказались все члены; не выбираются, пока в радиусе
    dismissed: Vec<Entity>,
}

/// Членство агента в группе
#[derive(Component, Debug, Clone, Copy)]
pub struct GroupMember {
    pub group: Entity,
    /// Движение агента сейчас ведёт формация (его Execute не пишет MovementCommand)
    pub steered: bool,
}

impl GroupMember {
    pub fn new(group: Entity) -> Self {
        Self { group, steered: false }
    }
}

impl Group {
    pub fn new(faction_id: u64, anchor: Vec2, config: FormationConfig) -> Self {
        Self {
            faction_id,
            anchor,
            config,
            members: Vec::new(),
            offsets: Vec::new(),
            shared_target: None,
            in_combat: false,
            dismissed: Vec::new(),
        }
    }

    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    pub fn offsets(&self) -> &[Vec2] {
        &self.offsets
    }

    pub fn shared_target(&self) -> Option<Entity> {
        self.shared_target
    }

    pub fn in_combat(&self) -> bool {
        self.in_combat
    }

    pub fn dismissed(&self) -> &[Entity] {
        &self.dismissed
    }

    /// Добавляет члена и пересчитывает offsets. false — уже в группе.
    pub fn add_member(&mut self, member: Entity) -> bool {
        if self.members.contains(&member) {
            return false;
        }
        self.members.push(member);
        self.recompute_offsets();
        true
    }

    /// Убирает члена и пересчитывает offsets
    pub fn remove_member(&mut self, member: Entity) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != member);
        let removed = self.members.len() != before;
        if removed {
            self.recompute_offsets();
        }
        removed
    }

    pub fn recompute_offsets(&mut self) {
        self.offsets = formation_offsets(&self.config.shape, self.members.len(), self.config.spacing);
    }

    /// Проверка перед каждым применением строя: кэш offsets не доверяем.
    /// При рассогласовании пересчитываем и возвращаем ошибку для лога.
    pub fn ensure_offsets(&mut self, group: Entity) -> Result<(), AiError> {
        if self.offsets.len() == self.members.len() {
            return Ok(());
        }
        let error = AiError::GroupMembershipInconsistency {
            group,
            offsets: self.offsets.len(),
            members: self.members.len(),
        };
        self.recompute_offsets();
        Err(error)
    }

    pub fn offset_of(&self, member: Entity) -> Option<Vec2> {
        let index = self.members.iter().position(|m| *m == member)?;
        self.offsets.get(index).copied()
    }

    /// Мировая точка слота: anchor + offset
    pub fn slot_position(&self, member: Entity) -> Option<Vec2> {
        self.offset_of(member).map(|offset| self.anchor + offset)
    }

    pub(crate) fn engage(&mut self, target: Entity) {
        self.shared_target = Some(target);
        self.in_combat = true;
    }

    pub(crate) fn release(&mut self) {
        self.shared_target = None;
        self.in_combat = false;
    }

    /// Общая цель снимается, in_combat остаётся до следующего выбора
    pub(crate) fn dismiss(&mut self, target: Entity) {
        if self.shared_target == Some(target) {
            self.shared_target = None;
        }
        if !self.dismissed.contains(&target) {
            self.dismissed.push(target);
        }
    }

    /// Оставляет только отвергнутые цели, которые всё ещё `in_range`
    pub(crate) fn retain_dismissed(&mut self, in_range: &[Entity]) {
        self.dismissed.retain(|target| in_range.contains(target));
    }

    #[cfg(test)]
    pub(crate) fn offsets_mut(&mut self) -> &mut Vec<Vec2> {
        &mut self.offsets
    }
}

/// Центроид позиций (None для пустого набора)
pub fn centroid(positions: impl IntoIterator<Item = Vec2>) -> Option<Vec2> {
    let (sum, count) = positions
        .into_iter()
        .fold((Vec2::ZERO, 0usize), |(sum, count), p| (sum + p, count + 1));
    (count > 0).then(|| sum / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_group() -> Group {
        Group::new(1, Vec2::new(10.0, 0.0), FormationConfig::default())
    }

    #[test]
    fn test_membership_recomputes_offsets() {
        let mut group = line_group();
        let members: Vec<Entity> = (1..=4).map(Entity::from_raw).collect();
        for member in &members {
            assert!(group.add_member(*member));
        }
        assert!(!group.add_member(members[0]));

        assert_eq!(group.offsets().len(), 4);
        assert_eq!(group.slot_position(members[0]), Some(Vec2::new(7.0, 0.0)));

        assert!(group.remove_member(members[3]));
        assert_eq!(group.offsets().len(), 3);
        assert_eq!(group.offset_of(members[0]), Some(Vec2::new(-2.0, 0.0)));
        assert_eq!(group.offset_of(members[3]), None);
    }

    #[test]
    fn test_ensure_offsets_repairs_mismatch() {
        let mut group = line_group();
        group.add_member(Entity::from_raw(1));
        group.add_member(Entity::from_raw(2));
        group.offsets_mut().pop();

        let error = group.ensure_offsets(Entity::from_raw(99));
        assert!(matches!(
            error,
            Err(AiError::GroupMembershipInconsistency { offsets: 1, members: 2, .. })
        ));
        assert_eq!(group.offsets().len(), 2);
        assert!(group.ensure_offsets(Entity::from_raw(99)).is_ok());
    }

    #[test]
    fn test_centroid() {
        assert_eq!(centroid(Vec::new()), None);
        assert_eq!(
            centroid([Vec2::new(0.0, 0.0), Vec2::new(4.0, 2.0)]),
            Some(Vec2::new(2.0, 1.0))
        );
    }
}
