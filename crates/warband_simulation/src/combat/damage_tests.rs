//! Tests for damage application.

use bevy::prelude::*;

use super::damage::{apply_damage, calculate_damage, DespawnAfter, HitOutcome, Shielded};
use crate::components::Health;

#[test]
fn test_damage_calculation_no_shield() {
    assert_eq!(calculate_damage(20, None), 20);
}

#[test]
fn test_damage_calculation_half_shield() {
    let shield = Shielded { reduction: 0.5 };
    assert_eq!(calculate_damage(20, Some(&shield)), 10);
}

#[test]
fn test_damage_calculation_shield_clamped() {
    let shield = Shielded { reduction: 3.0 };
    assert_eq!(calculate_damage(20, Some(&shield)), 0);
}

#[test]
fn test_apply_damage_kills_once() {
    let mut health = Health::new(30);

    assert_eq!(
        apply_damage(&mut health, None, 20),
        Some(HitOutcome { damage: 20, killed: false })
    );
    assert_eq!(
        apply_damage(&mut health, None, 20),
        Some(HitOutcome { damage: 20, killed: true })
    );
    assert_eq!(health.current, 0);

    // Труп повторно не бьём
    assert_eq!(apply_damage(&mut health, None, 20), None);
}

#[test]
fn test_despawn_after_negative_delay() {
    let timer = DespawnAfter::new(-1.0);
    assert_eq!(timer.remaining, 0.0);
}

#[test]
fn test_entity_died_event() {
    let event = super::EntityDied {
        entity: Entity::PLACEHOLDER,
        killer: Some(Entity::PLACEHOLDER),
    };

    assert!(event.killer.is_some());
}
