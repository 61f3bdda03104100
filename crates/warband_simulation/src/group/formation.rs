//! Formation offsets: closed-form по форме строя
//!
//! Одинаковый (count, shape, spacing) → побитово одинаковые offsets.
//! Ось строя — X (Line), колонна идёт вдоль −Y.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Форма строя
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormationShape {
    /// Шеренга вдоль X, центрирована на anchor
    #[default]
    Line,
    /// Колонна вдоль −Y
    Column,
    /// Равномерно по окружности радиуса spacing·n/(2π)
    Circle,
    /// Клин (V): лидер в вершине, крылья назад
    Wedge,
    /// Seeded разброс в круге (детерминирован seed + count)
    Random { seed: u64 },
    /// Явные offsets; лишним членам — позиции Line
    Custom { offsets: Vec<[f32; 2]> },
}

/// Параметры строя группы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    pub shape: FormationShape,
    pub spacing: f32,
    /// Держать строй даже в бою (члены в Chase ведёт группа)
    pub hold_in_combat: bool,
    /// Радиус поиска угроз вокруг центроида группы
    pub detection_radius: f32,
    /// Скорость движения к слоту / anchor вдоль маршрута
    pub move_speed: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            shape: FormationShape::Line,
            spacing: 2.0,
            hold_in_combat: false,
            detection_radius: 12.0,
            move_speed: 3.0,
        }
    }
}

fn line_offset(index: usize, count: usize, spacing: f32) -> Vec2 {
    // Центрированная шеренга: для n=4, spacing=2 → -3, -1, 1, 3
    let centre = (count as f32 - 1.0) / 2.0;
    Vec2::new((index as f32 - centre) * spacing, 0.0)
}

/// Offsets для `count` членов
pub fn formation_offsets(shape: &FormationShape, count: usize, spacing: f32) -> Vec<Vec2> {
    match shape {
        FormationShape::Line => (0..count).map(|i| line_offset(i, count, spacing)).collect(),
        FormationShape::Column => (0..count)
            .map(|i| {
                let along = line_offset(i, count, spacing).x;
                Vec2::new(0.0, -along)
            })
            .collect(),
        FormationShape::Circle => {
            let radius = spacing * count as f32 / TAU;
            (0..count)
                .map(|i| {
                    let angle = TAU * i as f32 / count as f32;
                    Vec2::new(angle.cos(), angle.sin()) * radius
                })
                .collect()
        }
        FormationShape::Wedge => (0..count)
            .map(|i| {
                if i == 0 {
                    return Vec2::ZERO;
                }
                let rank = i.div_ceil(2) as f32;
                let side = if i % 2 == 1 { -1.0 } else { 1.0 };
                Vec2::new(side * rank * spacing, -rank * spacing)
            })
            .collect(),
        FormationShape::Random { seed } => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ count as u64);
            let radius = spacing * (count as f32).sqrt();
            (0..count)
                .map(|_| {
                    let angle = rng.gen::<f32>() * TAU;
                    let distance = radius * rng.gen::<f32>().sqrt();
                    Vec2::new(angle.cos(), angle.sin()) * distance
                })
                .collect()
        }
        FormationShape::Custom { offsets } => (0..count)
            .map(|i| match offsets.get(i) {
                Some([x, y]) => Vec2::new(*x, *y),
                None => line_offset(i, count, spacing),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_line_four_members() {
        let offsets = formation_offsets(&FormationShape::Line, 4, 2.0);
        let xs: Vec<f32> = offsets.iter().map(|o| o.x).collect();

        assert_eq!(xs, vec![-3.0, -1.0, 1.0, 3.0]);
        assert!(offsets.iter().all(|o| o.y == 0.0));
    }

    #[test]
    fn test_circle_radius() {
        let offsets = formation_offsets(&FormationShape::Circle, 6, 3.0);
        let expected = 3.0 * 6.0 / TAU;

        assert_eq!(offsets.len(), 6);
        for offset in offsets {
            assert!((offset.length() - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_wedge_leader_at_apex() {
        let offsets = formation_offsets(&FormationShape::Wedge, 5, 1.0);

        assert_eq!(offsets[0], Vec2::ZERO);
        assert_eq!(offsets[1], Vec2::new(-1.0, -1.0));
        assert_eq!(offsets[2], Vec2::new(1.0, -1.0));
        assert_eq!(offsets[3], Vec2::new(-2.0, -2.0));
    }

    #[test]
    fn test_custom_pads_missing_slots() {
        let shape = FormationShape::Custom { offsets: vec![[5.0, 5.0]] };
        let offsets = formation_offsets(&shape, 3, 2.0);

        assert_eq!(offsets.len(), 3);
        assert_eq!(offsets[0], Vec2::new(5.0, 5.0));
        assert_eq!(offsets[2], Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_empty_group() {
        assert!(formation_offsets(&FormationShape::Circle, 0, 2.0).is_empty());
    }

    fn any_shape() -> impl Strategy<Value = FormationShape> {
        prop_oneof![
            Just(FormationShape::Line),
            Just(FormationShape::Column),
            Just(FormationShape::Circle),
            Just(FormationShape::Wedge),
            any::<u64>().prop_map(|seed| FormationShape::Random { seed }),
        ]
    }

    proptest! {
        #[test]
        fn prop_offsets_are_deterministic(shape in any_shape(), count in 0usize..24, spacing in 0.5f32..8.0) {
            let first = formation_offsets(&shape, count, spacing);
            let second = formation_offsets(&shape, count, spacing);

            prop_assert_eq!(first.len(), count);
            prop_assert_eq!(first, second);
        }
    }
}
