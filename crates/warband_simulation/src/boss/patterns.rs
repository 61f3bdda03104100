//! Категория скилла → фигуры telegraph + follow-up continuation

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::boss::skill::{SkillCategory, SkillDescriptor};
use crate::boss::telegraph::{FollowUp, TelegraphShape};

/// Снижение урона в окне щита
const SHIELD_REDUCTION: f32 = 0.5;

/// План исполнения скилла
#[derive(Debug, Clone, PartialEq)]
pub struct SkillPlan {
    pub shapes: Vec<TelegraphShape>,
    pub follow_up: Option<FollowUp>,
}

/// Строит план от позиции босса к позиции цели
pub fn plan_skill(descriptor: &SkillDescriptor, boss: Vec2, target: Vec2) -> SkillPlan {
    let towards = (target - boss).normalize_or_zero();
    let towards = if towards == Vec2::ZERO { Vec2::X } else { towards };
    let reach = descriptor.range.max.max(descriptor.area);
    let area = descriptor.area;

    match descriptor.category {
        SkillCategory::MeleeCleave => SkillPlan {
            shapes: vec![TelegraphShape::Circle { center: boss, radius: area }],
            follow_up: None,
        },
        SkillCategory::LinearCharge => {
            let end = boss + towards * reach;
            SkillPlan {
                shapes: vec![TelegraphShape::Line { start: boss, end, width: area }],
                follow_up: Some(FollowUp::Charge {
                    to: end,
                    duration: descriptor.effect_duration,
                }),
            }
        }
        SkillCategory::Summon => SkillPlan {
            shapes: vec![TelegraphShape::Circle { center: boss, radius: area }],
            follow_up: Some(FollowUp::Summon {
                at: boss,
                count: descriptor.count.max(1),
            }),
        },
        SkillCategory::AreaDenial => {
            let count = descriptor.count.max(1) as usize;
            // Первая фигура на цели, остальные кольцом вокруг
            let shapes: Vec<TelegraphShape> = (0..count)
                .map(|i| {
                    let center = if i == 0 {
                        target
                    } else {
                        let angle = TAU * (i - 1) as f32 / (count - 1) as f32;
                        target + Vec2::from_angle(angle) * area * 2.0
                    };
                    TelegraphShape::Square { center, half_extent: area }
                })
                .collect();
            SkillPlan {
                shapes,
                follow_up: Some(FollowUp::Hazard {
                    shape: TelegraphShape::Circle { center: target, radius: area },
                    duration: descriptor.effect_duration,
                    damage: (descriptor.base_damage / 4).max(1),
                }),
            }
        }
        SkillCategory::Shield => SkillPlan {
            shapes: vec![TelegraphShape::Circle { center: boss, radius: area }],
            follow_up: Some(FollowUp::Shield {
                duration: descriptor.effect_duration,
                reduction: SHIELD_REDUCTION,
            }),
        },
        SkillCategory::Reposition => SkillPlan {
            shapes: vec![TelegraphShape::Circle { center: boss, radius: area * 0.5 }],
            follow_up: Some(FollowUp::MoveAway {
                to: boss - towards * reach,
                duration: descriptor.effect_duration,
            }),
        },
        SkillCategory::Projectile => SkillPlan {
            shapes: vec![TelegraphShape::Line {
                start: boss,
                end: boss + towards * reach,
                width: area * 0.5,
            }],
            follow_up: None,
        },
    }
}
