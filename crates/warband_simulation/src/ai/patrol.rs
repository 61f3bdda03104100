//! PatrolController: следующая точка патруля для Loop/PingPong/RandomAroundAnchor/Once.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{PatrolCursor, PatrolMode, PatrolRoute};

/// Текущая точка назначения (выставляет первую точку при старте)
pub fn current_destination(route: &PatrolRoute, cursor: &mut PatrolCursor, rng: &mut impl Rng) -> Option<Vec2> {
    if cursor.finished || route.is_empty() {
        return None;
    }
    if cursor.destination.is_none() {
        cursor.destination = match route.mode {
            PatrolMode::RandomAroundAnchor => route.anchor().map(|anchor| sample_around(anchor, route.anchor_radius, rng)),
            _ => route.waypoints().get(cursor.index).copied(),
        };
    }
    cursor.destination
}

/// Продвигает курсор к следующей точке. None → маршрут завершён (Once).
pub fn advance(route: &PatrolRoute, cursor: &mut PatrolCursor, rng: &mut impl Rng) -> Option<Vec2> {
    let count = route.waypoints().len();
    if count == 0 || cursor.finished {
        cursor.destination = None;
        return None;
    }

    let next = match route.mode {
        PatrolMode::Loop => {
            cursor.index = (cursor.index + 1) % count;
            route.waypoints()[cursor.index]
        }
        PatrolMode::PingPong => {
            // Курсор мог остаться от более длинного маршрута
            let current = cursor.index.min(count - 1);
            cursor.index = current;
            if count > 1 {
                let step = |direction: i8| current as isize + direction as isize;
                let mut next_index = step(cursor.direction);
                if next_index < 0 || next_index >= count as isize {
                    cursor.direction = -cursor.direction;
                    next_index = step(cursor.direction);
                }
                cursor.index = next_index as usize;
            }
            route.waypoints()[cursor.index]
        }
        PatrolMode::Once => {
            if cursor.index + 1 >= count {
                cursor.finished = true;
                cursor.destination = None;
                return None;
            }
            cursor.index += 1;
            route.waypoints()[cursor.index]
        }
        PatrolMode::RandomAroundAnchor => {
            let anchor = route.waypoints()[0];
            sample_around(anchor, route.anchor_radius, rng)
        }
    };

    cursor.destination = Some(next);
    Some(next)
}

/// Равномерная точка в круге радиуса `radius`
pub fn sample_around(anchor: Vec2, radius: f32, rng: &mut impl Rng) -> Vec2 {
    let angle = rng.gen::<f32>() * std::f32::consts::TAU;
    let distance = radius.max(0.0) * rng.gen::<f32>().sqrt();
    anchor + Vec2::new(angle.cos(), angle.sin()) * distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn points() -> Vec<Vec2> {
        vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]
    }

    fn walk(route: &PatrolRoute, steps: usize) -> Vec<Option<Vec2>> {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut cursor = PatrolCursor::default();
        current_destination(route, &mut cursor, &mut rng);
        (0..steps).map(|_| advance(route, &mut cursor, &mut rng)).collect()
    }

    #[test]
    fn test_loop_wraps_to_start() {
        let route = PatrolRoute::new(&points(), PatrolMode::Loop);
        let xs: Vec<_> = walk(&route, 4).into_iter().map(|p| p.map(|v| v.x)).collect();
        assert_eq!(xs, vec![Some(1.0), Some(2.0), Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_ping_pong_reverses_at_ends() {
        let route = PatrolRoute::new(&points(), PatrolMode::PingPong);
        let xs: Vec<_> = walk(&route, 5).into_iter().map(|p| p.map(|v| v.x)).collect();
        assert_eq!(xs, vec![Some(1.0), Some(2.0), Some(1.0), Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_ping_pong_single_point_stays() {
        let route = PatrolRoute::new(&[Vec2::ONE], PatrolMode::PingPong);
        assert_eq!(walk(&route, 2), vec![Some(Vec2::ONE), Some(Vec2::ONE)]);
    }

    #[test]
    fn test_once_stops_at_last_point() {
        let route = PatrolRoute::new(&points(), PatrolMode::Once);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut cursor = PatrolCursor::default();

        assert_eq!(current_destination(&route, &mut cursor, &mut rng), Some(Vec2::ZERO));
        assert_eq!(advance(&route, &mut cursor, &mut rng), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(advance(&route, &mut cursor, &mut rng), Some(Vec2::new(2.0, 0.0)));
        assert_eq!(advance(&route, &mut cursor, &mut rng), None);
        assert!(cursor.finished);
        assert_eq!(current_destination(&route, &mut cursor, &mut rng), None);
    }

    #[test]
    fn test_ping_pong_survives_shorter_route() {
        let long = PatrolRoute::new(
            &[Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(4.0, 0.0)],
            PatrolMode::PingPong,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut cursor = PatrolCursor::default();
        for _ in 0..4 {
            advance(&long, &mut cursor, &mut rng);
        }
        assert_eq!(cursor.index, 4);

        // Курсор index 4 на маршруте из 3 точек: с конца разворачиваемся назад
        let short = PatrolRoute::new(&points(), PatrolMode::PingPong);
        assert_eq!(advance(&short, &mut cursor, &mut rng), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(cursor.direction, -1);
        assert_eq!(advance(&short, &mut cursor, &mut rng), Some(Vec2::ZERO));
    }

    #[test]
    fn test_random_around_anchor_stays_in_radius() {
        let anchor = Vec2::new(10.0, -4.0);
        let route = PatrolRoute::random_around(anchor, 3.0);

        for point in walk(&route, 50).into_iter().flatten() {
            assert!(point.distance(anchor) <= 3.0 + 1e-4);
        }
    }

    #[test]
    fn test_empty_route_has_no_destination() {
        let route = PatrolRoute::new(&[], PatrolMode::Loop);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut cursor = PatrolCursor::default();

        assert_eq!(current_destination(&route, &mut cursor, &mut rng), None);
        assert_eq!(advance(&route, &mut cursor, &mut rng), None);
    }
}
