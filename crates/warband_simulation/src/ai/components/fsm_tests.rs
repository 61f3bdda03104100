//! Tests for FSM AI components.

#[cfg(test)]
mod tests {
    use super::super::fsm::{AIConfig, AiState, PerceptionThrottle};

    #[test]
    fn test_ai_state_default() {
        let state = AiState::default();
        assert!(matches!(state, AiState::Idle));
    }

    #[test]
    fn test_ai_config_default() {
        let config = AIConfig::default();
        assert_eq!(config.detection_radius, 10.0);
        assert_eq!(config.chase_radius, 20.0);
        assert_eq!(config.attack_radius, 2.0);
        assert!(config.attack_hysteresis > 0.0);
        assert!(config.detection_radius <= config.chase_radius);
    }

    #[test]
    fn test_engaged_states() {
        assert!(AiState::Chase.is_engaged());
        assert!(AiState::Attack.is_engaged());
        assert!(AiState::Reposition.is_engaged());
        assert!(!AiState::Patrol.is_engaged());
        assert!(!AiState::Dead.is_engaged());
    }

    #[test]
    fn test_throttle_every_tick_when_interval_zero() {
        let mut throttle = PerceptionThrottle::default();
        for _ in 0..5 {
            assert!(throttle.tick(0.016, 0.0));
        }
    }

    #[test]
    fn test_throttle_skips_within_interval() {
        let mut throttle = PerceptionThrottle::default();

        assert!(throttle.tick(0.25, 0.5)); // первый тик всегда fresh
        assert!(!throttle.tick(0.25, 0.5));
        assert!(throttle.tick(0.25, 0.5));
        assert_eq!(throttle.remaining, 0.5);
    }
}
