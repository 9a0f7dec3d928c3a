//! Points earned at the end of a run

use std::time::Duration;

use crate::config::{BONUS_AFTER_SECS, BONUS_MULTIPLIER, POINTS_PER_FOOD};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsCalculator {
    pub per_score: u64,
    pub bonus_multiplier: f64,
    pub bonus_after: Duration,
}

impl Default for PointsCalculator {
    fn default() -> Self {
        Self {
            per_score: POINTS_PER_FOOD,
            bonus_multiplier: BONUS_MULTIPLIER,
            bonus_after: Duration::from_secs(BONUS_AFTER_SECS),
        }
    }
}

impl PointsCalculator {
    /// `score * per_score`, times the bonus (floored) for runs longer than `bonus_after`
    pub fn calculate(&self, score: u32, played: Duration) -> u64 {
        let points = u64::from(score) * self.per_score;

        if played > self.bonus_after {
            (points as f64 * self.bonus_multiplier).floor() as u64
        } else {
            points
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_run() {
        let calc = PointsCalculator::default();
        assert_eq!(calc.calculate(30, Duration::from_secs(10)), 300);
        assert_eq!(calc.calculate(0, Duration::from_secs(10)), 0);
    }

    #[test]
    fn test_bonus_only_after_threshold() {
        let calc = PointsCalculator::default();
        assert_eq!(calc.calculate(10, Duration::from_secs(60)), 100);
        assert_eq!(calc.calculate(10, Duration::from_secs(61)), 150);
    }

    #[test]
    fn test_bonus_is_floored() {
        let calc = PointsCalculator {
            per_score: 1,
            ..PointsCalculator::default()
        };
        assert_eq!(calc.calculate(3, Duration::from_secs(120)), 4);
    }
}
