//! Input normalization: keys and swipe / drag gestures to directions

use serde::Deserialize;

use super::direction::Direction;
use crate::config::MIN_SWIPE_DISTANCE;

/// A point in presentation-layer pixels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Map a keyboard key name (as browsers report `KeyboardEvent.key`) to a direction
pub fn direction_from_key(key: &str) -> Option<Direction> {
    match key {
        "ArrowUp" | "w" | "W" => Some(Direction::Up),
        "ArrowDown" | "s" | "S" => Some(Direction::Down),
        "ArrowLeft" | "a" | "A" => Some(Direction::Left),
        "ArrowRight" | "d" | "D" => Some(Direction::Right),
        _ => None,
    }
}

/// Map a swipe vector to a direction.
///
/// Vectors shorter than `min_distance` are ignored. The dominant axis wins;
/// equal components count as vertical.
pub fn direction_from_swipe(dx: f64, dy: f64, min_distance: f64) -> Option<Direction> {
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }
    if dx.hypot(dy) < min_distance {
        return None;
    }

    if dx.abs() > dy.abs() {
        Some(if dx > 0.0 { Direction::Right } else { Direction::Left })
    } else {
        Some(if dy > 0.0 { Direction::Down } else { Direction::Up })
    }
}

/// Map a pointer drag from `start` to `end` to a direction
pub fn direction_from_drag(start: Point, end: Point) -> Option<Direction> {
    direction_from_swipe(end.x - start.x, end.y - start.y, MIN_SWIPE_DISTANCE)
}
