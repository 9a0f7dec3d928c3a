//! Collision detection logic

use super::location::{Grid, Location};
use super::snake::Snake;

/// Fatal move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Head left the board
    Wall,
    /// Head ran into the snake's own body
    SelfBite,
}

/// Check whether moving the head to `next_head` is fatal.
/// The body is checked as it stands before the move, tail included.
pub fn check_collision(grid: &Grid, snake: &Snake, next_head: &Location) -> Option<Collision> {
    if !grid.contains(next_head) {
        return Some(Collision::Wall);
    }
    if snake.occupies(next_head) {
        return Some(Collision::SelfBite);
    }
    None
}
