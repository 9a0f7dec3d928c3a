//! Food entity - placed on a random free cell

use rand::seq::IteratorRandom;
use rand::Rng;

use super::location::{Grid, Location};
use super::snake::Snake;

/// The food item on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    /// Position of the food
    pub location: Location,
}

impl Food {
    /// Create food at a specific location
    pub fn at(location: Location) -> Self {
        Self { location }
    }

    /// Place food on a random cell the snake does not occupy.
    /// Returns `None` when the snake covers the whole board.
    pub fn spawn<R: Rng + ?Sized>(grid: &Grid, snake: &Snake, rng: &mut R) -> Option<Self> {
        if snake.len() >= grid.area() {
            return None;
        }
        grid.cells()
            .filter(|cell| !snake.occupies(cell))
            .choose(rng)
            .map(Food::at)
    }

    /// Check if a location matches the food position
    pub fn is_at(&self, loc: &Location) -> bool {
        self.location == *loc
    }
}
