//! Grid cells and the board they live on

use super::direction::Direction;
use crate::config::GRID_TILES;

/// A cell on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    /// Create a new location
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell next to this one in the given direction.
    /// No wrapping: the result may lie outside the board.
    pub fn adjacent(&self, direction: Direction) -> Location {
        let (dx, dy) = direction.vector();
        Location::new(self.x + dx, self.y + dy)
    }
}

/// Square board of `tiles` × `tiles` cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub tiles: i32,
}

impl Grid {
    pub fn new(tiles: i32) -> Self {
        Self { tiles }
    }

    /// Whether a cell lies on the board
    pub fn contains(&self, loc: &Location) -> bool {
        (0..self.tiles).contains(&loc.x) && (0..self.tiles).contains(&loc.y)
    }

    /// Number of cells on the board
    pub fn area(&self) -> usize {
        (self.tiles.max(0) as usize).pow(2)
    }

    /// Every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.tiles).flat_map(move |y| (0..self.tiles).map(move |x| Location::new(x, y)))
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GRID_TILES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent() {
        let loc = Location::new(5, 5);

        assert_eq!(loc.adjacent(Direction::Up), Location::new(5, 4));
        assert_eq!(loc.adjacent(Direction::Down), Location::new(5, 6));
        assert_eq!(loc.adjacent(Direction::Left), Location::new(4, 5));
        assert_eq!(loc.adjacent(Direction::Right), Location::new(6, 5));
        assert_eq!(loc.adjacent(Direction::None), loc);
    }

    #[test]
    fn test_no_wrap_at_edges() {
        let grid = Grid::default();

        let left = Location::new(0, 3).adjacent(Direction::Left);
        assert_eq!(left, Location::new(-1, 3));
        assert!(!grid.contains(&left));

        let bottom = Location::new(3, GRID_TILES - 1).adjacent(Direction::Down);
        assert!(!grid.contains(&bottom));
    }

    #[test]
    fn test_cells_cover_board() {
        let grid = Grid::new(4);
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), grid.area());
        assert!(cells.iter().all(|c| grid.contains(c)));
    }
}
