//! Snake entity: body, heading and movement

use std::collections::VecDeque;

use super::direction::Direction;
use super::location::Location;

/// The player's snake
#[derive(Debug, Clone)]
pub struct Snake {
    /// Current movement direction
    direction: Direction,
    /// Body segments (head is front, tail is back)
    body: VecDeque<Location>,
}

impl Snake {
    /// A one-cell snake at `head`, not moving
    pub fn new(head: Location) -> Self {
        let mut body = VecDeque::new();
        body.push_front(head);

        Self {
            direction: Direction::None,
            body,
        }
    }

    /// Get the snake's head location
    pub fn head(&self) -> Location {
        // never empty: every pop_back follows a push_front
        self.body[0]
    }

    /// All body cells, head first
    pub fn body(&self) -> &VecDeque<Location> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Always false; a snake has at least its head
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Get the current direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether any segment sits on `loc`
    pub fn occupies(&self, loc: &Location) -> bool {
        self.body.contains(loc)
    }

    /// Set the snake's direction, refusing 180-degree turns.
    /// Returns whether the change was accepted.
    pub fn set_direction(&mut self, new_direction: Direction) -> bool {
        if !new_direction.is_moving() || self.direction.is_opposite(&new_direction) {
            return false;
        }
        self.direction = new_direction;
        true
    }

    /// Where the head goes on the next move
    pub fn next_head(&self) -> Location {
        self.head().adjacent(self.direction)
    }

    /// Push `head` onto the front; drop the tail unless growing
    pub fn advance(&mut self, head: Location, grow: bool) {
        self.body.push_front(head);
        if !grow {
            self.body.pop_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snake() {
        let snake = Snake::new(Location::new(10, 10));
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Location::new(10, 10));
        assert_eq!(snake.direction(), Direction::None);
    }

    #[test]
    fn test_set_direction() {
        let mut snake = Snake::new(Location::new(10, 10));
        assert!(snake.set_direction(Direction::Up));
        assert_eq!(snake.direction(), Direction::Up);

        // Should not reverse
        assert!(!snake.set_direction(Direction::Down));
        assert_eq!(snake.direction(), Direction::Up);

        // Can turn 90 degrees
        assert!(snake.set_direction(Direction::Right));
        assert_eq!(snake.direction(), Direction::Right);

        // Cannot stop
        assert!(!snake.set_direction(Direction::None));
        assert_eq!(snake.direction(), Direction::Right);
    }

    #[test]
    fn test_reverse_rejected_from_every_heading() {
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            let mut snake = Snake::new(Location::new(5, 5));
            snake.set_direction(dir);
            let reverse = match dir {
                Direction::Up => Direction::Down,
                Direction::Down => Direction::Up,
                Direction::Left => Direction::Right,
                _ => Direction::Left,
            };
            assert!(!snake.set_direction(reverse));
            assert_eq!(snake.direction(), dir);
        }
    }

    #[test]
    fn test_advance_and_grow() {
        let mut snake = Snake::new(Location::new(5, 5));
        snake.set_direction(Direction::Right);

        let next = snake.next_head();
        snake.advance(next, true);
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.head(), Location::new(6, 5));

        let next = snake.next_head();
        snake.advance(next, false);
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.head(), Location::new(7, 5));
        assert!(!snake.occupies(&Location::new(5, 5)));
    }
}
