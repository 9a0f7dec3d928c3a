//! Single-player game state machine

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use super::collision::{check_collision, Collision};
use super::direction::Direction;
use super::food::Food;
use super::location::{Grid, Location};
use super::snake::Snake;
use crate::config::{FOOD_SCORE, START_X, START_Y};
use crate::protocol::{CellData, FrameData};

/// Lifecycle of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Idle,
    Running,
    Paused,
    GameOver,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCause {
    Wall,
    SelfBite,
    /// No free cell left for food
    BoardFilled,
}

impl From<Collision> for EndCause {
    fn from(collision: Collision) -> Self {
        match collision {
            Collision::Wall => EndCause::Wall,
            Collision::SelfBite => EndCause::SelfBite,
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or not moving yet
    Idle,
    Moved,
    Ate { score: u32 },
    GameOver { cause: EndCause, score: u32 },
}

/// Best score seen; only ever goes up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore(u32);

impl HighScore {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Raise to `score` if it beats the current best. Returns whether it did.
    pub fn offer(&mut self, score: u32) -> bool {
        if score > self.0 {
            self.0 = score;
            true
        } else {
            false
        }
    }
}

/// One player's game
#[derive(Debug)]
pub struct Game {
    grid: Grid,
    snake: Snake,
    food: Option<Food>,
    score: u32,
    high_score: HighScore,
    state: GameState,
    ticks: u64,
    rng: StdRng,
}

impl Game {
    /// New idle game on the default board
    pub fn new(high_score: u32) -> Self {
        Self::with_rng(Grid::default(), high_score, StdRng::from_entropy())
    }

    /// New idle game with an explicit board and random source
    pub fn with_rng(grid: Grid, high_score: u32, rng: StdRng) -> Self {
        let snake = Snake::new(start_cell(&grid));
        let mut game = Self {
            grid,
            snake,
            food: None,
            score: 0,
            high_score: HighScore::new(high_score),
            state: GameState::Idle,
            ticks: 0,
            rng,
        };
        game.reset();
        game
    }

    /// Fresh board, back to `Idle`. The high score is kept.
    pub fn reset(&mut self) {
        self.snake = Snake::new(start_cell(&self.grid));
        self.food = Food::spawn(&self.grid, &self.snake, &mut self.rng);
        self.score = 0;
        self.ticks = 0;
        self.state = GameState::Idle;
    }

    /// Begin a run from `Idle` or `GameOver`. Returns whether it started.
    pub fn start(&mut self) -> bool {
        match self.state {
            GameState::Idle | GameState::GameOver => {
                self.reset();
                self.state = GameState::Running;
                true
            }
            GameState::Running | GameState::Paused => false,
        }
    }

    /// Switch between `Running` and `Paused`; other states are left alone
    pub fn toggle_pause(&mut self) -> GameState {
        self.state = match self.state {
            GameState::Running => GameState::Paused,
            GameState::Paused => GameState::Running,
            other => other,
        };
        self.state
    }

    /// Apply a direction change. Only while running; reversals are refused.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.state != GameState::Running {
            return false;
        }
        self.snake.set_direction(direction)
    }

    /// Advance the simulation by one step
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != GameState::Running || !self.snake.direction().is_moving() {
            return TickOutcome::Idle;
        }
        self.ticks += 1;

        let next_head = self.snake.next_head();
        if let Some(collision) = check_collision(&self.grid, &self.snake, &next_head) {
            return self.end(collision.into());
        }

        let ate = self.food.is_some_and(|food| food.is_at(&next_head));
        self.snake.advance(next_head, ate);

        if !ate {
            return TickOutcome::Moved;
        }

        self.score += FOOD_SCORE;
        self.high_score.offer(self.score);
        self.food = Food::spawn(&self.grid, &self.snake, &mut self.rng);
        if self.food.is_none() {
            return self.end(EndCause::BoardFilled);
        }

        TickOutcome::Ate { score: self.score }
    }

    fn end(&mut self, cause: EndCause) -> TickOutcome {
        self.state = GameState::GameOver;
        TickOutcome::GameOver {
            cause,
            score: self.score,
        }
    }

    /// Raise the high score from an outside record (e.g. a loaded profile)
    pub fn merge_high_score(&mut self, best: u32) {
        self.high_score.offer(best);
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score.get()
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Option<Food> {
        self.food
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Ticks the current run has moved
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Test hook: put food on a chosen cell
    #[cfg(test)]
    pub(crate) fn place_food(&mut self, location: Location) {
        self.food = Some(Food::at(location));
    }

    /// Convert to FrameData for protocol messages
    pub fn to_frame(&self) -> FrameData {
        FrameData {
            state: self.state,
            grid: self.grid.tiles,
            snake: self
                .snake
                .body()
                .iter()
                .map(|loc| CellData { x: loc.x, y: loc.y })
                .collect(),
            food: self.food.map(|f| CellData {
                x: f.location.x,
                y: f.location.y,
            }),
            score: self.score,
            high_score: self.high_score.get(),
        }
    }
}

/// Head position at the start of each run, clamped for small boards
fn start_cell(grid: &Grid) -> Location {
    let max = (grid.tiles - 1).max(0);
    Location::new(START_X.min(max), START_Y.min(max))
}
