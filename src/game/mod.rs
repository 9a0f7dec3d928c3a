//! Game module

pub mod collision;
pub mod direction;
pub mod engine;
pub mod food;
pub mod game_loop;
pub mod input;
pub mod location;
pub mod snake;

pub use direction::Direction;
pub use engine::{Game, GameState, TickOutcome};
pub use food::Food;
pub use location::{Grid, Location};
pub use snake::Snake;
