//! twenty48: a 2048 board transition engine
//!
//! This crate provides:
//! - A compact `Board` type with the four directional moves, random tile
//!   spawning, and terminal-state detection (`engine` module)
//! - A `Game` session object owning board, score, and phase (`game` module)
//!
//! Quick start:
//! ```
//! use twenty48::engine::Direction;
//! use twenty48::game::Game;
//!
//! let mut game = Game::seeded(42);
//! let step = game.step(Direction::Left);
//! if step.moved {
//!     assert_eq!(game.score(), step.gained as u64);
//! }
//! ```
//!
//! The engine itself is stateless; for direct board manipulation use
//! `engine::Board` with an RNG you own:
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use twenty48::engine::{Board, Direction};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let board = Board::new_game(&mut rng);
//! let result = board.apply_move(Direction::Up);
//! assert_eq!(result.changed, result.board != board);
//! ```
pub mod engine;
pub mod game;
