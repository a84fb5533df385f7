//! Session layer: owns the board, score, and Playing/GameOver phase so UI
//! collaborators only forward directions and render. The engine stays
//! stateless; the RNG is injected and seedable for deterministic play.

use crate::engine::{Board, Direction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Where a session is in its lifecycle. `GameOver` is terminal except for
/// an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Playing,
    GameOver,
}

/// What one accepted input event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Whether the move changed the board (and therefore spawned a tile).
    pub moved: bool,
    /// Score gained by merges in this move.
    pub gained: u32,
    /// Whether this step ended the game.
    pub game_over: bool,
}

/// One play session: board, accumulated score, phase, and its own RNG.
pub struct Game<R: Rng = StdRng> {
    board: Board,
    score: u64,
    phase: Phase,
    rng: R,
}

impl Game<StdRng> {
    /// New session seeded from OS entropy.
    pub fn new() -> Self {
        Game::with_rng(StdRng::from_entropy())
    }

    /// New session with a fixed seed, for reproducible games.
    pub fn seeded(seed: u64) -> Self {
        Game::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Game<StdRng> {
    fn default() -> Self {
        Game::new()
    }
}

impl<R: Rng> Game<R> {
    /// New session driven by the given random source.
    pub fn with_rng(mut rng: R) -> Self {
        let board = Board::new_game(&mut rng);
        Game {
            board,
            score: 0,
            phase: Phase::Playing,
            rng,
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Process one direction input. A move that changes the board spawns
    /// exactly one tile and accumulates the gained score; a no-op move
    /// leaves board, score, and RNG untouched. Inputs after game over are
    /// ignored until `reset`.
    pub fn step(&mut self, direction: Direction) -> Step {
        if self.phase == Phase::GameOver {
            return Step {
                moved: false,
                gained: 0,
                game_over: true,
            };
        }

        let result = self.board.apply_move(direction);
        if !result.changed {
            return Step {
                moved: false,
                gained: 0,
                game_over: false,
            };
        }

        self.board = result.board.spawn_tile(&mut self.rng);
        self.score += result.score as u64;
        if !self.board.has_moves() {
            self.phase = Phase::GameOver;
        }

        Step {
            moved: true,
            gained: result.score,
            game_over: self.phase == Phase::GameOver,
        }
    }

    /// Wholesale board replacement: two fresh tiles, score 0, back to
    /// `Playing`.
    pub fn reset(&mut self) {
        self.board = Board::new_game(&mut self.rng);
        self.score = 0;
        self.phase = Phase::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Board;

    #[test]
    fn new_session_has_two_tiles_and_zero_score() {
        let game = Game::seeded(1);
        assert_eq!(game.board().count_empty(), 14);
        assert_eq!(game.score(), 0);
        assert_eq!(game.phase(), Phase::Playing);
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let mut a = Game::seeded(42);
        let mut b = Game::seeded(42);
        for dir in Direction::ALL.into_iter().cycle().take(40) {
            assert_eq!(a.step(dir), b.step(dir));
            assert_eq!(a.board(), b.board());
            assert_eq!(a.score(), b.score());
        }
    }

    #[test]
    fn step_accumulates_score_and_spawns() {
        let mut game = Game::seeded(5);
        let mut expected_score = 0u64;
        let mut steps = 0;
        for dir in Direction::ALL.into_iter().cycle() {
            let before = game.board();
            let step = game.step(dir);
            if step.moved {
                expected_score += step.gained as u64;
                // One tile spawned on top of the slid board.
                assert_eq!(
                    game.board().count_empty() + 1,
                    before.apply_move(dir).board.count_empty()
                );
                steps += 1;
            }
            assert_eq!(game.score(), expected_score);
            if steps >= 50 || step.game_over {
                break;
            }
        }
        assert!(steps > 0);
    }

    #[test]
    fn no_op_move_changes_nothing() {
        let mut game = Game::seeded(9);
        // Drive the board until some direction is a no-op.
        for dir in Direction::ALL.into_iter().cycle().take(200) {
            let before_board = game.board();
            let before_score = game.score();
            let step = game.step(dir);
            if game.is_over() {
                break;
            }
            if !step.moved {
                assert_eq!(game.board(), before_board);
                assert_eq!(game.score(), before_score);
                assert_eq!(step.gained, 0);
                return;
            }
        }
        // Random play on a fresh board hits a no-op long before 200 steps
        // unless the game ended first; either way the invariant held.
    }

    #[test]
    fn game_over_is_terminal_until_reset() {
        let mut game = Game::seeded(2);
        // One move from death: Left merges the 2s in the top row, the spawn
        // fills the gap at (0,3), and no adjacent pair survives whether the
        // spawned tile is a 2 or a 4.
        game.board = Board::from_grid([
            [2, 2, 8, 16],
            [16, 4, 2, 8],
            [2, 8, 4, 2],
            [4, 2, 8, 4],
        ]);
        let step = game.step(Direction::Left);
        assert!(step.moved);
        assert_eq!(step.gained, 4);
        assert!(step.game_over);
        assert!(game.is_over());
        assert_eq!(game.score(), 4);

        let frozen = game.board();
        let ignored = game.step(Direction::Up);
        assert!(!ignored.moved);
        assert!(ignored.game_over);
        assert_eq!(game.board(), frozen);
        assert_eq!(game.score(), 4);

        game.reset();
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.score(), 0);
        assert_eq!(game.board().count_empty(), 14);
    }

    #[test]
    fn played_out_session_terminates() {
        let mut game = Game::seeded(7);
        let mut budget = 10_000;
        while !game.is_over() && budget > 0 {
            for dir in Direction::ALL {
                game.step(dir);
            }
            budget -= 1;
        }
        assert!(game.is_over(), "session never reached game over");
        assert!(!game.board().has_moves());
        assert!(game.score() > 0);
    }
}
