use serde::{Deserialize, Serialize};

use crate::board::{random_f64, GameState, Grid};
use crate::engine::{get_best_move, AiConfig, SearchResult};
use crate::moves::{Direction, MoveOutcome, OriginMap, TileOrigin};

/// Tiles placed when a game starts.
pub const START_TILES: usize = 2;

/// Serializable session state, enough to resume a game.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GameSnapshot {
    pub game: GameState,
    pub over: bool,
}

/// A running game: the live state plus the bookkeeping a front end needs.
#[derive(Clone, Debug)]
pub struct Game {
    state: GameState,
    over: bool,
    best_score: u64,
    last_origins: OriginMap,
}

impl Game {
    pub fn new(size: usize) -> Self {
        Self::new_with(size, random_f64)
    }

    /// Start a game whose spawns draw from `roll` (values in [0, 1)).
    pub fn new_with(size: usize, mut roll: impl FnMut() -> f64) -> Self {
        let mut state = GameState::new(size);
        for _ in 0..START_TILES {
            state.grid.add_random_tile_with(&mut roll);
        }
        Game {
            state,
            over: false,
            best_score: 0,
            last_origins: OriginMap::all_spawned(size),
        }
    }

    /// Resume from a snapshot. The best score starts at the snapshot's score.
    pub fn from_snapshot(snapshot: GameSnapshot) -> Self {
        let size = snapshot.game.grid.size();
        let over = snapshot.over || !snapshot.game.can_move();
        Game {
            state: snapshot.game,
            over,
            best_score: snapshot.game.score,
            last_origins: OriginMap::all_spawned(size),
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game: self.state,
            over: self.over,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.state.grid
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Origins recorded by the most recent move (all spawned after a restart).
    pub fn last_origins(&self) -> &OriginMap {
        &self.last_origins
    }

    /// Start over on a fresh board of the same size. The best score is kept.
    pub fn restart(&mut self) {
        self.restart_with(random_f64);
    }

    pub fn restart_with(&mut self, roll: impl FnMut() -> f64) {
        let best = self.best_score;
        *self = Game::new_with(self.state.grid.size(), roll);
        self.best_score = best;
    }

    /// Apply a player move. When anything moved, a random tile is spawned
    /// and marked in the returned origins. The game is flagged over once
    /// no move remains.
    pub fn play(&mut self, direction: Direction) -> MoveOutcome {
        self.play_with(direction, random_f64)
    }

    pub fn play_with(&mut self, direction: Direction, roll: impl FnMut() -> f64) -> MoveOutcome {
        let mut outcome = self.state.move_tiles(direction);
        if outcome.moved {
            if let Some(pos) = self.state.grid.add_random_tile_with(roll) {
                outcome.origins.set(pos, TileOrigin::Spawned);
            }
        }
        if !self.state.can_move() {
            self.over = true;
        }
        self.best_score = self.best_score.max(self.state.score);
        self.last_origins = outcome.origins;
        outcome
    }

    /// Let the AI choose and play one move. `None` when the game is over.
    pub fn step_ai(&mut self, config: &AiConfig) -> Option<(SearchResult, MoveOutcome)> {
        self.step_ai_with(config, random_f64)
    }

    pub fn step_ai_with(
        &mut self,
        config: &AiConfig,
        roll: impl FnMut() -> f64,
    ) -> Option<(SearchResult, MoveOutcome)> {
        if self.over {
            return None;
        }
        let result = get_best_move(&self.state, config)?;
        let outcome = self.play_with(result.direction, roll);
        Some((result, outcome))
    }
}
