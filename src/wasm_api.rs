use crate::board::{MAX_SIZE, MIN_SIZE};
use crate::engine::{evaluate_breakdown, get_best_move, AiConfig, SearchResult};
use crate::game::{Game, GameSnapshot};
use crate::moves::{Direction, TileOrigin};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct GameView {
    grid: Vec<Vec<Option<u32>>>,
    origins: Vec<Vec<Option<TileOrigin>>>,
    score: u64,
    best_score: u64,
    over: bool,
}

#[derive(Serialize)]
struct MoveResult {
    #[serde(flatten)]
    game: Option<GameView>,
    moved: bool,
    score_delta: u64,
    search: Option<SearchJson>,
    error: Option<String>,
}

#[derive(Serialize)]
struct SearchJson {
    direction: &'static str,
    depth: u32,
    evaluation: f64,
    evals: u64,
}

impl From<SearchResult> for SearchJson {
    fn from(r: SearchResult) -> Self {
        SearchJson {
            direction: r.direction.label(),
            depth: r.depth,
            evaluation: r.evaluation,
            evals: r.evals,
        }
    }
}

fn build_view(game: &Game) -> GameView {
    GameView {
        grid: game.grid().rows(),
        origins: game.last_origins().rows(),
        score: game.score(),
        best_score: game.best_score(),
        over: game.is_over(),
    }
}

fn error_result(message: &str) -> JsValue {
    let err = MoveResult {
        game: None,
        moved: false,
        score_delta: 0,
        search: None,
        error: Some(message.to_string()),
    };
    serde_wasm_bindgen::to_value(&err).unwrap_or(JsValue::NULL)
}

#[wasm_bindgen]
pub struct Game2048 {
    game: Game,
    ai_config: AiConfig,
}

#[wasm_bindgen]
impl Game2048 {
    #[wasm_bindgen(constructor)]
    pub fn new(size: usize) -> Game2048 {
        Game2048 {
            game: Game::new(size.clamp(MIN_SIZE, MAX_SIZE)),
            ai_config: AiConfig::new(),
        }
    }

    pub fn restart(&mut self) -> JsValue {
        self.game.restart();
        self.get_state()
    }

    pub fn set_time_limit(&mut self, ms: f64) {
        self.ai_config.time_limit_ms = ms.clamp(1.0, 5_000.0);
    }

    /// Throws on an unknown weight name.
    pub fn set_weight(&mut self, name: &str, value: f64) -> Result<(), JsValue> {
        self.ai_config
            .weights
            .set(name, value)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn get_state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&build_view(&self.game)).unwrap_or(JsValue::NULL)
    }

    /// Direction: 0 = up, 1 = right, 2 = down, 3 = left.
    pub fn make_move(&mut self, direction: u8) -> JsValue {
        if self.game.is_over() {
            return error_result("Game is already over");
        }
        let Some(direction) = Direction::from_index(direction) else {
            return error_result("Unknown direction");
        };
        let outcome = self.game.play(direction);
        let result = MoveResult {
            game: Some(build_view(&self.game)),
            moved: outcome.moved,
            score_delta: outcome.score_delta,
            search: None,
            error: None,
        };
        serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
    }

    pub fn make_ai_move(&mut self) -> JsValue {
        match self.game.step_ai(&self.ai_config) {
            Some((search, outcome)) => {
                let result = MoveResult {
                    game: Some(build_view(&self.game)),
                    moved: outcome.moved,
                    score_delta: outcome.score_delta,
                    search: Some(search.into()),
                    error: None,
                };
                serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
            }
            None => self.get_state(),
        }
    }

    pub fn get_hint(&self) -> JsValue {
        match get_best_move(self.game.state(), &self.ai_config) {
            Some(result) => {
                serde_wasm_bindgen::to_value(&SearchJson::from(result)).unwrap_or(JsValue::NULL)
            }
            None => JsValue::NULL,
        }
    }

    pub fn get_eval_breakdown(&self) -> JsValue {
        let breakdown = evaluate_breakdown(self.game.state(), &self.ai_config.weights);
        serde_wasm_bindgen::to_value(&breakdown).unwrap_or(JsValue::NULL)
    }

    /// Snapshot for the page to store; pass it back to `load` to resume.
    pub fn save(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.game.snapshot()).unwrap_or(JsValue::NULL)
    }

    pub fn load(&mut self, snapshot: JsValue) -> Result<JsValue, JsValue> {
        let snapshot: GameSnapshot = serde_wasm_bindgen::from_value(snapshot)?;
        self.game = Game::from_snapshot(snapshot);
        Ok(self.get_state())
    }
}
