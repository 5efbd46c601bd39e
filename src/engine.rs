// =============================================================================
// 2048 AI Engine
//
// Iterative-deepening alpha-beta over a tree that alternates player moves
// with tile spawns. Spawns are treated as an adversary: every empty cell
// receives both a 2 and a 4 and the worst outcome is taken, which gives a
// cheap lower bound instead of a true expectation. Each deepening pass runs
// against a soft wall-clock deadline; a pass that hits the deadline is
// thrown away so the returned move always comes from a fully searched tree.
//
// The evaluation is a weighted sum of independent terms (free space, score,
// duplicated large tiles, neighbourhood smoothness). Weights live in an
// explicit Weights struct so differently tuned players can coexist.
// =============================================================================

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{GameState, Grid};
use crate::moves::Direction;

/// Milliseconds on a monotonic clock.
/// Uses js_sys::Date::now() in WASM builds, std::time::Instant natively.
fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::sync::OnceLock;
        use std::time::Instant;
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
    }
}

/// Tile values the adversary may place, in search order.
const SPAWN_VALUES: [u32; 2] = [2, 4];

/// Tiles at or below this value are what spawns produce, so duplicates of
/// them are expected and not penalized.
const MAX_SPAWN_VALUE: u32 = 4;

// =============================================================================
// Configuration
// =============================================================================

/// Tunable weights for the evaluation terms. Tuned with src/bin/simulate.rs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Bonus per empty cell.
    pub empty: f64,
    /// Bonus per point of accumulated score.
    pub score: f64,
    /// Bonus per unit of ln(1 + score).
    pub log_score: f64,
    /// Penalty per unit of Σ value × (count − 1) over large duplicated tiles.
    pub duplication: f64,
    /// Bonus per unit of neighbourhood friendliness.
    pub neighborhood: f64,
    /// Flat penalty for a position with no legal move, found during search.
    pub loss_penalty: f64,
}

impl Weights {
    /// Set one weight by its field name.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), ConfigError> {
        let slot = match name {
            "empty" => &mut self.empty,
            "score" => &mut self.score,
            "log_score" => &mut self.log_score,
            "duplication" => &mut self.duplication,
            "neighborhood" => &mut self.neighborhood,
            "loss_penalty" => &mut self.loss_penalty,
            _ => return Err(ConfigError::UnknownWeight(name.to_string())),
        };
        *slot = value;
        Ok(())
    }
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            empty: 1.0,
            score: 0.07,
            log_score: 0.0,
            duplication: 0.002,
            neighborhood: 0.25,
            loss_penalty: 500.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Wall-clock allowance per move choice. Soft: checked on node entry.
    pub time_limit_ms: f64,
    /// Hard cap on the deepening loop.
    pub max_depth: u32,
    /// Search player moves in order of their static evaluation.
    pub order_moves: bool,
    pub weights: Weights,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AiConfig {
    pub fn new() -> Self {
        AiConfig {
            time_limit_ms: 100.0,
            max_depth: 32,
            order_moves: true,
            weights: Weights::default(),
        }
    }

    /// Parse a (possibly partial) JSON config; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown weight {0:?}")]
    UnknownWeight(String),
}

/// The outcome of a move search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub direction: Direction,
    /// Depth of the deepest fully completed pass.
    pub depth: u32,
    /// Minimax value of the chosen move at that depth.
    pub evaluation: f64,
    /// Static evaluations performed across all passes, including a final
    /// pass that was cut off and discarded.
    pub evals: u64,
}

/// What [`get_best_move_cancellable`] found, and whether it stopped early
/// because the cancel flag was set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchOutcome {
    pub result: Option<SearchResult>,
    pub cancelled: bool,
}

// =============================================================================
// Evaluation — top-level
// =============================================================================

/// Score a state by summing the weighted terms. Terms with a zero weight
/// are skipped.
pub fn evaluate(state: &GameState, w: &Weights) -> f64 {
    let grid = &state.grid;
    let mut value = grid.empty_count() as f64 * w.empty;

    if w.score != 0.0 {
        value += state.score as f64 * w.score;
    }
    if w.log_score != 0.0 {
        value += (state.score as f64).ln_1p() * w.log_score;
    }
    if w.duplication != 0.0 {
        value -= duplication(grid) * w.duplication;
    }
    if w.neighborhood != 0.0 {
        value += neighborhood(grid) * w.neighborhood;
    }
    value
}

/// Weighted contribution of each term, for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvalBreakdown {
    pub empty: f64,
    pub score: f64,
    pub log_score: f64,
    pub duplication: f64,
    pub neighborhood: f64,
    pub total: f64,
}

pub fn evaluate_breakdown(state: &GameState, w: &Weights) -> EvalBreakdown {
    let grid = &state.grid;
    let empty = grid.empty_count() as f64 * w.empty;
    let score = state.score as f64 * w.score;
    let log_score = (state.score as f64).ln_1p() * w.log_score;
    let duplication = -duplication(grid) * w.duplication;
    let neighborhood = neighborhood(grid) * w.neighborhood;
    let total = empty + score + log_score + duplication + neighborhood;
    EvalBreakdown { empty, score, log_score, duplication, neighborhood, total }
}

// =============================================================================
// Evaluation terms
// =============================================================================

/// Σ value × (count − 1) over distinct tile values above the spawn range.
fn duplication(grid: &Grid) -> f64 {
    let mut counts = [0u32; 32];
    for (_, value) in grid.tiles() {
        if value > MAX_SPAWN_VALUE {
            counts[value.trailing_zeros() as usize] += 1;
        }
    }
    counts
        .iter()
        .enumerate()
        .filter(|&(_, &n)| n > 1)
        .map(|(exp, &n)| (1u64 << exp) as f64 * (n - 1) as f64)
        .sum()
}

/// Local shape of a line around one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Run {
    /// Both sides equal.
    Flat,
    /// Rising or falling through the cell.
    Monotonic,
    /// Slope changes sign at the cell.
    Reversal,
}

/// Classify the cell at `at` on a line of tile ranks (log2, 0 = empty).
///
/// An edge cell sees only one neighbour; that slope is mirrored to the
/// missing side. An equal neighbour contributes no sign of its own and
/// takes the other side's slope instead.
fn run_at(line: impl Fn(usize) -> i32, at: usize, len: usize) -> Run {
    let here = line(at);
    let before = (at > 0).then(|| (here - line(at - 1)).signum());
    let after = (at + 1 < len).then(|| (line(at + 1) - here).signum());

    let (mut before, mut after) = match (before, after) {
        (Some(b), Some(a)) => (b, a),
        (None, Some(a)) => (a, a),
        (Some(b), None) => (b, b),
        (None, None) => (0, 0),
    };
    if before == 0 {
        before = after;
    }
    if after == 0 {
        after = before;
    }

    if before == 0 && after == 0 {
        Run::Flat
    } else if before == after {
        Run::Monotonic
    } else {
        Run::Reversal
    }
}

fn rank(grid: &Grid, row: usize, col: usize) -> i32 {
    grid.get(row, col).map_or(0, |v| v.trailing_zeros() as i32)
}

/// Neighbourhood friendliness. Each tile scores ±log2(value) per axis:
/// positive inside a flat or monotonic run, negative at a sign reversal.
/// The axes combine conservatively (minimum), except that a flat column
/// lets the better axis through.
fn neighborhood(grid: &Grid) -> f64 {
    let size = grid.size();
    let mut total = 0.0;
    for (row, col) in (0..size).flat_map(|r| (0..size).map(move |c| (r, c))) {
        let here = rank(grid, row, col);
        if here == 0 {
            continue;
        }
        let weight = here as f64;
        let across = run_at(|c| rank(grid, row, c), col, size);
        let down = run_at(|r| rank(grid, r, col), row, size);

        let axis = |run: Run| if run == Run::Reversal { -weight } else { weight };
        total += if down == Run::Flat {
            axis(across).max(axis(down))
        } else {
            axis(across).min(axis(down))
        };
    }
    total
}

// =============================================================================
// Search — alpha-beta over alternating player / spawn plies
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ply {
    /// The player picks a direction (maximizing).
    Player,
    /// A tile appears on an empty cell (minimizing).
    Chance,
}

/// Value of a searched subtree. `completed` is false when any node below
/// was cut off by the deadline rather than by reaching depth zero.
struct Node {
    value: f64,
    best: Option<Direction>,
    completed: bool,
}

#[derive(Clone, Copy)]
struct Child {
    direction: Direction,
    state: GameState,
    order: f64,
}

/// One deepening pass.
struct Search<'a> {
    config: &'a AiConfig,
    deadline: Option<f64>,
    evals: u64,
    /// Set once any branch reaches depth zero. A completed pass that never
    /// gets there has exhausted the game tree.
    reached_horizon: bool,
}

impl<'a> Search<'a> {
    fn new(config: &'a AiConfig, deadline: Option<f64>) -> Self {
        Search { config, deadline, evals: 0, reached_horizon: false }
    }

    fn leaf(&mut self, state: &GameState, completed: bool) -> Node {
        self.evals += 1;
        Node {
            value: evaluate(state, &self.config.weights),
            best: None,
            completed,
        }
    }

    /// Entry point for every non-root node.
    fn search(&mut self, state: &GameState, depth: u32, alpha: f64, beta: f64, ply: Ply) -> Node {
        if depth == 0 {
            self.reached_horizon = true;
            return self.leaf(state, true);
        }
        if self.deadline.is_some_and(|d| now_ms() >= d) {
            return self.leaf(state, false);
        }
        match ply {
            Ply::Player => self.player(state, depth, alpha, beta),
            Ply::Chance => self.chance(state, depth, alpha, beta),
        }
    }

    fn player(&mut self, state: &GameState, depth: u32, mut alpha: f64, beta: f64) -> Node {
        let mut children = [Child { direction: Direction::Up, state: *state, order: 0.0 }; 4];
        let mut count = 0;
        for direction in Direction::ALL {
            let mut next = *state;
            if next.slide(direction).is_none() {
                continue;
            }
            let order = if self.config.order_moves {
                evaluate(&next, &self.config.weights)
            } else {
                0.0
            };
            children[count] = Child { direction, state: next, order };
            count += 1;
        }

        if count == 0 {
            let mut node = self.leaf(state, true);
            node.value -= self.config.weights.loss_penalty;
            return node;
        }

        let children = &mut children[..count];
        if self.config.order_moves {
            // Stable: equal evaluations keep direction order.
            children.sort_by(|a, b| b.order.total_cmp(&a.order));
        }

        let mut value = f64::NEG_INFINITY;
        let mut best = None;
        let mut completed = true;
        for child in children.iter() {
            let node = self.search(&child.state, depth - 1, alpha, beta, Ply::Chance);
            completed &= node.completed;
            if best.is_none() || node.value > value {
                value = node.value;
                best = Some(child.direction);
            }
            alpha = alpha.max(value);
            if alpha >= beta || !completed {
                break;
            }
        }
        Node { value, best, completed }
    }

    fn chance(&mut self, state: &GameState, depth: u32, alpha: f64, mut beta: f64) -> Node {
        let size = state.grid.size();
        let mut value = f64::INFINITY;
        let mut completed = true;
        let mut expanded = false;

        'cells: for row in 0..size {
            for col in 0..size {
                if state.grid.get(row, col).is_some() {
                    continue;
                }
                for tile in SPAWN_VALUES {
                    let mut next = *state;
                    next.grid.set(row, col, Some(tile));
                    let node = self.search(&next, depth - 1, alpha, beta, Ply::Player);
                    expanded = true;
                    completed &= node.completed;
                    value = value.min(node.value);
                    beta = beta.min(value);
                    if alpha >= beta || !completed {
                        break 'cells;
                    }
                }
            }
        }

        if !expanded {
            return self.leaf(state, true);
        }
        Node { value, best: None, completed }
    }
}

// =============================================================================
// Move selection
// =============================================================================

/// Run a single alpha-beta pass to exactly `depth` with no deadline.
/// Deterministic for a given state and config. Returns `None` when no
/// direction moves.
pub fn search_depth(state: &GameState, depth: u32, config: &AiConfig) -> Option<SearchResult> {
    assert!(depth >= 1, "search depth must be at least 1");
    let mut search = Search::new(config, None);
    let node = search.player(state, depth, f64::NEG_INFINITY, f64::INFINITY);
    node.best.map(|direction| SearchResult {
        direction,
        depth,
        evaluation: node.value,
        evals: search.evals,
    })
}

/// Pick a direction within `config.time_limit_ms`.
///
/// Searches depth 1, 2, 3, … and keeps the result of the deepest pass that
/// finished before the deadline. The root never checks the clock, so the
/// depth-1 pass always completes and any state with a legal move yields
/// `Some`.
pub fn get_best_move(state: &GameState, config: &AiConfig) -> Option<SearchResult> {
    get_best_move_cancellable(state, config, &AtomicBool::new(false)).result
}

/// [`get_best_move`] that also stops deepening once `cancel` is set. The
/// flag is only read between passes, and `cancelled` is true only when it
/// ended the deepening.
pub fn get_best_move_cancellable(
    state: &GameState,
    config: &AiConfig,
    cancel: &AtomicBool,
) -> SearchOutcome {
    let started = now_ms();
    let deadline = started + config.time_limit_ms;
    let mut best: Option<SearchResult> = None;
    let mut cancelled = false;
    let mut evals = 0;

    for depth in 1..=config.max_depth.max(1) {
        if depth > 1 && cancel.load(Ordering::Relaxed) {
            debug!("search cancelled before depth {depth}");
            cancelled = true;
            break;
        }

        let mut search = Search::new(config, Some(deadline));
        let node = search.player(state, depth, f64::NEG_INFINITY, f64::INFINITY);
        evals += search.evals;

        if !node.completed {
            trace!("discarding depth {depth} pass cut off after {:.1}ms", now_ms() - started);
            break;
        }
        let Some(direction) = node.best else {
            break;
        };
        best = Some(SearchResult { direction, depth, evaluation: node.value, evals });
        debug!(
            "depth {depth}: {direction} value {:.2} ({evals} evals, {:.1}ms)",
            node.value,
            now_ms() - started
        );

        if !search.reached_horizon {
            debug!("game tree exhausted at depth {depth}");
            break;
        }
    }

    SearchOutcome {
        result: best.map(|result| SearchResult { evals, ..result }),
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(rows: [[u32; 4]; 4]) -> GameState {
        GameState::with_grid(Grid::from_values(&rows).expect("valid grid"))
    }

    fn opening() -> GameState {
        state([[2, 0, 0, 0], [0, 0, 0, 0], [0, 0, 2, 0], [0, 0, 0, 0]])
    }

    fn only(weights: impl FnOnce(&mut Weights)) -> Weights {
        let mut w = Weights {
            empty: 0.0,
            score: 0.0,
            log_score: 0.0,
            duplication: 0.0,
            neighborhood: 0.0,
            loss_penalty: 0.0,
        };
        weights(&mut w);
        w
    }

    #[test]
    fn empty_and_score_terms_add_up() {
        let mut s = opening();
        s.score = 100;
        let w = only(|w| {
            w.empty = 1.0;
            w.score = 0.07;
        });
        assert!((evaluate(&s, &w) - (14.0 + 7.0)).abs() < 1e-9);
    }

    #[test]
    fn log_score_uses_natural_log() {
        let mut s = opening();
        s.score = 0;
        let w = only(|w| w.log_score = 2.0);
        assert_eq!(evaluate(&s, &w), 0.0);
        s.score = 99;
        assert!((evaluate(&s, &w) - 2.0 * 100f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn duplication_ignores_spawnable_tiles() {
        let s = state([[4, 4, 4, 0], [2, 2, 0, 0], [0; 4], [0; 4]]);
        assert_eq!(duplication(&s.grid), 0.0);

        let s = state([[8, 8, 8, 0], [64, 64, 0, 0], [128, 0, 0, 0], [0; 4]]);
        assert_eq!(duplication(&s.grid), 8.0 * 2.0 + 64.0);
    }

    #[test]
    fn run_mirrors_edges_and_inherits_equal_slopes() {
        let line = [1, 2, 2, 1];
        let at = |i: usize| line[i];
        // Edge: only the rising slope to the right exists.
        assert_eq!(run_at(at, 0, 4), Run::Monotonic);
        // Equal on the right inherits the rise from the left.
        assert_eq!(run_at(at, 1, 4), Run::Monotonic);
        // Equal on the left inherits the fall to the right.
        assert_eq!(run_at(at, 2, 4), Run::Monotonic);
        assert_eq!(run_at(at, 3, 4), Run::Monotonic);

        let peak = [1, 3, 1, 1];
        assert_eq!(run_at(|i| peak[i], 1, 4), Run::Reversal);
        let flat = [5, 5, 5, 5];
        assert_eq!(run_at(|i| flat[i], 0, 4), Run::Flat);
        assert_eq!(run_at(|i| flat[i], 2, 4), Run::Flat);
    }

    #[test]
    fn neighborhood_prefers_ordered_rows() {
        let ordered = state([[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        let zigzag = state([[2, 16, 4, 8], [0; 4], [0; 4], [0; 4]]);
        assert!(neighborhood(&ordered.grid) > neighborhood(&zigzag.grid));
    }

    #[test]
    fn neighborhood_flat_column_takes_the_better_axis() {
        let s = state([[8, 8, 8, 8], [2, 8, 2, 0], [8, 8, 8, 8], [8, 8, 8, 8]]);
        // (1, 1) peaks along its row but sits in a flat column.
        assert_eq!(run_at(|c| rank(&s.grid, 1, c), 1, 4), Run::Reversal);
        assert_eq!(run_at(|r| rank(&s.grid, r, 1), 1, 4), Run::Flat);
        assert_eq!(neighborhood(&s.grid), 37.0);

        // Breaking the column turns (1, 1) into a peak on both axes.
        let mut peaked = s;
        peaked.grid.set(0, 1, Some(2));
        peaked.grid.set(2, 1, Some(2));
        assert_eq!(neighborhood(&peaked.grid), 23.0);
    }

    #[test]
    fn breakdown_total_matches_evaluate() {
        let mut s = state([[2, 4, 8, 16], [32, 32, 0, 0], [0, 0, 2, 0], [0; 4]]);
        s.score = 1234;
        let w = Weights { log_score: 0.5, ..Weights::default() };
        let b = evaluate_breakdown(&s, &w);
        assert!((b.total - evaluate(&s, &w)).abs() < 1e-9);
        assert!(b.duplication < 0.0);
    }

    #[test]
    fn depth_one_always_returns_a_move() {
        let config = AiConfig { time_limit_ms: 0.0, ..AiConfig::new() };
        let result = get_best_move(&opening(), &config).expect("should find a move");
        // The depth-2 pass hits the deadline on its first child and is dropped.
        assert_eq!(result.depth, 1);
        let direct = search_depth(&opening(), 1, &config).unwrap();
        assert_eq!(result.direction, direct.direction);
        assert_eq!(result.evaluation, direct.evaluation);
        // Its work still shows up in the count.
        assert!(result.evals > direct.evals);
    }

    #[test]
    fn terminal_state_has_no_move() {
        let locked = state([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert_eq!(get_best_move(&locked, &AiConfig::new()), None);
        assert_eq!(search_depth(&locked, 3, &AiConfig::new()), None);
    }

    #[test]
    fn only_legal_directions_are_considered() {
        // A single hole in the corner: only right and down move anything.
        let s = state([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 0]]);
        let legal: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|&d| s.clone().slide(d).is_some())
            .collect();
        assert_eq!(legal, vec![Direction::Right, Direction::Down]);
        let result = search_depth(&s, 2, &AiConfig::new()).expect("has a move");
        assert!(legal.contains(&result.direction));
    }

    #[test]
    fn takes_the_obvious_merge() {
        let s = state([[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let config = AiConfig::new();
        let result = search_depth(&s, 1, &config).expect("has a move");
        assert!(matches!(result.direction, Direction::Left | Direction::Right));
    }

    #[test]
    fn fixed_depth_search_is_deterministic() {
        let s = state([[2, 4, 0, 0], [0, 8, 2, 0], [0, 0, 4, 0], [2, 0, 0, 16]]);
        let config = AiConfig::new();
        let a = search_depth(&s, 4, &config).unwrap();
        let b = search_depth(&s, 4, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn move_ordering_does_not_change_the_value() {
        let s = state([[2, 4, 0, 0], [0, 8, 2, 0], [0, 0, 4, 0], [2, 0, 0, 16]]);
        let ordered = AiConfig::new();
        let unordered = AiConfig { order_moves: false, ..AiConfig::new() };
        let a = search_depth(&s, 3, &ordered).unwrap();
        let b = search_depth(&s, 3, &unordered).unwrap();
        assert!((a.evaluation - b.evaluation).abs() < 1e-9);
    }

    #[test]
    fn search_never_touches_the_callers_state() {
        let s = opening();
        let before = s;
        let _ = get_best_move(&s, &AiConfig { time_limit_ms: 20.0, ..AiConfig::new() });
        assert_eq!(s, before);
    }

    #[test]
    fn deepening_stops_at_max_depth() {
        let config = AiConfig { time_limit_ms: 10_000.0, max_depth: 2, ..AiConfig::new() };
        let result = get_best_move(&opening(), &config).unwrap();
        assert_eq!(result.depth, 2);
        let direct = search_depth(&opening(), 2, &config).unwrap();
        assert_eq!(result.direction, direct.direction);
    }

    #[test]
    fn cancel_flag_stops_after_first_pass() {
        let config = AiConfig { time_limit_ms: 10_000.0, ..AiConfig::new() };
        let cancel = AtomicBool::new(true);
        let outcome = get_best_move_cancellable(&opening(), &config, &cancel);
        assert!(outcome.cancelled);
        assert_eq!(outcome.result.unwrap().depth, 1);
    }

    #[test]
    fn finished_search_is_not_reported_as_cancelled() {
        let config = AiConfig { time_limit_ms: 10_000.0, max_depth: 1, ..AiConfig::new() };
        let outcome = get_best_move_cancellable(&opening(), &config, &AtomicBool::new(false));
        assert!(!outcome.cancelled);
        // Setting the flag after max depth was reached changes nothing.
        let cancel = AtomicBool::new(true);
        let outcome = get_best_move_cancellable(&opening(), &config, &cancel);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.result.unwrap().depth, 1);
    }

    #[test]
    fn exhausted_tree_stops_deepening() {
        // Left or right merges the 32s, and whatever spawns in the hole
        // leaves the board locked. Depth 3 only finds lost positions, so
        // deepening stops there well before the deadline or max depth.
        let s = GameState::with_grid(Grid::from_values(&[[8u32, 16], [32, 32]]).unwrap());
        let config = AiConfig { time_limit_ms: 60_000.0, max_depth: 1_000, ..AiConfig::new() };
        let result = get_best_move(&s, &config).unwrap();
        assert_eq!(result.depth, 3);
        assert!(matches!(result.direction, Direction::Left | Direction::Right));
    }

    #[test]
    fn config_parses_partial_json() {
        let json = r#"{"time_limit_ms": 250, "weights": {"empty": 2.5}}"#;
        let config = AiConfig::from_json(json).unwrap();
        assert_eq!(config.time_limit_ms, 250.0);
        assert_eq!(config.weights.empty, 2.5);
        assert_eq!(config.weights.score, Weights::default().score);
        assert!(config.order_moves);
    }

    #[test]
    fn weights_set_by_name() {
        let mut w = Weights::default();
        w.set("neighborhood", 0.5).unwrap();
        w.set("loss_penalty", 10.0).unwrap();
        assert_eq!(w.neighborhood, 0.5);
        assert_eq!(w.loss_penalty, 10.0);

        let before = w.clone();
        let err = w.set("neighbourhood", 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownWeight(ref name) if name == "neighbourhood"));
        assert_eq!(w, before);
    }

    #[test]
    fn config_rejects_wrong_types() {
        let err = AiConfig::from_json(r#"{"max_depth": "deep"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(matches!(AiConfig::load("/nonexistent/ai.json"), Err(ConfigError::Io(_))));
    }
}
