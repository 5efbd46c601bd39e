// =============================================================================
// Background AI
//
// Runs move searches on a dedicated thread so a caller (a game loop, a UI)
// never blocks on the search budget. One request may be outstanding at a
// time. Each request carries its own copy of the state, so nothing is
// shared with the caller except the cancel flag, which the search reads
// only between deepening passes.
// =============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use thiserror::Error;

use crate::board::GameState;
use crate::engine::{get_best_move_cancellable, AiConfig, SearchOutcome, SearchResult};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("a search is already in flight")]
    Busy,
    #[error("no search has been requested")]
    Idle,
    #[error("the search thread has stopped")]
    Disconnected,
}

/// Answer to one request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reply {
    /// `None` when the state had no legal move.
    pub result: Option<SearchResult>,
    /// Whether deepening was cut short by [`AiWorker::cancel`].
    pub cancelled: bool,
}

impl From<SearchOutcome> for Reply {
    fn from(outcome: SearchOutcome) -> Self {
        Reply { result: outcome.result, cancelled: outcome.cancelled }
    }
}

pub struct AiWorker {
    requests: Option<Sender<GameState>>,
    replies: Receiver<Reply>,
    cancel: Arc<AtomicBool>,
    pending: bool,
    handle: Option<JoinHandle<()>>,
}

impl AiWorker {
    pub fn spawn(config: AiConfig) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<GameState>();
        let (reply_tx, reply_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let flag = cancel.clone();
        let handle = thread::spawn(move || {
            for state in request_rx {
                let outcome = get_best_move_cancellable(&state, &config, &flag);
                if reply_tx.send(Reply::from(outcome)).is_err() {
                    break;
                }
            }
            debug!("search thread exiting");
        });

        AiWorker {
            requests: Some(request_tx),
            replies: reply_rx,
            cancel,
            pending: false,
            handle: Some(handle),
        }
    }

    /// Queue a search of `state`. Fails with [`WorkerError::Busy`] while a
    /// previous reply has not been collected.
    pub fn request(&mut self, state: &GameState) -> Result<(), WorkerError> {
        if self.pending {
            return Err(WorkerError::Busy);
        }
        self.cancel.store(false, Ordering::Relaxed);
        let requests = self.requests.as_ref().ok_or(WorkerError::Disconnected)?;
        requests.send(*state).map_err(|_| WorkerError::Disconnected)?;
        self.pending = true;
        Ok(())
    }

    /// Ask the in-flight search to stop at the end of its current pass.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Block until the outstanding search answers.
    pub fn recv(&mut self) -> Result<Reply, WorkerError> {
        if !self.pending {
            return Err(WorkerError::Idle);
        }
        let reply = self.replies.recv().map_err(|_| WorkerError::Disconnected)?;
        self.pending = false;
        Ok(reply)
    }

    /// The outstanding reply if it is ready, `Ok(None)` if still searching.
    pub fn try_recv(&mut self) -> Result<Option<Reply>, WorkerError> {
        if !self.pending {
            return Err(WorkerError::Idle);
        }
        match self.replies.try_recv() {
            Ok(reply) => {
                self.pending = false;
                Ok(Some(reply))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }
}

impl Drop for AiWorker {
    fn drop(&mut self) {
        self.cancel();
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Grid;
    use crate::moves::Direction;

    fn opening() -> GameState {
        let grid = Grid::from_values(&[[2u32, 0, 0, 0], [0; 4], [0, 0, 2, 0], [0; 4]]).unwrap();
        GameState::with_grid(grid)
    }

    fn quick() -> AiConfig {
        AiConfig { time_limit_ms: 20.0, ..AiConfig::new() }
    }

    #[test]
    fn answers_a_request() {
        let mut worker = AiWorker::spawn(quick());
        worker.request(&opening()).unwrap();
        assert!(worker.is_pending());
        let reply = worker.recv().unwrap();
        assert!(reply.result.is_some());
        assert!(!reply.cancelled);
        assert!(!worker.is_pending());
    }

    #[test]
    fn one_request_at_a_time() {
        let mut worker = AiWorker::spawn(quick());
        assert_eq!(worker.recv(), Err(WorkerError::Idle));
        worker.request(&opening()).unwrap();
        assert_eq!(worker.request(&opening()), Err(WorkerError::Busy));
        worker.recv().unwrap();
        worker.request(&opening()).unwrap();
        worker.recv().unwrap();
    }

    #[test]
    fn try_recv_eventually_answers() {
        let mut worker = AiWorker::spawn(quick());
        worker.request(&opening()).unwrap();
        let reply = loop {
            if let Some(reply) = worker.try_recv().unwrap() {
                break reply;
            }
            thread::sleep(std::time::Duration::from_millis(1));
        };
        assert!(reply.result.is_some());
    }

    #[test]
    fn cancelled_search_still_returns_a_move() {
        let config = AiConfig { time_limit_ms: 60_000.0, ..AiConfig::new() };
        let mut worker = AiWorker::spawn(config);
        worker.request(&opening()).unwrap();
        worker.cancel();
        let reply = worker.recv().unwrap();
        assert!(reply.cancelled);
        assert!(reply.result.is_some());
    }

    #[test]
    fn cancel_that_never_stops_deepening_is_not_reported() {
        // With a single pass the flag is never consulted.
        let config = AiConfig { time_limit_ms: 60_000.0, max_depth: 1, ..AiConfig::new() };
        let mut worker = AiWorker::spawn(config);
        worker.request(&opening()).unwrap();
        worker.cancel();
        let reply = worker.recv().unwrap();
        assert!(!reply.cancelled);
        assert_eq!(reply.result.unwrap().depth, 1);
    }

    #[test]
    fn locked_board_gets_no_move() {
        let locked = Grid::from_values(&[[2u32, 4], [4, 2]]).unwrap();
        let mut worker = AiWorker::spawn(quick());
        worker.request(&GameState::with_grid(locked)).unwrap();
        assert_eq!(worker.recv().unwrap().result, None);
    }

    #[test]
    fn agrees_with_a_direct_fixed_depth_search() {
        let config = AiConfig { time_limit_ms: 60_000.0, max_depth: 2, ..AiConfig::new() };
        let direct = crate::engine::search_depth(&opening(), 2, &config).unwrap();
        let mut worker = AiWorker::spawn(config);
        worker.request(&opening()).unwrap();
        let reply = worker.recv().unwrap().result.unwrap();
        assert_eq!(reply.direction, direct.direction);
        assert!(Direction::ALL.contains(&reply.direction));
    }
}
