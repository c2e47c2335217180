//! In-memory collaborators for controller tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::{Collaborators, GameController, SubmitOutcome};
use crate::client::{ApiError, ApiResult};
use crate::config::GameConfig;
use crate::services::{BestScoreLookup, PuzzleSource, SessionRecorder};
use crate::types::{GameSession, Puzzle, SessionSummary};

pub(crate) struct FakeBackend {
    correct_answer: u32,
    fail_next_puzzle: AtomicBool,
    fail_persistence: AtomicBool,
    puzzle_fetches: AtomicUsize,
    persist_attempts: AtomicUsize,
    best_score_lookups: AtomicUsize,
    /// `None` makes the lookup fail
    best_score: Mutex<Option<u32>>,
    summaries: Mutex<Vec<SessionSummary>>,
    /// When set, the next call waits for the paired sender before answering
    puzzle_gate: Mutex<Option<oneshot::Receiver<()>>>,
    best_score_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeBackend {
    pub(crate) fn new(correct_answer: u32) -> Arc<Self> {
        Arc::new(Self {
            correct_answer,
            fail_next_puzzle: AtomicBool::new(false),
            fail_persistence: AtomicBool::new(false),
            puzzle_fetches: AtomicUsize::new(0),
            persist_attempts: AtomicUsize::new(0),
            best_score_lookups: AtomicUsize::new(0),
            best_score: Mutex::new(Some(0)),
            summaries: Mutex::new(Vec::new()),
            puzzle_gate: Mutex::new(None),
            best_score_gate: Mutex::new(None),
        })
    }

    pub(crate) fn fail_next_puzzle(&self) {
        self.fail_next_puzzle.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_persistence(&self) {
        self.fail_persistence.store(true, Ordering::SeqCst);
    }

    /// Hold the next puzzle fetch until the returned sender fires (or drops)
    pub(crate) fn hold_next_puzzle(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.puzzle_gate.lock().unwrap() = Some(gate);
        release
    }

    pub(crate) fn hold_next_best_score(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.best_score_gate.lock().unwrap() = Some(gate);
        release
    }

    pub(crate) fn set_best_score(&self, best: Option<u32>) {
        *self.best_score.lock().unwrap() = best;
    }

    pub(crate) fn summaries(&self) -> Vec<SessionSummary> {
        self.summaries.lock().unwrap().clone()
    }

    pub(crate) fn puzzle_fetches(&self) -> usize {
        self.puzzle_fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn persist_attempts(&self) -> usize {
        self.persist_attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn best_score_lookups(&self) -> usize {
        self.best_score_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PuzzleSource for FakeBackend {
    async fn fetch_puzzle(&self) -> ApiResult<Puzzle> {
        self.puzzle_fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.puzzle_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_next_puzzle.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Network("puzzle unavailable".to_string()));
        }
        Ok(Puzzle {
            correct_answer: self.correct_answer,
            image: Some(vec![0x89, b'P', b'N', b'G']),
        })
    }
}

#[async_trait]
impl SessionRecorder for FakeBackend {
    async fn persist_session_summary(&self, summary: &SessionSummary) -> ApiResult<GameSession> {
        self.persist_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_persistence.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected {
                status: 500,
                message: "database down".to_string(),
                details: Vec::new(),
            });
        }
        self.summaries.lock().unwrap().push(summary.clone());

        let request = summary.to_request();
        Ok(GameSession {
            id: Some(ulid::Ulid::new().to_string()),
            user: request.user,
            score: request.score,
            level: request.level,
            time_spent: request.time_spent,
            game_type: request.game_type,
            completed: request.completed,
            created_at: Some(summary.finished_at),
            updated_at: None,
        })
    }
}

#[async_trait]
impl BestScoreLookup for FakeBackend {
    async fn fetch_user_best_score(&self, _user_id: &str) -> ApiResult<u32> {
        self.best_score_lookups.fetch_add(1, Ordering::SeqCst);
        let gate = self.best_score_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let best = *self.best_score.lock().unwrap();
        best.ok_or_else(|| ApiError::Network("leaderboard unavailable".to_string()))
    }
}

/// Controller for user "u1" backed entirely by `backend`
pub(crate) fn controller(backend: &Arc<FakeBackend>, config: GameConfig) -> GameController {
    let collaborators = Collaborators {
        puzzles: backend.clone(),
        sessions: backend.clone(),
        scores: backend.clone(),
    };
    GameController::new(collaborators, config, Some("u1".to_string()))
}

/// Select the current puzzle's answer and submit it
pub(crate) async fn answer_correctly(game: &GameController) -> SubmitOutcome {
    let correct = game
        .shared
        .round
        .read()
        .await
        .puzzle
        .as_ref()
        .map(|p| p.correct_answer)
        .expect("puzzle should be loaded");
    game.select_answer(correct).await;
    game.submit_answer().await
}
