//! Game round lifecycle.
//!
//! [`GameController`] is the only writer of round state. Presentation code
//! dispatches intents (select, submit, pause, abandon) and renders from
//! [`GameController::snapshot`]. Puzzle fetches and session persistence run
//! without holding the round lock; their completions are matched against the
//! round ID so results for a replaced round are dropped.

mod answer;
mod choices;
mod level;
mod lifecycle;
mod round;
mod termination;
mod timer;

#[cfg(test)]
pub(crate) mod fakes;

pub use choices::{generate_answer_choices, CHOICE_COUNT};
pub use level::{questions_for_level, timer_for_level};
pub use round::{
    RoundEvent, RoundPhase, RoundSnapshot, RoundState, TerminationCause, POINTS_PER_CORRECT,
};
pub use answer::SubmitOutcome;

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

use crate::config::GameConfig;
use crate::services::{
    BestScoreLookup, GameService, LeaderboardService, PuzzleSource, SessionRecorder,
};
use crate::types::{LeaderboardComparison, Puzzle, RoundId, SessionSummary, UserId};
use timer::Ticker;

/// External services the controller talks to
#[derive(Clone)]
pub struct Collaborators {
    pub puzzles: Arc<dyn PuzzleSource>,
    pub sessions: Arc<dyn SessionRecorder>,
    pub scores: Arc<dyn BestScoreLookup>,
}

impl Collaborators {
    pub fn from_services(game: GameService, leaderboard: LeaderboardService) -> Self {
        let game = Arc::new(game);
        Self {
            puzzles: game.clone(),
            sessions: game,
            scores: Arc::new(leaderboard),
        }
    }
}

/// Everything owned by the current round
struct RoundInner {
    id: RoundId,
    state: RoundState,
    puzzle: Option<Puzzle>,
    choices: Vec<u32>,
    overlay_open: bool,
    fetch_error: Option<String>,
    started_at: Instant,
    termination: Option<TerminationCause>,
    summary: Option<SessionSummary>,
    comparison: Option<LeaderboardComparison>,
    comparison_error: Option<String>,
    /// Dropping the handle stops the countdown
    ticker: Option<Ticker>,
    ticker_generation: u64,
}

impl RoundInner {
    fn idle() -> Self {
        Self::with_state(RoundState::idle())
    }

    fn starting(level: u32) -> Self {
        Self::with_state(RoundState::new(level))
    }

    fn with_state(state: RoundState) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            state,
            puzzle: None,
            choices: Vec::new(),
            overlay_open: false,
            fetch_error: None,
            started_at: Instant::now(),
            termination: None,
            summary: None,
            comparison: None,
            comparison_error: None,
            ticker: None,
            ticker_generation: 0,
        }
    }

    fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            round_id: self.id.clone(),
            state: self.state.clone(),
            choices: self.choices.clone(),
            image: self.puzzle.as_ref().and_then(|p| p.image.clone()),
            overlay_open: self.overlay_open,
            fetch_error: self.fetch_error.clone(),
            termination: self.termination,
            summary: self.summary.clone(),
            comparison: self.comparison,
            comparison_error: self.comparison_error.clone(),
        }
    }
}

struct Shared {
    round: RwLock<RoundInner>,
    collaborators: Collaborators,
    user_id: Option<UserId>,
    config: GameConfig,
    events: broadcast::Sender<RoundEvent>,
}

/// Cheap-to-clone handle to the round controller
#[derive(Clone)]
pub struct GameController {
    shared: Arc<Shared>,
}

impl GameController {
    /// `user_id` is needed to record sessions and compare high scores;
    /// without it rounds are still playable but nothing is persisted.
    pub fn new(collaborators: Collaborators, config: GameConfig, user_id: Option<UserId>) -> Self {
        let (events, _rx) = broadcast::channel(64);
        Self {
            shared: Arc::new(Shared {
                round: RwLock::new(RoundInner::idle()),
                collaborators,
                user_id,
                config,
                events,
            }),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.shared.config
    }

    /// Owned view of the current round
    pub async fn snapshot(&self) -> RoundSnapshot {
        self.shared.round.read().await.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.shared.events.subscribe()
    }

    fn emit(&self, event: RoundEvent) {
        // No subscribers is fine
        let _ = self.shared.events.send(event);
    }
}
