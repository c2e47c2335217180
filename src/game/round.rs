use serde::{Deserialize, Serialize};

use super::level::{questions_for_level, timer_for_level};
use crate::types::{LeaderboardComparison, RoundId, SessionSummary};

/// Points awarded per correct answer
pub const POINTS_PER_CORRECT: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundPhase {
    /// No round has been started yet
    Idle,
    /// First puzzle is loading (or failed to load)
    Starting,
    Active,
    /// Answer accepted, next puzzle loading (or failed to load)
    AwaitingNextPuzzle,
    /// Absorbing; only a new round leaves it
    Terminated,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    WrongAnswer,
    Timeout,
    Abandoned,
}

/// Score, level, streak and timer of one round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundState {
    pub score: u32,
    pub level: u32,
    pub streak: u32,
    pub questions_answered_in_level: u32,
    pub questions_required_for_level: u32,
    pub time_remaining_seconds: u32,
    pub selected_answer: Option<u32>,
    pub phase: RoundPhase,
}

impl RoundState {
    /// Fresh state for a round starting at `level`
    pub fn new(level: u32) -> Self {
        let level = level.max(1);
        Self {
            score: 0,
            level,
            streak: 0,
            questions_answered_in_level: 0,
            questions_required_for_level: questions_for_level(level),
            time_remaining_seconds: timer_for_level(level),
            selected_answer: None,
            phase: RoundPhase::Starting,
        }
    }

    pub(crate) fn idle() -> Self {
        Self {
            phase: RoundPhase::Idle,
            ..Self::new(1)
        }
    }

    /// Round in progress, including while the next puzzle loads
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            RoundPhase::Active | RoundPhase::AwaitingNextPuzzle
        )
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == RoundPhase::Terminated
    }

    /// Apply a correct answer. Returns true when it cleared the level.
    pub(crate) fn record_correct(&mut self) -> bool {
        self.score = self.score.saturating_add(POINTS_PER_CORRECT);
        self.streak += 1;
        self.questions_answered_in_level += 1;

        if self.questions_answered_in_level < self.questions_required_for_level {
            return false;
        }

        self.level += 1;
        self.questions_answered_in_level = 0;
        self.questions_required_for_level = questions_for_level(self.level);
        self.reset_timer();
        true
    }

    pub(crate) fn reset_timer(&mut self) {
        self.time_remaining_seconds = timer_for_level(self.level);
    }
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum RoundEvent {
    RoundStarted {
        round_id: RoundId,
        level: u32,
    },
    PuzzleReady {
        round_id: RoundId,
        choices: Vec<u32>,
    },
    PuzzleFailed {
        round_id: RoundId,
        error: String,
    },
    Tick {
        round_id: RoundId,
        remaining: u32,
    },
    AnswerCorrect {
        round_id: RoundId,
        score: u32,
        streak: u32,
    },
    StreakReset {
        round_id: RoundId,
    },
    LevelUp {
        round_id: RoundId,
        level: u32,
    },
    Terminated {
        round_id: RoundId,
        cause: TerminationCause,
        score: u32,
        level: u32,
    },
    HighScoreChecked {
        round_id: RoundId,
        comparison: LeaderboardComparison,
    },
}

/// Owned copy of everything the presentation layer renders
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoundSnapshot {
    pub round_id: RoundId,
    pub state: RoundState,
    pub choices: Vec<u32>,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    pub overlay_open: bool,
    pub fetch_error: Option<String>,
    pub termination: Option<TerminationCause>,
    pub summary: Option<SessionSummary>,
    pub comparison: Option<LeaderboardComparison>,
    pub comparison_error: Option<String>,
}

impl RoundSnapshot {
    /// A puzzle fetch is in flight
    pub fn is_loading(&self) -> bool {
        matches!(
            self.state.phase,
            RoundPhase::Starting | RoundPhase::AwaitingNextPuzzle
        ) && self.fetch_error.is_none()
    }

    pub fn is_new_high_score(&self) -> bool {
        self.comparison.is_some_and(|c| c.is_new_high_score)
    }
}
