//! Typed request builders over [`ApiClient`] and the collaborator traits the
//! round controller consumes.

mod auth;
mod game;
mod leaderboard;

pub use auth::AuthService;
pub use game::GameService;
pub use leaderboard::LeaderboardService;

use async_trait::async_trait;

use crate::client::ApiResult;
use crate::types::{GameSession, Puzzle, SessionSummary};

/// Source of new puzzles
#[async_trait]
pub trait PuzzleSource: Send + Sync {
    async fn fetch_puzzle(&self) -> ApiResult<Puzzle>;
}

/// Destination for summaries of terminated rounds
#[async_trait]
pub trait SessionRecorder: Send + Sync {
    async fn persist_session_summary(&self, summary: &SessionSummary) -> ApiResult<GameSession>;
}

/// Lookup of a user's previously stored best score
#[async_trait]
pub trait BestScoreLookup: Send + Sync {
    async fn fetch_user_best_score(&self, user_id: &str) -> ApiResult<u32>;
}
