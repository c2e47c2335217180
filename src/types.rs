use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type UserId = String;
pub type RoundId = String;

/// Game type every session and leaderboard query is filed under
pub const DEFAULT_GAME_TYPE: &str = "mixed";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// A single question instance. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Puzzle {
    pub correct_answer: u32,
    /// Decoded image bytes (PNG as served by the backend)
    pub image: Option<Vec<u8>>,
}

/// Session record as stored by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user: UserId,
    pub score: u32,
    pub level: u32,
    pub time_spent: u64,
    pub game_type: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /game/session`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionRequest {
    pub user: UserId,
    pub score: u32,
    pub level: u32,
    pub time_spent: u64,
    pub game_type: String,
    pub completed: bool,
}

/// Record of one terminated round. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub user_id: UserId,
    pub score: u32,
    pub level: u32,
    pub elapsed_seconds: u64,
    pub completed: bool,
    pub game_type: String,
    pub finished_at: DateTime<Utc>,
}

impl SessionSummary {
    pub fn to_request(&self) -> GameSessionRequest {
        GameSessionRequest {
            user: self.user_id.clone(),
            score: self.score,
            level: self.level,
            time_spent: self.elapsed_seconds,
            game_type: self.game_type.clone(),
            completed: self.completed,
        }
    }
}

/// Result of comparing a final score against the user's stored best
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardComparison {
    pub final_score: u32,
    pub previous_best: u32,
    pub is_new_high_score: bool,
}

impl LeaderboardComparison {
    pub fn new(final_score: u32, previous_best: u32) -> Self {
        Self {
            final_score,
            previous_best,
            is_new_high_score: final_score > previous_best,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub username: String,
    pub highest_score: u32,
    pub total_games: u32,
    pub average_score: f64,
    pub last_played: DateTime<Utc>,
    /// Filled in client-side from the response order
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub score: Option<u32>,
}

/// A user's standing on the leaderboard (`position` is absent for unranked users)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UserPosition {
    pub position: Option<u32>,
    #[serde(default)]
    pub score: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_games: u32,
    pub total_score: u64,
    pub average_score: u32,
    pub highest_score: u32,
    pub total_time_spent: u64,
    pub highest_level: u32,
}

impl GameStats {
    /// Fold a freshly persisted session into the cached totals
    pub fn record_session(&mut self, session: &GameSession) {
        self.total_games += 1;
        self.total_score += u64::from(session.score);
        self.average_score = (self.total_score as f64 / f64::from(self.total_games)).round() as u32;
        self.highest_score = self.highest_score.max(session.score);
        self.highest_level = self.highest_level.max(session.level);
        self.total_time_spent += session.time_spent;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionPage {
    pub sessions: Vec<GameSession>,
    pub pagination: Pagination,
}
