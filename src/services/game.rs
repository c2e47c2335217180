use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use super::{PuzzleSource, SessionRecorder};
use crate::client::{ApiClient, ApiError, ApiResult};
use crate::types::{
    GameSession, GameSessionRequest, GameStats, Puzzle, SessionPage, SessionSummary,
};

const PUZZLE: &str = "/game/puzzle?base64=true";
const SESSION: &str = "/game/session";
const SESSIONS: &str = "/game/sessions";
const STATS: &str = "/game/stats";

/// Puzzle as served: base64 PNG plus the hidden number
#[derive(Debug, Deserialize)]
struct PuzzleResponse {
    #[serde(default)]
    image: Option<String>,
    solution: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    game_session: GameSession,
}

/// Puzzle, session and statistics endpoints
#[derive(Clone)]
pub struct GameService {
    client: ApiClient,
}

impl GameService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn fetch_puzzle(&self) -> ApiResult<Puzzle> {
        let response: PuzzleResponse = self.client.get(PUZZLE).await?;
        decode_puzzle(response)
    }

    /// Persist a finished session
    pub async fn create_session(&self, session: &GameSessionRequest) -> ApiResult<GameSession> {
        let response: CreateSessionResponse = self.client.post(SESSION, session).await?;
        Ok(response.game_session)
    }

    /// Page through the current user's past sessions (pages start at 1)
    pub async fn sessions(&self, page: u32, limit: u32) -> ApiResult<SessionPage> {
        let query = [("page", page.max(1).to_string()), ("limit", limit.to_string())];
        self.client.get_with(SESSIONS, &[], &query).await
    }

    pub async fn stats(&self) -> ApiResult<GameStats> {
        self.client.get(STATS).await
    }
}

fn decode_puzzle(response: PuzzleResponse) -> ApiResult<Puzzle> {
    let correct_answer = u32::try_from(response.solution).map_err(|_| {
        ApiError::InvalidPayload(format!(
            "Puzzle solution must be a non-negative integer, got {}",
            response.solution
        ))
    })?;

    let image = match response.image.as_deref().map(str::trim) {
        Some(encoded) if !encoded.is_empty() => {
            // Tolerate data URLs as well as bare base64
            let encoded = encoded
                .split_once("base64,")
                .map(|(_, data)| data)
                .unwrap_or(encoded);
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| ApiError::InvalidPayload(format!("Puzzle image: {}", e)))?;
            Some(bytes)
        }
        _ => None,
    };

    Ok(Puzzle {
        correct_answer,
        image,
    })
}

#[async_trait]
impl PuzzleSource for GameService {
    async fn fetch_puzzle(&self) -> ApiResult<Puzzle> {
        GameService::fetch_puzzle(self).await
    }
}

#[async_trait]
impl SessionRecorder for GameService {
    async fn persist_session_summary(&self, summary: &SessionSummary) -> ApiResult<GameSession> {
        self.create_session(&summary.to_request()).await
    }
}
