use async_trait::async_trait;
use serde::Deserialize;

use super::BestScoreLookup;
use crate::client::{ApiClient, ApiResult};
use crate::types::{LeaderboardEntry, UserPosition};

const LEADERBOARD: &str = "/leaderboard";
const LEADERBOARD_USER: &str = "/leaderboard/user";

/// Points per displayed leaderboard level
const POINTS_PER_LEVEL: u32 = 250;

#[derive(Debug, Deserialize)]
struct LeaderboardResponse {
    leaderboard: Vec<LeaderboardEntry>,
}

/// Leaderboard endpoints, scoped to one game type for best-score lookups
#[derive(Clone)]
pub struct LeaderboardService {
    client: ApiClient,
    game_type: String,
}

impl LeaderboardService {
    pub fn new(client: ApiClient, game_type: impl Into<String>) -> Self {
        Self {
            client,
            game_type: game_type.into(),
        }
    }

    /// Top entries, ranked in response order
    pub async fn leaderboard(
        &self,
        limit: u32,
        game_type: Option<&str>,
    ) -> ApiResult<Vec<LeaderboardEntry>> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(game_type) = game_type {
            query.push(("gameType", game_type.to_string()));
        }

        let response: LeaderboardResponse =
            self.client.get_with(LEADERBOARD, &[], &query).await?;
        Ok(rank_entries(response.leaderboard))
    }

    /// Where a user stands, and their best score
    pub async fn user_position(
        &self,
        user_id: &str,
        game_type: Option<&str>,
    ) -> ApiResult<UserPosition> {
        let query: Vec<(&str, String)> = game_type
            .map(|game_type| ("gameType", game_type.to_string()))
            .into_iter()
            .collect();
        self.client.get_with(LEADERBOARD_USER, &[user_id], &query).await
    }
}

/// Display level derived from a best score
pub fn level_for_score(score: u32) -> u32 {
    score / POINTS_PER_LEVEL + 1
}

fn rank_entries(entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| LeaderboardEntry {
            rank: Some(index as u32 + 1),
            level: Some(level_for_score(entry.highest_score)),
            score: Some(entry.highest_score),
            ..entry
        })
        .collect()
}

#[async_trait]
impl BestScoreLookup for LeaderboardService {
    async fn fetch_user_best_score(&self, user_id: &str) -> ApiResult<u32> {
        let position = self.user_position(user_id, Some(&self.game_type)).await?;
        Ok(position.score)
    }
}
