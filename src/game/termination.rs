use chrono::Utc;

use super::round::{RoundEvent, RoundPhase, TerminationCause};
use super::{GameController, RoundInner};
use crate::types::{LeaderboardComparison, RoundId, SessionSummary, UserId};

/// Work left after the round lock is released
pub(super) struct Finalization {
    round_id: RoundId,
    summary: Option<SessionSummary>,
}

impl GameController {
    /// End the round. Idempotent: only the first call for a round records a
    /// session summary and checks for a new high score. Returns whether this
    /// call ended the round.
    pub async fn terminate_round(&self, cause: TerminationCause) -> bool {
        let finalization = {
            let mut round = self.shared.round.write().await;
            self.begin_termination(&mut round, cause)
        };

        match finalization {
            Some(finalization) => {
                self.finalize(finalization).await;
                true
            }
            None => false,
        }
    }

    /// Leave the round early (navigation away, logout). The summary is
    /// recorded as not completed.
    pub async fn abandon_round(&self) -> bool {
        self.terminate_round(TerminationCause::Abandoned).await
    }

    /// State transition half of termination; runs under the round lock
    pub(super) fn begin_termination(
        &self,
        round: &mut RoundInner,
        cause: TerminationCause,
    ) -> Option<Finalization> {
        debug_assert!(
            round.state.phase != RoundPhase::Idle,
            "terminate_round called before any round was started"
        );
        match round.state.phase {
            RoundPhase::Terminated => {
                tracing::debug!("Round {} already terminated", round.id);
                return None;
            }
            RoundPhase::Idle => {
                tracing::error!("terminate_round called before any round was started");
                return None;
            }
            _ => {}
        }

        round.state.phase = RoundPhase::Terminated;
        round.ticker = None;
        round.termination = Some(cause);

        let summary = self.shared.user_id.as_ref().map(|user_id| SessionSummary {
            user_id: user_id.clone(),
            score: round.state.score,
            level: round.state.level,
            elapsed_seconds: round.started_at.elapsed().as_secs(),
            completed: cause != TerminationCause::Abandoned,
            game_type: self.shared.config.game_type.clone(),
            finished_at: Utc::now(),
        });
        round.summary = summary.clone();

        tracing::info!(
            "Round {} over ({:?}): score={} level={}",
            round.id,
            cause,
            round.state.score,
            round.state.level
        );
        self.emit(RoundEvent::Terminated {
            round_id: round.id.clone(),
            cause,
            score: round.state.score,
            level: round.state.level,
        });

        Some(Finalization {
            round_id: round.id.clone(),
            summary,
        })
    }

    /// Persist the summary (best-effort) and compare against the stored best
    pub(super) async fn finalize(&self, finalization: Finalization) {
        let Some(summary) = finalization.summary else {
            tracing::warn!(
                "No signed-in user, session for round {} not recorded",
                finalization.round_id
            );
            return;
        };

        match self
            .shared
            .collaborators
            .sessions
            .persist_session_summary(&summary)
            .await
        {
            Ok(_) => tracing::info!("Recorded session for round {}", finalization.round_id),
            Err(e) => tracing::warn!(
                "Failed to record session for round {}: {}",
                finalization.round_id,
                e
            ),
        }

        self.compare_high_score(&finalization.round_id, &summary.user_id, summary.score)
            .await;
    }

    /// Re-run a failed high-score comparison for the terminated round
    pub async fn retry_high_score_check(&self) -> Option<LeaderboardComparison> {
        let (round_id, user_id, score) = {
            let round = self.shared.round.read().await;
            if round.state.phase != RoundPhase::Terminated || round.comparison_error.is_none() {
                return round.comparison;
            }
            let user_id = round.summary.as_ref()?.user_id.clone();
            (round.id.clone(), user_id, round.state.score)
        };

        self.compare_high_score(&round_id, &user_id, score).await
    }

    async fn compare_high_score(
        &self,
        round_id: &str,
        user_id: &UserId,
        score: u32,
    ) -> Option<LeaderboardComparison> {
        let result = self
            .shared
            .collaborators
            .scores
            .fetch_user_best_score(user_id)
            .await;

        let mut round = self.shared.round.write().await;
        if round.id != round_id {
            tracing::debug!("Dropping high score result for stale round {}", round_id);
            return None;
        }

        match result {
            Ok(previous_best) => {
                let comparison = LeaderboardComparison::new(score, previous_best);
                if comparison.is_new_high_score {
                    tracing::info!("New high score {} (previous {})", score, previous_best);
                }
                round.comparison = Some(comparison);
                round.comparison_error = None;
                self.emit(RoundEvent::HighScoreChecked {
                    round_id: round_id.to_string(),
                    comparison,
                });
                Some(comparison)
            }
            Err(e) => {
                tracing::warn!("High score check failed for round {}: {}", round_id, e);
                round.comparison_error = Some(e.user_message());
                None
            }
        }
    }
}
