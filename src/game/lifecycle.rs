use super::round::{RoundEvent, RoundPhase};
use super::{generate_answer_choices, GameController, RoundInner};
use crate::client::ApiResult;

impl GameController {
    /// Replace the current round with a fresh one at `level` and load its
    /// first puzzle. A failed fetch leaves the round in `Starting` with
    /// `fetch_error` set; use [`GameController::retry_puzzle`].
    pub async fn start_round(&self, level: u32) -> ApiResult<()> {
        let round_id = {
            let mut round = self.shared.round.write().await;
            if round.state.is_active() {
                tracing::info!("Discarding round {} for a new one", round.id);
            }
            // Dropping the old round also stops its ticker
            *round = RoundInner::starting(level);
            round.id.clone()
        };

        let level = level.max(1);
        tracing::info!("Round {} started at level {}", round_id, level);
        self.emit(RoundEvent::RoundStarted {
            round_id: round_id.clone(),
            level,
        });

        self.load_puzzle(&round_id).await
    }

    /// Start over from level 1
    pub async fn new_round(&self) -> ApiResult<()> {
        self.start_round(1).await
    }

    /// Re-attempt a failed puzzle fetch. No-op unless one has failed.
    pub async fn retry_puzzle(&self) -> ApiResult<()> {
        let round_id = {
            let mut round = self.shared.round.write().await;
            let loading = matches!(
                round.state.phase,
                RoundPhase::Starting | RoundPhase::AwaitingNextPuzzle
            );
            if !loading || round.fetch_error.is_none() {
                return Ok(());
            }
            round.fetch_error = None;
            round.id.clone()
        };

        tracing::info!("Retrying puzzle fetch for round {}", round_id);
        self.load_puzzle(&round_id).await
    }

    /// Fetch a puzzle and, if the round is still waiting for it, install it:
    /// new choices, cleared selection, timer reset for the current level.
    pub(super) async fn load_puzzle(&self, round_id: &str) -> ApiResult<()> {
        let result = self.shared.collaborators.puzzles.fetch_puzzle().await;

        let mut round = self.shared.round.write().await;
        let waiting = matches!(
            round.state.phase,
            RoundPhase::Starting | RoundPhase::AwaitingNextPuzzle
        );
        if round.id != round_id || !waiting {
            tracing::debug!("Dropping puzzle result for stale round {}", round_id);
            return Ok(());
        }

        match result {
            Ok(puzzle) => {
                let choices = generate_answer_choices(puzzle.correct_answer, &mut rand::rng());
                round.choices = choices.clone();
                round.puzzle = Some(puzzle);
                round.fetch_error = None;
                round.state.selected_answer = None;
                round.state.reset_timer();
                round.state.phase = RoundPhase::Active;
                if !round.overlay_open {
                    self.restart_ticker(&mut round);
                }

                self.emit(RoundEvent::PuzzleReady {
                    round_id: round_id.to_string(),
                    choices,
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Puzzle fetch failed for round {}: {}", round_id, e);
                let message = e.user_message();
                round.fetch_error = Some(message.clone());
                self.emit(RoundEvent::PuzzleFailed {
                    round_id: round_id.to_string(),
                    error: message,
                });
                Err(e)
            }
        }
    }
}
