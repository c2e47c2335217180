use super::round::{RoundEvent, RoundPhase, TerminationCause};
use super::termination::Finalization;
use super::GameController;
use crate::config::IncorrectAnswerPolicy;
use crate::types::RoundId;

/// What happened to a submitted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing selected, round not active, or an overlay is open
    Ignored,
    Correct { leveled_up: bool },
    /// `terminated` is false only under the reset-streak policy
    Incorrect { terminated: bool },
}

enum AfterSubmit {
    NextPuzzle(RoundId),
    /// Round already ended under the lock; only persistence is left
    Finalize(Option<Finalization>),
}

impl GameController {
    /// Record the player's pick. Ignored unless the round is active and no
    /// overlay is open. Returns whether the selection was recorded.
    pub async fn select_answer(&self, value: u32) -> bool {
        let mut round = self.shared.round.write().await;
        if round.state.phase != RoundPhase::Active || round.overlay_open {
            return false;
        }
        round.state.selected_answer = Some(value);
        true
    }

    /// Check the selected answer against the puzzle.
    ///
    /// A correct answer scores, may level up, and loads the next puzzle before
    /// returning. A wrong one ends the round or resets the streak depending on
    /// [`IncorrectAnswerPolicy`].
    pub async fn submit_answer(&self) -> SubmitOutcome {
        let (outcome, next) = {
            let mut round = self.shared.round.write().await;
            if round.state.phase != RoundPhase::Active || round.overlay_open {
                return SubmitOutcome::Ignored;
            }
            let Some(selected) = round.state.selected_answer else {
                return SubmitOutcome::Ignored;
            };
            let Some(correct) = round.puzzle.as_ref().map(|p| p.correct_answer) else {
                return SubmitOutcome::Ignored;
            };
            let round_id = round.id.clone();

            if selected == correct {
                let leveled_up = round.state.record_correct();
                round.state.phase = RoundPhase::AwaitingNextPuzzle;
                // No ticking while the next puzzle is in flight
                round.ticker = None;

                tracing::debug!(
                    "Correct answer in round {}: score={} streak={}",
                    round_id,
                    round.state.score,
                    round.state.streak
                );
                self.emit(RoundEvent::AnswerCorrect {
                    round_id: round_id.clone(),
                    score: round.state.score,
                    streak: round.state.streak,
                });
                if leveled_up {
                    tracing::info!("Round {} reached level {}", round_id, round.state.level);
                    self.emit(RoundEvent::LevelUp {
                        round_id: round_id.clone(),
                        level: round.state.level,
                    });
                }

                (
                    SubmitOutcome::Correct { leveled_up },
                    AfterSubmit::NextPuzzle(round_id),
                )
            } else {
                match self.shared.config.on_incorrect {
                    IncorrectAnswerPolicy::Terminate => {
                        // Same lock as the check, so a tick cannot end it as a timeout first
                        let finalization =
                            self.begin_termination(&mut round, TerminationCause::WrongAnswer);
                        (
                            SubmitOutcome::Incorrect { terminated: true },
                            AfterSubmit::Finalize(finalization),
                        )
                    }
                    IncorrectAnswerPolicy::ResetStreak => {
                        round.state.streak = 0;
                        round.state.phase = RoundPhase::AwaitingNextPuzzle;
                        round.ticker = None;
                        tracing::debug!("Wrong answer in round {}, streak reset", round_id);
                        self.emit(RoundEvent::StreakReset {
                            round_id: round_id.clone(),
                        });
                        (
                            SubmitOutcome::Incorrect { terminated: false },
                            AfterSubmit::NextPuzzle(round_id),
                        )
                    }
                }
            }
        };

        match next {
            AfterSubmit::Finalize(finalization) => {
                if let Some(finalization) = finalization {
                    self.finalize(finalization).await;
                }
            }
            AfterSubmit::NextPuzzle(round_id) => {
                let delay = self.shared.config.next_puzzle_delay;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                // Failures surface through the snapshot's fetch_error
                let _ = self.load_puzzle(&round_id).await;
            }
        }

        outcome
    }
}
