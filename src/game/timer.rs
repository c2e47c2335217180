use std::sync::Weak;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::round::{RoundEvent, RoundPhase, TerminationCause};
use super::{GameController, RoundInner, Shared};

/// Owned handle to the one-second countdown task. Dropping it stops the task.
pub(super) struct Ticker {
    _cancel: oneshot::Sender<()>,
}

impl Ticker {
    fn spawn(shared: Weak<Shared>, generation: u64, period: Duration) -> Self {
        let (cancel, mut cancelled) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    // Resolves when the handle is dropped
                    _ = &mut cancelled => break,
                    _ = interval.tick() => {}
                }

                let Some(shared) = shared.upgrade() else {
                    break;
                };
                GameController { shared }.tick_from(Some(generation)).await;
            }
        });

        Self { _cancel: cancel }
    }
}

impl GameController {
    /// Advance the countdown by one second. Ignored unless the round is
    /// active with no overlay open; reaching zero ends the round.
    pub async fn tick(&self) {
        self.tick_from(None).await;
    }

    /// `generation` identifies the ticker task that fired; ticks from a
    /// ticker that has since been replaced or stopped are dropped.
    async fn tick_from(&self, generation: Option<u64>) {
        let finalization = {
            let mut round = self.shared.round.write().await;
            if let Some(generation) = generation {
                if round.ticker.is_none() || round.ticker_generation != generation {
                    return;
                }
            }
            if round.state.phase != RoundPhase::Active || round.overlay_open {
                return;
            }

            round.state.time_remaining_seconds = round.state.time_remaining_seconds.saturating_sub(1);
            let remaining = round.state.time_remaining_seconds;
            self.emit(RoundEvent::Tick {
                round_id: round.id.clone(),
                remaining,
            });

            if remaining > 0 {
                return;
            }
            tracing::info!("Time is up for round {}", round.id);
            self.begin_termination(&mut round, TerminationCause::Timeout)
        };

        if let Some(finalization) = finalization {
            self.finalize(finalization).await;
        }
    }

    /// Freeze the round behind a blocking dialog
    pub async fn pause_for_overlay(&self) {
        let mut round = self.shared.round.write().await;
        if round.overlay_open {
            return;
        }
        round.overlay_open = true;
        round.ticker = None;
        tracing::debug!("Round {} paused", round.id);
    }

    pub async fn resume_from_overlay(&self) {
        let mut round = self.shared.round.write().await;
        if !round.overlay_open {
            return;
        }
        round.overlay_open = false;
        if round.state.phase == RoundPhase::Active {
            self.restart_ticker(&mut round);
        }
        tracing::debug!("Round {} resumed", round.id);
    }

    /// Replace any running ticker with a fresh one, if ticking is automatic
    pub(super) fn restart_ticker(&self, round: &mut RoundInner) {
        round.ticker = None;
        if let Some(period) = self.shared.config.tick_interval {
            round.ticker_generation += 1;
            round.ticker = Some(Ticker::spawn(
                std::sync::Arc::downgrade(&self.shared),
                round.ticker_generation,
                period,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::GameConfig;
    use crate::game::fakes::{answer_correctly, controller, FakeBackend};
    use crate::game::{RoundEvent, RoundPhase, TerminationCause};

    #[tokio::test]
    async fn test_tick_counts_down() {
        let backend = FakeBackend::new(7);
        let game = controller(&backend, GameConfig::manual());
        game.start_round(1).await.unwrap();

        game.tick().await;
        game.tick().await;

        assert_eq!(game.snapshot().await.state.time_remaining_seconds, 28);
    }

    #[tokio::test]
    async fn test_timeout_terminates_round() {
        let backend = FakeBackend::new(7);
        let game = controller(&backend, GameConfig::manual());
        game.start_round(1).await.unwrap();
        answer_correctly(&game).await;

        for _ in 0..30 {
            game.tick().await;
        }

        let snap = game.snapshot().await;
        assert_eq!(snap.state.time_remaining_seconds, 0);
        assert!(!snap.state.is_active());
        assert!(snap.state.is_terminated());
        assert_eq!(snap.termination, Some(TerminationCause::Timeout));
        assert_eq!(backend.summaries().len(), 1);
        assert_eq!(backend.summaries()[0].score, 10);

        // Further ticks change nothing
        game.tick().await;
        assert_eq!(game.snapshot().await.state, snap.state);
        assert_eq!(backend.summaries().len(), 1);
    }

    #[tokio::test]
    async fn test_pause_freezes_timer() {
        let backend = FakeBackend::new(7);
        let game = controller(&backend, GameConfig::manual());
        game.start_round(1).await.unwrap();
        game.tick().await;

        game.pause_for_overlay().await;
        for _ in 0..40 {
            game.tick().await;
        }
        let snap = game.snapshot().await;
        assert_eq!(snap.state.time_remaining_seconds, 29);
        assert!(snap.overlay_open);
        assert_eq!(snap.state.phase, RoundPhase::Active);

        game.resume_from_overlay().await;
        game.tick().await;
        assert_eq!(game.snapshot().await.state.time_remaining_seconds, 28);
    }

    #[tokio::test(start_paused = true)]
    async fn test_automatic_ticker_runs_out_the_clock() {
        let backend = FakeBackend::new(7);
        let config = GameConfig {
            tick_interval: Some(Duration::from_secs(1)),
            ..GameConfig::manual()
        };
        let game = controller(&backend, config);
        game.start_round(1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(game.snapshot().await.state.time_remaining_seconds, 20);

        tokio::time::sleep(Duration::from_secs(21)).await;
        let snap = game.snapshot().await;
        assert!(snap.state.is_terminated());
        assert_eq!(snap.termination, Some(TerminationCause::Timeout));
        assert_eq!(backend.summaries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_automatic_ticker_stops_while_paused() {
        let backend = FakeBackend::new(7);
        let config = GameConfig {
            tick_interval: Some(Duration::from_secs(1)),
            ..GameConfig::manual()
        };
        let game = controller(&backend, config);
        game.start_round(1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        game.pause_for_overlay().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        let snap = game.snapshot().await;
        assert_eq!(snap.state.time_remaining_seconds, 25);
        assert!(!snap.state.is_terminated());

        game.resume_from_overlay().await;
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(game.snapshot().await.state.time_remaining_seconds, 23);
    }

    #[tokio::test]
    async fn test_tick_events_are_broadcast() {
        let backend = FakeBackend::new(7);
        let game = controller(&backend, GameConfig::manual());
        game.start_round(1).await.unwrap();
        let mut events = game.subscribe();

        game.tick().await;

        assert!(matches!(
            events.recv().await.unwrap(),
            RoundEvent::Tick { remaining: 29, .. }
        ));
    }
}
