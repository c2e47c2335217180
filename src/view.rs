//! Plain-text rendering of round snapshots for the terminal client

use std::fmt::Write as _;

use crate::game::{RoundPhase, RoundSnapshot, RoundState, TerminationCause};
use crate::types::LeaderboardEntry;

/// Timer values at or below this are flagged
pub const HURRY_THRESHOLD_SECONDS: u32 = 10;

pub fn stats_bar(state: &RoundState) -> String {
    let hurry = if state.time_remaining_seconds <= HURRY_THRESHOLD_SECONDS {
        " !"
    } else {
        ""
    };
    format!(
        "Level {} ({}/{}) | Score {} | Streak {} | Time {}s{}",
        state.level,
        state.questions_answered_in_level,
        state.questions_required_for_level,
        state.score,
        state.streak,
        state.time_remaining_seconds,
        hurry
    )
}

pub fn puzzle_panel(snapshot: &RoundSnapshot) -> String {
    if let Some(error) = &snapshot.fetch_error {
        return format!("Could not load puzzle: {}\nPress r to retry.", error);
    }
    if snapshot.is_loading() {
        return "Loading puzzle...".to_string();
    }
    match &snapshot.image {
        Some(image) => format!("[puzzle image, {} bytes]", image.len()),
        None => "[puzzle image unavailable]".to_string(),
    }
}

/// Numbered choices; the selected one is marked with `>`
pub fn choices(snapshot: &RoundSnapshot) -> String {
    snapshot
        .choices
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let marker = if snapshot.state.selected_answer == Some(value) {
                '>'
            } else {
                ' '
            };
            format!("{} {}) {}", marker, index + 1, value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn pause_overlay() -> String {
    "== Paused ==\n  c) Continue\n  n) New game\n  q) Quit".to_string()
}

pub fn game_over(snapshot: &RoundSnapshot) -> String {
    let mut out = String::from("== Game Over ==\n");
    let reason = match snapshot.termination {
        Some(TerminationCause::WrongAnswer) => "Wrong answer",
        Some(TerminationCause::Timeout) => "Time's up",
        Some(TerminationCause::Abandoned) => "Round abandoned",
        None => "Round over",
    };
    let _ = writeln!(out, "{}", reason);
    let _ = writeln!(out, "Final score: {}", snapshot.state.score);
    let _ = write!(out, "Level reached: {}", snapshot.state.level);

    if snapshot.is_new_high_score() {
        out.push_str("\nNew High Score!");
    } else if let Some(comparison) = snapshot.comparison {
        let _ = write!(out, "\nBest: {}", comparison.previous_best);
    } else if snapshot.comparison_error.is_some() {
        out.push_str("\nCould not check high score (press r to retry)");
    }
    out.push_str("\nPress n for a new game.");
    out
}

/// Full screen for the current round
pub fn round_screen(snapshot: &RoundSnapshot) -> String {
    match snapshot.state.phase {
        RoundPhase::Idle => "Press n to start a game.".to_string(),
        RoundPhase::Terminated => game_over(snapshot),
        _ if snapshot.overlay_open => {
            format!("{}\n\n{}", stats_bar(&snapshot.state), pause_overlay())
        }
        RoundPhase::Active => format!(
            "{}\n{}\n{}",
            stats_bar(&snapshot.state),
            puzzle_panel(snapshot),
            choices(snapshot)
        ),
        RoundPhase::Starting | RoundPhase::AwaitingNextPuzzle => {
            format!("{}\n{}", stats_bar(&snapshot.state), puzzle_panel(snapshot))
        }
    }
}

pub fn leaderboard_table(entries: &[LeaderboardEntry], current_user: Option<&str>) -> String {
    if entries.is_empty() {
        return "No scores yet.".to_string();
    }

    let mut out = format!("{:>4}  {:<20} {:>6} {:>5}", "Rank", "Player", "Score", "Level");
    for (index, entry) in entries.iter().enumerate() {
        let rank = entry.rank.unwrap_or(index as u32 + 1);
        let you = if current_user == Some(entry.user_id.as_str()) {
            " (you)"
        } else {
            ""
        };
        let _ = write!(
            out,
            "\n{:>4}  {:<20} {:>6} {:>5}{}",
            rank,
            entry.username,
            entry.score.unwrap_or(entry.highest_score),
            entry.level.unwrap_or(1),
            you
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LeaderboardComparison;
    use chrono::Utc;

    fn snapshot(phase: RoundPhase) -> RoundSnapshot {
        let mut state = RoundState::new(1);
        state.phase = phase;
        RoundSnapshot {
            round_id: "r1".to_string(),
            state,
            choices: vec![3, 7, 1, 9],
            image: Some(vec![0; 12]),
            overlay_open: false,
            fetch_error: None,
            termination: None,
            summary: None,
            comparison: None,
            comparison_error: None,
        }
    }

    #[test]
    fn test_stats_bar_hurry_marker() {
        let mut state = RoundState::new(1);
        assert!(!stats_bar(&state).ends_with('!'));

        state.time_remaining_seconds = 10;
        assert!(stats_bar(&state).ends_with("10s !"));
    }

    #[test]
    fn test_choices_mark_selection() {
        let mut snap = snapshot(RoundPhase::Active);
        snap.state.selected_answer = Some(7);

        let rendered = choices(&snap);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "> 2) 7");
        assert_eq!(lines[0], "  1) 3");
    }

    #[test]
    fn test_puzzle_panel_states() {
        let mut snap = snapshot(RoundPhase::Starting);
        assert_eq!(puzzle_panel(&snap), "Loading puzzle...");

        snap.fetch_error = Some("Network error".to_string());
        assert!(puzzle_panel(&snap).contains("Press r to retry"));

        let snap = snapshot(RoundPhase::Active);
        assert_eq!(puzzle_panel(&snap), "[puzzle image, 12 bytes]");
    }

    #[test]
    fn test_game_over_high_score() {
        let mut snap = snapshot(RoundPhase::Terminated);
        snap.state.score = 40;
        snap.termination = Some(TerminationCause::Timeout);
        snap.comparison = Some(LeaderboardComparison::new(40, 30));

        let rendered = game_over(&snap);
        assert!(rendered.contains("Time's up"));
        assert!(rendered.contains("Final score: 40"));
        assert!(rendered.contains("New High Score!"));

        snap.comparison = Some(LeaderboardComparison::new(40, 90));
        let rendered = game_over(&snap);
        assert!(!rendered.contains("New High Score!"));
        assert!(rendered.contains("Best: 90"));
    }

    #[test]
    fn test_overlay_hides_choices() {
        let mut snap = snapshot(RoundPhase::Active);
        snap.overlay_open = true;

        let rendered = round_screen(&snap);
        assert!(rendered.contains("Paused"));
        assert!(!rendered.contains("1) 3"));
    }

    #[test]
    fn test_leaderboard_table_marks_current_user() {
        let entry = LeaderboardEntry {
            user_id: "u1".to_string(),
            username: "alice".to_string(),
            highest_score: 300,
            total_games: 4,
            average_score: 120.0,
            last_played: Utc::now(),
            rank: Some(1),
            level: Some(2),
            score: Some(300),
        };

        let rendered = leaderboard_table(&[entry], Some("u1"));
        let row = rendered.lines().nth(1).unwrap();
        assert!(row.contains("alice"));
        assert!(row.contains("300"));
        assert!(row.ends_with("(you)"));

        assert_eq!(leaderboard_table(&[], None), "No scores yet.");
    }
}
