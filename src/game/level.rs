//! Level progression. Every level transition goes through these two functions.

/// Countdown for one puzzle: 30s at level 1, two seconds less per level, never under 10s
pub fn timer_for_level(level: u32) -> u32 {
    let steps = level.max(1) - 1;
    30u32.saturating_sub(steps.saturating_mul(2)).max(10)
}

/// Correct answers needed to clear a level: 5 at level 1, two more per level
pub fn questions_for_level(level: u32) -> u32 {
    let steps = level.max(1) - 1;
    5u32.saturating_add(steps.saturating_mul(2))
}
