use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Number of answers offered per puzzle
pub const CHOICE_COUNT: usize = 4;

/// Build the answer set for a puzzle: the correct answer plus three distinct
/// non-negative distractors drawn from `correct ± max(5, correct)`, shuffled.
///
/// The draw window always holds at least `CHOICE_COUNT` non-negative values,
/// so the loop terminates with probability 1.
pub fn generate_answer_choices<R: Rng + ?Sized>(correct: u32, rng: &mut R) -> Vec<u32> {
    let correct_wide = i64::from(correct);
    let range = correct_wide.max(5);

    let mut seen = HashSet::with_capacity(CHOICE_COUNT);
    let mut choices = Vec::with_capacity(CHOICE_COUNT);
    seen.insert(correct);
    choices.push(correct);

    while choices.len() < CHOICE_COUNT {
        let candidate = correct_wide + rng.random_range(-range..=range);
        let Ok(candidate) = u32::try_from(candidate) else {
            continue;
        };
        if seen.insert(candidate) {
            choices.push(candidate);
        }
    }

    choices.shuffle(rng);
    choices
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_well_formed(correct: u32, choices: &[u32]) {
        assert_eq!(choices.len(), CHOICE_COUNT);
        assert_eq!(choices.iter().filter(|&&c| c == correct).count(), 1);

        let unique: HashSet<_> = choices.iter().collect();
        assert_eq!(unique.len(), CHOICE_COUNT, "duplicates in {:?}", choices);
    }

    #[test]
    fn test_structure_holds_for_small_answers() {
        let mut rng = StdRng::seed_from_u64(7);
        for correct in 0..=50 {
            for _ in 0..20 {
                let choices = generate_answer_choices(correct, &mut rng);
                assert_well_formed(correct, &choices);
            }
        }
    }

    #[test]
    fn test_zero_has_enough_candidates() {
        // Only 0..=5 are reachable from 0
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let choices = generate_answer_choices(0, &mut rng);
            assert_well_formed(0, &choices);
            assert!(choices.iter().all(|&c| c <= 5));
        }
    }

    #[test]
    fn test_distractors_stay_in_window() {
        let mut rng = StdRng::seed_from_u64(99);
        let correct = 40;
        for _ in 0..200 {
            let choices = generate_answer_choices(correct, &mut rng);
            assert!(choices.iter().all(|&c| c <= correct * 2));
        }
    }

    #[test]
    fn test_large_answers_do_not_overflow() {
        let mut rng = StdRng::seed_from_u64(3);
        let choices = generate_answer_choices(u32::MAX, &mut rng);
        assert_well_formed(u32::MAX, &choices);
    }

    #[test]
    fn test_correct_answer_position_varies() {
        let mut rng = StdRng::seed_from_u64(42);
        let positions: HashSet<usize> = (0..100)
            .map(|_| {
                let choices = generate_answer_choices(9, &mut rng);
                choices.iter().position(|&c| c == 9).unwrap()
            })
            .collect();
        assert!(positions.len() > 1);
    }

    #[test]
    fn test_thread_rng_works() {
        let choices = generate_answer_choices(12, &mut rand::rng());
        assert_well_formed(12, &choices);
    }
}
