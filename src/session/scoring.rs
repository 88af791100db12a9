// src/session/scoring.rs

use std::time::Duration;

use rand::{Rng, seq::SliceRandom};

use crate::{config::PASSING_SCORE_PERCENTAGE, models::exam_result::Answer};

/// Number of answers marked correct.
pub fn calculate_score(answers: &[Answer]) -> u32 {
    answers.iter().filter(|a| a.is_correct).count() as u32
}

/// `round(100 * score / total)`, or 0 for an empty exam.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(score) * 100.0 / f64::from(total)).round() as u32
}

pub fn is_passing(percentage: u32) -> bool {
    percentage >= PASSING_SCORE_PERCENTAGE
}

/// Elapsed time rounded to whole minutes.
pub fn duration_minutes(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() / 60.0).round() as u64
}

/// Draws up to `count` distinct items: full shuffle, then truncate.
pub fn sample<T, R: Rng + ?Sized>(mut items: Vec<T>, count: usize, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items.truncate(count);
    items
}
