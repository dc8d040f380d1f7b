// src/scoring/stats.rs

use chrono::{DateTime, Utc};

use crate::models::quiz::Quiz;
use crate::models::user::{CategoryStats, Points, PointsEntry, Progress};
use crate::scoring::grade::GradingOutcome;

/// Folds one graded submission into the user's aggregates.
///
/// * First pass of a quiz appends its id to `completedQuizzes`.
/// * `totalAttempted` always increments; `totalPassed` only on a pass.
/// * `averageScore` advances by incremental mean, so after M submissions
///   it equals the arithmetic mean of all M percentage scores.
/// * The quiz's category entry is created on first sight; on later
///   submissions its average is re-derived from `category_history`, the
///   user's percentage scores for this category pulled from the result
///   ledger (the just-recorded attempt included).
/// * The activity streak compares calendar days in UTC: a submission the
///   day after the last activity extends it, a same-day one leaves it
///   alone, anything else resets it to 1.
/// * The raw earned score lands in `points`, pass or fail.
///
/// Mutates the aggregates in place; persisting them is the caller's job.
pub fn apply_submission(
    progress: &mut Progress,
    points: &mut Points,
    quiz: &Quiz,
    outcome: &GradingOutcome,
    category_history: &[f64],
    now: DateTime<Utc>,
) {
    if outcome.passed && !progress.completed_quizzes.contains(&quiz.id) {
        progress.completed_quizzes.push(quiz.id);
    }

    let stats = &mut progress.quiz_stats;
    stats.total_attempted += 1;
    if outcome.passed {
        stats.total_passed += 1;
    }

    let previous_total = stats.average_score * (stats.total_attempted - 1) as f64;
    stats.average_score =
        (previous_total + outcome.percentage_score) / stats.total_attempted as f64;

    match stats.category_progress.get_mut(&quiz.category) {
        None => {
            stats.category_progress.insert(
                quiz.category.clone(),
                CategoryStats {
                    completed: if outcome.passed { 1 } else { 0 },
                    total_available: 1,
                    average_score: outcome.percentage_score,
                },
            );
        }
        Some(entry) => {
            if outcome.passed {
                entry.completed += 1;
            }
            entry.average_score = if category_history.is_empty() {
                outcome.percentage_score
            } else {
                category_history.iter().sum::<f64>() / category_history.len() as f64
            };
        }
    }

    let today = now.date_naive();
    let last_day = progress.streaks.last_activity.date_naive();
    let gap_days = (today - last_day).num_days();
    if gap_days == 1 {
        progress.streaks.current += 1;
        if progress.streaks.current > progress.streaks.best {
            progress.streaks.best = progress.streaks.current;
        }
    } else if gap_days != 0 {
        progress.streaks.current = 1;
    }
    progress.streaks.last_activity = now;

    points.total += outcome.score;
    points.history.push(PointsEntry {
        amount: outcome.score,
        reason: format!("Completed quiz: {}", quiz.title),
        date: now,
    });
}
