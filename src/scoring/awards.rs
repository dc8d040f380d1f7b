// src/scoring/awards.rs

use chrono::{DateTime, Utc};

use crate::models::award::{Award, AwardCriteria};
use crate::models::quiz::Quiz;
use crate::models::quiz_result::QuizResult;
use crate::models::user::{HeldAward, Points, PointsEntry, Progress};

/// Grants every candidate award the user newly qualifies for.
///
/// Runs after [`super::stats::apply_submission`], so criteria that read
/// the aggregates (`quiz_completion`, `streak`, `category_mastery`) see
/// this submission already counted. Candidates the user already holds are
/// skipped, which also dedupes within a single evaluation pass.
///
/// Returns the granted awards in candidate order; `held` and `points` are
/// updated in place.
pub fn evaluate_awards(
    held: &mut Vec<HeldAward>,
    points: &mut Points,
    progress: &Progress,
    quiz: &Quiz,
    result: &QuizResult,
    candidates: &[Award],
    now: DateTime<Utc>,
) -> Vec<Award> {
    let mut earned = Vec::new();

    for award in candidates {
        let eligible = is_eligible(&award.criteria.0, progress, quiz, result);
        let already_held = held.iter().any(|h| h.award == award.id);

        if eligible && !already_held {
            held.push(HeldAward {
                award: award.id,
                date_earned: now,
                from_quiz: Some(quiz.id),
            });
            points.total += award.points_value;
            points.history.push(PointsEntry {
                amount: award.points_value,
                reason: format!("Earned award: {}", award.name),
                date: now,
            });
            earned.push(award.clone());
        }
    }

    earned
}

/// Checks one criterion against the updated aggregates and this result.
/// Criteria types this build does not know never match.
fn is_eligible(
    criteria: &AwardCriteria,
    progress: &Progress,
    quiz: &Quiz,
    result: &QuizResult,
) -> bool {
    match criteria.criteria_type.as_str() {
        "quiz_score" => result.percentage_score >= criteria.value,
        "quiz_completion" => progress.quiz_stats.total_passed as f64 >= criteria.value,
        "streak" => progress.streaks.current as f64 >= criteria.value,
        "time" => result.time_taken as f64 <= criteria.value,
        "category_mastery" => progress
            .quiz_stats
            .category_progress
            .get(&quiz.category)
            .is_some_and(|category| category.completed as f64 >= criteria.value),
        _ => false,
    }
}
