// src/models/quiz_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

use crate::models::award::Award;

/// Represents the 'quiz_results' table in the database.
///
/// Append-only attempt ledger. Rows are never updated after insert, and
/// they deliberately carry no foreign keys: deleting a quiz must not erase
/// the history of people who took it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub answers: Json<Vec<AnswerRecord>>,
    /// Points earned across answered questions.
    pub score: i64,
    /// Ceiling the percentage is computed against.
    pub max_score: i64,
    /// `score / max_score * 100`; 0 when `max_score` is 0.
    pub percentage_score: f64,
    /// Seconds the attempt took, as reported by the client.
    pub time_taken: i64,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// One graded answer inside a result document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// Question id as submitted, kept even when it matches no question.
    pub question: String,
    pub selected_option: String,
    pub is_correct: bool,
}

/// Response body for a quiz submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub quiz_result: QuizResult,
    /// Awards granted by this very submission, in evaluation order.
    pub earned_awards: Vec<Award>,
}

/// Leaderboard row, ranked by lifetime points.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub points: i64,
    pub quizzes_passed: i64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}

/// One row of a user's attempt history, joined with quiz metadata.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizHistoryEntry {
    pub id: i64,
    pub quiz_id: i64,
    /// Empty when the quiz has since been deleted.
    pub quiz_title: Option<String>,
    pub category: Option<String>,
    pub score: i64,
    pub max_score: i64,
    pub percentage_score: f64,
    pub passed: bool,
    pub time_taken: i64,
    pub completed_at: DateTime<Utc>,
}
