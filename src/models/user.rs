// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use std::collections::BTreeMap;
use validator::Validate;

/// Represents the 'users' table in the database.
///
/// The gamification aggregates (`progress`, `awards`, `points`) are JSONB
/// columns: everything the scoring pipeline mutates for one user lives in
/// this single row, so persisting a submission is one `UPDATE`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email, used as the login identifier.
    pub email: String,

    /// Argon2 hash, never serialized into responses.
    #[serde(skip)]
    pub password: String,

    /// 'user' or 'admin'; gates the admin route group.
    pub role: String,

    /// Profile image URL (uploads themselves are handled elsewhere).
    pub profile_image: String,

    pub progress: Json<Progress>,

    /// Awards held by this user. Each award id appears at most once.
    pub awards: Json<Vec<HeldAward>>,

    pub points: Json<Points>,

    pub created_at: Option<DateTime<Utc>>,
}

/// Learning and quiz progress aggregate, stored as one JSONB document.
///
/// Every field carries a serde default so documents written by older
/// versions of the service still decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progress {
    /// Modules the user has fully completed (every lesson at 100%).
    pub completed_modules: Vec<i64>,

    /// First module, in catalog order, not yet completed.
    pub current_module: Option<i64>,

    /// Share of the module catalog completed, 0-100.
    pub completion_percentage: f64,

    /// Per-lesson completion percentage, keyed by module id then lesson id.
    pub lesson_progress: BTreeMap<String, BTreeMap<String, f64>>,

    /// Quizzes passed at least once. A quiz id is added only on a pass,
    /// and only the first time.
    pub completed_quizzes: Vec<i64>,

    pub quiz_stats: QuizStats,

    pub streaks: Streaks,

    /// Self-reported emotion samples, keyed by module id then lesson id.
    pub emotional_data: BTreeMap<String, BTreeMap<String, Vec<EmotionSample>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizStats {
    pub total_attempted: i64,

    /// Invariant: never exceeds `total_attempted`.
    pub total_passed: i64,

    /// Running mean of every percentage score ever recorded, passes and
    /// failures alike.
    pub average_score: f64,

    /// Per-category aggregates, keyed by quiz category.
    pub category_progress: BTreeMap<String, CategoryStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryStats {
    /// Count of passed quizzes in this category ("category mastery").
    pub completed: i64,

    pub total_available: i64,

    pub average_score: f64,
}

/// Consecutive-calendar-day activity streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Streaks {
    pub current: i64,

    /// Invariant: `best == max` over all historical values of `current`.
    pub best: i64,

    pub last_activity: DateTime<Utc>,
}

impl Default for Streaks {
    fn default() -> Self {
        // Fresh accounts start with the registration moment as their last
        // activity, so a same-day first submission leaves `current` at 0.
        Self {
            current: 0,
            best: 0,
            last_activity: Utc::now(),
        }
    }
}

/// One emotion sample reported by the client for a lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionSample {
    pub emotion: f64,
    pub engagement: f64,
    pub focus: f64,
    /// Seconds the sample covers.
    pub duration: f64,
    pub timestamp: DateTime<Utc>,
}

/// An award held by a user, with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldAward {
    /// Award catalog id.
    pub award: i64,
    pub date_earned: DateTime<Utc>,
    pub from_quiz: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Points {
    pub total: i64,

    /// Append-only accrual log.
    pub history: Vec<PointsEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsEntry {
    pub amount: i64,
    pub reason: String,
    pub date: DateTime<Utc>,
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for a user updating their own profile. All fields optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// URL of an already-hosted image; this service does not take uploads.
    #[validate(length(max = 500))]
    pub profile_image: Option<String>,
}

/// DTO for admin user updates. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = validate_role))]
    pub role: Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if role != "user" && role != "admin" {
        return Err(validator::ValidationError::new("invalid_role"));
    }
    Ok(())
}

/// Module-side progress summary for the current user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub completed_modules: Vec<i64>,
    pub current_module: Option<crate::models::learning_module::ModuleSummary>,
    pub completion_percentage: f64,
}

/// DTO for reporting an emotion sample against a lesson.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmotionDataRequest {
    pub module_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub lesson_id: String,
    #[validate(nested)]
    pub emotional_data: EmotionInput,
}

/// Sample values as reported by the client, each normalized to [0, 1].
#[derive(Debug, Deserialize, Validate)]
pub struct EmotionInput {
    #[validate(range(min = 0.0, max = 1.0))]
    pub emotion: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub engagement: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub focus: f64,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub duration: f64,
}

impl EmotionInput {
    pub fn into_sample(self, timestamp: DateTime<Utc>) -> EmotionSample {
        EmotionSample {
            emotion: self.emotion,
            engagement: self.engagement,
            focus: self.focus,
            duration: self.duration,
            timestamp,
        }
    }
}

/// Aggregated view over one lesson's emotion samples.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalSummary {
    pub total_entries: usize,
    pub average_emotion: f64,
    pub average_engagement: f64,
    pub average_focus: f64,
    /// Total seconds covered by the samples.
    pub time_spent: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl EmotionalSummary {
    /// Empty sample lists summarize to zeros, not NaN.
    pub fn from_samples(samples: &[EmotionSample]) -> Self {
        let count = samples.len();
        let mean = |pick: fn(&EmotionSample) -> f64| {
            if count == 0 {
                0.0
            } else {
                samples.iter().map(pick).sum::<f64>() / count as f64
            }
        };
        Self {
            total_entries: count,
            average_emotion: mean(|s| s.emotion),
            average_engagement: mean(|s| s.engagement),
            average_focus: mean(|s| s.focus),
            time_spent: samples.iter().map(|s| s.duration).sum(),
            last_updated: samples.last().map(|s| s.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_serializes_with_camel_case_keys() {
        let mut progress = Progress::default();
        progress.quiz_stats.total_attempted = 3;
        progress.quiz_stats.category_progress.insert(
            "My Environment".to_string(),
            CategoryStats {
                completed: 1,
                total_available: 1,
                average_score: 80.0,
            },
        );

        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["quizStats"]["totalAttempted"], 3);
        assert_eq!(
            value["quizStats"]["categoryProgress"]["My Environment"]["totalAvailable"],
            1
        );
        assert!(value["streaks"]["lastActivity"].is_string());
        assert!(value.get("quiz_stats").is_none());
    }

    #[test]
    fn partial_progress_documents_still_decode() {
        // Documents written before the gamification fields existed must
        // decode into defaults rather than failing the row fetch.
        let progress: Progress =
            serde_json::from_str(r#"{"completedModules":[4],"completionPercentage":25.0}"#)
                .unwrap();
        assert_eq!(progress.completed_modules, vec![4]);
        assert_eq!(progress.quiz_stats.total_attempted, 0);
        assert_eq!(progress.streaks.current, 0);
        assert!(progress.completed_quizzes.is_empty());

        let empty: Progress = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.completion_percentage, 0.0);
    }

    #[test]
    fn emotional_summary_averages_and_handles_empty_lists() {
        assert_eq!(EmotionalSummary::from_samples(&[]).average_emotion, 0.0);
        assert!(EmotionalSummary::from_samples(&[]).last_updated.is_none());

        let t1 = Utc::now();
        let t2 = t1 + chrono::Duration::seconds(60);
        let sample = |emotion: f64, timestamp| EmotionSample {
            emotion,
            engagement: 0.5,
            focus: 1.0,
            duration: 30.0,
            timestamp,
        };

        let summary = EmotionalSummary::from_samples(&[sample(0.2, t1), sample(0.8, t2)]);
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.average_emotion, 0.5);
        assert_eq!(summary.average_focus, 1.0);
        assert_eq!(summary.time_spent, 60.0);
        assert_eq!(summary.last_updated, Some(t2));
    }

    #[test]
    fn held_award_round_trips_camel_case_field_names() {
        let held: HeldAward = serde_json::from_str(
            r#"{"award":7,"dateEarned":"2025-09-14T10:00:00Z","fromQuiz":3}"#,
        )
        .unwrap();
        assert_eq!(held.award, 7);
        assert_eq!(held.from_quiz, Some(3));

        let value = serde_json::to_value(&held).unwrap();
        assert!(value.get("dateEarned").is_some());
        assert!(value.get("date_earned").is_none());
    }
}
