// src/handlers/progress.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        award::{Award, EarnedAwardView},
        learning_module::{LearningModule, LessonProgressRequest},
        quiz_result::QuizHistoryEntry,
        user::{EmotionDataRequest, EmotionalSummary, User},
    },
    utils::jwt::Claims,
};

/// Get the current user's whole progress aggregate.
pub async fn get_overall_progress(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()).await?;
    Ok(Json(user.progress.0))
}

/// Records a lesson's completion percentage for the current user.
///
/// * The module and lesson must exist in the catalog.
/// * When every lesson of the module reaches 100%, the module id is
///   added to `completedModules` (once).
pub async fn update_lesson_progress(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<LessonProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let module = sqlx::query_as::<_, LearningModule>(
        "SELECT id, title, description, content, order_index, image_url, lessons, resources, \
         created_at FROM learning_modules WHERE id = $1",
    )
    .bind(payload.module_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch module: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Module not found".to_string()))?;

    if !module.lessons.0.iter().any(|l| l.id == payload.lesson_id) {
        return Err(AppError::NotFound("Lesson not found".to_string()));
    }

    let user = fetch_user(&pool, claims.user_id()).await?;
    let mut progress = user.progress.0;

    progress
        .lesson_progress
        .entry(module.id.to_string())
        .or_default()
        .insert(payload.lesson_id.clone(), payload.progress);

    let lesson_marks = &progress.lesson_progress[&module.id.to_string()];
    let module_completed = module
        .lessons
        .0
        .iter()
        .all(|lesson| lesson_marks.get(&lesson.id).copied().unwrap_or(0.0) >= 100.0);

    if module_completed && !progress.completed_modules.contains(&module.id) {
        progress.completed_modules.push(module.id);
    }

    sqlx::query("UPDATE users SET progress = $1 WHERE id = $2")
        .bind(SqlJson(&progress))
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save lesson progress: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(json!({
        "lessonProgress": payload.progress,
        "moduleCompleted": module_completed
    })))
}

/// Lists the current user's attempt history, newest first, with quiz
/// metadata joined in. Attempts whose quiz was deleted keep their row,
/// with null title and category.
pub async fn get_quiz_history(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let history = sqlx::query_as::<_, QuizHistoryEntry>(
        r#"
        SELECT
            r.id, r.quiz_id,
            q.title AS quiz_title,
            q.category,
            r.score, r.max_score, r.percentage_score, r.passed, r.time_taken, r.completed_at
        FROM quiz_results r
        LEFT JOIN quizzes q ON q.id = r.quiz_id
        WHERE r.user_id = $1
        ORDER BY r.completed_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(history))
}

/// Lists the awards the current user has earned, joined with catalog
/// metadata, in the order they were earned. Held entries whose award was
/// deleted from the catalog are dropped from the view.
pub async fn get_my_awards(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()).await?;
    let held = user.awards.0;

    let ids: Vec<i64> = held.iter().map(|h| h.award).collect();
    let catalog = sqlx::query_as::<_, Award>(
        "SELECT id, name, award_type, description, image_url, category, criteria, rarity, \
         points_value, is_active, created_at FROM awards WHERE id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch earned awards: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let earned: Vec<EarnedAwardView> = held
        .into_iter()
        .filter_map(|h| {
            catalog
                .iter()
                .find(|award| award.id == h.award)
                .map(|award| EarnedAwardView {
                    award: award.clone(),
                    date_earned: h.date_earned,
                    from_quiz: h.from_quiz,
                })
        })
        .collect();

    Ok(Json(earned))
}

/// Appends an emotion sample to the current user's record for a lesson.
/// Returns the lesson's full sample list.
pub async fn add_emotional_data(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EmotionDataRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = fetch_user(&pool, claims.user_id()).await?;
    let mut progress = user.progress.0;

    let samples = progress
        .emotional_data
        .entry(payload.module_id.to_string())
        .or_default()
        .entry(payload.lesson_id.clone())
        .or_default();
    samples.push(payload.emotional_data.into_sample(Utc::now()));
    let response = samples.clone();

    sqlx::query("UPDATE users SET progress = $1 WHERE id = $2")
        .bind(SqlJson(&progress))
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save emotional data: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalSummaryParams {
    pub module_id: Option<i64>,
    pub lesson_id: Option<String>,
}

/// Summarizes the emotion samples for one lesson: entry count, per-signal
/// averages, total covered time and the newest timestamp.
pub async fn get_emotional_summary(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<EmotionalSummaryParams>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(module_id), Some(lesson_id)) = (params.module_id, params.lesson_id) else {
        return Err(AppError::BadRequest(
            "Please provide moduleId and lessonId".to_string(),
        ));
    };

    let user = fetch_user(&pool, claims.user_id()).await?;

    let samples = user
        .progress
        .0
        .emotional_data
        .get(&module_id.to_string())
        .and_then(|lessons| lessons.get(&lesson_id))
        .cloned()
        .unwrap_or_default();

    Ok(Json(EmotionalSummary::from_samples(&samples)))
}

async fn fetch_user(pool: &PgPool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password, role, profile_image, progress, awards, points, \
         created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch user {id}: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("User not found".to_string()))
}
