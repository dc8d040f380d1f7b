// src/handlers/users.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        learning_module::{Lesson, ModuleSummary},
        user::{AdminUpdateUserRequest, ProgressSummary, UpdateProfileRequest, User},
    },
    utils::{hash::hash_password, jwt::Claims},
};

const USER_COLUMNS: &str =
    "id, name, email, password, role, profile_image, progress, awards, points, created_at";

/// Get the current user's profile.
pub async fn get_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()).await?;
    Ok(Json(user))
}

/// Updates the current user's profile.
///
/// Performs updates sequentially for the fields that are present, then
/// returns the fresh row.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    if let Some(name) = payload.name {
        sqlx::query("UPDATE users SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(user_id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    if let Some(email) = payload.email {
        sqlx::query("UPDATE users SET email = $1 WHERE id = $2")
            .bind(&email)
            .bind(user_id)
            .execute(&pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                    AppError::Conflict(format!("Email '{email}' is already registered"))
                } else {
                    AppError::InternalServerError(e.to_string())
                }
            })?;
    }

    if let Some(profile_image) = payload.profile_image {
        sqlx::query("UPDATE users SET profile_image = $1 WHERE id = $2")
            .bind(profile_image)
            .bind(user_id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    let user = fetch_user(&pool, user_id).await?;
    Ok(Json(user))
}

/// Module catalog row with the lesson list needed to judge completion.
#[derive(sqlx::FromRow)]
struct ModuleLessons {
    id: i64,
    title: String,
    order_index: i64,
    lessons: SqlJson<Vec<Lesson>>,
}

/// Module-completion summary for the current user.
///
/// * Walks the module catalog in order and marks a module completed when
///   every one of its lessons is recorded at 100%, or when it was
///   already in `completedModules`.
/// * The first incomplete module becomes `currentModule`.
/// * The recomputed summary is written back into the user's progress
///   aggregate before responding, leaving the quiz and streak fields of
///   the aggregate untouched.
pub async fn get_progress_summary(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()).await?;
    let mut progress = user.progress.0;

    let modules = sqlx::query_as::<_, ModuleLessons>(
        "SELECT id, title, order_index, lessons FROM learning_modules ORDER BY order_index, id",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch module catalog: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut completed_modules = Vec::new();
    let mut current_module: Option<ModuleSummary> = None;

    for module in &modules {
        let lesson_marks = progress.lesson_progress.get(&module.id.to_string());
        let all_lessons_done = !module.lessons.0.is_empty()
            && module.lessons.0.iter().all(|lesson| {
                lesson_marks
                    .and_then(|marks| marks.get(&lesson.id))
                    .copied()
                    .unwrap_or(0.0)
                    >= 100.0
            });

        if all_lessons_done || progress.completed_modules.contains(&module.id) {
            completed_modules.push(module.id);
        } else if current_module.is_none() {
            current_module = Some(ModuleSummary {
                id: module.id,
                title: module.title.clone(),
                order_index: module.order_index,
            });
        }
    }

    let completion_percentage = if modules.is_empty() {
        0.0
    } else {
        completed_modules.len() as f64 / modules.len() as f64 * 100.0
    };

    progress.completed_modules = completed_modules.clone();
    progress.current_module = current_module.as_ref().map(|m| m.id);
    progress.completion_percentage = completion_percentage;

    sqlx::query("UPDATE users SET progress = $1 WHERE id = $2")
        .bind(SqlJson(&progress))
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save progress summary: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(ProgressSummary {
        completed_modules,
        current_module,
        completion_percentage,
    }))
}

/// Lists every account, newest first.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Fetches a single user by ID.
/// Admin only.
pub async fn get_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, id).await?;
    Ok(Json(user))
}

/// Updates an account's identity fields.
/// Admin only. May change name, email, role and password.
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    // One statement per supplied field
    if let Some(name) = payload.name {
        sqlx::query("UPDATE users SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    if let Some(email) = payload.email {
        sqlx::query("UPDATE users SET email = $1 WHERE id = $2")
            .bind(&email)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                    AppError::Conflict(format!("Email '{email}' is already registered"))
                } else {
                    AppError::InternalServerError(e.to_string())
                }
            })?;
    }

    if let Some(role) = payload.role {
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    if let Some(password) = payload.password {
        let hashed = hash_password(&password)?;
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(hashed)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    Ok(StatusCode::OK)
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self. The user's quiz results stay in
/// the ledger; history joins tolerate the orphaned rows.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id() {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::OK)
}

async fn fetch_user(pool: &PgPool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user {id}: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("User not found".to_string()))
}
