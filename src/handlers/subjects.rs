// src/handlers/subjects.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        learning_module::ModuleSummary,
        subject::{CreateSubjectRequest, Subject, SubjectView, UpdateSubjectRequest},
    },
};

const SUBJECT_COLUMNS: &str =
    "id, name, description, icon, color, order_index, modules, created_at";

/// Lists all subjects in catalog order, with module references expanded
/// to summaries. References that no longer resolve are dropped.
pub async fn list_subjects(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(&format!(
        "SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY order_index, id"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list subjects: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut ids: Vec<i64> = subjects
        .iter()
        .flat_map(|subject| subject.modules.0.iter().copied())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let modules = fetch_module_summaries(&pool, &ids).await?;

    let views: Vec<SubjectView> = subjects
        .into_iter()
        .map(|subject| {
            let expanded = expand_modules(&subject, &modules);
            SubjectView::new(subject, expanded)
        })
        .collect();

    Ok(Json(views))
}

/// Fetches a single subject by ID with its modules expanded.
pub async fn get_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = sqlx::query_as::<_, Subject>(&format!(
        "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch subject {id}: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    let modules = fetch_module_summaries(&pool, &subject.modules.0).await?;
    let expanded = expand_modules(&subject, &modules);

    Ok(Json(SubjectView::new(subject, expanded)))
}

/// Creates a new subject.
/// Admin only. Module references are stored as given; they are resolved
/// lazily at read time.
pub async fn create_subject(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let subject = sqlx::query_as::<_, Subject>(&format!(
        r#"
        INSERT INTO subjects (name, description, icon, color, order_index, modules)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {SUBJECT_COLUMNS}
        "#
    ))
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.icon.as_deref().unwrap_or("book"))
    .bind(payload.color.as_deref().unwrap_or("#4CAF50"))
    .bind(payload.order_index.unwrap_or(0))
    .bind(SqlJson(payload.modules))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Subject '{}' already exists", payload.name))
        } else {
            tracing::error!("Failed to create subject: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(subject)))
}

/// Updates a subject.
/// Admin only. The module reference list is replaced wholesale when present.
pub async fn update_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.name.is_none()
        && payload.description.is_none()
        && payload.icon.is_none()
        && payload.color.is_none()
        && payload.order_index.is_none()
        && payload.modules.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE subjects SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(icon) = payload.icon {
        separated.push("icon = ");
        separated.push_bind_unseparated(icon);
    }

    if let Some(color) = payload.color {
        separated.push("color = ");
        separated.push_bind_unseparated(color);
    }

    if let Some(order_index) = payload.order_index {
        separated.push("order_index = ");
        separated.push_bind_unseparated(order_index);
    }

    if let Some(modules) = payload.modules {
        separated.push("modules = ");
        separated.push_bind_unseparated(serde_json::to_value(modules).unwrap_or_default());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("Subject name already exists".to_string())
        } else {
            tracing::error!("Failed to update subject: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a subject by ID.
/// Admin only. The modules it referenced are untouched.
pub async fn delete_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete subject: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(StatusCode::OK)
}

async fn fetch_module_summaries(
    pool: &PgPool,
    ids: &[i64],
) -> Result<HashMap<i64, ModuleSummary>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let summaries = sqlx::query_as::<_, ModuleSummary>(
        "SELECT id, title, order_index FROM learning_modules WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch module summaries: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(summaries
        .into_iter()
        .map(|summary| (summary.id, summary))
        .collect())
}

/// Resolves a subject's module ids against fetched summaries, keeping the
/// subject's own ordering.
fn expand_modules(subject: &Subject, modules: &HashMap<i64, ModuleSummary>) -> Vec<ModuleSummary> {
    subject
        .modules
        .0
        .iter()
        .filter_map(|id| modules.get(id).cloned())
        .collect()
}
