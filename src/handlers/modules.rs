// src/handlers/modules.rs

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
    models::learning_module::{
        CreateModuleRequest, LearningModule, Lesson, LessonInput, Resource, ResourceInput,
        UpdateModuleRequest,
    },
};

const MODULE_COLUMNS: &str =
    "id, title, description, content, order_index, image_url, lessons, resources, created_at";

/// Lists all learning modules in catalog order.
pub async fn list_modules(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let modules = sqlx::query_as::<_, LearningModule>(&format!(
        "SELECT {MODULE_COLUMNS} FROM learning_modules ORDER BY order_index, id"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list modules: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(modules))
}

/// Fetches a single module by ID, lessons and resources included.
pub async fn get_module(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let module = fetch_module(&pool, id).await?;
    Ok(Json(module))
}

/// Creates a new learning module.
/// Admin only. Lesson ids are minted server-side.
pub async fn create_module(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let lessons: Vec<Lesson> = payload
        .lessons
        .into_iter()
        .map(LessonInput::into_lesson)
        .collect();
    let resources: Vec<Resource> = payload
        .resources
        .into_iter()
        .map(ResourceInput::into_resource)
        .collect();

    let module = sqlx::query_as::<_, LearningModule>(&format!(
        r#"
        INSERT INTO learning_modules
            (title, description, content, order_index, image_url, lessons, resources)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {MODULE_COLUMNS}
        "#
    ))
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.content)
    .bind(payload.order_index.unwrap_or(0))
    .bind(&payload.image_url)
    .bind(SqlJson(lessons))
    .bind(SqlJson(resources))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create module: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(module)))
}

/// Updates a learning module.
/// Admin only. Lessons and resources are replaced wholesale when present,
/// and replaced lessons get fresh ids.
pub async fn update_module(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.title.is_none()
        && payload.description.is_none()
        && payload.content.is_none()
        && payload.order_index.is_none()
        && payload.image_url.is_none()
        && payload.lessons.is_none()
        && payload.resources.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE learning_modules SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(content) = payload.content {
        separated.push("content = ");
        separated.push_bind_unseparated(content);
    }

    if let Some(order_index) = payload.order_index {
        separated.push("order_index = ");
        separated.push_bind_unseparated(order_index);
    }

    if let Some(image_url) = payload.image_url {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image_url);
    }

    if let Some(lessons) = payload.lessons {
        let lessons: Vec<Lesson> = lessons.into_iter().map(LessonInput::into_lesson).collect();
        separated.push("lessons = ");
        separated.push_bind_unseparated(serde_json::to_value(lessons).unwrap_or_default());
    }

    if let Some(resources) = payload.resources {
        let resources: Vec<Resource> = resources
            .into_iter()
            .map(ResourceInput::into_resource)
            .collect();
        separated.push("resources = ");
        separated.push_bind_unseparated(serde_json::to_value(resources).unwrap_or_default());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update module: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Module not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a learning module by ID.
/// Admin only. Attached AR models are removed with it; quizzes that
/// referenced it are detached, not deleted.
pub async fn delete_module(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM learning_modules WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete module: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Module not found".to_string()));
    }

    Ok(StatusCode::OK)
}

async fn fetch_module(pool: &PgPool, id: i64) -> Result<LearningModule, AppError> {
    sqlx::query_as::<_, LearningModule>(&format!(
        "SELECT {MODULE_COLUMNS} FROM learning_modules WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch module {id}: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Module not found".to_string()))
}
