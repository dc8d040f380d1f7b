// src/handlers/ar_models.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::ar_model::{
        ArModel, ArModelListParams, CreateArModelRequest, Texture, TextureInput,
        UpdateArModelRequest, Vec3,
    },
};

const AR_MODEL_COLUMNS: &str = "id, name, description, model_url, file_type, preview_image, \
                                textures, scale, rotation, module_id, created_at";

/// Lists AR model metadata, optionally filtered by owning module.
pub async fn list_ar_models(
    State(pool): State<PgPool>,
    Query(params): Query<ArModelListParams>,
) -> Result<impl IntoResponse, AppError> {
    let models = sqlx::query_as::<_, ArModel>(&format!(
        r#"
        SELECT {AR_MODEL_COLUMNS}
        FROM ar_models
        WHERE ($1::BIGINT IS NULL OR module_id = $1)
        ORDER BY id
        "#
    ))
    .bind(params.module_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list AR models: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(models))
}

/// Fetches a single AR model by ID.
pub async fn get_ar_model(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let model = sqlx::query_as::<_, ArModel>(&format!(
        "SELECT {AR_MODEL_COLUMNS} FROM ar_models WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch AR model {id}: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("AR model not found".to_string()))?;

    Ok(Json(model))
}

/// Registers a new AR model.
/// Admin only. The owning module must exist; placement defaults to unit
/// scale and zero rotation.
pub async fn create_ar_model(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateArModelRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    ensure_module_exists(&pool, payload.module_id).await?;

    let textures: Vec<Texture> = payload
        .textures
        .into_iter()
        .map(TextureInput::into_texture)
        .collect();

    let model = sqlx::query_as::<_, ArModel>(&format!(
        r#"
        INSERT INTO ar_models
            (name, description, model_url, file_type, preview_image, textures, scale, rotation, module_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {AR_MODEL_COLUMNS}
        "#
    ))
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.model_url)
    .bind(&payload.file_type)
    .bind(&payload.preview_image)
    .bind(SqlJson(textures))
    .bind(SqlJson(payload.scale.unwrap_or_else(Vec3::unit)))
    .bind(SqlJson(payload.rotation.unwrap_or_default()))
    .bind(payload.module_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create AR model: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(model)))
}

/// Updates an AR model.
/// Admin only. Textures are replaced wholesale when present; a new owning
/// module must exist.
pub async fn update_ar_model(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateArModelRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.name.is_none()
        && payload.description.is_none()
        && payload.model_url.is_none()
        && payload.file_type.is_none()
        && payload.preview_image.is_none()
        && payload.textures.is_none()
        && payload.scale.is_none()
        && payload.rotation.is_none()
        && payload.module_id.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if let Some(module_id) = payload.module_id {
        ensure_module_exists(&pool, module_id).await?;
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE ar_models SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(model_url) = payload.model_url {
        separated.push("model_url = ");
        separated.push_bind_unseparated(model_url);
    }

    if let Some(file_type) = payload.file_type {
        separated.push("file_type = ");
        separated.push_bind_unseparated(file_type);
    }

    if let Some(preview_image) = payload.preview_image {
        separated.push("preview_image = ");
        separated.push_bind_unseparated(preview_image);
    }

    if let Some(textures) = payload.textures {
        let textures: Vec<Texture> = textures.into_iter().map(TextureInput::into_texture).collect();
        separated.push("textures = ");
        separated.push_bind_unseparated(serde_json::to_value(textures).unwrap_or_default());
    }

    if let Some(scale) = payload.scale {
        separated.push("scale = ");
        separated.push_bind_unseparated(serde_json::to_value(scale).unwrap_or_default());
    }

    if let Some(rotation) = payload.rotation {
        separated.push("rotation = ");
        separated.push_bind_unseparated(serde_json::to_value(rotation).unwrap_or_default());
    }

    if let Some(module_id) = payload.module_id {
        separated.push("module_id = ");
        separated.push_bind_unseparated(module_id);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update AR model: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("AR model not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes an AR model by ID.
/// Admin only.
pub async fn delete_ar_model(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM ar_models WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete AR model: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("AR model not found".to_string()));
    }

    Ok(StatusCode::OK)
}

async fn ensure_module_exists(pool: &PgPool, module_id: i64) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM learning_modules WHERE id = $1")
        .bind(module_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check module {module_id}: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if exists.is_none() {
        return Err(AppError::NotFound("Module not found".to_string()));
    }

    Ok(())
}
