// src/handlers/awards.rs

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
    models::award::{
        Award, AwardListParams, CreateAwardRequest, GroupedAwards, UpdateAwardRequest,
    },
};

const AWARD_COLUMNS: &str = "id, name, award_type, description, image_url, category, criteria, \
                             rarity, points_value, is_active, created_at";

/// Lists the award catalog, flat and grouped by type.
///
/// Optional filters: `category`, `isActive`. Sorted by rarity, type and
/// name so the display order is stable.
pub async fn list_awards(
    State(pool): State<PgPool>,
    Query(params): Query<AwardListParams>,
) -> Result<impl IntoResponse, AppError> {
    let awards = sqlx::query_as::<_, Award>(&format!(
        r#"
        SELECT {AWARD_COLUMNS}
        FROM awards
        WHERE ($1::TEXT IS NULL OR category = $1)
          AND ($2::BOOLEAN IS NULL OR is_active = $2)
        ORDER BY rarity, award_type, name
        "#
    ))
    .bind(params.category)
    .bind(params.is_active)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list awards: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(GroupedAwards::new(awards)))
}

/// Fetches a single award by ID.
pub async fn get_award(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let award = sqlx::query_as::<_, Award>(&format!(
        "SELECT {AWARD_COLUMNS} FROM awards WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch award {id}: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Award not found".to_string()))?;

    Ok(Json(award))
}

/// Creates a new award.
/// Admin only.
pub async fn create_award(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateAwardRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let award = sqlx::query_as::<_, Award>(&format!(
        r#"
        INSERT INTO awards
            (name, award_type, description, image_url, category, criteria, rarity, points_value, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {AWARD_COLUMNS}
        "#
    ))
    .bind(&payload.name)
    .bind(&payload.award_type)
    .bind(&payload.description)
    .bind(&payload.image_url)
    .bind(&payload.category)
    .bind(SqlJson(payload.criteria.into_criteria()))
    .bind(payload.rarity.as_deref().unwrap_or("common"))
    .bind(payload.points_value.unwrap_or(0))
    .bind(payload.is_active.unwrap_or(true))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Award '{}' already exists", payload.name))
        } else {
            tracing::error!("Failed to create award: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(award)))
}

/// Updates an award.
/// Admin only. Criteria are replaced wholesale when present.
pub async fn update_award(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAwardRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.name.is_none()
        && payload.award_type.is_none()
        && payload.description.is_none()
        && payload.image_url.is_none()
        && payload.category.is_none()
        && payload.criteria.is_none()
        && payload.rarity.is_none()
        && payload.points_value.is_none()
        && payload.is_active.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE awards SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(award_type) = payload.award_type {
        separated.push("award_type = ");
        separated.push_bind_unseparated(award_type);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(image_url) = payload.image_url {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image_url);
    }

    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
    }

    if let Some(criteria) = payload.criteria {
        separated.push("criteria = ");
        separated.push_bind_unseparated(
            serde_json::to_value(criteria.into_criteria()).unwrap_or_default(),
        );
    }

    if let Some(rarity) = payload.rarity {
        separated.push("rarity = ");
        separated.push_bind_unseparated(rarity);
    }

    if let Some(points_value) = payload.points_value {
        separated.push("points_value = ");
        separated.push_bind_unseparated(points_value);
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("Award name already exists".to_string())
        } else {
            tracing::error!("Failed to update award: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Award not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes an award by ID.
/// Admin only. Users who already hold the award keep the held entry;
/// joined views drop rows whose catalog award no longer resolves.
pub async fn delete_award(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM awards WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete award: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Award not found".to_string()));
    }

    Ok(StatusCode::OK)
}
