// src/handlers/quizzes.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::DEFAULT_PASSING_SCORE,
    error::AppError,
    models::{
        award::Award,
        quiz::{
            CreateQuizRequest, PublicQuiz, Question, QuestionInput, Quiz, QuizListParams,
            QuizSummary, SubmitQuizRequest, UpdateQuizRequest,
        },
        quiz_result::{LeaderboardEntry, LeaderboardParams, QuizResult, SubmitQuizResponse},
        user::User,
    },
    scoring::{apply_submission, evaluate_awards, grade_submission},
    utils::jwt::Claims,
};

const QUIZ_COLUMNS: &str =
    "id, title, description, category, difficulty, passing_score, module_id, questions, created_at";

const AWARD_COLUMNS: &str = "id, name, award_type, description, image_url, category, criteria, \
                             rarity, points_value, is_active, created_at";

const RESULT_COLUMNS: &str = "id, user_id, quiz_id, answers, score, max_score, percentage_score, \
                              time_taken, passed, completed_at";

/// Lists the quiz catalog, optionally filtered by category, difficulty
/// or module. Question bodies stay out of the listing.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT
            id, title, description, category, difficulty, passing_score, module_id,
            jsonb_array_length(questions)::BIGINT AS question_count,
            created_at
        FROM quizzes
        WHERE ($1::TEXT IS NULL OR category = $1)
          AND ($2::TEXT IS NULL OR difficulty = $2)
          AND ($3::BIGINT IS NULL OR module_id = $3)
        ORDER BY id
        "#,
    )
    .bind(params.category)
    .bind(params.difficulty)
    .bind(params.module_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Fetches one quiz in its learner-facing form: options are present but
/// the correct flags and explanations are stripped.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    Ok(Json(PublicQuiz::from(quiz)))
}

/// Retrieves the top users by lifetime points. Defaults to 10 entries,
/// capped at 50.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 50);

    let leaderboard = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT
            name,
            COALESCE((points->>'total')::BIGINT, 0) AS points,
            COALESCE((progress->'quizStats'->>'totalPassed')::BIGINT, 0) AS quizzes_passed
        FROM users
        ORDER BY points DESC, id
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to compute leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(leaderboard))
}

/// Creates a new quiz.
/// Admin only. Question and option ids are minted server-side.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let questions: Vec<Question> = payload
        .questions
        .into_iter()
        .map(QuestionInput::into_question)
        .collect();

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        r#"
        INSERT INTO quizzes (title, description, category, difficulty, passing_score, module_id, questions)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {QUIZ_COLUMNS}
        "#
    ))
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(payload.difficulty.as_deref().unwrap_or("beginner"))
    .bind(payload.passing_score.unwrap_or(DEFAULT_PASSING_SCORE))
    .bind(payload.module_id)
    .bind(SqlJson(&questions))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("foreign key") {
            AppError::BadRequest("Referenced module does not exist".to_string())
        } else {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Updates a quiz.
/// Admin only. A questions payload replaces the whole list, minting
/// fresh ids; results referencing old question ids stay untouched in
/// the ledger.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.title.is_none()
        && payload.description.is_none()
        && payload.category.is_none()
        && payload.difficulty.is_none()
        && payload.passing_score.is_none()
        && payload.module_id.is_none()
        && payload.questions.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
    }

    if let Some(difficulty) = payload.difficulty {
        separated.push("difficulty = ");
        separated.push_bind_unseparated(difficulty);
    }

    if let Some(passing_score) = payload.passing_score {
        separated.push("passing_score = ");
        separated.push_bind_unseparated(passing_score);
    }

    if let Some(module_id) = payload.module_id {
        separated.push("module_id = ");
        separated.push_bind_unseparated(module_id);
    }

    if let Some(questions) = payload.questions {
        let questions: Vec<Question> = questions.into_iter().map(QuestionInput::into_question).collect();
        separated.push("questions = ");
        separated.push_bind_unseparated(serde_json::to_value(questions).unwrap_or_default());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        if e.to_string().contains("foreign key") {
            AppError::BadRequest("Referenced module does not exist".to_string())
        } else {
            tracing::error!("Failed to update quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a quiz by ID.
/// Admin only. Past results for the quiz remain in the ledger.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Appends a question to a quiz.
/// Admin only.
pub async fn add_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuestionInput>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = fetch_quiz(&pool, id).await?;

    let mut questions = quiz.questions.0;
    questions.push(payload.into_question());

    let updated = sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET questions = $1 WHERE id = $2 RETURNING {QUIZ_COLUMNS}"
    ))
    .bind(SqlJson(&questions))
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to add question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(updated))
}

/// Submits a user's quiz answers.
///
/// Runs the whole scoring pipeline:
/// * Grades the answers against the quiz.
/// * Records the attempt in the `quiz_results` ledger.
/// * Folds the outcome into the user's progress, streak and points.
/// * Evaluates award criteria and grants anything newly earned.
/// * Saves the user aggregates in a single update.
///
/// The ledger insert and the user update are separate statements, so a
/// failure in between leaves the attempt recorded but the aggregates
/// behind; resubmitting recomputes from the stored state. Submissions
/// are not idempotent: submitting twice counts two attempts.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;

    let answers = payload
        .answers
        .ok_or(AppError::BadRequest("Please provide answers array".to_string()))?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password, role, profile_image, progress, awards, points, \
         created_at FROM users WHERE id = $1",
    )
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch user for submission: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let outcome = grade_submission(&quiz, &answers);
    let now = Utc::now();

    let quiz_result = sqlx::query_as::<_, QuizResult>(&format!(
        r#"
        INSERT INTO quiz_results
            (user_id, quiz_id, answers, score, max_score, percentage_score, time_taken, passed, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {RESULT_COLUMNS}
        "#
    ))
    .bind(user.id)
    .bind(quiz.id)
    .bind(SqlJson(&outcome.answers))
    .bind(outcome.score)
    .bind(outcome.max_score)
    .bind(outcome.percentage_score)
    .bind(payload.time_taken)
    .bind(outcome.passed)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record quiz result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // Queried after the insert so the just-recorded attempt is part of
    // the category mean.
    let category_history: Vec<f64> = sqlx::query_scalar(
        r#"
        SELECT r.percentage_score
        FROM quiz_results r
        JOIN quizzes q ON q.id = r.quiz_id
        WHERE r.user_id = $1 AND q.category = $2
        ORDER BY r.id
        "#,
    )
    .bind(user.id)
    .bind(&quiz.category)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch category history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut progress = user.progress.0;
    let mut points = user.points.0;
    let mut held_awards = user.awards.0;

    apply_submission(
        &mut progress,
        &mut points,
        &quiz,
        &outcome,
        &category_history,
        now,
    );

    // Award evaluation is best-effort: a failed candidate fetch is logged
    // and grants nothing rather than failing the submission.
    let candidates = match sqlx::query_as::<_, Award>(&format!(
        r#"
        SELECT {AWARD_COLUMNS}
        FROM awards
        WHERE is_active = TRUE
          AND (criteria->>'quizCategory' = 'all' OR criteria->>'quizCategory' = $1)
        ORDER BY id
        "#
    ))
    .bind(&quiz.category)
    .fetch_all(&pool)
    .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to fetch award candidates: {:?}", e);
            Vec::new()
        }
    };

    let earned_awards = evaluate_awards(
        &mut held_awards,
        &mut points,
        &progress,
        &quiz,
        &quiz_result,
        &candidates,
        now,
    );

    // Single-statement save of the whole aggregate. Concurrent
    // submissions for one user race read-to-write and the last save
    // wins; see the scoring pipeline docs.
    sqlx::query("UPDATE users SET progress = $1, awards = $2, points = $3 WHERE id = $4")
        .bind(SqlJson(&progress))
        .bind(SqlJson(&held_awards))
        .bind(SqlJson(&points))
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save user aggregates: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(SubmitQuizResponse {
        quiz_result,
        earned_awards,
    }))
}

async fn fetch_quiz(pool: &PgPool, id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch quiz {id}: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}
