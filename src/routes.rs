// src/routes.rs

use axum::{
    Json, Router,
    http::Method,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{ar_models, auth, awards, modules, progress, quizzes, subjects, users},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Builds the full API router.
///
/// Each resource gets its own sub-router nested under `/api/...`; public
/// reads stay open while mutations are merge-layered behind the auth and
/// admin middlewares. Tracing and CORS wrap the whole thing.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
        // Android emulator reaches the host via 10.0.2.2
        "http://10.0.2.2:5000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new().route("/me", get(auth::get_me)).layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            ),
        );

    let user_routes = Router::new()
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/progress", get(users::get_progress_summary))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(
            Router::new()
                .route("/", get(users::list_users))
                .route(
                    "/{id}",
                    get(users::get_user)
                        .put(users::update_user)
                        .delete(users::delete_user),
                )
                // Outermost layer runs first: authenticate, then check the role
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let quiz_routes = Router::new()
        .route("/", get(quizzes::list_quizzes))
        .route("/leaderboard", get(quizzes::get_leaderboard))
        .route("/{id}", get(quizzes::get_quiz))
        .merge(
            Router::new()
                .route("/{id}/submit", post(quizzes::submit_quiz))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        .merge(
            Router::new()
                .route("/", post(quizzes::create_quiz))
                .route(
                    "/{id}",
                    put(quizzes::update_quiz).delete(quizzes::delete_quiz),
                )
                .route("/{id}/questions", post(quizzes::add_question))
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let award_routes = Router::new()
        .route("/", get(awards::list_awards))
        .route("/{id}", get(awards::get_award))
        .merge(
            Router::new()
                .route("/", post(awards::create_award))
                .route(
                    "/{id}",
                    put(awards::update_award).delete(awards::delete_award),
                )
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    // Everything under /api/progress requires authentication.
    let progress_routes = Router::new()
        .route("/", get(progress::get_overall_progress))
        .route("/lesson", post(progress::update_lesson_progress))
        .route("/quiz-history", get(progress::get_quiz_history))
        .route("/awards", get(progress::get_my_awards))
        .route("/emotional-data", post(progress::add_emotional_data))
        .route("/emotional-summary", get(progress::get_emotional_summary))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let module_routes = Router::new()
        .route("/", get(modules::list_modules))
        .route("/{id}", get(modules::get_module))
        .merge(
            Router::new()
                .route("/", post(modules::create_module))
                .route(
                    "/{id}",
                    put(modules::update_module).delete(modules::delete_module),
                )
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let subject_routes = Router::new()
        .route("/", get(subjects::list_subjects))
        .route("/{id}", get(subjects::get_subject))
        .merge(
            Router::new()
                .route("/", post(subjects::create_subject))
                .route(
                    "/{id}",
                    put(subjects::update_subject).delete(subjects::delete_subject),
                )
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let ar_model_routes = Router::new()
        .route("/", get(ar_models::list_ar_models))
        .route("/{id}", get(ar_models::get_ar_model))
        .merge(
            Router::new()
                .route("/", post(ar_models::create_ar_model))
                .route(
                    "/{id}",
                    put(ar_models::update_ar_model)
                        .delete(ar_models::delete_ar_model),
                )
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .route("/", get(root))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/awards", award_routes)
        .nest("/api/progress", progress_routes)
        .nest("/api/modules", module_routes)
        .nest("/api/subjects", subject_routes)
        .nest("/api/armodels", ar_model_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Landing route, handy for checking the service is up.
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to AreaLearn API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
