//! HTTP routes for the tracker API

mod analytics;
mod problems;
mod summaries;
mod users;
mod verification;
mod vocab;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::profile::ProfileFetcher;
use crate::state::AppState;
use crate::store::{ProblemDetail, TrackerStore, VocabKind};

/// Create the router with all routes
pub fn create_router<S, P>(state: Arc<AppState<S, P>>) -> Router
where
    S: TrackerStore + 'static,
    P: ProfileFetcher + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/users", post(users::get_or_create_user))
        .route("/users/:user_id/stats", get(users::get_user_stats))
        .route("/problems", post(problems::add_problem))
        .route("/problems/user/:user_id", get(problems::get_user_problems))
        .route(
            "/problems/:problem_id",
            get(problems::get_problem)
                .put(problems::update_problem)
                .delete(problems::delete_problem),
        )
        .nest("/difficulties", vocab_routes(VocabKind::Difficulty))
        .nest("/languages", vocab_routes(VocabKind::Language))
        .nest("/tags", vocab_routes(VocabKind::Tag))
        .route("/daily-summaries", post(summaries::upsert_summary))
        .route("/daily-summaries/auto-calculate", post(summaries::auto_calculate))
        .route("/daily-summaries/user/:user_id", get(summaries::get_user_summaries))
        .route(
            "/daily-summaries/user/:user_id/date/:date",
            get(summaries::get_summary_by_date),
        )
        .route("/daily-summaries/:summary_id", delete(summaries::delete_summary))
        .route("/analytics/user/:user_id", get(analytics::get_user_analytics))
        .route("/analytics/platform", get(analytics::get_platform_analytics))
        .route("/analytics/leaderboard", get(analytics::get_leaderboard))
        .route("/verification/initiate", post(verification::initiate))
        .route("/verification/verify", post(verification::verify))
        .route("/verification/status/:user_id", get(verification::status))
        .route("/verification/remove", delete(verification::remove))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The three vocabularies expose identical sub-routers; the kind travels as
/// an extension so one set of handlers serves all of them.
fn vocab_routes<S, P>(kind: VocabKind) -> Router<Arc<AppState<S, P>>>
where
    S: TrackerStore + 'static,
    P: ProfileFetcher + 'static,
{
    Router::new()
        .route("/", get(vocab::list_all).post(vocab::create))
        .route("/popular", get(vocab::popular))
        .route(
            "/:id",
            get(vocab::get_one).put(vocab::rename).delete(vocab::remove),
        )
        .layer(Extension(kind))
}

/// CORS layer allowing the configured frontend origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Server is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// View of a stored problem as the aggregation layer consumes it.
fn solved_view(problem: &ProblemDetail) -> solvetrack_core::SolvedProblem {
    solvetrack_core::SolvedProblem {
        difficulty: problem.difficulty.clone(),
        language: problem.language.clone(),
        tags: problem.tags.clone(),
        time_spent_min: problem.time_spent_min,
        solved_at: problem.solved_at,
    }
}
