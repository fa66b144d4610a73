//! User endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use solvetrack_core::{current_streak, user_analytics, Breakdown};

use crate::dates::today_local;
use crate::error::ApiError;
use crate::profile::ProfileFetcher;
use crate::response;
use crate::state::AppState;
use crate::store::{DailySummary, ProblemDetail, TrackerStore, User};

/// Summaries returned inline with a user; effectively "all of them".
const SUMMARY_LIST_MAX: u64 = 10_000;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRelations {
    #[serde(flatten)]
    pub user: User,
    pub problems_solved: Vec<ProblemDetail>,
    pub summaries: Vec<DailySummary>,
}

/// POST /users
pub async fn get_or_create_user<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let username = req
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::validation("Username is required"))?;

    let user = state.store.get_or_create_user(username)?;
    let problems_solved = state.store.user_problems_in_range(&user.id, None, None)?;
    let summaries = state
        .store
        .list_summaries(&user.id, None, None, SUMMARY_LIST_MAX)?;

    Ok(response::ok(
        UserWithRelations {
            user,
            problems_solved,
            summaries,
        },
        "User retrieved/created successfully",
    ))
}

/// GET /users/:user_id/stats
pub async fn get_user_stats<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let user = state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let problems = state.store.user_problems_in_range(&user.id, None, None)?;
    let solved: Vec<_> = problems.iter().map(super::solved_view).collect();
    let analytics = user_analytics(&solved);

    let recent_summaries = state.store.list_summaries(&user.id, None, None, 30)?;

    let solved_days: Vec<_> = problems
        .iter()
        .map(|p| p.solved_at.with_timezone(&Local).date_naive())
        .collect();
    let streak = current_streak(&solved_days, today_local());

    let stats = json!({
        "user": { "id": user.id, "username": user.username },
        "totalProblems": analytics.overview.total_problems,
        "difficultyBreakdown": count_map(&analytics.difficulty_breakdown),
        "languageBreakdown": count_map(&analytics.language_breakdown),
        "totalTimeSpent": analytics.overview.total_time_spent,
        "currentStreak": streak,
        "recentSummaries": recent_summaries,
    });

    Ok(response::ok(stats, "User statistics retrieved successfully"))
}

/// Label-to-count object in first-seen order; the stats endpoint reports
/// counts without the per-label time totals.
fn count_map(breakdown: &Breakdown) -> serde_json::Map<String, serde_json::Value> {
    breakdown
        .iter()
        .map(|(label, stat)| (label.to_string(), stat.count.into()))
        .collect()
}
