//! Analytics endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use solvetrack_core::{platform_overview, rank_leaderboard, user_analytics, LeaderboardEntry};

use crate::dates::{day_end, day_start, parse_day};
use crate::error::ApiError;
use crate::profile::ProfileFetcher;
use crate::response;
use crate::state::AppState;
use crate::store::TrackerStore;

const DEFAULT_LEADERBOARD_LIMIT: u64 = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /analytics/user/:user_id
pub async fn get_user_analytics<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(user_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let user = state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let start = query
        .start_date
        .as_deref()
        .map(parse_day)
        .transpose()?
        .map(day_start);
    let end = query
        .end_date
        .as_deref()
        .map(parse_day)
        .transpose()?
        .map(day_end);

    let problems = state.store.user_problems_in_range(&user.id, start, end)?;
    let solved: Vec<_> = problems.iter().map(super::solved_view).collect();
    let analytics = user_analytics(&solved);

    let data = json!({
        "user": { "id": user.id, "username": user.username },
        "overview": analytics.overview,
        "difficultyBreakdown": analytics.difficulty_breakdown,
        "languageBreakdown": analytics.language_breakdown,
        "topTags": analytics.top_tags,
        "dateRange": {
            "startDate": query.start_date,
            "endDate": query.end_date,
        },
    });

    Ok(response::ok(data, "Analytics retrieved successfully"))
}

/// GET /analytics/platform
pub async fn get_platform_analytics<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let total_users = state.store.count_users()?;
    let total_problems = state.store.count_problems()?;
    let total_time_spent = state.store.total_time_spent()?;

    let overview = platform_overview(total_users, total_problems, total_time_spent);

    Ok(response::ok(
        json!({ "overview": overview }),
        "Platform analytics retrieved successfully",
    ))
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u64>,
}

/// GET /analytics/leaderboard
pub async fn get_leaderboard<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, 100) as usize;

    // Totals arrive in registration order, so count ties rank the earlier
    // registration first.
    let entries: Vec<LeaderboardEntry> = state
        .store
        .user_problem_totals()?
        .into_iter()
        .map(|t| LeaderboardEntry {
            id: t.user.id,
            username: t.user.username,
            problem_count: t.problem_count,
            total_time_spent: t.total_time_spent,
        })
        .collect();

    let ranked = rank_leaderboard(entries, limit);

    Ok(response::ok(ranked, "Leaderboard retrieved successfully"))
}
