//! Daily-summary endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use solvetrack_core::summary_stats;

use crate::dates::{day_end, day_start, parse_day};
use crate::error::ApiError;
use crate::profile::ProfileFetcher;
use crate::response;
use crate::state::AppState;
use crate::store::TrackerStore;

const DEFAULT_LIST_LIMIT: u64 = 30;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSummaryRequest {
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub total_minutes: Option<u32>,
}

/// POST /daily-summaries
pub async fn upsert_summary<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<UpsertSummaryRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let (Some(user_id), Some(date), Some(total_minutes)) =
        (req.user_id, req.date, req.total_minutes)
    else {
        return Err(ApiError::validation(
            "User ID, date, and total minutes are required",
        ));
    };

    state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let date = parse_day(&date)?;
    let (summary, created) = state.store.upsert_summary(&user_id, date, total_minutes)?;

    if created {
        Ok(response::created(summary, "Daily summary created successfully"))
    } else {
        Ok(response::ok(summary, "Daily summary updated successfully"))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCalculateRequest {
    pub user_id: Option<String>,
    pub date: Option<String>,
}

/// POST /daily-summaries/auto-calculate
///
/// Derives the day's total from the problems solved during the local
/// calendar day instead of trusting a client-supplied figure.
pub async fn auto_calculate<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<AutoCalculateRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let (Some(user_id), Some(date)) = (req.user_id, req.date) else {
        return Err(ApiError::validation("User ID and date are required"));
    };

    let day = parse_day(&date)?;
    let problems =
        state
            .store
            .user_problems_in_range(&user_id, Some(day_start(day)), Some(day_end(day)))?;

    let total_minutes: u32 = problems.iter().map(|p| p.time_spent_min).sum();
    if total_minutes == 0 {
        return Err(ApiError::not_found("No problems found for the specified date"));
    }

    let (summary, _) = state.store.upsert_summary(&user_id, day, total_minutes)?;

    let data = json!({
        "summary": summary,
        "problemsCount": problems.len(),
        "problemsOnDate": problems,
    });

    Ok(response::ok(data, "Daily summary auto-calculated successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u64>,
}

/// GET /daily-summaries/user/:user_id
pub async fn get_user_summaries<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(user_id): Path<String>,
    Query(query): Query<SummaryListQuery>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let start = query.start_date.as_deref().map(parse_day).transpose()?;
    let end = query.end_date.as_deref().map(parse_day).transpose()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 365);

    let summaries = state.store.list_summaries(&user_id, start, end, limit)?;

    let minutes: Vec<u32> = summaries.iter().map(|s| s.total_minutes).collect();
    let stats = summary_stats(&minutes);

    let data = json!({ "summaries": summaries, "stats": stats });
    Ok(response::ok(data, "Daily summaries retrieved successfully"))
}

/// GET /daily-summaries/user/:user_id/date/:date
pub async fn get_summary_by_date<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path((user_id, date)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let day = parse_day(&date)?;
    let summary = state
        .store
        .get_summary_by_date(&user_id, day)?
        .ok_or_else(|| ApiError::not_found("Daily summary not found for the specified date"))?;

    Ok(response::ok(summary, "Daily summary retrieved successfully"))
}

/// DELETE /daily-summaries/:summary_id
pub async fn delete_summary<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(summary_id): Path<String>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    if !state.store.delete_summary(&summary_id)? {
        return Err(ApiError::not_found("Daily summary not found"));
    }

    Ok(response::ok(
        serde_json::Value::Null,
        "Daily summary deleted successfully",
    ))
}
