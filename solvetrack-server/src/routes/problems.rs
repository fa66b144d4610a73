//! Problem CRUD endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::profile::ProfileFetcher;
use crate::response;
use crate::state::AppState;
use crate::store::{NewProblem, ProblemFilter, ProblemUpdate, TrackerStore};

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProblemRequest {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub external_id: Option<i64>,
    pub difficulty: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub time_spent_min: Option<u32>,
    pub solved_at: Option<DateTime<Utc>>,
}

/// POST /problems
pub async fn add_problem<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<AddProblemRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let (Some(user_id), Some(title), Some(external_id), Some(difficulty), Some(language), Some(time_spent_min)) = (
        req.user_id,
        req.title.filter(|t| !t.trim().is_empty()),
        req.external_id,
        req.difficulty.filter(|d| !d.trim().is_empty()),
        req.language.filter(|l| !l.trim().is_empty()),
        req.time_spent_min.filter(|m| *m > 0),
    ) else {
        return Err(ApiError::validation("All required fields must be provided"));
    };

    state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let problem = state.store.create_problem(NewProblem {
        user_id,
        title,
        external_id,
        difficulty,
        language,
        tags: req.tags,
        time_spent_min,
        solved_at: req.solved_at,
    })?;

    Ok(response::created(problem, "Problem added successfully"))
}

#[derive(Deserialize)]
pub struct ProblemListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub difficulty: Option<String>,
    pub language: Option<String>,
    pub tag: Option<String>,
}

/// GET /problems/user/:user_id
pub async fn get_user_problems<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(user_id): Path<String>,
    Query(query): Query<ProblemListQuery>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let filter = ProblemFilter {
        difficulty: query.difficulty,
        language: query.language,
        tag: query.tag,
    };

    let (problems, total) = state
        .store
        .list_user_problems(&user_id, &filter, offset, limit)?;

    let data = json!({
        "problems": problems,
        "pagination": {
            "currentPage": page,
            "totalPages": total.div_ceil(limit),
            "totalProblems": total,
            "hasNext": offset + limit < total,
            "hasPrev": page > 1,
        },
    });

    Ok(response::ok(data, "Problems retrieved successfully"))
}

/// GET /problems/:problem_id
pub async fn get_problem<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(problem_id): Path<String>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let problem = state
        .store
        .get_problem(&problem_id)?
        .ok_or_else(|| ApiError::not_found("Problem not found"))?;

    Ok(response::ok(problem, "Problem retrieved successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProblemRequest {
    pub title: Option<String>,
    pub difficulty: Option<String>,
    pub language: Option<String>,
    pub tags: Option<Vec<String>>,
    pub time_spent_min: Option<u32>,
}

/// PUT /problems/:problem_id
pub async fn update_problem<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(problem_id): Path<String>,
    Json(req): Json<UpdateProblemRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let update = ProblemUpdate {
        title: req.title.filter(|t| !t.trim().is_empty()),
        difficulty: req.difficulty.filter(|d| !d.trim().is_empty()),
        language: req.language.filter(|l| !l.trim().is_empty()),
        tags: req.tags,
        time_spent_min: req.time_spent_min.filter(|m| *m > 0),
    };

    let problem = state
        .store
        .update_problem(&problem_id, update)?
        .ok_or_else(|| ApiError::not_found("Problem not found"))?;

    Ok(response::ok(problem, "Problem updated successfully"))
}

/// DELETE /problems/:problem_id
pub async fn delete_problem<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(problem_id): Path<String>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    if !state.store.delete_problem(&problem_id)? {
        return Err(ApiError::not_found("Problem not found"));
    }

    Ok(response::ok(
        serde_json::Value::Null,
        "Problem deleted successfully",
    ))
}
