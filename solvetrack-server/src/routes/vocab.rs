//! Reference-vocabulary endpoints, shared by /tags, /languages, and
//! /difficulties. The concrete kind arrives as a router extension.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::profile::ProfileFetcher;
use crate::response;
use crate::state::AppState;
use crate::store::{TrackerStore, VocabKind};

const DEFAULT_POPULAR_LIMIT: u64 = 10;

/// The difficulty scale is closed; the other vocabularies are free-form.
const DIFFICULTY_LEVELS: [&str; 3] = ["Easy", "Medium", "Hard"];

fn validate_name(kind: VocabKind, name: Option<&str>) -> Result<String, ApiError> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{} name is required", kind.label())))?;

    if kind == VocabKind::Difficulty && !DIFFICULTY_LEVELS.contains(&name) {
        return Err(ApiError::validation(
            "Difficulty level must be one of: Easy, Medium, Hard",
        ));
    }
    Ok(name.to_string())
}

/// GET /{vocab}/
pub async fn list_all<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(kind): Extension<VocabKind>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let entries = state.store.list_vocab(kind)?;
    Ok(response::ok(
        entries,
        format!("{} retrieved successfully", kind.label_plural()),
    ))
}

#[derive(Deserialize)]
pub struct VocabNameRequest {
    pub name: Option<String>,
}

/// POST /{vocab}/
pub async fn create<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(kind): Extension<VocabKind>,
    Json(req): Json<VocabNameRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let name = validate_name(kind, req.name.as_deref())?;
    let entry = state.store.create_vocab(kind, &name)?;
    Ok(response::created(
        entry,
        format!("{} created successfully", kind.label()),
    ))
}

/// GET /{vocab}/:id
pub async fn get_one<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(kind): Extension<VocabKind>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let entry = state
        .store
        .get_vocab(kind, id)?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", kind.label())))?;
    let problems = state.store.vocab_problems(kind, id)?;

    let data = json!({
        "id": entry.id,
        "name": entry.name,
        "problemCount": entry.problem_count,
        "problems": problems,
    });

    Ok(response::ok(
        data,
        format!("{} retrieved successfully", kind.label()),
    ))
}

/// PUT /{vocab}/:id
pub async fn rename<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(kind): Extension<VocabKind>,
    Path(id): Path<i64>,
    Json(req): Json<VocabNameRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let name = validate_name(kind, req.name.as_deref())?;
    let entry = state.store.rename_vocab(kind, id, &name)?;
    Ok(response::ok(
        entry,
        format!("{} updated successfully", kind.label()),
    ))
}

/// DELETE /{vocab}/:id
pub async fn remove<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(kind): Extension<VocabKind>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    state.store.delete_vocab(kind, id)?;
    Ok(response::ok(
        serde_json::Value::Null,
        format!("{} deleted successfully", kind.label()),
    ))
}

#[derive(Deserialize)]
pub struct PopularQuery {
    pub limit: Option<u64>,
}

/// GET /{vocab}/popular
pub async fn popular<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Extension(kind): Extension<VocabKind>,
    Query(query): Query<PopularQuery>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT).clamp(1, 100);
    let entries = state.store.popular_vocab(kind, limit)?;
    Ok(response::ok(
        entries,
        format!(
            "Popular {} retrieved successfully",
            kind.label_plural().to_lowercase()
        ),
    ))
}
