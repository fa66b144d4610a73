//! Profile-verification endpoints.
//!
//! Ownership of an external profile is proven by placing a short-lived code
//! in the profile's public bio and asking us to check for it.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::profile::ProfileFetcher;
use crate::response;
use crate::state::AppState;
use crate::store::TrackerStore;
use crate::verification::{code_expiry, generate_verification_code, verification_instructions};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub user_id: Option<String>,
    pub profile_username: Option<String>,
}

/// POST /verification/initiate
pub async fn initiate<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<VerificationRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let (Some(user_id), Some(profile_username)) = (req.user_id, req.profile_username) else {
        return Err(ApiError::validation(
            "Profile username and user ID are required",
        ));
    };

    state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if state
        .store
        .find_verified_claim(&profile_username, &user_id)?
        .is_some()
    {
        return Err(ApiError::conflict(
            "This profile is already verified by another user",
        ));
    }

    let code = generate_verification_code();
    state
        .store
        .upsert_pending_verification(&user_id, &profile_username, &code, code_expiry())?;

    tracing::info!(user_id = %user_id, profile = %profile_username, "verification initiated");

    let data = json!({
        "verificationCode": code,
        "instructions": verification_instructions(),
    });

    Ok(response::ok(
        data,
        "Verification initiated. Please follow the instructions to verify your profile.",
    ))
}

/// POST /verification/verify
pub async fn verify<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<VerificationRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore + 'static,
    P: ProfileFetcher + 'static,
{
    let (Some(user_id), Some(profile_username)) = (req.user_id, req.profile_username) else {
        return Err(ApiError::validation(
            "User ID and profile username are required",
        ));
    };

    let verification = state
        .store
        .get_verification(&user_id, &profile_username)?
        .ok_or_else(|| {
            ApiError::not_found("No verification request found. Please initiate verification first.")
        })?;

    if verification.expires_at < Utc::now() {
        return Err(ApiError::Expired(
            "Verification code has expired. Please initiate verification again.".to_string(),
        ));
    }

    if verification.verified {
        return Err(ApiError::validation("Profile is already verified"));
    }

    // The fetcher uses a blocking HTTP client; keep it off the async runtime.
    let fetch_state = state.clone();
    let username = profile_username.clone();
    let bio = tokio::task::spawn_blocking(move || fetch_state.fetcher.fetch_bio(&username))
        .await
        .map_err(|e| ApiError::Internal(format!("profile lookup task failed: {e}")))?
        .map_err(ApiError::Internal)?;

    if !bio.contains(&verification.code) {
        return Err(ApiError::validation(
            "Verification code not found in your profile bio. \
             Please make sure you added the code and saved your profile.",
        ));
    }

    state
        .store
        .mark_verified(&user_id, &profile_username, Utc::now())?;
    state
        .store
        .set_profile_username(&user_id, Some(&profile_username))?;

    tracing::info!(user_id = %user_id, profile = %profile_username, "profile verified");

    let data = json!({ "verified": true, "profileUsername": profile_username });
    Ok(response::ok(data, "Profile verified successfully!"))
}

/// GET /verification/status/:user_id
pub async fn status<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let latest = state.store.latest_verified(&user_id)?;

    let data = json!({
        "hasVerifiedProfile": latest.is_some(),
        "verifiedUsername": latest.as_ref().map(|v| v.profile_username.clone()),
        "verifiedAt": latest.as_ref().and_then(|v| v.verified_at),
    });

    Ok(response::ok(data, "Verification status retrieved"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub user_id: Option<String>,
}

/// DELETE /verification/remove
pub async fn remove<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<RemoveRequest>,
) -> Result<Response, ApiError>
where
    S: TrackerStore,
    P: ProfileFetcher,
{
    let user_id = req
        .user_id
        .ok_or_else(|| ApiError::validation("User ID is required"))?;

    state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    state.store.delete_user_verifications(&user_id)?;
    state.store.set_profile_username(&user_id, None)?;

    Ok(response::ok(
        json!({}),
        "Profile verification removed successfully",
    ))
}
