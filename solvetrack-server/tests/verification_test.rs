//! Tests for the profile-verification workflow

mod common;

use common::{create_test_server, create_user};
use serde_json::{json, Value};

/// Test: the full initiate-then-verify flow
#[tokio::test]
async fn test_verification_flow() {
    let (server, fetcher) = create_test_server();
    let user_id = create_user(&server, "alice").await;

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": user_id, "profileUsername": "alice_codes" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let code = body["data"]["verificationCode"].as_str().unwrap().to_string();
    assert!(code.starts_with("solvetrack-"));
    assert!(!body["data"]["instructions"].as_array().unwrap().is_empty());

    // The user pastes the code into their public bio.
    fetcher.set_bio("alice_codes", &format!("Solving problems daily. {code}"));

    let response = server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "alice_codes" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["verified"], true);
    assert_eq!(body["data"]["profileUsername"], "alice_codes");

    let response = server
        .get(&format!("/verification/status/{user_id}"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["hasVerifiedProfile"], true);
    assert_eq!(body["data"]["verifiedUsername"], "alice_codes");
    assert!(body["data"]["verifiedAt"].as_str().is_some());
}

/// Test: verifying without initiating first is 404
#[tokio::test]
async fn test_verify_before_initiate() {
    let (server, _) = create_test_server();
    let user_id = create_user(&server, "bob").await;

    let response = server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "bob_codes" }))
        .await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "No verification request found. Please initiate verification first."
    );
}

/// Test: a bio without the code fails verification
#[tokio::test]
async fn test_code_missing_from_bio() {
    let (server, fetcher) = create_test_server();
    let user_id = create_user(&server, "carol").await;

    server
        .post("/verification/initiate")
        .json(&json!({ "userId": user_id, "profileUsername": "carol_codes" }))
        .await;

    fetcher.set_bio("carol_codes", "No code here.");

    let response = server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "carol_codes" }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Verification code not found"));

    // Status stays unverified.
    let response = server
        .get(&format!("/verification/status/{user_id}"))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["hasVerifiedProfile"], false);
    assert_eq!(body["data"]["verifiedUsername"], Value::Null);
}

/// Test: a verified record cannot be verified twice
#[tokio::test]
async fn test_verify_twice() {
    let (server, fetcher) = create_test_server();
    let user_id = create_user(&server, "dave").await;

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": user_id, "profileUsername": "dave_codes" }))
        .await;
    let body: Value = response.json();
    let code = body["data"]["verificationCode"].as_str().unwrap().to_string();
    fetcher.set_bio("dave_codes", &code);

    server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "dave_codes" }))
        .await;

    let response = server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "dave_codes" }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Profile is already verified");
}

/// Test: a profile verified by one user cannot be claimed by another
#[tokio::test]
async fn test_profile_claimed_by_another_user() {
    let (server, fetcher) = create_test_server();
    let first = create_user(&server, "erin").await;
    let second = create_user(&server, "frank").await;

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": first, "profileUsername": "shared_profile" }))
        .await;
    let body: Value = response.json();
    let code = body["data"]["verificationCode"].as_str().unwrap().to_string();
    fetcher.set_bio("shared_profile", &code);

    server
        .post("/verification/verify")
        .json(&json!({ "userId": first, "profileUsername": "shared_profile" }))
        .await;

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": second, "profileUsername": "shared_profile" }))
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "This profile is already verified by another user"
    );
}

/// Test: re-initiating rotates the code and resets the pending record
#[tokio::test]
async fn test_reinitiate_rotates_code() {
    let (server, fetcher) = create_test_server();
    let user_id = create_user(&server, "grace").await;

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": user_id, "profileUsername": "grace_codes" }))
        .await;
    let body: Value = response.json();
    let first_code = body["data"]["verificationCode"].as_str().unwrap().to_string();

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": user_id, "profileUsername": "grace_codes" }))
        .await;
    let body: Value = response.json();
    let second_code = body["data"]["verificationCode"].as_str().unwrap().to_string();
    assert_ne!(first_code, second_code);

    // The stale code no longer verifies.
    fetcher.set_bio("grace_codes", &first_code);
    let response = server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "grace_codes" }))
        .await;
    assert_eq!(response.status_code(), 400);

    fetcher.set_bio("grace_codes", &second_code);
    let response = server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "grace_codes" }))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Test: an expired code fails even when the bio contains it
#[tokio::test]
async fn test_expired_code() {
    use std::sync::Arc;

    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use common::MockProfileFetcher;
    use solvetrack_server::{routes, AppState, SqliteStore, TrackerStore};

    // Seed the store with an already-expired pending record before wiring
    // the server around it.
    let store = SqliteStore::open_in_memory().unwrap();
    let user = store.get_or_create_user("kate").unwrap();
    let code = "solvetrack-abc123-1692123456789";
    store
        .upsert_pending_verification(
            &user.id,
            "kate_codes",
            code,
            Utc::now() - Duration::hours(1),
        )
        .unwrap();

    let fetcher = MockProfileFetcher::new();
    fetcher.set_bio("kate_codes", code);

    let state = Arc::new(AppState::new(store, fetcher));
    let server = TestServer::new(routes::create_router(state)).unwrap();

    let response = server
        .post("/verification/verify")
        .json(&json!({ "userId": user.id, "profileUsername": "kate_codes" }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "Verification code has expired. Please initiate verification again."
    );
}

/// Test: an unreachable profile surfaces as a server error
#[tokio::test]
async fn test_profile_lookup_failure() {
    let (server, _) = create_test_server();
    let user_id = create_user(&server, "henry").await;

    server
        .post("/verification/initiate")
        .json(&json!({ "userId": user_id, "profileUsername": "missing_profile" }))
        .await;

    // No bio registered in the fetcher, so the lookup itself fails.
    let response = server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "missing_profile" }))
        .await;
    assert_eq!(response.status_code(), 500);
}

/// Test: removal clears verification state
#[tokio::test]
async fn test_remove_verification() {
    let (server, fetcher) = create_test_server();
    let user_id = create_user(&server, "iris").await;

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": user_id, "profileUsername": "iris_codes" }))
        .await;
    let body: Value = response.json();
    let code = body["data"]["verificationCode"].as_str().unwrap().to_string();
    fetcher.set_bio("iris_codes", &code);

    server
        .post("/verification/verify")
        .json(&json!({ "userId": user_id, "profileUsername": "iris_codes" }))
        .await;

    let response = server
        .delete("/verification/remove")
        .json(&json!({ "userId": user_id }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .get(&format!("/verification/status/{user_id}"))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["hasVerifiedProfile"], false);

    // The profile is free for someone else now.
    let other = create_user(&server, "jack").await;
    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": other, "profileUsername": "iris_codes" }))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Test: initiating for an unknown user is 404, missing fields are 400
#[tokio::test]
async fn test_initiate_validation() {
    let (server, _) = create_test_server();

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "userId": "nonexistent", "profileUsername": "someone" }))
        .await;
    assert_eq!(response.status_code(), 404);

    let response = server
        .post("/verification/initiate")
        .json(&json!({ "profileUsername": "someone" }))
        .await;
    assert_eq!(response.status_code(), 400);
}
