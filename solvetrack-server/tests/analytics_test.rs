//! Tests for analytics endpoints

mod common;

use common::{add_problem, create_test_server, create_user};
use serde_json::{json, Value};

/// Test: user analytics aggregates overview, breakdowns, and top tags
#[tokio::test]
async fn test_user_analytics() {
    let (server, _) = create_test_server();
    let user_id = create_user(&server, "alice").await;

    add_problem(&server, &user_id, "A", "Easy", "Rust", &["array"], 10).await;
    add_problem(&server, &user_id, "B", "Easy", "Python", &["array", "dp"], 20).await;
    add_problem(&server, &user_id, "C", "Hard", "Rust", &["graph"], 60).await;

    let response = server.get(&format!("/analytics/user/{user_id}")).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let data = &body["data"];

    assert_eq!(data["user"]["username"], "alice");
    assert_eq!(data["overview"]["totalProblems"], 3);
    assert_eq!(data["overview"]["totalTimeSpent"], 90);
    assert_eq!(data["overview"]["averageTimePerProblem"], 30.0);

    assert_eq!(data["difficultyBreakdown"]["Easy"]["count"], 2);
    assert_eq!(data["difficultyBreakdown"]["Easy"]["timeSpent"], 30);
    assert_eq!(data["difficultyBreakdown"]["Hard"]["count"], 1);
    assert_eq!(data["languageBreakdown"]["Rust"]["count"], 2);

    assert_eq!(data["topTags"]["array"]["count"], 2);
    assert_eq!(data["topTags"]["dp"]["count"], 1);

    assert_eq!(data["dateRange"]["startDate"], Value::Null);
    assert_eq!(data["dateRange"]["endDate"], Value::Null);
}

/// Test: analytics for an unknown user is 404
#[tokio::test]
async fn test_user_analytics_unknown_user() {
    let (server, _) = create_test_server();

    let response = server.get("/analytics/user/nonexistent").await;
    assert_eq!(response.status_code(), 404);
}

/// Test: the date range excludes problems outside it and is echoed back
#[tokio::test]
async fn test_user_analytics_date_range() {
    let (server, _) = create_test_server();
    let user_id = create_user(&server, "bob").await;

    // Solved now; a window far in the past must exclude it.
    add_problem(&server, &user_id, "A", "Easy", "Rust", &[], 10).await;

    let response = server
        .get(&format!(
            "/analytics/user/{user_id}?startDate=2020-01-01&endDate=2020-12-31"
        ))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let data = &body["data"];

    assert_eq!(data["overview"]["totalProblems"], 0);
    assert_eq!(data["overview"]["averageTimePerProblem"], 0.0);
    assert_eq!(data["dateRange"]["startDate"], "2020-01-01");
    assert_eq!(data["dateRange"]["endDate"], "2020-12-31");
}

/// Test: platform analytics covers every user
#[tokio::test]
async fn test_platform_analytics() {
    let (server, _) = create_test_server();
    let alice = create_user(&server, "alice").await;
    let bob = create_user(&server, "bob").await;

    add_problem(&server, &alice, "A", "Easy", "Rust", &[], 10).await;
    add_problem(&server, &alice, "B", "Easy", "Rust", &[], 20).await;
    add_problem(&server, &bob, "C", "Hard", "Python", &[], 60).await;

    let response = server.get("/analytics/platform").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let overview = &body["data"]["overview"];

    assert_eq!(overview["totalUsers"], 2);
    assert_eq!(overview["totalProblems"], 3);
    assert_eq!(overview["totalTimeSpent"], 90);
    assert_eq!(overview["averageProblemsPerUser"], 1.5);
}

/// Test: empty platform reports zeroes
#[tokio::test]
async fn test_platform_analytics_empty() {
    let (server, _) = create_test_server();

    let response = server.get("/analytics/platform").await;
    let body: Value = response.json();
    let overview = &body["data"]["overview"];
    assert_eq!(overview["totalUsers"], 0);
    assert_eq!(overview["averageProblemsPerUser"], 0.0);
}

/// Test: the leaderboard ranks by problem count and honors the limit
#[tokio::test]
async fn test_leaderboard() {
    let (server, _) = create_test_server();
    let alice = create_user(&server, "alice").await;
    let bob = create_user(&server, "bob").await;
    let carol = create_user(&server, "carol").await;

    add_problem(&server, &bob, "A", "Easy", "Rust", &[], 10).await;
    add_problem(&server, &bob, "B", "Easy", "Rust", &[], 10).await;
    add_problem(&server, &carol, "C", "Easy", "Rust", &[], 10).await;
    let _ = alice;

    let response = server.get("/analytics/leaderboard?limit=2").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let entries = body["data"].as_array().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["username"], "bob");
    assert_eq!(entries[0]["problemCount"], 2);
    assert_eq!(entries[0]["totalTimeSpent"], 20);
    assert_eq!(entries[1]["username"], "carol");
}
