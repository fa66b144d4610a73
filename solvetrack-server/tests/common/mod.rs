//! Common test utilities for API integration tests

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum_test::TestServer;
use serde_json::{json, Value};
use solvetrack_server::{routes, AppState, ProfileFetcher, SqliteStore};

/// Mock profile fetcher backed by an in-memory bio table
#[derive(Default, Clone)]
pub struct MockProfileFetcher {
    bios: Arc<RwLock<HashMap<String, String>>>,
}

impl MockProfileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bio the fetcher returns for a profile
    pub fn set_bio(&self, username: &str, bio: &str) {
        self.bios
            .write()
            .unwrap()
            .insert(username.to_string(), bio.to_string());
    }
}

impl ProfileFetcher for MockProfileFetcher {
    fn fetch_bio(&self, username: &str) -> Result<String, String> {
        self.bios
            .read()
            .unwrap()
            .get(username)
            .cloned()
            .ok_or_else(|| format!("profile '{username}' not found"))
    }
}

/// Create a test server over an in-memory database plus the mock fetcher
pub fn create_test_server() -> (TestServer, MockProfileFetcher) {
    let store = SqliteStore::open_in_memory().expect("Failed to open in-memory store");
    let fetcher = MockProfileFetcher::new();

    let state = Arc::new(AppState::new(store, fetcher.clone()));
    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, fetcher)
}

/// Create a user and return its id
pub async fn create_user(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/users")
        .json(&json!({ "username": username }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    body["data"]["id"]
        .as_str()
        .expect("user id in response")
        .to_string()
}

/// Add a problem for a user and return its id
#[allow(dead_code)]
pub async fn add_problem(
    server: &TestServer,
    user_id: &str,
    title: &str,
    difficulty: &str,
    language: &str,
    tags: &[&str],
    minutes: u32,
) -> String {
    let response = server
        .post("/problems")
        .json(&json!({
            "userId": user_id,
            "title": title,
            "externalId": 1,
            "difficulty": difficulty,
            "language": language,
            "tags": tags,
            "timeSpentMin": minutes,
        }))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    body["data"]["id"]
        .as_str()
        .expect("problem id in response")
        .to_string()
}
