//! External profile lookup.
//!
//! Fetching the claimed profile's public biography is a collaborator
//! boundary: the verification workflow only owns the match logic. The HTTP
//! implementation talks to the practice site's GraphQL endpoint; tests plug
//! in a mock.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;

/// Trait for fetching the public biography of an external profile
pub trait ProfileFetcher: Send + Sync {
    /// Fetch the profile's biography text. `Err` means the lookup itself
    /// failed (network, parse); an existing profile with an empty bio is
    /// `Ok(String::new())`.
    fn fetch_bio(&self, username: &str) -> Result<String, String>;
}

/// Allow using Box<dyn ProfileFetcher> as a ProfileFetcher
impl ProfileFetcher for Box<dyn ProfileFetcher> {
    fn fetch_bio(&self, username: &str) -> Result<String, String> {
        (**self).fetch_bio(username)
    }
}

const PROFILE_QUERY: &str = "query userPublicProfile($username: String!) { \
     matchedUser(username: $username) { profile { aboutMe } } }";

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

/// GraphQL-based fetcher for the practice site's public profile endpoint.
///
/// Uses a blocking client; callers run it inside a blocking task.
pub struct HttpProfileFetcher {
    client: Client,
    endpoint: String,
}

impl HttpProfileFetcher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl ProfileFetcher for HttpProfileFetcher {
    fn fetch_bio(&self, username: &str) -> Result<String, String> {
        let body = GraphqlRequest {
            query: PROFILE_QUERY,
            variables: serde_json::json!({ "username": username }),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| format!("profile request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("profile request failed: HTTP {}", response.status()));
        }

        let payload: Value = response
            .json()
            .map_err(|e| format!("profile response was not JSON: {e}"))?;

        let matched = payload
            .get("data")
            .and_then(|d| d.get("matchedUser"))
            .ok_or_else(|| "profile response missing matchedUser".to_string())?;

        if matched.is_null() {
            return Err(format!("profile '{username}' not found"));
        }

        // A profile without a bio is an empty string, not a lookup failure.
        Ok(matched
            .get("profile")
            .and_then(|p| p.get("aboutMe"))
            .and_then(|b| b.as_str())
            .unwrap_or_default()
            .to_string())
    }
}
