//! Server configuration, read from the environment.

use std::env;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_PATH: &str = "solvetrack.db";
const DEFAULT_PROFILE_ENDPOINT: &str = "https://leetcode.com/graphql";

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// SQLite database file (`DATABASE_PATH`).
    pub database_path: String,
    /// Allowed CORS origins, comma-separated (`CORS_ORIGINS`).
    pub cors_origins: Vec<String>,
    /// GraphQL endpoint for external profile lookups (`PROFILE_ENDPOINT`).
    pub profile_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            cors_origins: vec!["http://localhost:5173".to_string()],
            profile_endpoint: DEFAULT_PROFILE_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let database_path = env::var("DATABASE_PATH").unwrap_or(defaults.database_path);

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => defaults.cors_origins,
        };

        let profile_endpoint = env::var("PROFILE_ENDPOINT").unwrap_or(defaults.profile_endpoint);

        Self {
            port,
            database_path,
            cors_origins,
            profile_endpoint,
        }
    }
}
