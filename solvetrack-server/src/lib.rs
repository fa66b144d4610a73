//! SolveTrack backend
//!
//! REST API for a personal coding-practice tracker: solved problems with
//! their difficulty/language/tag vocabularies, daily practice summaries,
//! derived analytics, and bio-based verification of external profiles.

pub mod config;
pub mod dates;
pub mod error;
pub mod profile;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
pub mod token;
pub mod verification;

pub use config::Config;
pub use error::ApiError;
pub use profile::{HttpProfileFetcher, ProfileFetcher};
pub use state::AppState;
pub use store::{SqliteStore, TrackerStore};
