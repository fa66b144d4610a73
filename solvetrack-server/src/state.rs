//! Shared application state

use crate::profile::ProfileFetcher;
use crate::store::TrackerStore;

/// State handed to every route handler, generic over the store and the
/// profile fetcher so tests can substitute in-memory and mock
/// implementations.
pub struct AppState<S: TrackerStore, P: ProfileFetcher> {
    pub store: S,
    pub fetcher: P,
}

impl<S: TrackerStore, P: ProfileFetcher> AppState<S, P> {
    pub fn new(store: S, fetcher: P) -> Self {
        Self { store, fetcher }
    }
}
