//! Storage abstractions for the tracker

pub mod models;
pub mod sqlite;

pub use models::*;
pub use sqlite::SqliteStore;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ApiError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ApiError>;

/// Trait for tracker persistence: users, problems, reference vocabularies,
/// daily summaries, and profile-verification records.
pub trait TrackerStore: Send + Sync {
    // --- users ---

    /// Fetch the user with this display name, creating it on first reference.
    fn get_or_create_user(&self, username: &str) -> StoreResult<User>;

    fn get_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// Link or clear the user's external profile name.
    fn set_profile_username(
        &self,
        user_id: &str,
        profile_username: Option<&str>,
    ) -> StoreResult<()>;

    fn count_users(&self) -> StoreResult<u64>;

    /// Every user with their problem count and total time, for the
    /// leaderboard.
    fn user_problem_totals(&self) -> StoreResult<Vec<UserProblemTotals>>;

    // --- problems ---

    /// Insert a problem, get-or-creating its vocabulary rows.
    fn create_problem(&self, new: NewProblem) -> StoreResult<ProblemDetail>;

    fn get_problem(&self, problem_id: &str) -> StoreResult<Option<ProblemDetail>>;

    /// Apply a partial update; returns `None` when the problem is absent.
    fn update_problem(
        &self,
        problem_id: &str,
        update: ProblemUpdate,
    ) -> StoreResult<Option<ProblemDetail>>;

    /// Returns whether a row was deleted.
    fn delete_problem(&self, problem_id: &str) -> StoreResult<bool>;

    /// Filtered page of a user's problems (solved-at descending) plus the
    /// total matching count.
    fn list_user_problems(
        &self,
        user_id: &str,
        filter: &ProblemFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<ProblemDetail>, u64)>;

    /// All of a user's problems inside an optional solved-at range,
    /// solved-at descending.
    fn user_problems_in_range(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<ProblemDetail>>;

    fn count_problems(&self) -> StoreResult<u64>;

    /// Sum of time spent across all problems on the platform.
    fn total_time_spent(&self) -> StoreResult<u64>;

    // --- reference vocabularies ---

    fn list_vocab(&self, kind: VocabKind) -> StoreResult<Vec<VocabEntry>>;

    /// Create a named entry; conflict when the name is taken.
    fn create_vocab(&self, kind: VocabKind, name: &str) -> StoreResult<VocabEntry>;

    /// Race-free get-or-create: a conditional insert with conflict handling,
    /// then a re-fetch. Concurrent callers converge on one row.
    fn get_or_create_vocab(&self, kind: VocabKind, name: &str) -> StoreResult<VocabEntry>;

    fn get_vocab(&self, kind: VocabKind, id: i64) -> StoreResult<Option<VocabEntry>>;

    /// Problems carrying this entry, solved-at descending.
    fn vocab_problems(&self, kind: VocabKind, id: i64) -> StoreResult<Vec<ProblemDetail>>;

    /// Rename; not-found when absent, conflict when the name belongs to a
    /// different entry.
    fn rename_vocab(&self, kind: VocabKind, id: i64, name: &str) -> StoreResult<VocabEntry>;

    /// Delete; not-found when absent, conflict while the usage count is
    /// nonzero.
    fn delete_vocab(&self, kind: VocabKind, id: i64) -> StoreResult<()>;

    /// Entries ordered by usage count descending.
    fn popular_vocab(&self, kind: VocabKind, limit: u64) -> StoreResult<Vec<VocabEntry>>;

    // --- daily summaries ---

    /// Upsert the (user, day) row; the bool is true when a row was created.
    fn upsert_summary(
        &self,
        user_id: &str,
        date: NaiveDate,
        total_minutes: u32,
    ) -> StoreResult<(DailySummary, bool)>;

    /// Date-desc listing inside an optional range, capped at `limit`.
    fn list_summaries(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: u64,
    ) -> StoreResult<Vec<DailySummary>>;

    fn get_summary_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<DailySummary>>;

    fn get_summary(&self, summary_id: &str) -> StoreResult<Option<DailySummary>>;

    fn delete_summary(&self, summary_id: &str) -> StoreResult<bool>;

    // --- profile verification ---

    /// A *verified* record claiming this profile username under any user
    /// other than `excluding_user`.
    fn find_verified_claim(
        &self,
        profile_username: &str,
        excluding_user: &str,
    ) -> StoreResult<Option<ProfileVerification>>;

    /// Write a fresh pending record for the (user, profile username) pair,
    /// overwriting any prior unverified one.
    fn upsert_pending_verification(
        &self,
        user_id: &str,
        profile_username: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<ProfileVerification>;

    fn get_verification(
        &self,
        user_id: &str,
        profile_username: &str,
    ) -> StoreResult<Option<ProfileVerification>>;

    fn mark_verified(
        &self,
        user_id: &str,
        profile_username: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// The user's most recently verified record, if any.
    fn latest_verified(&self, user_id: &str) -> StoreResult<Option<ProfileVerification>>;

    /// Drop every verification record for the user.
    fn delete_user_verifications(&self, user_id: &str) -> StoreResult<()>;
}
