//! Core aggregation logic for the solvetrack practice tracker.
//!
//! Pure reductions over a user's solved-problem set: totals, per-difficulty /
//! per-language / per-tag breakdowns, platform-wide stats, leaderboard ranking,
//! and the dashboard streak metric. No I/O lives here; the server crate feeds
//! this library rows it has already loaded.

pub mod analytics;
pub mod streak;
pub mod summary;

pub use analytics::{
    user_analytics, platform_overview, rank_leaderboard, Breakdown, LeaderboardEntry, Overview,
    PlatformOverview, SolvedProblem, UsageStat, UserAnalytics, TOP_TAGS_LIMIT,
};
pub use streak::current_streak;
pub use summary::{summary_stats, SummaryStats};

/// Round to two decimal places, the way every derived average in the API is
/// presented.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
