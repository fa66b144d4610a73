//! Aggregate statistics over solved problems.
//!
//! Breakdowns preserve first-seen label order so the JSON objects the API
//! emits list labels in the order problems were solved, and count ties in the
//! top-tags listing keep that same order (stable sort).

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::round2;

/// Maximum number of entries in the top-tags listing.
pub const TOP_TAGS_LIMIT: usize = 10;

/// A solved problem as the aggregation layer sees it: reference-vocabulary
/// labels already resolved, join rows already flattened.
#[derive(Debug, Clone)]
pub struct SolvedProblem {
    pub difficulty: String,
    pub language: String,
    pub tags: Vec<String>,
    pub time_spent_min: u32,
    pub solved_at: DateTime<Utc>,
}

/// Per-label usage: how many problems carry the label and how much time they
/// took in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStat {
    pub count: u64,
    pub time_spent: u64,
}

/// Label-to-usage mapping that remembers first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Breakdown {
    entries: Vec<(String, UsageStat)>,
}

impl Breakdown {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self, label: &str, minutes: u32) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, stat)) => {
                stat.count += 1;
                stat.time_spent += u64::from(minutes);
            }
            None => self.entries.push((
                label.to_string(),
                UsageStat {
                    count: 1,
                    time_spent: u64::from(minutes),
                },
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&UsageStat> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UsageStat)> {
        self.entries.iter().map(|(l, s)| (l.as_str(), s))
    }

    /// Sum of per-label counts. For the difficulty and language breakdowns
    /// this equals the total problem count.
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|(_, s)| s.count).sum()
    }

    /// Top `limit` labels by count descending; ties keep first-seen order.
    pub fn top(&self, limit: usize) -> Breakdown {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        entries.truncate(limit);
        Breakdown { entries }
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, stat) in &self.entries {
            map.serialize_entry(label, stat)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_problems: u64,
    pub total_time_spent: u64,
    pub average_time_per_problem: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub overview: Overview,
    pub difficulty_breakdown: Breakdown,
    pub language_breakdown: Breakdown,
    pub top_tags: Breakdown,
}

/// Produce the full per-user analytics block from a (possibly date-filtered)
/// problem set. An empty set yields zeroed aggregates, never a division by
/// zero.
pub fn user_analytics(problems: &[SolvedProblem]) -> UserAnalytics {
    let total_problems = problems.len() as u64;
    let total_time_spent: u64 = problems.iter().map(|p| u64::from(p.time_spent_min)).sum();
    let average_time_per_problem = if total_problems > 0 {
        round2(total_time_spent as f64 / total_problems as f64)
    } else {
        0.0
    };

    let mut difficulty_breakdown = Breakdown::new();
    let mut language_breakdown = Breakdown::new();
    let mut tag_stats = Breakdown::new();

    for problem in problems {
        difficulty_breakdown.bump(&problem.difficulty, problem.time_spent_min);
        language_breakdown.bump(&problem.language, problem.time_spent_min);
        for tag in &problem.tags {
            tag_stats.bump(tag, problem.time_spent_min);
        }
    }

    UserAnalytics {
        overview: Overview {
            total_problems,
            total_time_spent,
            average_time_per_problem,
        },
        difficulty_breakdown,
        language_breakdown,
        top_tags: tag_stats.top(TOP_TAGS_LIMIT),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOverview {
    pub total_users: u64,
    pub total_problems: u64,
    pub total_time_spent: u64,
    pub average_problems_per_user: f64,
}

/// Platform-wide totals. Mean problems-per-user is 0 when there are no users.
pub fn platform_overview(
    total_users: u64,
    total_problems: u64,
    total_time_spent: u64,
) -> PlatformOverview {
    let average_problems_per_user = if total_users > 0 {
        round2(total_problems as f64 / total_users as f64)
    } else {
        0.0
    };
    PlatformOverview {
        total_users,
        total_problems,
        total_time_spent,
        average_problems_per_user,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub username: String,
    pub problem_count: u64,
    pub total_time_spent: u64,
}

/// Rank users by solved-problem count descending and keep the top `limit`.
/// The sort is stable, so users tied on count stay in the order the caller
/// supplied them.
pub fn rank_leaderboard(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| b.problem_count.cmp(&a.problem_count));
    entries.truncate(limit);
    entries
}
