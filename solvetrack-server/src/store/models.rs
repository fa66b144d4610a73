//! Data models for tracker storage

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// The three reference vocabularies share one schema shape (unique name plus
/// a usage count), so store operations take the kind as a parameter instead
/// of triplicating every method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabKind {
    Difficulty,
    Language,
    Tag,
}

impl VocabKind {
    pub fn table(&self) -> &'static str {
        match self {
            VocabKind::Difficulty => "difficulties",
            VocabKind::Language => "languages",
            VocabKind::Tag => "tags",
        }
    }

    /// Human label used in error messages ("Tag not found", ...).
    pub fn label(&self) -> &'static str {
        match self {
            VocabKind::Difficulty => "Difficulty",
            VocabKind::Language => "Language",
            VocabKind::Tag => "Tag",
        }
    }

    /// Plural form for listing messages ("Tags retrieved successfully", ...).
    pub fn label_plural(&self) -> &'static str {
        match self {
            VocabKind::Difficulty => "Difficulties",
            VocabKind::Language => "Languages",
            VocabKind::Tag => "Tags",
        }
    }

    /// Column on `problems` referencing this vocabulary, if it is a direct
    /// foreign key. Tags go through the `problem_tags` join table instead.
    pub fn problem_column(&self) -> Option<&'static str> {
        match self {
            VocabKind::Difficulty => Some("difficulty_id"),
            VocabKind::Language => Some("language_id"),
            VocabKind::Tag => None,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    /// External profile name, set once verification completes.
    pub profile_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A reference-vocabulary entry with its usage count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabEntry {
    pub id: i64,
    pub name: String,
    pub problem_count: u64,
}

/// A solved problem with its vocabulary labels resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetail {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Numeric identifier of the problem on the practice site.
    pub external_id: i64,
    pub difficulty: String,
    pub language: String,
    pub tags: Vec<String>,
    pub time_spent_min: u32,
    pub solved_at: DateTime<Utc>,
}

/// Fields for creating a problem. `solved_at` defaults to now.
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub user_id: String,
    pub title: String,
    pub external_id: i64,
    pub difficulty: String,
    pub language: String,
    pub tags: Vec<String>,
    pub time_spent_min: u32,
    pub solved_at: Option<DateTime<Utc>>,
}

/// Partial update; `tags: Some(_)` replaces the whole tag set.
#[derive(Debug, Clone, Default)]
pub struct ProblemUpdate {
    pub title: Option<String>,
    pub difficulty: Option<String>,
    pub language: Option<String>,
    pub tags: Option<Vec<String>>,
    pub time_spent_min: Option<u32>,
}

/// Label filters for the per-user problem listing.
#[derive(Debug, Clone, Default)]
pub struct ProblemFilter {
    pub difficulty: Option<String>,
    pub language: Option<String>,
    pub tag: Option<String>,
}

/// One row per (user, calendar day) of practice time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub total_minutes: u32,
}

/// A verification record for a claimed external profile.
#[derive(Debug, Clone)]
pub struct ProfileVerification {
    pub id: String,
    pub user_id: String,
    pub profile_username: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Per-user problem totals, input to the leaderboard ranking.
#[derive(Debug, Clone)]
pub struct UserProblemTotals {
    pub user: User,
    pub problem_count: u64,
    pub total_time_spent: u64,
}
