//! SQLite-based storage implementation

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    DailySummary, NewProblem, ProblemDetail, ProblemFilter, ProblemUpdate, ProfileVerification,
    StoreResult, TrackerStore, User, UserProblemTotals, VocabEntry, VocabKind,
};
use crate::error::ApiError;
use crate::token::new_id;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const DATE_FMT: &str = "%Y-%m-%d";

/// SQLite-based store implementing [`TrackerStore`]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, ApiError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database (used by tests)
    pub fn open_in_memory() -> Result<Self, ApiError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, ApiError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ApiError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ApiError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Users
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                profile_username TEXT,
                created_at TEXT NOT NULL
            );

            -- Reference vocabularies
            CREATE TABLE IF NOT EXISTS difficulties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                level TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS languages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            -- Solved problems
            CREATE TABLE IF NOT EXISTS problems (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                external_id INTEGER NOT NULL,
                difficulty_id INTEGER NOT NULL REFERENCES difficulties(id),
                language_id INTEGER NOT NULL REFERENCES languages(id),
                time_spent_min INTEGER NOT NULL,
                solved_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_problems_user_id ON problems(user_id);
            CREATE INDEX IF NOT EXISTS idx_problems_solved_at ON problems(solved_at);

            CREATE TABLE IF NOT EXISTS problem_tags (
                problem_id TEXT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id),
                PRIMARY KEY (problem_id, tag_id)
            );

            -- Daily summaries, one row per (user, calendar day)
            CREATE TABLE IF NOT EXISTS daily_summaries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                total_minutes INTEGER NOT NULL,
                UNIQUE (user_id, date)
            );

            -- External profile verification records
            CREATE TABLE IF NOT EXISTS profile_verifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                profile_username TEXT NOT NULL,
                code TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                verified INTEGER NOT NULL DEFAULT 0,
                verified_at TEXT,
                UNIQUE (user_id, profile_username)
            );
            CREATE INDEX IF NOT EXISTS idx_verifications_profile
                ON profile_verifications(profile_username);
            "#,
        )?;

        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<User, rusqlite::Error> {
    let created_at: String = row.get("created_at")?;
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        profile_username: row.get("profile_username")?,
        created_at: parse_datetime(&created_at),
    })
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> Result<DailySummary, rusqlite::Error> {
    let date: String = row.get("date")?;
    Ok(DailySummary {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        date: parse_date(&date),
        total_minutes: row.get("total_minutes")?,
    })
}

fn verification_from_row(row: &rusqlite::Row<'_>) -> Result<ProfileVerification, rusqlite::Error> {
    let expires_at: String = row.get("expires_at")?;
    let verified_at: Option<String> = row.get("verified_at")?;
    let verified: i64 = row.get("verified")?;
    Ok(ProfileVerification {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        profile_username: row.get("profile_username")?,
        code: row.get("code")?,
        expires_at: parse_datetime(&expires_at),
        verified: verified != 0,
        verified_at: verified_at.map(|s| parse_datetime(&s)),
    })
}

/// Name column differs between vocabularies (`level` vs `name`); queries
/// alias it to `name`.
fn name_column(kind: VocabKind) -> &'static str {
    match kind {
        VocabKind::Difficulty => "level",
        VocabKind::Language | VocabKind::Tag => "name",
    }
}

/// Correlated subquery counting problems referencing vocabulary row `v`.
fn usage_count_sql(kind: VocabKind) -> &'static str {
    match kind.problem_column() {
        Some("difficulty_id") => "(SELECT COUNT(*) FROM problems p WHERE p.difficulty_id = v.id)",
        Some(_) => "(SELECT COUNT(*) FROM problems p WHERE p.language_id = v.id)",
        None => "(SELECT COUNT(*) FROM problem_tags pt WHERE pt.tag_id = v.id)",
    }
}

const PROBLEM_SELECT: &str = "SELECT p.id, p.user_id, p.title, p.external_id, \
     d.level AS difficulty, l.name AS language, p.time_spent_min, p.solved_at \
     FROM problems p \
     JOIN difficulties d ON d.id = p.difficulty_id \
     JOIN languages l ON l.id = p.language_id";

fn problem_from_row(row: &rusqlite::Row<'_>) -> Result<ProblemDetail, rusqlite::Error> {
    let solved_at: String = row.get("solved_at")?;
    Ok(ProblemDetail {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        external_id: row.get("external_id")?,
        difficulty: row.get("difficulty")?,
        language: row.get("language")?,
        tags: Vec::new(),
        time_spent_min: row.get("time_spent_min")?,
        solved_at: parse_datetime(&solved_at),
    })
}

fn load_tags(conn: &Connection, problem_id: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM problem_tags pt \
         JOIN tags t ON t.id = pt.tag_id \
         WHERE pt.problem_id = ?1 \
         ORDER BY t.name ASC",
    )?;
    let tags = stmt
        .query_map(params![problem_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(tags)
}

fn get_problem_on(conn: &Connection, problem_id: &str) -> StoreResult<Option<ProblemDetail>> {
    let sql = format!("{PROBLEM_SELECT} WHERE p.id = ?1");
    let problem = conn
        .query_row(&sql, params![problem_id], problem_from_row)
        .optional()?;
    match problem {
        Some(mut p) => {
            p.tags = load_tags(conn, &p.id)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

fn query_problems(
    conn: &Connection,
    sql: &str,
    bind: &[&dyn rusqlite::ToSql],
) -> StoreResult<Vec<ProblemDetail>> {
    let mut stmt = conn.prepare(sql)?;
    let mut problems = stmt
        .query_map(rusqlite::params_from_iter(bind.iter()), problem_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    for problem in &mut problems {
        problem.tags = load_tags(conn, &problem.id)?;
    }
    Ok(problems)
}

/// Conditional insert + re-fetch: two concurrent callers converge on one row
/// instead of racing a check-then-create sequence.
fn get_or_create_vocab_on(
    conn: &Connection,
    kind: VocabKind,
    name: &str,
) -> StoreResult<VocabEntry> {
    let table = kind.table();
    let col = name_column(kind);
    conn.execute(
        &format!("INSERT INTO {table} ({col}) VALUES (?1) ON CONFLICT({col}) DO NOTHING"),
        params![name],
    )?;
    let entry = conn.query_row(
        &format!(
            "SELECT v.id, v.{col} AS name, {count} AS problem_count FROM {table} v WHERE v.{col} = ?1",
            count = usage_count_sql(kind)
        ),
        params![name],
        vocab_from_row,
    )?;
    Ok(entry)
}

fn vocab_from_row(row: &rusqlite::Row<'_>) -> Result<VocabEntry, rusqlite::Error> {
    let count: i64 = row.get("problem_count")?;
    Ok(VocabEntry {
        id: row.get("id")?,
        name: row.get("name")?,
        problem_count: count as u64,
    })
}

fn get_vocab_on(conn: &Connection, kind: VocabKind, id: i64) -> StoreResult<Option<VocabEntry>> {
    let col = name_column(kind);
    let entry = conn
        .query_row(
            &format!(
                "SELECT v.id, v.{col} AS name, {count} AS problem_count FROM {table} v WHERE v.id = ?1",
                count = usage_count_sql(kind),
                table = kind.table()
            ),
            params![id],
            vocab_from_row,
        )
        .optional()?;
    Ok(entry)
}

impl TrackerStore for SqliteStore {
    fn get_or_create_user(&self, username: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();

        // Same conditional-insert pattern as the vocabularies: the UNIQUE
        // constraint is the backstop for concurrent first references.
        conn.execute(
            "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(username) DO NOTHING",
            params![new_id(), username, Utc::now().to_rfc3339()],
        )?;

        Ok(conn.query_row(
            "SELECT id, username, profile_username, created_at FROM users WHERE username = ?1",
            params![username],
            user_from_row,
        )?)
    }

    fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, username, profile_username, created_at FROM users WHERE id = ?1",
                params![user_id],
                user_from_row,
            )
            .optional()?)
    }

    fn set_profile_username(
        &self,
        user_id: &str,
        profile_username: Option<&str>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE users SET profile_username = ?1 WHERE id = ?2",
            params![profile_username, user_id],
        )?;
        if affected == 0 {
            return Err(ApiError::not_found("User not found"));
        }
        Ok(())
    }

    fn count_users(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn user_problem_totals(&self) -> StoreResult<Vec<UserProblemTotals>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.profile_username, u.created_at, \
                    (SELECT COUNT(*) FROM problems p WHERE p.user_id = u.id) AS problem_count, \
                    (SELECT IFNULL(SUM(p.time_spent_min), 0) FROM problems p WHERE p.user_id = u.id) AS total_time \
             FROM users u \
             ORDER BY u.created_at ASC",
        )?;
        let totals = stmt
            .query_map([], |row| {
                let problem_count: i64 = row.get("problem_count")?;
                let total_time: i64 = row.get("total_time")?;
                Ok(UserProblemTotals {
                    user: user_from_row(row)?,
                    problem_count: problem_count as u64,
                    total_time_spent: total_time as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(totals)
    }

    fn create_problem(&self, new: NewProblem) -> StoreResult<ProblemDetail> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let difficulty = get_or_create_vocab_on(&tx, VocabKind::Difficulty, &new.difficulty)?;
        let language = get_or_create_vocab_on(&tx, VocabKind::Language, &new.language)?;

        let id = new_id();
        let solved_at = new.solved_at.unwrap_or_else(Utc::now);
        tx.execute(
            "INSERT INTO problems \
             (id, user_id, title, external_id, difficulty_id, language_id, time_spent_min, solved_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                new.user_id,
                new.title,
                new.external_id,
                difficulty.id,
                language.id,
                new.time_spent_min,
                solved_at.to_rfc3339(),
            ],
        )?;

        for tag_name in &new.tags {
            let tag = get_or_create_vocab_on(&tx, VocabKind::Tag, tag_name)?;
            tx.execute(
                "INSERT OR IGNORE INTO problem_tags (problem_id, tag_id) VALUES (?1, ?2)",
                params![id, tag.id],
            )?;
        }

        let problem = get_problem_on(&tx, &id)?
            .ok_or_else(|| ApiError::Internal("problem vanished during insert".to_string()))?;
        tx.commit()?;
        Ok(problem)
    }

    fn get_problem(&self, problem_id: &str) -> StoreResult<Option<ProblemDetail>> {
        let conn = self.conn.lock().unwrap();
        get_problem_on(&conn, problem_id)
    }

    fn update_problem(
        &self,
        problem_id: &str,
        update: ProblemUpdate,
    ) -> StoreResult<Option<ProblemDetail>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if get_problem_on(&tx, problem_id)?.is_none() {
            return Ok(None);
        }

        if let Some(title) = &update.title {
            tx.execute(
                "UPDATE problems SET title = ?1 WHERE id = ?2",
                params![title, problem_id],
            )?;
        }
        if let Some(minutes) = update.time_spent_min {
            tx.execute(
                "UPDATE problems SET time_spent_min = ?1 WHERE id = ?2",
                params![minutes, problem_id],
            )?;
        }
        if let Some(level) = &update.difficulty {
            let difficulty = get_or_create_vocab_on(&tx, VocabKind::Difficulty, level)?;
            tx.execute(
                "UPDATE problems SET difficulty_id = ?1 WHERE id = ?2",
                params![difficulty.id, problem_id],
            )?;
        }
        if let Some(name) = &update.language {
            let language = get_or_create_vocab_on(&tx, VocabKind::Language, name)?;
            tx.execute(
                "UPDATE problems SET language_id = ?1 WHERE id = ?2",
                params![language.id, problem_id],
            )?;
        }
        if let Some(tags) = &update.tags {
            tx.execute(
                "DELETE FROM problem_tags WHERE problem_id = ?1",
                params![problem_id],
            )?;
            for tag_name in tags {
                let tag = get_or_create_vocab_on(&tx, VocabKind::Tag, tag_name)?;
                tx.execute(
                    "INSERT OR IGNORE INTO problem_tags (problem_id, tag_id) VALUES (?1, ?2)",
                    params![problem_id, tag.id],
                )?;
            }
        }

        let problem = get_problem_on(&tx, problem_id)?;
        tx.commit()?;
        Ok(problem)
    }

    fn delete_problem(&self, problem_id: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM problems WHERE id = ?1", params![problem_id])?;
        Ok(affected > 0)
    }

    fn list_user_problems(
        &self,
        user_id: &str,
        filter: &ProblemFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<ProblemDetail>, u64)> {
        let conn = self.conn.lock().unwrap();

        let mut clauses = String::from(" WHERE p.user_id = ?1");
        let mut bind: Vec<&dyn rusqlite::ToSql> = vec![&user_id];

        if let Some(level) = &filter.difficulty {
            bind.push(level);
            clauses.push_str(&format!(" AND d.level = ?{}", bind.len()));
        }
        if let Some(name) = &filter.language {
            bind.push(name);
            clauses.push_str(&format!(" AND l.name = ?{}", bind.len()));
        }
        if let Some(tag) = &filter.tag {
            bind.push(tag);
            clauses.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM problem_tags pt \
                 JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.problem_id = p.id AND t.name = ?{})",
                bind.len()
            ));
        }

        let count_sql = format!(
            "SELECT COUNT(*) FROM problems p \
             JOIN difficulties d ON d.id = p.difficulty_id \
             JOIN languages l ON l.id = p.language_id{clauses}"
        );
        let total: i64 = conn.query_row(
            &count_sql,
            rusqlite::params_from_iter(bind.iter()),
            |row| row.get(0),
        )?;

        let page_sql = format!(
            "{PROBLEM_SELECT}{clauses} ORDER BY p.solved_at DESC LIMIT {limit} OFFSET {offset}"
        );
        let problems = query_problems(&conn, &page_sql, &bind)?;

        Ok((problems, total as u64))
    }

    fn user_problems_in_range(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<ProblemDetail>> {
        let conn = self.conn.lock().unwrap();

        // Timestamps are stored as UTC RFC 3339, so string comparison orders
        // them correctly.
        let mut clauses = String::from(" WHERE p.user_id = ?1");
        let start_s = start.map(|t| t.to_rfc3339());
        let end_s = end.map(|t| t.to_rfc3339());
        let mut bind: Vec<&dyn rusqlite::ToSql> = vec![&user_id];
        if let Some(s) = &start_s {
            bind.push(s);
            clauses.push_str(&format!(" AND p.solved_at >= ?{}", bind.len()));
        }
        if let Some(e) = &end_s {
            bind.push(e);
            clauses.push_str(&format!(" AND p.solved_at <= ?{}", bind.len()));
        }

        let sql = format!("{PROBLEM_SELECT}{clauses} ORDER BY p.solved_at DESC");
        query_problems(&conn, &sql, &bind)
    }

    fn count_problems(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM problems", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn total_time_spent(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let total: i64 = conn.query_row(
            "SELECT IFNULL(SUM(time_spent_min), 0) FROM problems",
            [],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }

    fn list_vocab(&self, kind: VocabKind) -> StoreResult<Vec<VocabEntry>> {
        let conn = self.conn.lock().unwrap();
        let col = name_column(kind);
        // Difficulties keep insertion (id) order: Easy/Medium/Hard reads
        // better than alphabetical.
        let order = match kind {
            VocabKind::Difficulty => "v.id ASC",
            VocabKind::Language | VocabKind::Tag => "name ASC",
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT v.id, v.{col} AS name, {count} AS problem_count \
             FROM {table} v ORDER BY {order}",
            count = usage_count_sql(kind),
            table = kind.table()
        ))?;
        let entries = stmt
            .query_map([], vocab_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn create_vocab(&self, kind: VocabKind, name: &str) -> StoreResult<VocabEntry> {
        let conn = self.conn.lock().unwrap();
        let col = name_column(kind);
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {table} ({col}) VALUES (?1) ON CONFLICT({col}) DO NOTHING",
                table = kind.table()
            ),
            params![name],
        )?;
        if inserted == 0 {
            return Err(ApiError::conflict(format!("{} already exists", kind.label())));
        }
        Ok(conn.query_row(
            &format!(
                "SELECT v.id, v.{col} AS name, {count} AS problem_count FROM {table} v WHERE v.{col} = ?1",
                count = usage_count_sql(kind),
                table = kind.table()
            ),
            params![name],
            vocab_from_row,
        )?)
    }

    fn get_or_create_vocab(&self, kind: VocabKind, name: &str) -> StoreResult<VocabEntry> {
        let conn = self.conn.lock().unwrap();
        get_or_create_vocab_on(&conn, kind, name)
    }

    fn get_vocab(&self, kind: VocabKind, id: i64) -> StoreResult<Option<VocabEntry>> {
        let conn = self.conn.lock().unwrap();
        get_vocab_on(&conn, kind, id)
    }

    fn vocab_problems(&self, kind: VocabKind, id: i64) -> StoreResult<Vec<ProblemDetail>> {
        let conn = self.conn.lock().unwrap();
        let sql = match kind.problem_column() {
            Some(column) => {
                format!("{PROBLEM_SELECT} WHERE p.{column} = ?1 ORDER BY p.solved_at DESC")
            }
            None => format!(
                "{PROBLEM_SELECT} \
                 JOIN problem_tags pt ON pt.problem_id = p.id \
                 WHERE pt.tag_id = ?1 ORDER BY p.solved_at DESC"
            ),
        };
        query_problems(&conn, &sql, &[&id])
    }

    fn rename_vocab(&self, kind: VocabKind, id: i64, name: &str) -> StoreResult<VocabEntry> {
        let conn = self.conn.lock().unwrap();
        let col = name_column(kind);
        let table = kind.table();

        if get_vocab_on(&conn, kind, id)?.is_none() {
            return Err(ApiError::not_found(format!("{} not found", kind.label())));
        }

        let taken: Option<i64> = conn
            .query_row(
                &format!("SELECT id FROM {table} WHERE {col} = ?1"),
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some_and(|other| other != id) {
            return Err(ApiError::conflict(format!(
                "{} with this name already exists",
                kind.label()
            )));
        }

        conn.execute(
            &format!("UPDATE {table} SET {col} = ?1 WHERE id = ?2"),
            params![name, id],
        )?;

        get_vocab_on(&conn, kind, id)?
            .ok_or_else(|| ApiError::Internal("vocabulary row vanished during rename".to_string()))
    }

    fn delete_vocab(&self, kind: VocabKind, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let entry = get_vocab_on(&conn, kind, id)?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", kind.label())))?;

        if entry.problem_count > 0 {
            return Err(ApiError::conflict(format!(
                "Cannot delete {}. It is associated with {} problem(s)",
                kind.label().to_lowercase(),
                entry.problem_count
            )));
        }

        conn.execute(
            &format!("DELETE FROM {table} WHERE id = ?1", table = kind.table()),
            params![id],
        )?;
        Ok(())
    }

    fn popular_vocab(&self, kind: VocabKind, limit: u64) -> StoreResult<Vec<VocabEntry>> {
        let conn = self.conn.lock().unwrap();
        let col = name_column(kind);
        let mut stmt = conn.prepare(&format!(
            "SELECT v.id, v.{col} AS name, {count} AS problem_count \
             FROM {table} v ORDER BY problem_count DESC, v.id ASC LIMIT {limit}",
            count = usage_count_sql(kind),
            table = kind.table()
        ))?;
        let entries = stmt
            .query_map([], vocab_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn upsert_summary(
        &self,
        user_id: &str,
        date: NaiveDate,
        total_minutes: u32,
    ) -> StoreResult<(DailySummary, bool)> {
        let conn = self.conn.lock().unwrap();
        let date_s = date.format(DATE_FMT).to_string();

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM daily_summaries WHERE user_id = ?1 AND date = ?2",
                params![user_id, date_s],
                |row| row.get(0),
            )
            .optional()?;

        let (id, created) = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE daily_summaries SET total_minutes = ?1 WHERE id = ?2",
                    params![total_minutes, id],
                )?;
                (id, false)
            }
            None => {
                let id = new_id();
                conn.execute(
                    "INSERT INTO daily_summaries (id, user_id, date, total_minutes) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, user_id, date_s, total_minutes],
                )?;
                (id, true)
            }
        };

        let summary = conn.query_row(
            "SELECT id, user_id, date, total_minutes FROM daily_summaries WHERE id = ?1",
            params![id],
            summary_from_row,
        )?;
        Ok((summary, created))
    }

    fn list_summaries(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: u64,
    ) -> StoreResult<Vec<DailySummary>> {
        let conn = self.conn.lock().unwrap();

        let mut clauses = String::from(" WHERE user_id = ?1");
        let start_s = start.map(|d| d.format(DATE_FMT).to_string());
        let end_s = end.map(|d| d.format(DATE_FMT).to_string());
        let mut bind: Vec<&dyn rusqlite::ToSql> = vec![&user_id];
        if let Some(s) = &start_s {
            bind.push(s);
            clauses.push_str(&format!(" AND date >= ?{}", bind.len()));
        }
        if let Some(e) = &end_s {
            bind.push(e);
            clauses.push_str(&format!(" AND date <= ?{}", bind.len()));
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT id, user_id, date, total_minutes FROM daily_summaries{clauses} \
             ORDER BY date DESC LIMIT {limit}"
        ))?;
        let summaries = stmt
            .query_map(rusqlite::params_from_iter(bind.iter()), summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    fn get_summary_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<DailySummary>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, user_id, date, total_minutes FROM daily_summaries \
                 WHERE user_id = ?1 AND date = ?2",
                params![user_id, date.format(DATE_FMT).to_string()],
                summary_from_row,
            )
            .optional()?)
    }

    fn get_summary(&self, summary_id: &str) -> StoreResult<Option<DailySummary>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, user_id, date, total_minutes FROM daily_summaries WHERE id = ?1",
                params![summary_id],
                summary_from_row,
            )
            .optional()?)
    }

    fn delete_summary(&self, summary_id: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "DELETE FROM daily_summaries WHERE id = ?1",
            params![summary_id],
        )?;
        Ok(affected > 0)
    }

    fn find_verified_claim(
        &self,
        profile_username: &str,
        excluding_user: &str,
    ) -> StoreResult<Option<ProfileVerification>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, user_id, profile_username, code, expires_at, verified, verified_at \
                 FROM profile_verifications \
                 WHERE profile_username = ?1 AND verified = 1 AND user_id != ?2",
                params![profile_username, excluding_user],
                verification_from_row,
            )
            .optional()?)
    }

    fn upsert_pending_verification(
        &self,
        user_id: &str,
        profile_username: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<ProfileVerification> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO profile_verifications \
             (id, user_id, profile_username, code, expires_at, verified, verified_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL) \
             ON CONFLICT(user_id, profile_username) DO UPDATE SET \
             code = excluded.code, expires_at = excluded.expires_at, \
             verified = 0, verified_at = NULL",
            params![
                new_id(),
                user_id,
                profile_username,
                code,
                expires_at.to_rfc3339(),
            ],
        )?;

        Ok(conn.query_row(
            "SELECT id, user_id, profile_username, code, expires_at, verified, verified_at \
             FROM profile_verifications WHERE user_id = ?1 AND profile_username = ?2",
            params![user_id, profile_username],
            verification_from_row,
        )?)
    }

    fn get_verification(
        &self,
        user_id: &str,
        profile_username: &str,
    ) -> StoreResult<Option<ProfileVerification>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, user_id, profile_username, code, expires_at, verified, verified_at \
                 FROM profile_verifications WHERE user_id = ?1 AND profile_username = ?2",
                params![user_id, profile_username],
                verification_from_row,
            )
            .optional()?)
    }

    fn mark_verified(
        &self,
        user_id: &str,
        profile_username: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE profile_verifications SET verified = 1, verified_at = ?1 \
             WHERE user_id = ?2 AND profile_username = ?3",
            params![at.to_rfc3339(), user_id, profile_username],
        )?;
        if affected == 0 {
            return Err(ApiError::not_found("No verification request found"));
        }
        Ok(())
    }

    fn latest_verified(&self, user_id: &str) -> StoreResult<Option<ProfileVerification>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, user_id, profile_username, code, expires_at, verified, verified_at \
                 FROM profile_verifications \
                 WHERE user_id = ?1 AND verified = 1 \
                 ORDER BY verified_at DESC LIMIT 1",
                params![user_id],
                verification_from_row,
            )
            .optional()?)
    }

    fn delete_user_verifications(&self, user_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM profile_verifications WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn new_problem(user_id: &str, tags: &[&str]) -> NewProblem {
        NewProblem {
            user_id: user_id.to_string(),
            title: "Two Sum".to_string(),
            external_id: 1,
            difficulty: "Easy".to_string(),
            language: "Rust".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            time_spent_min: 25,
            solved_at: None,
        }
    }

    #[test]
    fn test_open_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        store.get_or_create_user("alice").unwrap();

        // Reopen and confirm the schema migration is idempotent.
        drop(store);
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        let user = store.get_or_create_user("alice").unwrap();
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_get_or_create_user_is_idempotent() {
        let store = create_test_store();
        let first = store.get_or_create_user("alice").unwrap();
        let second = store.get_or_create_user("alice").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.count_users().unwrap(), 1);
    }

    #[test]
    fn test_create_problem_resolves_vocabulary() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();

        let problem = store
            .create_problem(new_problem(&user.id, &["array", "hash-map"]))
            .unwrap();
        assert_eq!(problem.difficulty, "Easy");
        assert_eq!(problem.language, "Rust");
        assert_eq!(problem.tags, vec!["array", "hash-map"]);

        // Second problem reuses the same vocabulary rows.
        store
            .create_problem(new_problem(&user.id, &["array"]))
            .unwrap();
        let tags = store.list_vocab(VocabKind::Tag).unwrap();
        assert_eq!(tags.len(), 2);
        let array = tags.iter().find(|t| t.name == "array").unwrap();
        assert_eq!(array.problem_count, 2);
    }

    #[test]
    fn test_vocab_create_conflict() {
        let store = create_test_store();
        store.create_vocab(VocabKind::Difficulty, "Easy").unwrap();
        let err = store.create_vocab(VocabKind::Difficulty, "Easy").unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_get_or_create_vocab_converges() {
        let store = create_test_store();
        let a = store.get_or_create_vocab(VocabKind::Tag, "graph").unwrap();
        let b = store.get_or_create_vocab(VocabKind::Tag, "graph").unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_delete_vocab_in_use_is_rejected() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();
        store
            .create_problem(new_problem(&user.id, &["array"]))
            .unwrap();

        let tags = store.list_vocab(VocabKind::Tag).unwrap();
        let err = store.delete_vocab(VocabKind::Tag, tags[0].id).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // No deletion happened.
        assert_eq!(store.list_vocab(VocabKind::Tag).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_unused_vocab() {
        let store = create_test_store();
        let entry = store.create_vocab(VocabKind::Language, "Zig").unwrap();
        store.delete_vocab(VocabKind::Language, entry.id).unwrap();
        assert!(store.get_vocab(VocabKind::Language, entry.id).unwrap().is_none());
    }

    #[test]
    fn test_rename_vocab_conflicts_with_other_entry() {
        let store = create_test_store();
        let a = store.create_vocab(VocabKind::Tag, "dp").unwrap();
        store.create_vocab(VocabKind::Tag, "graph").unwrap();

        let err = store.rename_vocab(VocabKind::Tag, a.id, "graph").unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // Renaming to its own name is fine.
        let renamed = store.rename_vocab(VocabKind::Tag, a.id, "dp").unwrap();
        assert_eq!(renamed.name, "dp");
    }

    #[test]
    fn test_popular_vocab_orders_by_usage() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();
        store
            .create_problem(new_problem(&user.id, &["array", "dp"]))
            .unwrap();
        store
            .create_problem(new_problem(&user.id, &["array"]))
            .unwrap();

        let popular = store.popular_vocab(VocabKind::Tag, 10).unwrap();
        assert_eq!(popular[0].name, "array");
        assert_eq!(popular[0].problem_count, 2);
    }

    #[test]
    fn test_list_user_problems_filters_and_counts() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();
        store
            .create_problem(new_problem(&user.id, &["array"]))
            .unwrap();
        let mut hard = new_problem(&user.id, &["graph"]);
        hard.difficulty = "Hard".to_string();
        hard.language = "Python".to_string();
        store.create_problem(hard).unwrap();

        let (all, total) = store
            .list_user_problems(&user.id, &ProblemFilter::default(), 0, 10)
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(total, 2);

        let filter = ProblemFilter {
            difficulty: Some("Hard".to_string()),
            ..Default::default()
        };
        let (hard_only, total) = store.list_user_problems(&user.id, &filter, 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(hard_only[0].language, "Python");

        let filter = ProblemFilter {
            tag: Some("array".to_string()),
            ..Default::default()
        };
        let (tagged, total) = store.list_user_problems(&user.id, &filter, 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(tagged[0].tags, vec!["array"]);
    }

    #[test]
    fn test_problems_in_range() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();

        let mut old = new_problem(&user.id, &[]);
        old.solved_at = Some(Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap());
        store.create_problem(old).unwrap();

        let mut recent = new_problem(&user.id, &[]);
        recent.solved_at = Some(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
        store.create_problem(recent).unwrap();

        let from_june = store
            .user_problems_in_range(
                &user.id,
                Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
                None,
            )
            .unwrap();
        assert_eq!(from_june.len(), 1);
    }

    #[test]
    fn test_update_problem_replaces_tags() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();
        let problem = store
            .create_problem(new_problem(&user.id, &["array"]))
            .unwrap();

        let update = ProblemUpdate {
            title: Some("Three Sum".to_string()),
            tags: Some(vec!["two-pointers".to_string()]),
            ..Default::default()
        };
        let updated = store.update_problem(&problem.id, update).unwrap().unwrap();
        assert_eq!(updated.title, "Three Sum");
        assert_eq!(updated.tags, vec!["two-pointers"]);

        // The old tag row survives with zero usage.
        let tags = store.list_vocab(VocabKind::Tag).unwrap();
        let array = tags.iter().find(|t| t.name == "array").unwrap();
        assert_eq!(array.problem_count, 0);
    }

    #[test]
    fn test_delete_problem() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();
        let problem = store.create_problem(new_problem(&user.id, &["array"])).unwrap();

        assert!(store.delete_problem(&problem.id).unwrap());
        assert!(!store.delete_problem(&problem.id).unwrap());
        assert!(store.get_problem(&problem.id).unwrap().is_none());
    }

    #[test]
    fn test_summary_upsert() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let (summary, created) = store.upsert_summary(&user.id, date, 60).unwrap();
        assert!(created);
        assert_eq!(summary.total_minutes, 60);

        let (summary, created) = store.upsert_summary(&user.id, date, 90).unwrap();
        assert!(!created);
        assert_eq!(summary.total_minutes, 90);

        let summaries = store.list_summaries(&user.id, None, None, 30).unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn test_verification_upsert_overwrites_pending() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();
        let expires = Utc::now() + Duration::hours(24);

        let first = store
            .upsert_pending_verification(&user.id, "alice123", "code-1", expires)
            .unwrap();
        let second = store
            .upsert_pending_verification(&user.id, "alice123", "code-2", expires)
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.code, "code-2");
        assert!(!second.verified);
    }

    #[test]
    fn test_verified_claim_visible_to_other_users_only() {
        let store = create_test_store();
        let alice = store.get_or_create_user("alice").unwrap();
        let bob = store.get_or_create_user("bob").unwrap();
        let expires = Utc::now() + Duration::hours(24);

        store
            .upsert_pending_verification(&alice.id, "shared", "code", expires)
            .unwrap();
        store.mark_verified(&alice.id, "shared", Utc::now()).unwrap();

        assert!(store.find_verified_claim("shared", &bob.id).unwrap().is_some());
        assert!(store.find_verified_claim("shared", &alice.id).unwrap().is_none());

        let latest = store.latest_verified(&alice.id).unwrap().unwrap();
        assert_eq!(latest.profile_username, "shared");
        assert!(latest.verified_at.is_some());
    }

    #[test]
    fn test_delete_user_verifications() {
        let store = create_test_store();
        let user = store.get_or_create_user("alice").unwrap();
        let expires = Utc::now() + Duration::hours(24);
        store
            .upsert_pending_verification(&user.id, "alice123", "code", expires)
            .unwrap();

        store.delete_user_verifications(&user.id).unwrap();
        assert!(store.get_verification(&user.id, "alice123").unwrap().is_none());
    }
}
