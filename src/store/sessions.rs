//! SQLite-backed session store: one row per session id, replaced on every new
//! verdict. Writes serialize through the connection mutex, which is what keeps
//! concurrent upserts on the same session atomic.
//!
//! `status` is partly derived: a stored `active` reads back as `inactive` once
//! the session has gone quiet for longer than the inactivity window. `blocked`
//! is sticky and never overridden by that rule. Deriving at read time avoids a
//! background sweeper while keeping the externally observed behavior.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found")]
    NotFound,
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Inactive,
    Blocked,
}

impl SessionStatus {
    fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Inactive => "inactive",
            SessionStatus::Blocked => "blocked",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "blocked" => SessionStatus::Blocked,
            "inactive" => SessionStatus::Inactive,
            _ => SessionStatus::Active,
        }
    }
}

/// One session row. `created_at` is first-seen and survives later verdicts;
/// everything else reflects the most recent prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub user_type: String,
    pub confidence: f64,
    pub status: SessionStatus,
    pub movement_count: u32,
    pub last_prediction_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_sessions: u64,
    pub human_sessions: u64,
    pub bot_sessions: u64,
}

pub struct SessionStore {
    conn: Mutex<Connection>,
    inactivity: Duration,
}

fn derive_status(
    stored: SessionStatus,
    last_prediction_at: DateTime<Utc>,
    now: DateTime<Utc>,
    inactivity: Duration,
) -> SessionStatus {
    match stored {
        SessionStatus::Blocked => SessionStatus::Blocked,
        SessionStatus::Active if now - last_prediction_at > inactivity => SessionStatus::Inactive,
        other => other,
    }
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl SessionStore {
    /// Open or create the database at `path`. `inactivity` is the quiet period
    /// after which an active session reads back as inactive.
    pub fn open(path: &Path, inactivity: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn, inactivity)
    }

    /// In-memory store for tests.
    pub fn open_in_memory(inactivity: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, inactivity)
    }

    fn init(conn: Connection, inactivity: Duration) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                user_type TEXT NOT NULL,
                confidence REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                movement_count INTEGER NOT NULL DEFAULT 0,
                last_prediction TEXT NOT NULL,
                ip_address TEXT NOT NULL,
                user_agent TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_last_prediction
                ON sessions(last_prediction);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            inactivity,
        })
    }

    /// Create or replace the row for a session. The classification fields are
    /// overwritten, status resets to active, and `created_at` is preserved for
    /// pre-existing sessions (first-seen semantics).
    #[allow(clippy::too_many_arguments)]
    pub fn upsert(
        &self,
        session_id: &str,
        user_type: &str,
        confidence: f64,
        movement_count: u32,
        predicted_at: DateTime<Utc>,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store lock");
        conn.execute(
            r#"
            INSERT INTO sessions
                (session_id, created_at, user_type, confidence, status,
                 movement_count, last_prediction, ip_address, user_agent)
            VALUES (?1, ?2, ?3, ?4, 'active', ?5, ?6, ?7, ?8)
            ON CONFLICT(session_id) DO UPDATE SET
                user_type = excluded.user_type,
                confidence = excluded.confidence,
                status = 'active',
                movement_count = excluded.movement_count,
                last_prediction = excluded.last_prediction,
                ip_address = excluded.ip_address,
                user_agent = excluded.user_agent
            "#,
            params![
                session_id,
                predicted_at.to_rfc3339(),
                user_type,
                confidence,
                movement_count,
                predicted_at.to_rfc3339(),
                ip_address,
                user_agent,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, session_id: &str) -> Result<SessionRecord, StoreError> {
        let conn = self.conn.lock().expect("store lock");
        let mut stmt = conn.prepare(
            "SELECT session_id, created_at, user_type, confidence, status,
                    movement_count, last_prediction, ip_address, user_agent
             FROM sessions WHERE session_id = ?1",
        )?;
        let mut rows = stmt.query(params![session_id])?;
        match rows.next()? {
            Some(row) => Ok(self.record_from_row(row, Utc::now())?),
            None => Err(StoreError::NotFound),
        }
    }

    /// Most recently predicted sessions first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
        let conn = self.conn.lock().expect("store lock");
        let mut stmt = conn.prepare(
            "SELECT session_id, created_at, user_type, confidence, status,
                    movement_count, last_prediction, ip_address, user_agent
             FROM sessions ORDER BY last_prediction DESC LIMIT ?1",
        )?;
        let now = Utc::now();
        let mut rows = stmt.query(params![limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(self.record_from_row(row, now)?);
        }
        Ok(out)
    }

    /// Mark a session blocked. Idempotent; unknown ids report `NotFound`.
    pub fn block(&self, session_id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store lock");
        let changed = conn.execute(
            "UPDATE sessions SET status = 'blocked' WHERE session_id = ?1",
            params![session_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Remove a session row. Idempotent; deleting an absent id is a no-op.
    pub fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store lock");
        conn.execute(
            "DELETE FROM sessions WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<SessionStats, StoreError> {
        let conn = self.conn.lock().expect("store lock");
        let total: u64 =
            conn.query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get(0))?;
        let human: u64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE user_type = 'Human'",
            [],
            |r| r.get(0),
        )?;
        let bot: u64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE user_type = 'Bot'",
            [],
            |r| r.get(0),
        )?;
        Ok(SessionStats {
            total_sessions: total,
            human_sessions: human,
            bot_sessions: bot,
        })
    }

    fn record_from_row(
        &self,
        row: &rusqlite::Row<'_>,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, rusqlite::Error> {
        let created_raw: String = row.get(1)?;
        let status_raw: String = row.get(4)?;
        let last_raw: String = row.get(6)?;
        let last_prediction_at = parse_ts(&last_raw);
        let stored = SessionStatus::parse(&status_raw);
        Ok(SessionRecord {
            session_id: row.get(0)?,
            created_at: parse_ts(&created_raw),
            user_type: row.get(2)?,
            confidence: row.get(3)?,
            status: derive_status(stored, last_prediction_at, now, self.inactivity),
            movement_count: row.get::<_, i64>(5)? as u32,
            last_prediction_at,
            ip_address: row.get(7)?,
            user_agent: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::open_in_memory(Duration::minutes(2)).unwrap()
    }

    #[test]
    fn upsert_then_get_roundtrip() {
        let s = store();
        let t = Utc::now();
        s.upsert("s1", "Human", 91.25, 42, t, "10.0.0.1", "Mozilla/5.0")
            .unwrap();
        let rec = s.get("s1").unwrap();
        assert_eq!(rec.session_id, "s1");
        assert_eq!(rec.user_type, "Human");
        assert_eq!(rec.confidence, 91.25);
        assert_eq!(rec.movement_count, 42);
        assert_eq!(rec.status, SessionStatus::Active);
        assert_eq!(rec.ip_address, "10.0.0.1");
    }

    #[test]
    fn upsert_is_idempotent() {
        let s = store();
        let t = Utc::now();
        s.upsert("s1", "Bot", 88.0, 10, t, "1.2.3.4", "curl").unwrap();
        let first = s.get("s1").unwrap();
        s.upsert("s1", "Bot", 88.0, 10, t, "1.2.3.4", "curl").unwrap();
        let second = s.get("s1").unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.movement_count, second.movement_count);
        assert_eq!(first.last_prediction_at, second.last_prediction_at);
    }

    #[test]
    fn upsert_preserves_created_at_and_replaces_verdict() {
        let s = store();
        let t0 = Utc::now() - Duration::seconds(30);
        s.upsert("s1", "Human", 70.0, 5, t0, "1.1.1.1", "ua").unwrap();
        let before = s.get("s1").unwrap();

        let t1 = Utc::now();
        s.upsert("s1", "Bot", 99.5, 80, t1, "1.1.1.1", "ua").unwrap();
        let after = s.get("s1").unwrap();

        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.user_type, "Bot");
        assert_eq!(after.confidence, 99.5);
        assert_eq!(after.movement_count, 80);
        assert!(after.last_prediction_at > before.last_prediction_at);
    }

    #[test]
    fn stale_active_session_reads_inactive() {
        let s = store();
        let stale = Utc::now() - Duration::minutes(3);
        s.upsert("s1", "Human", 80.0, 9, stale, "ip", "ua").unwrap();
        assert_eq!(s.get("s1").unwrap().status, SessionStatus::Inactive);
    }

    #[test]
    fn blocked_is_sticky_across_inactivity_and_reblocks() {
        let s = store();
        let stale = Utc::now() - Duration::minutes(10);
        s.upsert("s1", "Bot", 95.0, 3, stale, "ip", "ua").unwrap();
        s.block("s1").unwrap();
        assert_eq!(s.get("s1").unwrap().status, SessionStatus::Blocked);
        // Second block also succeeds, status unchanged.
        s.block("s1").unwrap();
        assert_eq!(s.get("s1").unwrap().status, SessionStatus::Blocked);
    }

    #[test]
    fn new_verdict_unblocks_by_resetting_status() {
        let s = store();
        s.upsert("s1", "Bot", 95.0, 3, Utc::now(), "ip", "ua").unwrap();
        s.block("s1").unwrap();
        s.upsert("s1", "Human", 60.0, 12, Utc::now(), "ip", "ua").unwrap();
        assert_eq!(s.get("s1").unwrap().status, SessionStatus::Active);
    }

    #[test]
    fn block_unknown_session_reports_not_found() {
        let s = store();
        assert!(matches!(s.block("ghost"), Err(StoreError::NotFound)));
    }

    #[test]
    fn delete_is_idempotent() {
        let s = store();
        s.upsert("s1", "Human", 50.0, 4, Utc::now(), "ip", "ua").unwrap();
        s.delete("s1").unwrap();
        assert!(matches!(s.get("s1"), Err(StoreError::NotFound)));
        s.delete("s1").unwrap();
    }

    #[test]
    fn list_recent_orders_by_last_prediction() {
        let s = store();
        let now = Utc::now();
        s.upsert("old", "Human", 50.0, 1, now - Duration::seconds(20), "ip", "ua")
            .unwrap();
        s.upsert("new", "Bot", 90.0, 2, now, "ip", "ua").unwrap();
        s.upsert("mid", "Human", 70.0, 3, now - Duration::seconds(10), "ip", "ua")
            .unwrap();
        let ids: Vec<String> = s
            .list_recent(10)
            .unwrap()
            .into_iter()
            .map(|r| r.session_id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);

        let limited = s.list_recent(2).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn stats_count_by_user_type() {
        let s = store();
        let now = Utc::now();
        s.upsert("h1", "Human", 80.0, 1, now, "ip", "ua").unwrap();
        s.upsert("h2", "Human", 85.0, 1, now, "ip", "ua").unwrap();
        s.upsert("b1", "Bot", 99.0, 1, now, "ip", "ua").unwrap();
        let stats = s.stats().unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.human_sessions, 2);
        assert_eq!(stats.bot_sessions, 1);
    }

    #[test]
    fn derive_status_rules() {
        let now = Utc::now();
        let window = Duration::minutes(2);
        let fresh = now - Duration::seconds(30);
        let stale = now - Duration::minutes(5);
        assert_eq!(
            derive_status(SessionStatus::Active, fresh, now, window),
            SessionStatus::Active
        );
        assert_eq!(
            derive_status(SessionStatus::Active, stale, now, window),
            SessionStatus::Inactive
        );
        assert_eq!(
            derive_status(SessionStatus::Blocked, stale, now, window),
            SessionStatus::Blocked
        );
    }
}
