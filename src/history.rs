use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;

use crate::input::InputMode;
use crate::levels::{GameMode, Level};
use crate::session::EndReason;
use crate::summary::SessionSummary;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        played_at TEXT NOT NULL,
        game_mode TEXT NOT NULL,
        level TEXT NOT NULL,
        input_mode TEXT NOT NULL,
        end_reason TEXT NOT NULL,
        hits INTEGER NOT NULL,
        duration_seconds REAL NOT NULL,
        mean_interval_seconds REAL,
        feedback TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_level ON sessions(game_mode, level);
    CREATE INDEX IF NOT EXISTS idx_sessions_played_at ON sessions(played_at);
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub played_at: DateTime<Local>,
    pub game_mode: String,
    pub level: String,
    pub input_mode: String,
    pub end_reason: String,
    pub hits: i64,
    pub duration_seconds: f64,
    pub mean_interval_seconds: Option<f64>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutcomeCounts {
    pub wins: i64,
    pub timeouts: i64,
    pub aborts: i64,
}

/// Played sessions, for progress tracking across visits.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        // databases from before ratings were collected
        let has_feedback: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('sessions') WHERE name = 'feedback'",
            [],
            |row| row.get(0),
        )?;
        if !has_feedback {
            conn.execute_batch("ALTER TABLE sessions ADD COLUMN feedback TEXT;")?;
        }
        Ok(Self { conn })
    }

    pub fn record(
        &self,
        summary: &SessionSummary,
        mode: GameMode,
        level: Level,
        input: InputMode,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (played_at, game_mode, level, input_mode, end_reason, hits, duration_seconds, mean_interval_seconds, feedback)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                summary.date.to_rfc3339(),
                mode.to_string(),
                level.to_string(),
                input.to_string(),
                summary.end_reason.to_string(),
                summary.hits as i64,
                summary.duration_seconds,
                summary.mean_interval_seconds,
                summary.feedback.map(|f| f.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT played_at, game_mode, level, input_mode, end_reason, hits,
                   duration_seconds, mean_interval_seconds, feedback
            FROM sessions
            ORDER BY played_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let played_at: String = row.get(0)?;
            let played_at = DateTime::parse_from_rfc3339(&played_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "played_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            Ok(HistoryEntry {
                played_at,
                game_mode: row.get(1)?,
                level: row.get(2)?,
                input_mode: row.get(3)?,
                end_reason: row.get(4)?,
                hits: row.get(5)?,
                duration_seconds: row.get(6)?,
                mean_interval_seconds: row.get(7)?,
                feedback: row.get(8)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Fastest win for a level, in seconds.
    pub fn best_duration(&self, mode: GameMode, level: Level) -> Result<Option<f64>> {
        self.conn
            .query_row(
                r#"
                SELECT MIN(duration_seconds) FROM sessions
                WHERE game_mode = ?1 AND level = ?2 AND end_reason = ?3
                "#,
                params![mode.to_string(), level.to_string(), EndReason::Win.to_string()],
                |row| row.get::<_, Option<f64>>(0),
            )
            .optional()
            .map(Option::flatten)
    }

    pub fn outcome_counts(&self, mode: GameMode, level: Level) -> Result<OutcomeCounts> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT end_reason, COUNT(*) FROM sessions
            WHERE game_mode = ?1 AND level = ?2
            GROUP BY end_reason
            "#,
        )?;
        let mut counts = OutcomeCounts::default();
        let rows = stmt.query_map(params![mode.to_string(), level.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (reason, n) = row?;
            match reason.as_str() {
                "win" => counts.wins = n,
                "timeout" => counts.timeouts = n,
                "early_abort" => counts.aborts = n,
                _ => {}
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{Feedback, HitEntry};
    use chrono::TimeZone;

    fn summary(reason: EndReason, duration: f64, minute: u32) -> SessionSummary {
        SessionSummary {
            date: Local.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap(),
            end_reason: reason,
            hits: 2,
            duration_seconds: duration,
            hit_log: vec![
                HitEntry {
                    time_since_start: 1.0,
                    target_id: 7,
                },
                HitEntry {
                    time_since_start: 2.5,
                    target_id: 4,
                },
            ],
            mean_interval_seconds: Some(1.25),
            feedback: None,
        }
    }

    #[test]
    fn record_and_list_recent() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(
            &summary(EndReason::Win, 12.5, 1),
            GameMode::CircleTheDots,
            Level::One,
            InputMode::Mouse,
        )
        .unwrap();
        db.record(
            &summary(EndReason::Timeout, 300.0, 2),
            GameMode::CircleTheDots,
            Level::One,
            InputMode::Finger,
        )
        .unwrap();

        let recent = db.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].end_reason, "timeout");
        assert_eq!(recent[0].input_mode, "finger");
        assert_eq!(recent[1].game_mode, "Circle the Dots");
        assert_eq!(recent[1].mean_interval_seconds, Some(1.25));

        assert_eq!(db.recent(1).unwrap().len(), 1);
        assert_eq!(recent[0].feedback, None);
    }

    #[test]
    fn old_database_gains_the_feedback_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TABLE sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    played_at TEXT NOT NULL,
                    game_mode TEXT NOT NULL,
                    level TEXT NOT NULL,
                    input_mode TEXT NOT NULL,
                    end_reason TEXT NOT NULL,
                    hits INTEGER NOT NULL,
                    duration_seconds REAL NOT NULL,
                    mean_interval_seconds REAL
                );",
            )
            .unwrap();

        let db = HistoryDb::open(&path).unwrap();
        db.record(
            &summary(EndReason::Win, 9.0, 5),
            GameMode::CircleTheDots,
            Level::One,
            InputMode::Mouse,
        )
        .unwrap();
        assert_eq!(db.recent(1).unwrap().len(), 1);
    }

    #[test]
    fn rating_is_stored_with_the_session() {
        let db = HistoryDb::open_in_memory().unwrap();
        let mut rated = summary(EndReason::Win, 9.0, 4);
        rated.feedback = Some(Feedback::Sad);
        db.record(&rated, GameMode::ConnectTheDots, Level::One, InputMode::Mouse)
            .unwrap();
        assert_eq!(db.recent(1).unwrap()[0].feedback.as_deref(), Some("sad"));
    }

    #[test]
    fn best_duration_only_counts_wins() {
        let db = HistoryDb::open_in_memory().unwrap();
        let (mode, level) = (GameMode::ConnectTheDots, Level::Two);
        assert_eq!(db.best_duration(mode, level).unwrap(), None);

        db.record(&summary(EndReason::Win, 40.0, 1), mode, level, InputMode::Mouse)
            .unwrap();
        db.record(&summary(EndReason::Win, 31.2, 2), mode, level, InputMode::Mouse)
            .unwrap();
        db.record(&summary(EndReason::EarlyAbort, 3.0, 3), mode, level, InputMode::Mouse)
            .unwrap();

        assert_eq!(db.best_duration(mode, level).unwrap(), Some(31.2));
        assert_eq!(db.best_duration(mode, Level::One).unwrap(), None);
    }

    #[test]
    fn outcome_counts_by_reason() {
        let db = HistoryDb::open_in_memory().unwrap();
        let (mode, level) = (GameMode::CircleTheDots, Level::Three);
        for (i, reason) in [EndReason::Win, EndReason::Win, EndReason::EarlyAbort]
            .into_iter()
            .enumerate()
        {
            db.record(&summary(reason, 20.0, i as u32), mode, level, InputMode::Finger)
                .unwrap();
        }
        assert_eq!(
            db.outcome_counts(mode, level).unwrap(),
            OutcomeCounts {
                wins: 2,
                timeouts: 0,
                aborts: 1
            }
        );
    }
}
