use anima_core::{DriveState, PersistedSnapshot};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::path::Path;

use crate::error::PersistenceError;

const MEMORY_URL: &str = "sqlite::memory:";

/// One row of the append-only emotion timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub emotion: String,
    pub intensity: f32,
    pub cause: String,
    pub timestamp: DateTime<Utc>,
}

/// Long-term defaults the engine falls back to.
#[derive(Debug, Clone, PartialEq)]
pub struct Baselines {
    pub baseline_mood: String,
    pub baseline_intensity: f32,
    pub drives: DriveState,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed durable store for the affective state.
///
/// - `emotional_state`: single overwritten snapshot row
/// - `emotion_timeline`: append-only, pruned oldest-first to a cap
/// - `emotional_baselines`: single row of baseline mood and drives
#[derive(Clone)]
pub struct EmotionStore {
    pool: Pool<Sqlite>,
}

impl EmotionStore {
    /// Open (creating if needed) the database at `db_path`. The path
    /// `:memory:` opens a private in-memory database.
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let path = db_path.as_ref();
        if path.as_os_str() == ":memory:" {
            return Self::open_in_memory().await;
        }
        let db_url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new().connect(&db_url).await?;
        tracing::info!("Emotion store opened at {}", path.display());

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store. Held on one long-lived connection so the
    /// database lives as long as the pool.
    pub async fn open_in_memory() -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(MEMORY_URL)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), PersistenceError> {
        self.create("emotional_state", r#"
            CREATE TABLE IF NOT EXISTS emotional_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                state_json TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            );
            "#).await?;

        self.create("emotion_timeline", r#"
            CREATE TABLE IF NOT EXISTS emotion_timeline (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                emotion TEXT NOT NULL,
                intensity REAL NOT NULL,
                cause TEXT NOT NULL DEFAULT '',
                timestamp INTEGER NOT NULL
            );
            "#).await?;

        self.create(
            "idx_timeline_timestamp",
            "CREATE INDEX IF NOT EXISTS idx_timeline_timestamp ON emotion_timeline(timestamp)",
        )
        .await?;

        self.create("emotional_baselines", r#"
            CREATE TABLE IF NOT EXISTS emotional_baselines (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                baseline_mood TEXT NOT NULL,
                baseline_intensity REAL NOT NULL,
                drive_learning REAL NOT NULL DEFAULT 0.8,
                drive_connection REAL NOT NULL DEFAULT 0.7,
                drive_competence REAL NOT NULL DEFAULT 0.8,
                drive_contribution REAL NOT NULL DEFAULT 0.9,
                drive_autonomy REAL NOT NULL DEFAULT 0.6,
                updated_at INTEGER NOT NULL
            );
            "#).await?;

        Ok(())
    }

    async fn create(&self, name: &str, sql: &str) -> Result<(), PersistenceError> {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| PersistenceError::Migration(format!("{}: {}", name, e)))?;
        Ok(())
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    /// Replace the current snapshot and append its emotions to the timeline,
    /// pruning the timeline to `timeline_cap` rows. One transaction.
    pub async fn save_snapshot(
        &self,
        snapshot: &PersistedSnapshot,
        timeline_cap: i64,
    ) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(snapshot)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO emotional_state (id, state_json, saved_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET state_json = excluded.state_json, saved_at = excluded.saved_at",
        )
        .bind(&json)
        .bind(snapshot.saved_at.timestamp())
        .execute(&mut *tx)
        .await?;

        for e in &snapshot.active_emotions {
            sqlx::query(
                "INSERT INTO emotion_timeline (emotion, intensity, cause, timestamp) VALUES (?, ?, ?, ?)",
            )
            .bind(&e.emotion)
            .bind(e.intensity as f64)
            .bind(&e.cause)
            .bind(e.created_at.timestamp())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "DELETE FROM emotion_timeline WHERE id NOT IN \
             (SELECT id FROM emotion_timeline ORDER BY id DESC LIMIT ?)",
        )
        .bind(timeline_cap.max(0))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            "Emotional state saved: {} emotions, mood={}",
            snapshot.active_emotions.len(),
            snapshot.mood.as_ref().map(|m| m.dominant.as_str()).unwrap_or("none")
        );
        Ok(())
    }

    /// Latest snapshot, or `None` on a cold start.
    pub async fn load_snapshot(&self) -> Result<Option<PersistedSnapshot>, PersistenceError> {
        let row = sqlx::query("SELECT state_json FROM emotional_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let json: String = row.try_get("state_json")?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // Timeline
    // ========================================================================

    /// Entries newer than `now - hours`, oldest first.
    pub async fn timeline(
        &self,
        hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimelineEntry>, PersistenceError> {
        let cutoff = (now - Duration::hours(hours.max(0))).timestamp();
        let rows = sqlx::query(
            "SELECT emotion, intensity, cause, timestamp FROM emotion_timeline \
             WHERE timestamp > ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let secs: i64 = row.try_get("timestamp")?;
            let intensity: f64 = row.try_get("intensity")?;
            entries.push(TimelineEntry {
                emotion: row.try_get("emotion")?,
                intensity: intensity as f32,
                cause: row.try_get("cause")?,
                timestamp: DateTime::from_timestamp(secs, 0).unwrap_or_default(),
            });
        }
        Ok(entries)
    }

    /// Most frequent emotion label over the trailing window. Ties go to the
    /// label seen first.
    pub async fn dominant_over(
        &self,
        hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, PersistenceError> {
        let entries = self.timeline(hours, now).await?;
        let mut counts: Vec<(String, usize)> = Vec::new();
        for e in entries {
            match counts.iter_mut().find(|(label, _)| *label == e.emotion) {
                Some((_, n)) => *n += 1,
                None => counts.push((e.emotion, 1)),
            }
        }

        let mut best: Option<(String, usize)> = None;
        for (label, n) in counts {
            if best.as_ref().map_or(true, |(_, b)| n > *b) {
                best = Some((label, n));
            }
        }
        Ok(best.map(|(label, _)| label))
    }

    pub async fn timeline_len(&self) -> Result<i64, PersistenceError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM emotion_timeline")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    // ========================================================================
    // Baselines
    // ========================================================================

    pub async fn save_baselines(&self, baselines: &Baselines) -> Result<(), PersistenceError> {
        let d = &baselines.drives;
        sqlx::query(
            "INSERT INTO emotional_baselines \
             (id, baseline_mood, baseline_intensity, drive_learning, drive_connection, \
              drive_competence, drive_contribution, drive_autonomy, updated_at) \
             VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
               baseline_mood = excluded.baseline_mood, \
               baseline_intensity = excluded.baseline_intensity, \
               drive_learning = excluded.drive_learning, \
               drive_connection = excluded.drive_connection, \
               drive_competence = excluded.drive_competence, \
               drive_contribution = excluded.drive_contribution, \
               drive_autonomy = excluded.drive_autonomy, \
               updated_at = excluded.updated_at",
        )
        .bind(&baselines.baseline_mood)
        .bind(baselines.baseline_intensity as f64)
        .bind(d.learning as f64)
        .bind(d.connection as f64)
        .bind(d.competence as f64)
        .bind(d.contribution as f64)
        .bind(d.autonomy as f64)
        .bind(baselines.updated_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_baselines(&self) -> Result<Option<Baselines>, PersistenceError> {
        let row = sqlx::query(
            "SELECT baseline_mood, baseline_intensity, drive_learning, drive_connection, \
             drive_competence, drive_contribution, drive_autonomy, updated_at \
             FROM emotional_baselines WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let real = |name: &str| -> Result<f32, sqlx::Error> { Ok(row.try_get::<f64, _>(name)? as f32) };
        let mut drives = DriveState {
            learning: real("drive_learning")?,
            connection: real("drive_connection")?,
            competence: real("drive_competence")?,
            contribution: real("drive_contribution")?,
            autonomy: real("drive_autonomy")?,
        };
        drives.normalize();
        let updated: i64 = row.try_get("updated_at")?;

        Ok(Some(Baselines {
            baseline_mood: row.try_get("baseline_mood")?,
            baseline_intensity: real("baseline_intensity")?,
            drives,
            updated_at: DateTime::from_timestamp(updated, 0).unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::{PersistedEmotion, PersistedMood};

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn snap(labels: &[&str], saved_at: DateTime<Utc>) -> PersistedSnapshot {
        PersistedSnapshot {
            active_emotions: labels
                .iter()
                .enumerate()
                .map(|(i, l)| PersistedEmotion {
                    emotion: l.to_string(),
                    intensity: 0.5,
                    cause: format!("cause {}", i),
                    created_at: saved_at - Duration::minutes(1),
                })
                .collect(),
            mood: Some(PersistedMood {
                dominant: "hope".into(),
                intensity: 0.4,
                started_at: saved_at,
                influences: vec![],
            }),
            drives: DriveState::default(),
            complexity: None,
            baseline_mood: "contentment".into(),
            baseline_intensity: 0.6,
            saved_at,
        }
    }

    #[tokio::test]
    async fn test_cold_start_is_none() {
        let store = EmotionStore::open_in_memory().await.unwrap();
        assert!(store.load_snapshot().await.unwrap().is_none());
        assert!(store.load_baselines().await.unwrap().is_none());
        assert_eq!(store.dominant_over(48, t0()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_snapshot_overwrites_single_row() {
        let store = EmotionStore::open_in_memory().await.unwrap();
        store.save_snapshot(&snap(&["joy"], t0()), 500).await.unwrap();
        store.save_snapshot(&snap(&["awe", "hope"], t0() + Duration::minutes(5)), 500).await.unwrap();

        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded.active_emotions.len(), 2);
        assert_eq!(loaded.saved_at, t0() + Duration::minutes(5));
        assert_eq!(store.timeline_len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_timeline_pruned_to_cap() {
        let store = EmotionStore::open_in_memory().await.unwrap();
        for i in 0..4 {
            store
                .save_snapshot(&snap(&["joy", "awe", "hope"], t0() + Duration::minutes(i)), 5)
                .await
                .unwrap();
        }
        assert_eq!(store.timeline_len().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_timeline_window_and_dominant() {
        let store = EmotionStore::open_in_memory().await.unwrap();
        store.save_snapshot(&snap(&["joy"], t0() - Duration::hours(50)), 500).await.unwrap();
        store.save_snapshot(&snap(&["awe", "hope"], t0() - Duration::hours(2)), 500).await.unwrap();
        store.save_snapshot(&snap(&["hope", "awe"], t0() - Duration::hours(1)), 500).await.unwrap();

        let recent = store.timeline(48, t0()).await.unwrap();
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].emotion, "awe");
        assert_eq!(recent[0].cause, "cause 0");

        // awe and hope tie at 2; awe was seen first
        assert_eq!(store.dominant_over(48, t0()).await.unwrap().as_deref(), Some("awe"));
        assert_eq!(store.timeline(100, t0()).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_baselines_roundtrip() {
        let store = EmotionStore::open_in_memory().await.unwrap();
        let mut drives = DriveState::default();
        drives.autonomy = 0.25;
        let b = Baselines {
            baseline_mood: "peaceful".into(),
            baseline_intensity: 0.5,
            drives,
            updated_at: t0(),
        };
        store.save_baselines(&b).await.unwrap();
        store.save_baselines(&b).await.unwrap();
        assert_eq!(store.load_baselines().await.unwrap().unwrap(), b);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("anima.db");
        {
            let store = EmotionStore::open(&path).await.unwrap();
            store.save_snapshot(&snap(&["pride"], t0()), 500).await.unwrap();
        }
        let store = EmotionStore::open(&path).await.unwrap();
        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded.active_emotions[0].emotion, "pride");
    }
}
