/// Workout persistence operations
///
/// Repository over the `workouts` table. All queries are parameterized.
/// Activity ingestion and dedup live upstream; this repository only needs
/// insert (seeding), listing, and counting.
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// One stored workout record.
///
/// Units: distance in kilometers, moving_time in minutes, elevation in
/// meters, average_pace in min/km.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    /// Database row id (None before insert)
    pub id: Option<i64>,

    /// Upstream activity identifier, unique per workout
    pub activity_id: String,

    /// Runner identifier
    pub user_id: String,

    /// Activity name
    pub name: String,

    /// Distance covered in kilometers
    pub distance: f64,

    /// Time spent moving in minutes
    pub moving_time: f64,

    /// Elevation gain in meters
    pub total_elevation_gain: f64,

    /// Activity type (e.g. "Run")
    #[serde(rename = "type")]
    pub activity_type: String,

    /// Date of the activity
    pub start_date: NaiveDate,

    /// Average pace in min/km
    pub average_pace: f64,

    /// Average heart rate in bpm
    pub average_heartrate: Option<f64>,

    /// Maximum heart rate in bpm
    pub max_heartrate: Option<f64>,
}

/// Workout repository for database operations
pub struct WorkoutRepository {
    pool: SqlitePool,
}

impl WorkoutRepository {
    /// Create a new workout repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a workout, ignoring duplicates by activity id.
    pub async fn insert(&self, workout: &Workout) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO workouts \
             (activity_id, user_id, name, distance, moving_time, total_elevation_gain, \
              type, start_date, average_pace, average_heartrate, max_heartrate) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&workout.activity_id)
        .bind(&workout.user_id)
        .bind(&workout.name)
        .bind(workout.distance)
        .bind(workout.moving_time)
        .bind(workout.total_elevation_gain)
        .bind(&workout.activity_type)
        .bind(workout.start_date.format("%Y-%m-%d").to_string())
        .bind(workout.average_pace)
        .bind(workout.average_heartrate)
        .bind(workout.max_heartrate)
        .execute(&self.pool)
        .await
        .context("Failed to insert workout")?;

        Ok(())
    }

    /// List the most recent workouts, newest first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Workout>> {
        let rows = sqlx::query(
            "SELECT id, activity_id, user_id, name, distance, moving_time, \
             total_elevation_gain, type, start_date, average_pace, \
             average_heartrate, max_heartrate \
             FROM workouts ORDER BY start_date DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list workouts")?;

        let mut workouts = Vec::with_capacity(rows.len());
        for row in rows {
            let start_date: String = row.try_get("start_date")?;
            workouts.push(Workout {
                id: Some(row.try_get("id")?),
                activity_id: row.try_get("activity_id")?,
                user_id: row.try_get("user_id")?,
                name: row.try_get("name")?,
                distance: row.try_get("distance")?,
                moving_time: row.try_get("moving_time")?,
                total_elevation_gain: row.try_get("total_elevation_gain")?,
                activity_type: row.try_get("type")?,
                start_date: NaiveDate::parse_from_str(&start_date, "%Y-%m-%d")
                    .context("Invalid start_date in workouts table")?,
                average_pace: row.try_get("average_pace")?,
                average_heartrate: row.try_get("average_heartrate")?,
                max_heartrate: row.try_get("max_heartrate")?,
            });
        }

        Ok(workouts)
    }

    /// Number of stored workouts.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count workouts")?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    fn workout(activity_id: &str, date: NaiveDate) -> Workout {
        Workout {
            id: None,
            activity_id: activity_id.to_string(),
            user_id: "runner-1".to_string(),
            name: "Evening Run".to_string(),
            distance: 8.2,
            moving_time: 51.0,
            total_elevation_gain: 64.0,
            activity_type: "Run".to_string(),
            start_date: date,
            average_pace: 6.2,
            average_heartrate: Some(151.0),
            max_heartrate: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();
        let repo = db.workouts();

        let stored = workout("a1", NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());
        repo.insert(&stored).await.unwrap();

        let listed = repo.list_recent(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].activity_id, "a1");
        assert_eq!(listed[0].start_date, stored.start_date);
        assert_eq!(listed[0].max_heartrate, None);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_activity_ids_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();
        let repo = db.workouts();

        let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        repo.insert(&workout("a1", date)).await.unwrap();
        repo.insert(&workout("a1", date)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_recent_orders_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();
        let repo = db.workouts();

        repo.insert(&workout("old", NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()))
            .await
            .unwrap();
        repo.insert(&workout("new", NaiveDate::from_ymd_opt(2026, 7, 5).unwrap()))
            .await
            .unwrap();

        let listed = repo.list_recent(10).await.unwrap();
        assert_eq!(listed[0].activity_id, "new");
        assert_eq!(listed[1].activity_id, "old");

        db.close().await.unwrap();
    }
}
