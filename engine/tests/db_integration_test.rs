//! Integration tests for the workout store
//!
//! Seeds through the repository and reads back through the query tool —
//! the same two paths the seed command and a live run take.

use chrono::NaiveDate;
use serde_json::Value;
use tempfile::TempDir;

use stride_engine::db::{Database, Workout};
use stride_engine::tools::HistoryQueryTool;

fn run(activity_id: &str, date: &str, pace: f64) -> Workout {
    Workout {
        id: None,
        activity_id: activity_id.to_string(),
        user_id: "runner-1".to_string(),
        name: "Morning Run".to_string(),
        distance: 10.0,
        moving_time: 10.0 * pace,
        total_elevation_gain: 55.0,
        activity_type: "Run".to_string(),
        start_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        average_pace: pace,
        average_heartrate: Some(150.0),
        max_heartrate: Some(175.0),
    }
}

#[tokio::test]
async fn test_seeded_store_answers_average_pace_queries() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("stride.db");

    let db = Database::new(&db_path).await.unwrap();
    let repo = db.workouts();
    repo.insert(&run("a1", "2026-06-01", 6.0)).await.unwrap();
    repo.insert(&run("a2", "2026-06-08", 7.0)).await.unwrap();
    db.close().await.unwrap();

    let tool = HistoryQueryTool::new(&db_path);
    let rows = tool
        .query("select avg(average_pace) from workouts where type='Run'")
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], Value::from(6.5));
}

#[tokio::test]
async fn test_query_tool_sees_repository_writes_without_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("stride.db");

    let db = Database::new(&db_path).await.unwrap();
    let tool = HistoryQueryTool::new(&db_path);

    // WAL mode: the read-only connection observes committed pool writes
    db.workouts()
        .insert(&run("a1", "2026-06-01", 6.2))
        .await
        .unwrap();

    let rows = tool.query("select count(*) from workouts").await.unwrap();
    assert_eq!(rows[0][0], Value::from(1));

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_date_window_filters_apply() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("stride.db");

    let db = Database::new(&db_path).await.unwrap();
    let repo = db.workouts();
    repo.insert(&run("recent", "2026-07-20", 6.0)).await.unwrap();
    repo.insert(&run("ancient", "2019-01-01", 5.0)).await.unwrap();
    db.close().await.unwrap();

    let tool = HistoryQueryTool::new(&db_path);
    let rows = tool
        .query("select activity_id from workouts where start_date >= '2026-01-01'")
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], Value::from("recent"));
}
