use crate::domain::error::{AppError, Result};
use crate::domain::report::{NewSubjectPerformance, SubjectPerformanceRecord};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;

/// Append-only store of per-subject results, one row per subject per upload.
pub struct ReportResultsRepository {
    pool: Pool<Sqlite>,
}

impl ReportResultsRepository {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own database
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS report_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                subject TEXT NOT NULL,
                percentage REAL NOT NULL,
                needs_focus BOOLEAN NOT NULL,
                created_at DATETIME NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_report_results_user ON report_results (user_id)",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create index: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn insert(&self, row: &NewSubjectPerformance) -> Result<SubjectPerformanceRecord> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO report_results (user_id, subject, percentage, needs_focus, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(row.user_id)
        .bind(&row.subject)
        .bind(row.percentage)
        .bind(row.needs_focus)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to save result for subject '{}': {}",
                row.subject, e
            ))
        })?;

        Ok(SubjectPerformanceRecord {
            id: result.last_insert_rowid(),
            user_id: row.user_id,
            subject: row.subject.clone(),
            percentage: row.percentage,
            needs_focus: row.needs_focus,
            created_at,
        })
    }

    /// A user's full history, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<SubjectPerformanceRecord>> {
        sqlx::query_as::<_, ReportResultEntity>(
            "SELECT id, user_id, subject, percentage, needs_focus, created_at
             FROM report_results WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch results: {}", e)))
        .map(|entities| entities.into_iter().map(|e| e.into()).collect())
    }

    #[cfg(test)]
    pub(crate) async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(sqlx::FromRow)]
struct ReportResultEntity {
    id: i64,
    user_id: i64,
    subject: String,
    percentage: f64,
    needs_focus: bool,
    created_at: DateTime<Utc>,
}

impl From<ReportResultEntity> for SubjectPerformanceRecord {
    fn from(e: ReportResultEntity) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            subject: e.subject,
            percentage: e.percentage,
            needs_focus: e.needs_focus,
            created_at: e.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: i64, subject: &str, percentage: f64, needs_focus: bool) -> NewSubjectPerformance {
        NewSubjectPerformance {
            user_id,
            subject: subject.to_string(),
            percentage,
            needs_focus,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_for_user() {
        let repo = ReportResultsRepository::init("sqlite::memory:").await.unwrap();
        let saved = repo.insert(&row(7, "Mathematics", 42.5, true)).await.unwrap();
        repo.insert(&row(7, "English", 71.0, false)).await.unwrap();
        repo.insert(&row(8, "History", 90.0, false)).await.unwrap();

        assert!(saved.id > 0);
        let history = repo.list_for_user(7).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].subject, "English");
        assert_eq!(history[1].subject, "Mathematics");
        assert!(history[1].needs_focus);
        assert!((history[1].percentage - 42.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_repeated_rows_are_appended() {
        let repo = ReportResultsRepository::init("sqlite::memory:").await.unwrap();
        repo.insert(&row(1, "Physics", 55.0, false)).await.unwrap();
        repo.insert(&row(1, "Physics", 55.0, false)).await.unwrap();
        assert_eq!(repo.list_for_user(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_closed_pool_is_database_error() {
        let repo = ReportResultsRepository::init("sqlite::memory:").await.unwrap();
        repo.close().await;
        let err = repo.insert(&row(1, "Physics", 55.0, false)).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
