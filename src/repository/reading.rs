//! Reading status repository.
//!
//! One row per (item, user) pair, enforced by the primary key; writes go
//! through an upsert so repeated calls update in place.

use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::reading::ReadingStatus,
};

/// Raw aggregates for one user's reading activity; velocity math happens
/// in the service layer.
#[derive(Debug, Clone, Default)]
pub struct ReadingAggregates {
    pub want_to_read: i64,
    pub reading: i64,
    pub read: i64,
    pub pages_read: i64,
    pub finished_this_year: i64,
    pub pages_in_window: i64,
    pub finished_in_window: i64,
}

#[derive(Clone)]
pub struct ReadingRepository {
    pool: Pool<Postgres>,
}

impl ReadingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, item_id: i32, user_id: i32) -> AppResult<Option<ReadingStatus>> {
        let status = sqlx::query_as::<_, ReadingStatus>(
            "SELECT * FROM reading_status WHERE item_id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }

    /// Insert or update the (item, user) record in one statement
    pub async fn upsert(
        &self,
        item_id: i32,
        user_id: i32,
        status: &str,
        start_date: Option<NaiveDate>,
        finish_date: Option<NaiveDate>,
        current_page: Option<i32>,
    ) -> AppResult<ReadingStatus> {
        let row = sqlx::query_as::<_, ReadingStatus>(
            r#"
            INSERT INTO reading_status (item_id, user_id, status, start_date, finish_date, current_page, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (item_id, user_id) DO UPDATE SET
                status = EXCLUDED.status,
                start_date = EXCLUDED.start_date,
                finish_date = EXCLUDED.finish_date,
                current_page = EXCLUDED.current_page,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .bind(status)
        .bind(start_date)
        .bind(finish_date)
        .bind(current_page)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Remove the record; absence of a row is the implicit "none" state
    pub async fn delete(&self, item_id: i32, user_id: i32) -> AppResult<()> {
        let rows = sqlx::query("DELETE FROM reading_status WHERE item_id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(AppError::NotFound(format!(
                "No reading status for item {}",
                item_id
            )));
        }
        Ok(())
    }

    pub async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<&str>,
    ) -> AppResult<Vec<ReadingStatus>> {
        let rows = sqlx::query_as::<_, ReadingStatus>(
            r#"
            SELECT * FROM reading_status
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Aggregate counts for the stats endpoint. `window_start` bounds the
    /// velocity window, `year_start` the finished-this-year count.
    pub async fn aggregates(
        &self,
        user_id: i32,
        year_start: NaiveDate,
        window_start: NaiveDate,
    ) -> AppResult<ReadingAggregates> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE rs.status = 'want_to_read') AS want_to_read,
                COUNT(*) FILTER (WHERE rs.status = 'reading') AS reading,
                COUNT(*) FILTER (WHERE rs.status = 'read') AS read,
                COALESCE(SUM(i.page_count) FILTER (WHERE rs.status = 'read'), 0) AS pages_read,
                COUNT(*) FILTER (WHERE rs.status = 'read' AND rs.finish_date >= $2) AS finished_this_year,
                COALESCE(SUM(i.page_count) FILTER (WHERE rs.status = 'read' AND rs.finish_date >= $3), 0) AS pages_in_window,
                COUNT(*) FILTER (WHERE rs.status = 'read' AND rs.finish_date >= $3) AS finished_in_window
            FROM reading_status rs
            JOIN items i ON i.id = rs.item_id
            WHERE rs.user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(year_start)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(ReadingAggregates {
            want_to_read: row.get("want_to_read"),
            reading: row.get("reading"),
            read: row.get("read"),
            pages_read: row.get::<i64, _>("pages_read"),
            finished_this_year: row.get("finished_this_year"),
            pages_in_window: row.get::<i64, _>("pages_in_window"),
            finished_in_window: row.get("finished_in_window"),
        })
    }
}
