//! Reading status tracking service.
//!
//! Statuses are labels with upsert semantics, not a workflow engine: any
//! transition is allowed, and deleting the record is the fourth state.

use chrono::{Datelike, Local, NaiveDate};

use crate::{
    error::AppResult,
    models::reading::{ReadingState, ReadingStats, ReadingStatus, UpsertReadingStatus},
    repository::Repository,
};

/// Velocity statistics look at this trailing window
const VELOCITY_WINDOW_DAYS: i64 = 90;

/// Fill in the date a transition implies when the caller didn't supply
/// one: entering `reading` stamps a start date, entering `read` stamps a
/// finish date.
pub fn stamp_dates(
    status: ReadingState,
    start_date: Option<NaiveDate>,
    finish_date: Option<NaiveDate>,
    today: NaiveDate,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match status {
        ReadingState::Reading => (start_date.or(Some(today)), finish_date),
        ReadingState::Read => (start_date, finish_date.or(Some(today))),
        ReadingState::WantToRead => (start_date, finish_date),
    }
}

/// Pages/week and books/month over a window of `days`
pub fn velocity(pages_in_window: i64, finished_in_window: i64, days: i64) -> (f64, f64) {
    let weeks = days as f64 / 7.0;
    let months = days as f64 / 30.0;
    (
        pages_in_window as f64 / weeks,
        finished_in_window as f64 / months,
    )
}

#[derive(Clone)]
pub struct ReadingService {
    repository: Repository,
}

impl ReadingService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, item_id: i32, user_id: i32) -> AppResult<Option<ReadingStatus>> {
        self.repository.reading.get(item_id, user_id).await
    }

    /// Upsert the (item, user) record, never a duplicate row
    pub async fn upsert(
        &self,
        item_id: i32,
        user_id: i32,
        request: UpsertReadingStatus,
    ) -> AppResult<ReadingStatus> {
        // Verify the item exists so statuses cannot dangle
        self.repository.items.get_by_id(item_id).await?;

        let today = Local::now().date_naive();
        let (start_date, finish_date) = stamp_dates(
            request.status,
            request.start_date,
            request.finish_date,
            today,
        );

        self.repository
            .reading
            .upsert(
                item_id,
                user_id,
                request.status.as_str(),
                start_date,
                finish_date,
                request.current_page,
            )
            .await
    }

    pub async fn delete(&self, item_id: i32, user_id: i32) -> AppResult<()> {
        self.repository.reading.delete(item_id, user_id).await
    }

    pub async fn list(
        &self,
        user_id: i32,
        status: Option<ReadingState>,
    ) -> AppResult<Vec<ReadingStatus>> {
        self.repository
            .reading
            .list_for_user(user_id, status.map(|s| s.as_str()))
            .await
    }

    /// Derived aggregate statistics for one user
    pub async fn stats(&self, user_id: i32) -> AppResult<ReadingStats> {
        let today = Local::now().date_naive();
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1)
            .unwrap_or(today);
        let window_start = today - chrono::Duration::days(VELOCITY_WINDOW_DAYS);

        let agg = self
            .repository
            .reading
            .aggregates(user_id, year_start, window_start)
            .await?;

        let (pages_per_week, books_per_month) = velocity(
            agg.pages_in_window,
            agg.finished_in_window,
            VELOCITY_WINDOW_DAYS,
        );

        Ok(ReadingStats {
            want_to_read: agg.want_to_read,
            reading: agg.reading,
            read: agg.read,
            pages_read: agg.pages_read,
            finished_this_year: agg.finished_this_year,
            pages_per_week,
            books_per_month,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn entering_reading_stamps_start_date() {
        let today = date(2024, 6, 1);
        let (start, finish) = stamp_dates(ReadingState::Reading, None, None, today);
        assert_eq!(start, Some(today));
        assert_eq!(finish, None);
    }

    #[test]
    fn explicit_start_date_is_kept() {
        let today = date(2024, 6, 1);
        let explicit = date(2024, 5, 20);
        let (start, _) = stamp_dates(ReadingState::Reading, Some(explicit), None, today);
        assert_eq!(start, Some(explicit));
    }

    #[test]
    fn entering_read_stamps_finish_date() {
        let today = date(2024, 6, 1);
        let (start, finish) = stamp_dates(ReadingState::Read, None, None, today);
        assert_eq!(start, None);
        assert_eq!(finish, Some(today));
    }

    #[test]
    fn want_to_read_stamps_nothing() {
        let today = date(2024, 6, 1);
        let (start, finish) = stamp_dates(ReadingState::WantToRead, None, None, today);
        assert_eq!(start, None);
        assert_eq!(finish, None);
    }

    #[test]
    fn velocity_over_ninety_days() {
        // 900 pages and 6 books over 90 days
        let (pages_per_week, books_per_month) = velocity(900, 6, 90);
        assert!((pages_per_week - 70.0).abs() < 1e-9);
        assert!((books_per_month - 2.0).abs() < 1e-9);
    }
}
