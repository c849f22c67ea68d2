//! Reading status tracking models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Reading states. Absence of a record is the implicit fourth state:
/// these are labels, not a workflow engine, and any transition is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReadingState {
    WantToRead,
    Reading,
    Read,
}

impl ReadingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingState::WantToRead => "want_to_read",
            ReadingState::Reading => "reading",
            ReadingState::Read => "read",
        }
    }
}

impl std::fmt::Display for ReadingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReadingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "want_to_read" => Ok(ReadingState::WantToRead),
            "reading" => Ok(ReadingState::Reading),
            "read" => Ok(ReadingState::Read),
            _ => Err(format!("Invalid reading state: {}", s)),
        }
    }
}

/// One reading-status record per (item, user) pair
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReadingStatus {
    pub item_id: i32,
    pub user_id: i32,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub current_page: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Upsert payload for a reading status
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpsertReadingStatus {
    pub status: ReadingState,
    /// Defaults to today when entering `reading` without one
    pub start_date: Option<NaiveDate>,
    /// Defaults to today when entering `read` without one
    pub finish_date: Option<NaiveDate>,
    pub current_page: Option<i32>,
}

/// Query parameters for the per-user reading list
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReadingListQuery {
    pub status: Option<ReadingState>,
}

/// Derived aggregate statistics for one user's reading activity
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReadingStats {
    pub want_to_read: i64,
    pub reading: i64,
    pub read: i64,
    pub pages_read: i64,
    pub finished_this_year: i64,
    /// Pages per week over the trailing 90-day window
    pub pages_per_week: f64,
    /// Books per month over the trailing 90-day window
    pub books_per_month: f64,
}
