//! Lending models: who borrowed which item, and when it came back

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// One lending record. An item with an open (unreturned) loan is out.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub item_id: i32,
    pub borrower: String,
    pub contact: Option<String>,
    pub loaned_at: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub returned_at: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Loan with the item title joined in, for list views
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub item_id: i32,
    pub item_title: String,
    pub borrower: String,
    pub contact: Option<String>,
    pub loaned_at: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub returned_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Create loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    pub item_id: i32,
    #[validate(length(min = 1, message = "Borrower name must not be empty"))]
    pub borrower: String,
    pub contact: Option<String>,
    /// Defaults to today
    pub loaned_at: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}
