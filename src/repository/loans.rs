//! Lending repository

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanDetails},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    /// Is there an unreturned loan on this item?
    pub async fn has_open_loan(&self, item_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE item_id = $1 AND returned_at IS NULL)",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(
        &self,
        item_id: i32,
        borrower: &str,
        contact: Option<&str>,
        loaned_at: NaiveDate,
        due_date: Option<NaiveDate>,
        notes: Option<&str>,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (item_id, borrower, contact, loaned_at, due_date, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(borrower)
        .bind(contact)
        .bind(loaned_at)
        .bind(due_date)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Stamp the return date; fails if the loan was already returned
    pub async fn mark_returned(&self, id: i32, returned_at: NaiveDate) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET returned_at = $2
            WHERE id = $1 AND returned_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(returned_at)
        .fetch_optional(&self.pool)
        .await?;

        match loan {
            Some(loan) => Ok(loan),
            None => {
                // Distinguish "no such loan" from "already returned"
                self.get_by_id(id).await?;
                Err(AppError::Conflict(format!("Loan {} already returned", id)))
            }
        }
    }

    pub async fn list_for_item(&self, item_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE item_id = $1 ORDER BY loaned_at DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// All open loans across the catalog, oldest first
    pub async fn list_open(&self) -> AppResult<Vec<LoanDetails>> {
        let loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.item_id, i.title AS item_title, l.borrower, l.contact,
                   l.loaned_at, l.due_date, l.returned_at, l.notes
            FROM loans l
            JOIN items i ON i.id = l.item_id
            WHERE l.returned_at IS NULL
            ORDER BY l.loaned_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }
}
