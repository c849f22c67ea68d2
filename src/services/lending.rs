//! Lending service: track items handed out to friends

use chrono::Local;

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, LoanDetails},
    repository::Repository,
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
}

impl LendingService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Lend an item out. One open loan per item at a time.
    pub async fn create_loan(&self, request: CreateLoan) -> AppResult<Loan> {
        self.repository.items.get_by_id(request.item_id).await?;

        if self.repository.loans.has_open_loan(request.item_id).await? {
            return Err(AppError::Conflict(
                "Item is already out on loan".to_string(),
            ));
        }

        let loaned_at = request
            .loaned_at
            .unwrap_or_else(|| Local::now().date_naive());

        self.repository
            .loans
            .create(
                request.item_id,
                &request.borrower,
                request.contact.as_deref(),
                loaned_at,
                request.due_date,
                request.notes.as_deref(),
            )
            .await
    }

    /// Mark a loan returned, stamping today's date
    pub async fn return_loan(&self, id: i32) -> AppResult<Loan> {
        self.repository
            .loans
            .mark_returned(id, Local::now().date_naive())
            .await
    }

    pub async fn loans_for_item(&self, item_id: i32) -> AppResult<Vec<Loan>> {
        self.repository.items.get_by_id(item_id).await?;
        self.repository.loans.list_for_item(item_id).await
    }

    pub async fn open_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_open().await
    }
}
