//! Lending endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, LoanDetails},
    AppState,
};

use super::AuthenticatedUser;

/// Lend an item out
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item is already out on loan")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let loan = state.services.lending.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Mark a loan returned
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan returned", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.lending.return_loan(id).await?;
    Ok(Json(loan))
}

/// Loan history for one item
#[utoipa::path(
    get,
    path = "/items/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Loans for this item", body = Vec<Loan>),
        (status = 404, description = "Item not found")
    )
)]
pub async fn item_loans(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(item_id): Path<i32>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.lending.loans_for_item(item_id).await?;
    Ok(Json(loans))
}

/// All currently open loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open loans, oldest first", body = Vec<LoanDetails>)
    )
)]
pub async fn open_loans(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.lending.open_loans().await?;
    Ok(Json(loans))
}
