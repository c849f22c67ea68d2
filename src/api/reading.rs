//! Reading status endpoints.
//!
//! All routes act on the authenticated user's own records; statuses are
//! per (item, user) and other users' shelves are invisible here.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reading::{ReadingListQuery, ReadingStats, ReadingStatus, UpsertReadingStatus},
    AppState,
};

use super::AuthenticatedUser;

/// Get the caller's reading status for one item
#[utoipa::path(
    get,
    path = "/items/{id}/reading",
    tag = "reading",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Current status, null when unset", body = ReadingStatus)
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(item_id): Path<i32>,
) -> AppResult<Json<Option<ReadingStatus>>> {
    let status = state.services.reading.get(item_id, claims.user_id).await?;
    Ok(Json(status))
}

/// Set the caller's reading status for one item.
///
/// Upsert semantics: repeating the call updates the record in place.
/// Entering `reading` without a start date stamps today, entering `read`
/// without a finish date stamps today.
#[utoipa::path(
    put,
    path = "/items/{id}/reading",
    tag = "reading",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body = UpsertReadingStatus,
    responses(
        (status = 200, description = "Status stored", body = ReadingStatus),
        (status = 404, description = "Item not found")
    )
)]
pub async fn upsert_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(item_id): Path<i32>,
    Json(request): Json<UpsertReadingStatus>,
) -> AppResult<Json<ReadingStatus>> {
    let status = state
        .services
        .reading
        .upsert(item_id, claims.user_id, request)
        .await?;
    Ok(Json(status))
}

/// Clear the caller's reading status for one item
#[utoipa::path(
    delete,
    path = "/items/{id}/reading",
    tag = "reading",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Status cleared"),
        (status = 404, description = "No status was set")
    )
)]
pub async fn delete_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(item_id): Path<i32>,
) -> AppResult<StatusCode> {
    state
        .services
        .reading
        .delete(item_id, claims.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's reading list, optionally filtered by status
#[utoipa::path(
    get,
    path = "/reading",
    tag = "reading",
    security(("bearer_auth" = [])),
    params(ReadingListQuery),
    responses(
        (status = 200, description = "Reading list", body = Vec<ReadingStatus>)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReadingListQuery>,
) -> AppResult<Json<Vec<ReadingStatus>>> {
    let statuses = state
        .services
        .reading
        .list(claims.user_id, query.status)
        .await?;
    Ok(Json(statuses))
}

/// Aggregate reading statistics for the caller
#[utoipa::path(
    get,
    path = "/reading/stats",
    tag = "reading",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Derived statistics", body = ReadingStats)
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ReadingStats>> {
    let stats = state.services.reading.stats(claims.user_id).await?;
    Ok(Json(stats))
}
