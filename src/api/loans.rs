//! Borrow and return endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::loan::{BorrowRequest, Loan, LoanQuery, OverdueQuery, ReturnRequest},
    services::loans::today,
    AppState,
};

use super::AuthenticatedUser;

/// List the loan ledger
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans ordered by id", body = Vec<Loan>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list_loans(&principal, &query).await?;
    Ok(Json(loans))
}

/// Borrow one copy of a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Loan recorded", body = Loan),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "No copies available")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.borrow(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed copy
#[utoipa::path(
    post,
    path = "/loans/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Loan closed", body = Loan),
        (status = 404, description = "Book not found"),
        (status = 422, description = "No active loan for this book and borrower")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.return_book(&principal, request).await?;
    Ok(Json(loan))
}

/// Active loans past their due date
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(OverdueQuery),
    responses(
        (status = 200, description = "Overdue loans", body = Vec<Loan>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn overdue_loans(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<OverdueQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    let as_of = query.as_of.unwrap_or_else(today);
    let loans = state.services.loans.overdue_loans(&principal, as_of).await?;
    Ok(Json(loans))
}

/// Borrower ids with at least one active loan
#[utoipa::path(
    get,
    path = "/loans/borrowers",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Distinct borrower ids", body = Vec<String>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn active_borrowers(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    let borrowers = state.services.loans.active_borrowers(&principal).await?;
    Ok(Json(borrowers))
}
