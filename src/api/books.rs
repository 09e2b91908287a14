//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppResult,
    export::CSV_FILE_NAME,
    models::book::{Book, BookQuery, CreateBook},
    services::catalog::Dashboard,
    AppState,
};

use super::AuthenticatedUser;

/// List or search the catalog
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books in insertion order", body = Vec<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.query(&principal, &query).await?;
    Ok(Json(books))
}

/// Get a book by its identifier
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(book_id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(&principal, &book_id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff privileges required"),
        (status = 409, description = "Book ID already exists")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.catalog.add_book(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Download the catalog as CSV
#[utoipa::path(
    get,
    path = "/books/export",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn export_books(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let csv = state.services.catalog.export_csv(&principal).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILE_NAME),
            ),
        ],
        csv,
    ))
}

/// Catalog overview
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Totals, per-category counts and recent additions", body = Dashboard),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state.services.catalog.dashboard(&principal).await?;
    Ok(Json(dashboard))
}
