//! Catalog management service

use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    export,
    models::{
        book::{Book, BookQuery, CreateBook, SearchField},
        user::Principal,
    },
    repository::Repository,
};

/// Number of books shown in the dashboard's recent list
const RECENT_BOOKS: i64 = 5;

/// Catalog overview
#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    /// Number of distinct titles
    pub total_books: i64,
    /// Copies owned across all titles
    pub total_copies: i64,
    /// Copies on the shelf
    pub available_copies: i64,
    /// Copies out on loan
    pub borrowed_copies: i64,
    /// Loans not yet returned
    pub active_loans: i64,
    pub by_category: Vec<CategoryCount>,
    pub recent_books: Vec<Book>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryCount {
    pub category: String,
    pub books: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the catalog. Its status is derived from `available`.
    pub async fn add_book(&self, principal: &Principal, request: CreateBook) -> AppResult<Book> {
        principal.require_write_catalog()?;

        let request = request.normalized();
        request.validate()?;
        if request.available > request.quantity {
            return Err(AppError::Validation(
                "Available copies cannot exceed quantity".to_string(),
            ));
        }

        let book = request.into_book();
        self.repository.books.insert(&book).await?;

        tracing::info!(
            book_id = %book.book_id,
            quantity = book.quantity,
            available = book.available,
            by = %principal.username,
            "Book added"
        );
        Ok(book)
    }

    pub async fn get_book(&self, principal: &Principal, book_id: &str) -> AppResult<Book> {
        principal.require_read_catalog()?;
        self.repository.books.get(book_id).await
    }

    pub async fn list_books(&self, principal: &Principal) -> AppResult<Vec<Book>> {
        principal.require_read_catalog()?;
        self.repository.books.list_all().await
    }

    /// Case-insensitive substring search on one field
    pub async fn search(&self, principal: &Principal, field: SearchField, needle: &str) -> AppResult<Vec<Book>> {
        principal.require_read_catalog()?;
        self.repository.books.find_by(field, needle.trim()).await
    }

    /// Listing entry point combining search and the borrowable filter
    pub async fn query(&self, principal: &Principal, query: &BookQuery) -> AppResult<Vec<Book>> {
        principal.require_read_catalog()?;

        let books = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(needle) => {
                let field = query.field.unwrap_or(SearchField::Title);
                self.search(principal, field, needle).await?
            }
            None if query.available_only.unwrap_or(false) => {
                return self.repository.books.list_available().await;
            }
            None => self.list_books(principal).await?,
        };

        if query.available_only.unwrap_or(false) {
            Ok(books.into_iter().filter(|b| b.available > 0).collect())
        } else {
            Ok(books)
        }
    }

    /// Full catalog as CSV
    pub async fn export_csv(&self, principal: &Principal) -> AppResult<String> {
        principal.require_write_catalog()?;

        let books = self.repository.books.list_all().await?;
        tracing::info!(books = books.len(), by = %principal.username, "Catalog exported");
        Ok(export::books_to_csv(&books))
    }

    pub async fn dashboard(&self, principal: &Principal) -> AppResult<Dashboard> {
        principal.require_read_catalog()?;

        let totals = self.repository.books.totals().await?;
        let by_category = self
            .repository
            .books
            .count_by_category()
            .await?
            .into_iter()
            .map(|(category, books)| CategoryCount { category, books })
            .collect();
        let recent_books = self.repository.books.recent(RECENT_BOOKS).await?;
        let active_loans = self.repository.loans.count_active().await?;

        Ok(Dashboard {
            total_books: totals.titles,
            total_copies: totals.quantity,
            available_copies: totals.available,
            borrowed_copies: totals.quantity - totals.available,
            active_loans,
            by_category,
            recent_books,
        })
    }
}
