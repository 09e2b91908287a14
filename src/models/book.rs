//! Book (catalog) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Shelf status of a book, derived from its available copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    Available,
    OutOfStock,
}

impl BookStatus {
    pub fn from_available(available: i32) -> Self {
        if available == 0 {
            BookStatus::OutOfStock
        } else {
            BookStatus::Available
        }
    }

    /// Stored and exported form of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::OutOfStock => "Out of Stock",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(' ', "").as_str() {
            "available" => Ok(BookStatus::Available),
            "outofstock" => Ok(BookStatus::OutOfStock),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    book_id: String,
    title: String,
    author: String,
    isbn: Option<String>,
    category: String,
    quantity: i32,
    available: i32,
    status: String,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        let status = row
            .status
            .parse()
            .unwrap_or_else(|_| BookStatus::from_available(row.available));
        Book {
            book_id: row.book_id,
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            category: row.category,
            quantity: row.quantity,
            available: row.available,
            status,
        }
    }
}

/// Book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    /// Total copies owned
    pub quantity: i32,
    /// Copies currently on the shelf
    pub available: i32,
    pub status: BookStatus,
}

/// Add-book request. The status is always derived from `available`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Book ID is required"))]
    pub book_id: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub isbn: Option<String>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    #[validate(range(min = 0, message = "Available copies cannot be negative"))]
    pub available: i32,
}

impl CreateBook {
    /// Trim free-text fields; a blank ISBN counts as absent
    pub fn normalized(mut self) -> Self {
        self.book_id = self.book_id.trim().to_string();
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.category = self.category.trim().to_string();
        self.isbn = self
            .isbn
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());
        self
    }

    pub fn into_book(self) -> Book {
        Book {
            status: BookStatus::from_available(self.available),
            book_id: self.book_id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            quantity: self.quantity,
            available: self.available,
        }
    }
}

/// Searchable catalog fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Title,
    Author,
    Category,
    BookId,
}

/// Catalog listing parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Field to search (defaults to title)
    pub field: Option<SearchField>,
    /// Case-insensitive substring
    pub q: Option<String>,
    /// Only books with at least one copy on the shelf
    pub available_only: Option<bool>,
}
