//! Loan (borrow) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    Borrowed,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "Borrowed",
            LoanStatus::Returned => "Returned",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrowed" => Ok(LoanStatus::Borrowed),
            "returned" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    id: i64,
    book_id: String,
    title: String,
    borrower_name: String,
    borrower_id: String,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
    status: String,
    returned_date: Option<NaiveDate>,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Loan {
            id: row.id,
            book_id: row.book_id,
            title: row.title,
            borrower_name: row.borrower_name,
            borrower_id: row.borrower_id,
            borrow_date: row.borrow_date,
            due_date: row.due_date,
            status: row.status.parse().unwrap_or(LoanStatus::Borrowed),
            returned_date: row.returned_date,
        }
    }
}

/// Ledger entry for one borrow transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub book_id: String,
    /// Title of the book at the time it was borrowed
    pub title: String,
    pub borrower_name: String,
    pub borrower_id: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
    pub returned_date: Option<NaiveDate>,
}

/// Ledger insert input
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub book_id: String,
    pub title: String,
    pub borrower_name: String,
    pub borrower_id: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BorrowRequest {
    #[validate(length(min = 1, message = "Book ID is required"))]
    pub book_id: String,
    #[validate(length(min = 1, message = "Borrower name is required"))]
    pub borrower_name: String,
    #[validate(length(min = 1, message = "Borrower ID is required"))]
    pub borrower_id: String,
    /// Defaults to today
    pub borrow_date: Option<NaiveDate>,
    /// Defaults to the borrow date plus the configured loan length
    pub due_date: Option<NaiveDate>,
}

impl BorrowRequest {
    pub fn normalized(mut self) -> Self {
        self.book_id = self.book_id.trim().to_string();
        self.borrower_name = self.borrower_name.trim().to_string();
        self.borrower_id = self.borrower_id.trim().to_string();
        self
    }
}

/// Return request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReturnRequest {
    #[validate(length(min = 1, message = "Book ID is required"))]
    pub book_id: String,
    #[validate(length(min = 1, message = "Borrower ID is required"))]
    pub borrower_id: String,
}

impl ReturnRequest {
    pub fn normalized(mut self) -> Self {
        self.book_id = self.book_id.trim().to_string();
        self.borrower_id = self.borrower_id.trim().to_string();
        self
    }
}

/// Ledger listing parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub borrower_id: Option<String>,
}

/// Overdue listing parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct OverdueQuery {
    /// Reference date (defaults to today)
    pub as_of: Option<NaiveDate>,
}
