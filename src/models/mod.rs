//! Data models for Libris

pub mod book;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookStatus, CreateBook, SearchField};
pub use loan::{BorrowRequest, Loan, LoanStatus, NewLoan, ReturnRequest};
pub use user::{Principal, RegisterUser, Role, User};
