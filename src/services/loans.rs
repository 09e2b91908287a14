//! Loan management service.
//!
//! Borrow and return touch both the catalog and the ledger. Each runs inside
//! one database transaction while holding the service-wide lock, so the
//! availability check and the two writes form a single step: either both
//! writes land or neither does, and two requests for the last copy cannot
//! both succeed. The first statement of each transaction is a write, so
//! SQLite takes its write lock up front and writers on other pooled
//! connections cannot invalidate what the transaction has read.

use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate};
use tokio::sync::Mutex;
use validator::Validate;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        loan::{BorrowRequest, Loan, LoanQuery, NewLoan, ReturnRequest},
        user::Principal,
    },
    repository::{books::BooksRepository, loans::LoansRepository, Repository},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
    lock: Arc<Mutex<()>>,
}

/// Local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Dates are stored as `YYYY-MM-DD` text and compared as strings, which
/// only orders correctly for four-digit years.
pub fn check_date(date: NaiveDate) -> AppResult<NaiveDate> {
    if (1..=9999).contains(&date.year()) {
        Ok(date)
    } else {
        Err(AppError::Validation(format!(
            "Date {} is out of range (years 1 to 9999)",
            date
        )))
    }
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self {
            repository,
            config,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Lend one copy of a book
    pub async fn borrow(&self, principal: &Principal, request: BorrowRequest) -> AppResult<Loan> {
        principal.require_manage_loans()?;

        let request = request.normalized();
        request.validate()?;

        let borrow_date = check_date(request.borrow_date.unwrap_or_else(today))?;
        let due_date = match request.due_date {
            Some(due_date) => due_date,
            None => borrow_date
                .checked_add_signed(Duration::days(self.config.default_duration_days))
                .ok_or_else(|| AppError::Validation("Due date is out of range".to_string()))?,
        };
        let due_date = check_date(due_date)?;
        if due_date < borrow_date {
            return Err(AppError::Validation(
                "Due date cannot be before the borrow date".to_string(),
            ));
        }

        let _guard = self.lock.lock().await;
        let mut tx = self.repository.pool.begin().await?;

        let book = match BooksRepository::take_copy_tx(&mut *tx, &request.book_id).await? {
            Some(book) => book,
            None => {
                // missing book surfaces as BookNotFound here
                let book = BooksRepository::get_tx(&mut *tx, &request.book_id).await?;
                tracing::warn!(book_id = %book.book_id, borrower_id = %request.borrower_id, "Borrow refused: no copies available");
                return Err(AppError::NoCopiesAvailable(book.book_id));
            }
        };
        let available = book.available;

        let loan = LoansRepository::insert_tx(
            &mut *tx,
            &NewLoan {
                book_id: book.book_id.clone(),
                title: book.title.clone(),
                borrower_name: request.borrower_name,
                borrower_id: request.borrower_id,
                borrow_date,
                due_date,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            book_id = %loan.book_id,
            borrower_id = %loan.borrower_id,
            due_date = %loan.due_date,
            available,
            by = %principal.username,
            "Book borrowed"
        );
        Ok(loan)
    }

    /// Take back a borrowed copy, closing the borrower's oldest open loan
    pub async fn return_book(&self, principal: &Principal, request: ReturnRequest) -> AppResult<Loan> {
        principal.require_manage_loans()?;

        let request = request.normalized();
        request.validate()?;

        let _guard = self.lock.lock().await;
        let mut tx = self.repository.pool.begin().await?;

        let loan = match LoansRepository::close_tx(&mut *tx, &request.book_id, &request.borrower_id, today()).await {
            Ok(loan) => loan,
            Err(e) => {
                if matches!(e, AppError::NoActiveLoan { .. }) {
                    tracing::warn!(book_id = %request.book_id, borrower_id = %request.borrower_id, "Return refused: no active loan");
                }
                return Err(e);
            }
        };

        let book = BooksRepository::get_tx(&mut *tx, &request.book_id).await?;
        let mut available = book.available + 1;
        if available > book.quantity {
            tracing::warn!(
                book_id = %book.book_id,
                quantity = book.quantity,
                "Returned copy would exceed quantity; availability capped"
            );
            available = book.quantity;
        }

        BooksRepository::set_availability_tx(
            &mut *tx,
            &book.book_id,
            available,
            BookStatus::from_available(available),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            book_id = %loan.book_id,
            borrower_id = %loan.borrower_id,
            available,
            by = %principal.username,
            "Book returned"
        );
        Ok(loan)
    }

    /// Ledger entries, optionally filtered
    pub async fn list_loans(&self, principal: &Principal, query: &LoanQuery) -> AppResult<Vec<Loan>> {
        principal.require_manage_loans()?;
        self.repository.loans.list(query).await
    }

    /// Borrowed loans whose due date is strictly before `as_of`
    pub async fn overdue_loans(&self, principal: &Principal, as_of: NaiveDate) -> AppResult<Vec<Loan>> {
        principal.require_manage_loans()?;
        self.repository.loans.overdue(check_date(as_of)?).await
    }

    /// Borrower IDs that currently hold at least one book
    pub async fn active_borrowers(&self, principal: &Principal) -> AppResult<Vec<String>> {
        principal.require_manage_loans()?;
        self.repository.loans.active_borrowers().await
    }
}
