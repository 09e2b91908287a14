//! Loans repository (loan ledger)

use chrono::NaiveDate;
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanQuery, LoanRow, LoanStatus, NewLoan},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Loan::from)
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Append a new Borrowed loan; the id comes from the table's sequence
    pub async fn insert(&self, loan: &NewLoan) -> AppResult<Loan> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_tx(&mut conn, loan).await
    }

    pub async fn insert_tx(conn: &mut SqliteConnection, loan: &NewLoan) -> AppResult<Loan> {
        let result = sqlx::query(
            r#"
            INSERT INTO loans (book_id, title, borrower_name, borrower_id, borrow_date, due_date, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&loan.book_id)
        .bind(&loan.title)
        .bind(&loan.borrower_name)
        .bind(&loan.borrower_id)
        .bind(loan.borrow_date)
        .bind(loan.due_date)
        .bind(LoanStatus::Borrowed.as_str())
        .execute(&mut *conn)
        .await?;

        Ok(Loan {
            id: result.last_insert_rowid(),
            book_id: loan.book_id.clone(),
            title: loan.title.clone(),
            borrower_name: loan.borrower_name.clone(),
            borrower_id: loan.borrower_id.clone(),
            borrow_date: loan.borrow_date,
            due_date: loan.due_date,
            status: LoanStatus::Borrowed,
            returned_date: None,
        })
    }

    /// Every ledger entry, oldest first
    pub async fn list_all(&self) -> AppResult<Vec<Loan>> {
        self.list(&LoanQuery::default()).await
    }

    /// Ledger entries filtered by status and/or borrower
    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<Loan>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM loans WHERE 1=1");

        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(ref borrower_id) = query.borrower_id {
            builder.push(" AND borrower_id = ").push_bind(borrower_id.clone());
        }
        builder.push(" ORDER BY id");

        let loans = builder
            .build_query_as::<LoanRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(loans.into_iter().map(Loan::from).collect())
    }

    /// Mark the oldest Borrowed loan for the pair as Returned.
    ///
    /// Several Borrowed loans may share a pair; the one with the lowest id
    /// is always chosen.
    pub async fn close(&self, book_id: &str, borrower_id: &str, returned_date: NaiveDate) -> AppResult<Loan> {
        let mut conn = self.pool.acquire().await?;
        Self::close_tx(&mut conn, book_id, borrower_id, returned_date).await
    }

    pub async fn close_tx(
        conn: &mut SqliteConnection,
        book_id: &str,
        borrower_id: &str,
        returned_date: NaiveDate,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, LoanRow>(
            r#"
            UPDATE loans
            SET status = ?, returned_date = ?
            WHERE id = (
                SELECT id FROM loans
                WHERE book_id = ? AND borrower_id = ? AND status = ?
                ORDER BY id
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Returned.as_str())
        .bind(returned_date)
        .bind(book_id)
        .bind(borrower_id)
        .bind(LoanStatus::Borrowed.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        loan.map(Loan::from).ok_or_else(|| AppError::NoActiveLoan {
            book_id: book_id.to_string(),
            borrower_id: borrower_id.to_string(),
        })
    }

    /// Borrowed loans whose due date is strictly before `as_of`
    pub async fn overdue(&self, as_of: NaiveDate) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, LoanRow>(
            "SELECT * FROM loans WHERE status = ? AND due_date < ? ORDER BY due_date, id",
        )
        .bind(LoanStatus::Borrowed.as_str())
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans.into_iter().map(Loan::from).collect())
    }

    /// Distinct borrower IDs holding at least one Borrowed loan
    pub async fn active_borrowers(&self) -> AppResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT borrower_id FROM loans WHERE status = ? ORDER BY borrower_id",
        )
        .bind(LoanStatus::Borrowed.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status = ?")
            .bind(LoanStatus::Borrowed.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
