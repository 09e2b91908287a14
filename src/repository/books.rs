//! Books repository (catalog store)

use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookRow, BookStatus, SearchField},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

/// Catalog-wide copy counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyTotals {
    pub titles: i64,
    pub quantity: i64,
    pub available: i64,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get(&self, book_id: &str) -> AppResult<Book> {
        let mut conn = self.pool.acquire().await?;
        Self::get_tx(&mut conn, book_id).await
    }

    /// Get book by ID on an existing connection or transaction
    pub async fn get_tx(conn: &mut SqliteConnection, book_id: &str) -> AppResult<Book> {
        sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE book_id = ?")
            .bind(book_id)
            .fetch_optional(&mut *conn)
            .await?
            .map(Book::from)
            .ok_or_else(|| AppError::BookNotFound(book_id.to_string()))
    }

    /// Insert a new book as given; status consistency is the caller's concern
    pub async fn insert(&self, book: &Book) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_tx(&mut conn, book).await
    }

    pub async fn insert_tx(conn: &mut SqliteConnection, book: &Book) -> AppResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE book_id = ?)")
            .bind(&book.book_id)
            .fetch_one(&mut *conn)
            .await?;
        if exists {
            return Err(AppError::DuplicateBookId(book.book_id.clone()));
        }

        sqlx::query(
            r#"
            INSERT INTO books (book_id, title, author, isbn, category, quantity, available, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.book_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.quantity)
        .bind(book.available)
        .bind(book.status.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if super::is_unique_violation(&e) {
                AppError::DuplicateBookId(book.book_id.clone())
            } else {
                e.into()
            }
        })?;

        Ok(())
    }

    /// Full catalog in insertion order
    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, BookRow>("SELECT * FROM books ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        Ok(books.into_iter().map(Book::from).collect())
    }

    /// Books with at least one copy on the shelf
    pub async fn list_available(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, BookRow>(
            "SELECT * FROM books WHERE available > 0 ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books.into_iter().map(Book::from).collect())
    }

    /// Case-insensitive substring search on one field.
    ///
    /// Matching happens here rather than in SQL because SQLite's `lower()`
    /// only folds ASCII.
    pub async fn find_by(&self, field: SearchField, needle: &str) -> AppResult<Vec<Book>> {
        let needle = needle.to_lowercase();
        let books = self.list_all().await?;

        Ok(books
            .into_iter()
            .filter(|book| {
                let haystack = match field {
                    SearchField::Title => &book.title,
                    SearchField::Author => &book.author,
                    SearchField::Category => &book.category,
                    SearchField::BookId => &book.book_id,
                };
                haystack.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Overwrite availability and status of a book
    pub async fn set_availability(&self, book_id: &str, available: i32, status: BookStatus) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::set_availability_tx(&mut conn, book_id, available, status).await
    }

    pub async fn set_availability_tx(
        conn: &mut SqliteConnection,
        book_id: &str,
        available: i32,
        status: BookStatus,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET available = ?, status = ? WHERE book_id = ?")
            .bind(available)
            .bind(status.as_str())
            .bind(book_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BookNotFound(book_id.to_string()));
        }
        Ok(())
    }

    /// Take one copy off the shelf if any is left, returning the updated book.
    ///
    /// `None` means the book is missing or has no copy available. Being a
    /// write, this takes SQLite's write lock as the first statement of a
    /// transaction, so later reads in the same transaction cannot go stale.
    pub async fn take_copy_tx(conn: &mut SqliteConnection, book_id: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, BookRow>(
            r#"
            UPDATE books
            SET available = available - 1,
                status = CASE WHEN available - 1 > 0 THEN ? ELSE ? END
            WHERE book_id = ? AND available > 0
            RETURNING *
            "#,
        )
        .bind(BookStatus::Available.as_str())
        .bind(BookStatus::OutOfStock.as_str())
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(book.map(Book::from))
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of titles and copy counters over the whole catalog
    pub async fn totals(&self) -> AppResult<CopyTotals> {
        let (titles, quantity, available): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(quantity), 0), COALESCE(SUM(available), 0) FROM books",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CopyTotals {
            titles,
            quantity,
            available,
        })
    }

    /// Titles per category, largest first
    pub async fn count_by_category(&self) -> AppResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) AS total FROM books GROUP BY category ORDER BY total DESC, category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Most recently added books
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, BookRow>("SELECT * FROM books ORDER BY rowid DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(books.into_iter().map(Book::from).collect())
    }
}
