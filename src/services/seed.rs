//! First-run bootstrap data.
//!
//! Each table is seeded only while it is empty, so running this on every
//! start is harmless. Default credentials:
//!
//! | username | password     | role          |
//! |----------|--------------|---------------|
//! | admin    | `admin123`   | Administrator |
//! | staff    | `staff123`   | Library Staff |
//! | student  | `student123` | Student       |

use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookStatus},
        user::{Role, User},
    },
    repository::{books::BooksRepository, Repository},
    services::auth::hash_password,
};

const DEFAULT_ACCOUNTS: [(&str, &str, &str, Role); 3] = [
    ("admin", "admin123", "System Administrator", Role::Administrator),
    ("staff", "staff123", "Library Staff", Role::LibraryStaff),
    ("student", "student123", "Student User", Role::Student),
];

const SAMPLE_BOOKS: [(&str, &str, &str, &str, &str, i32); 3] = [
    ("B001", "Python Programming", "John Smith", "978-1234567890", "Programming", 5),
    ("B002", "Data Science Handbook", "Jane Doe", "978-0987654321", "Data Science", 3),
    ("B003", "Web Development Guide", "Mike Johnson", "978-1122334455", "Web Development", 7),
];

/// What a seeding pass created
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub accounts: usize,
    pub books: usize,
}

pub async fn run(repository: &Repository) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();

    if repository.users.count().await? == 0 {
        for (username, password, full_name, role) in DEFAULT_ACCOUNTS {
            repository
                .users
                .insert(&User {
                    username: username.to_string(),
                    password_hash: hash_password(password),
                    full_name: full_name.to_string(),
                    email: None,
                    role,
                    created_date: Utc::now(),
                })
                .await?;
            report.accounts += 1;
        }
        tracing::info!(accounts = report.accounts, "Seeded default accounts; change their passwords");
    }

    if repository.books.count().await? == 0 {
        let mut tx = repository.pool.begin().await?;
        for (book_id, title, author, isbn, category, quantity) in SAMPLE_BOOKS {
            let book = Book {
                book_id: book_id.to_string(),
                title: title.to_string(),
                author: author.to_string(),
                isbn: Some(isbn.to_string()),
                category: category.to_string(),
                quantity,
                available: quantity,
                status: BookStatus::from_available(quantity),
            };
            BooksRepository::insert_tx(&mut *tx, &book).await?;
            report.books += 1;
        }
        tx.commit().await?;
        tracing::info!(books = report.books, "Seeded sample books");
    }

    Ok(report)
}
