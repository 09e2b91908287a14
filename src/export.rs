//! Catalog export in comma-separated form
//!
//! One header row with the column names, one line per book, `\n` line
//! endings. Fields are quoted only when they contain a comma, a double quote
//! or a line break; embedded quotes are doubled. A missing ISBN is an empty
//! field.

use std::borrow::Cow;

use crate::models::book::Book;

pub const CSV_HEADER: &str = "book_id,title,author,isbn,category,quantity,available,status";

/// Suggested file name for downloads
pub const CSV_FILE_NAME: &str = "library_inventory.csv";

pub fn books_to_csv(books: &[Book]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + books.len() * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for book in books {
        let quantity = book.quantity.to_string();
        let available = book.available.to_string();
        let fields = [
            book.book_id.as_str(),
            book.title.as_str(),
            book.author.as_str(),
            book.isbn.as_deref().unwrap_or(""),
            book.category.as_str(),
            quantity.as_str(),
            available.as_str(),
            book.status.as_str(),
        ];

        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&escape(field));
        }
        out.push('\n');
    }

    out
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
