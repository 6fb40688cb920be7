//! Borrow summary rows

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::book::{Book, Genre};
use super::borrow::BorrowRecord;

/// Book metadata carried by a summary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub title: String,
    pub isbn: String,
    pub author: String,
    pub genre: Genre,
    pub description: Option<String>,
    pub copies: i32,
    pub available: bool,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            author: book.author.clone(),
            genre: book.genre,
            description: book.description.clone(),
            copies: book.copies,
            available: book.available,
        }
    }
}

/// Total quantity ever borrowed for one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowSummary {
    pub book: BookSummary,
    pub total_quantity: i64,
}

/// Group `records` by book and sum their quantities.
///
/// Rows come out in order of each book's first borrow. Records whose book
/// is not in `books` are skipped, and books without records produce no row.
pub fn aggregate_summary<'a, I>(records: I, books: &HashMap<Uuid, Book>) -> Vec<BorrowSummary>
where
    I: IntoIterator<Item = &'a BorrowRecord>,
{
    let mut totals: IndexMap<Uuid, BorrowSummary> = IndexMap::new();

    for record in records {
        let Some(book) = books.get(&record.book_id) else {
            continue;
        };
        totals
            .entry(record.book_id)
            .or_insert_with(|| BorrowSummary {
                book: BookSummary::from(book),
                total_quantity: 0,
            })
            .total_quantity += i64::from(record.quantity);
    }

    totals.into_values().collect()
}
