//! In-process store implementing every repository trait.
//!
//! Used for `memory://` deployments and tests. Uniqueness of isbn and email,
//! the conditional stock decrement and the book/record cascade behave like
//! the PostgreSQL schema.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BookStore, BorrowRecordStore, BorrowerStore};
use crate::{
    error::{AppError, AppResult, ValidationError},
    models::{
        book::{apply_borrow, Book, BookListing, NewBook, SortField, SortOrder, UpdateBook},
        borrow::{BorrowRecord, NewBorrowRecord},
        borrower::{Borrower, NewBorrower},
        summary::{aggregate_summary, BorrowSummary},
    },
};

#[derive(Default)]
struct Tables {
    books: IndexMap<Uuid, Book>,
    borrowers: Vec<Borrower>,
    records: Vec<BorrowRecord>,
}

impl Tables {
    fn isbn_taken(&self, isbn: &str, except: Option<Uuid>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Number of stored borrowers
    pub async fn borrower_count(&self) -> usize {
        self.tables.lock().await.borrowers.len()
    }

    /// Number of stored borrow records
    pub async fn record_count(&self) -> usize {
        self.tables.lock().await.records.len()
    }
}

fn compare(a: &Book, b: &Book, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Author => a.author.cmp(&b.author),
        SortField::Genre => a.genre.cmp(&b.genre),
        SortField::Isbn => a.isbn.cmp(&b.isbn),
        SortField::Copies => a.copies.cmp(&b.copies),
        SortField::Available => a.available.cmp(&b.available),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

fn duplicate_isbn(isbn: &str) -> AppError {
    AppError::Validation(ValidationError::Duplicate {
        field: "isbn",
        value: isbn.to_string(),
    })
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        if tables.isbn_taken(&book.isbn, None) {
            return Err(duplicate_isbn(&book.isbn));
        }

        let now = Utc::now();
        let created = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre,
            isbn: book.isbn.clone(),
            description: book.description.clone(),
            copies: book.copies,
            available: book.available(),
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(&self, listing: &BookListing) -> AppResult<Vec<Book>> {
        let tables = self.tables.lock().await;

        // Insertion position breaks ties so equal keys keep a stable order
        let mut books: Vec<(usize, &Book)> = tables
            .books
            .values()
            .enumerate()
            .filter(|(_, b)| listing.genre.map_or(true, |g| b.genre == g))
            .collect();

        books.sort_by(|(ia, a), (ib, b)| {
            let ordering = compare(a, b, listing.sort_by).then(ia.cmp(ib));
            match listing.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let limit = listing
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        Ok(books
            .into_iter()
            .take(limit)
            .map(|(_, b)| b.clone())
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        self.tables
            .lock()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or_else(AppError::book_not_found)
    }

    async fn update(&self, id: Uuid, data: &UpdateBook) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        if !tables.books.contains_key(&id) {
            return Err(AppError::book_not_found());
        }
        if let Some(isbn) = &data.isbn {
            if tables.isbn_taken(isbn, Some(id)) {
                return Err(duplicate_isbn(isbn));
            }
        }

        let book = tables
            .books
            .get_mut(&id)
            .ok_or_else(AppError::book_not_found)?;
        if let Some(title) = &data.title {
            book.title = title.clone();
        }
        if let Some(author) = &data.author {
            book.author = author.clone();
        }
        if let Some(genre) = data.genre {
            book.genre = genre;
        }
        if let Some(isbn) = &data.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(description) = &data.description {
            book.description = Some(description.clone());
        }
        if let Some(copies) = data.copies {
            book.copies = copies;
        }
        book.available = book.copies > 0;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.books.shift_remove(&id).is_none() {
            return Err(AppError::book_not_found());
        }
        tables.records.retain(|r| r.book_id != id);
        Ok(())
    }

    async fn decrement_copies(&self, id: Uuid, quantity: i32) -> AppResult<Option<Book>> {
        let mut tables = self.tables.lock().await;
        let Some(book) = tables.books.get_mut(&id) else {
            return Ok(None);
        };
        match apply_borrow(book, i64::from(quantity)) {
            Ok(mut updated) => {
                updated.updated_at = Utc::now();
                *book = updated.clone();
                Ok(Some(updated))
            }
            Err(_) => Ok(None),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BorrowerStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Borrower>> {
        Ok(self
            .tables
            .lock()
            .await
            .borrowers
            .iter()
            .find(|b| b.email == email)
            .cloned())
    }

    async fn create(&self, borrower: &NewBorrower) -> AppResult<Borrower> {
        let mut tables = self.tables.lock().await;
        if tables.borrowers.iter().any(|b| b.email == borrower.email) {
            return Err(AppError::Validation(ValidationError::Duplicate {
                field: "email",
                value: borrower.email.clone(),
            }));
        }

        let created = Borrower {
            id: Uuid::new_v4(),
            name: borrower.name.clone(),
            email: borrower.email.clone(),
        };
        tables.borrowers.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl BorrowRecordStore for MemoryStore {
    async fn create(&self, record: &NewBorrowRecord) -> AppResult<BorrowRecord> {
        let mut tables = self.tables.lock().await;
        if !tables.books.contains_key(&record.book_id) {
            return Err(AppError::book_not_found());
        }
        if !tables.borrowers.iter().any(|b| b.id == record.borrower_id) {
            return Err(AppError::NotFound("Borrower not found".to_string()));
        }

        let now = Utc::now();
        let created = BorrowRecord {
            id: Uuid::new_v4(),
            book_id: record.book_id,
            quantity: record.quantity,
            borrow_date: record.borrow_date,
            due_date: record.due_date,
            borrower_id: record.borrower_id,
            created_at: now,
            updated_at: now,
        };
        tables.records.push(created.clone());
        Ok(created)
    }

    async fn summary(&self) -> AppResult<Vec<BorrowSummary>> {
        let tables = self.tables.lock().await;
        let books: HashMap<Uuid, Book> = tables
            .books
            .iter()
            .map(|(id, book)| (*id, book.clone()))
            .collect();
        Ok(aggregate_summary(&tables.records, &books))
    }
}
