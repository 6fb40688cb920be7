//! Repository layer for database operations

pub mod books;
pub mod borrowers;
pub mod borrows;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::{
    config::DatabaseConfig,
    error::AppResult,
    models::{
        book::{Book, BookListing, NewBook, UpdateBook},
        borrow::{BorrowRecord, NewBorrowRecord},
        borrower::{Borrower, NewBorrower},
        summary::BorrowSummary,
    },
};

/// Persistent catalog of books
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create(&self, book: &NewBook) -> AppResult<Book>;

    async fn list(&self, listing: &BookListing) -> AppResult<Vec<Book>>;

    /// Fails with `NotFound` when no book has this id
    async fn get_by_id(&self, id: Uuid) -> AppResult<Book>;

    /// Apply the provided fields and re-derive `available`
    async fn update(&self, id: Uuid, data: &UpdateBook) -> AppResult<Book>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Take `quantity` copies in a single conditional write.
    ///
    /// Returns `None` without touching the book when it is unavailable or
    /// holds fewer than `quantity` copies.
    async fn decrement_copies(&self, id: Uuid, quantity: i32) -> AppResult<Option<Book>>;

    /// Cheap round-trip used by readiness checks
    async fn ping(&self) -> AppResult<()>;
}

/// Persistent set of borrowers, unique by email
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowerStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Borrower>>;

    /// Fails with a duplicate validation error when the email is taken
    async fn create(&self, borrower: &NewBorrower) -> AppResult<Borrower>;
}

/// Append-only log of borrow transactions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowRecordStore: Send + Sync {
    async fn create(&self, record: &NewBorrowRecord) -> AppResult<BorrowRecord>;

    /// Per-book borrowed totals, in order of each book's first borrow
    async fn summary(&self) -> AppResult<Vec<BorrowSummary>>;
}

/// Main repository struct holding one store per collection
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub borrowers: Arc<dyn BorrowerStore>,
    pub borrows: Arc<dyn BorrowRecordStore>,
}

impl Repository {
    /// Build a repository from explicit stores
    pub fn new(
        books: Arc<dyn BookStore>,
        borrowers: Arc<dyn BorrowerStore>,
        borrows: Arc<dyn BorrowRecordStore>,
    ) -> Self {
        Self {
            books,
            borrowers,
            borrows,
        }
    }

    /// Repository backed by PostgreSQL
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::new(
            Arc::new(books::BooksRepository::new(pool.clone())),
            Arc::new(borrowers::BorrowersRepository::new(pool.clone())),
            Arc::new(borrows::BorrowsRepository::new(pool)),
        )
    }

    /// Repository backed by the in-process store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self::new(store.clone(), store.clone(), store)
    }

    /// Connect to the configured backend, running migrations for PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        if config.is_memory() {
            tracing::warn!("Using in-process store, data will not survive a restart");
            return Ok(Self::in_memory());
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("Database migrations completed");

        Ok(Self::postgres(pool))
    }
}

/// Map a unique-constraint violation to a duplicate validation error
pub(crate) fn unique_violation(
    err: sqlx::Error,
    field: &'static str,
    value: &str,
) -> crate::error::AppError {
    use crate::error::{AppError, ValidationError};

    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation(ValidationError::Duplicate {
                field,
                value: value.to_string(),
            })
        }
        _ => AppError::Database(err),
    }
}
