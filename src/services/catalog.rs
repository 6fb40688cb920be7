//! Catalog management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{
        Book, BookListing, BookQuery, CreateBook, Genre, SortField, SortOrder, UpdateBook,
        DEFAULT_LIST_LIMIT,
    },
    repository::Repository,
};

/// Parse a book id from a path or body. A malformed id names no book.
pub fn parse_book_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::book_not_found())
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a new book; `available` follows the initial copies
    pub async fn create_book(&self, request: CreateBook) -> AppResult<Book> {
        request.validate()?;
        let book = request
            .into_new_book()
            .ok_or_else(|| AppError::Internal("validated book is missing fields".to_string()))?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = %created.id, isbn = %created.isbn, "Book created");
        Ok(created)
    }

    /// List books with optional genre filter, sort and limit
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let genre = match query.filter.as_deref() {
            Some(raw) => match raw.parse::<Genre>() {
                Ok(genre) => Some(genre),
                // No book can carry an unknown genre
                Err(_) => return Ok(Vec::new()),
            },
            None => None,
        };

        let listing = BookListing {
            genre,
            sort_by: SortField::parse(query.sort_by.as_deref()),
            order: SortOrder::parse(query.sort.as_deref()),
            limit: match query.limit {
                None => Some(DEFAULT_LIST_LIMIT),
                Some(n) if n <= 0 => None,
                Some(n) => Some(n),
            },
        };

        self.repository.books.list(&listing).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        let id = parse_book_id(id)?;
        self.repository.books.get_by_id(id).await
    }

    /// Update the provided fields of a book
    pub async fn update_book(&self, id: &str, data: UpdateBook) -> AppResult<Book> {
        let id = parse_book_id(id)?;
        data.validate()?;

        let before = self.repository.books.get_by_id(id).await?;
        let updated = self.repository.books.update(id, &data).await?;
        if before.became_unavailable(&updated) {
            tracing::info!("Book '{}' is now unavailable.", updated.title);
        }
        Ok(updated)
    }

    /// Remove a book from the catalog
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        let id = parse_book_id(id)?;
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}
