//! Books repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{unique_violation, BookStore};
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookListing, NewBook, UpdateBook},
};

const BOOK_COLUMNS: &str =
    "id, title, author, genre, isbn, description, copies, available, created_at, updated_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO books (id, title, author, genre, isbn, description, copies, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(Uuid::new_v4())
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.genre)
            .bind(&book.isbn)
            .bind(&book.description)
            .bind(book.copies)
            .bind(book.available())
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "isbn", &book.isbn))
    }

    async fn list(&self, listing: &BookListing) -> AppResult<Vec<Book>> {
        // Sort column and direction come from closed enums, never from raw input
        let mut query = format!("SELECT {} FROM books", BOOK_COLUMNS);
        if listing.genre.is_some() {
            query.push_str(" WHERE genre = $1");
        }
        query.push_str(&format!(
            " ORDER BY {} {}, id",
            listing.sort_by.column(),
            listing.order.keyword()
        ));
        if let Some(limit) = listing.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        let mut builder = sqlx::query_as::<_, Book>(&query);
        if let Some(genre) = listing.genre {
            builder = builder.bind(genre);
        }

        let books = builder.fetch_all(&self.pool).await?;
        Ok(books)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(AppError::book_not_found)
    }

    async fn update(&self, id: Uuid, data: &UpdateBook) -> AppResult<Book> {
        let query = format!(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                genre = COALESCE($4, genre),
                isbn = COALESCE($5, isbn),
                description = COALESCE($6, description),
                copies = COALESCE($7, copies),
                available = COALESCE($7, copies) > 0,
                updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(&data.title)
            .bind(&data.author)
            .bind(data.genre)
            .bind(&data.isbn)
            .bind(&data.description)
            .bind(data.copies)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "isbn", data.isbn.as_deref().unwrap_or_default()))?
            .ok_or_else(AppError::book_not_found)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::book_not_found());
        }
        Ok(())
    }

    async fn decrement_copies(&self, id: Uuid, quantity: i32) -> AppResult<Option<Book>> {
        let query = format!(
            r#"
            UPDATE books SET
                copies = copies - $2,
                available = copies - $2 > 0,
                updated_at = $3
            WHERE id = $1 AND available AND copies >= $2
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(quantity)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
