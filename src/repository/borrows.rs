//! Borrow records repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use super::BorrowRecordStore;
use crate::{
    error::AppResult,
    models::{
        borrow::{BorrowRecord, NewBorrowRecord},
        summary::{BookSummary, BorrowSummary},
    },
};

#[derive(FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    book: BookSummary,
    total_quantity: i64,
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowRecordStore for BorrowsRepository {
    async fn create(&self, record: &NewBorrowRecord) -> AppResult<BorrowRecord> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrow_records (id, book_id, borrower_id, quantity, borrow_date, due_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, book_id, borrower_id, quantity, borrow_date, due_date, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.book_id)
        .bind(record.borrower_id)
        .bind(record.quantity)
        .bind(record.borrow_date)
        .bind(record.due_date)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn summary(&self) -> AppResult<Vec<BorrowSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT b.title, b.isbn, b.author, b.genre, b.description, b.copies, b.available,
                   SUM(r.quantity)::bigint AS total_quantity
            FROM borrow_records r
            JOIN books b ON b.id = r.book_id
            GROUP BY b.id
            ORDER BY MIN(r.created_at), b.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BorrowSummary {
                book: row.book,
                total_quantity: row.total_quantity,
            })
            .collect())
    }
}
