//! Borrowers repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{unique_violation, BorrowerStore};
use crate::{
    error::AppResult,
    models::borrower::{Borrower, NewBorrower},
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowerStore for BorrowersRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>(
            "SELECT id, name, email FROM borrowers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(borrower)
    }

    async fn create(&self, borrower: &NewBorrower) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (id, name, email)
            VALUES ($1, $2, $3)
            RETURNING id, name, email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&borrower.name)
        .bind(&borrower.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "email", &borrower.email))
    }
}
