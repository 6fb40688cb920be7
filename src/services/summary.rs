//! Borrow summary service

use crate::{error::AppResult, models::summary::BorrowSummary, repository::Repository};

#[derive(Clone)]
pub struct SummaryService {
    repository: Repository,
}

impl SummaryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Total quantity borrowed per book, one row per book with at least one
    /// borrow record, in order of first borrow. Recomputed on every call.
    pub async fn summarize(&self) -> AppResult<Vec<BorrowSummary>> {
        let rows = self.repository.borrows.summary().await?;
        tracing::debug!(rows = rows.len(), "Borrow summary computed");
        Ok(rows)
    }
}
