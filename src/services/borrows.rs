//! Borrow transaction workflow

use crate::{
    error::{AppError, AppResult, ValidationError},
    models::{
        book::apply_borrow,
        borrow::{BorrowRecord, BorrowRequest, NewBorrowRecord},
        borrower::{Borrower, NewBorrower},
    },
    repository::Repository,
};

use super::catalog::parse_book_id;

#[derive(Clone)]
pub struct BorrowService {
    repository: Repository,
}

impl BorrowService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow copies of a book.
    ///
    /// Validation runs in a fixed order and nothing is written until it
    /// has all passed: field presence, quantity, dates, book existence,
    /// then stock. The stock decrement itself is a conditional write, so a
    /// concurrent borrow that drained the book in between is reported as
    /// insufficient stock instead of overdrawing it.
    pub async fn borrow(&self, request: BorrowRequest) -> AppResult<BorrowRecord> {
        let command = request.into_command()?;

        let book_id = parse_book_id(&command.book)?;
        let book = self.repository.books.get_by_id(book_id).await?;

        apply_borrow(&book, command.quantity)
            .map_err(|stock| ValidationError::InsufficientStock { copies: stock.copies })?;
        // Bounded by the book's i32 copies once apply_borrow accepted it
        let quantity = i32::try_from(command.quantity)
            .map_err(|_| ValidationError::InsufficientStock { copies: book.copies })?;

        let borrower = self
            .find_or_create_borrower(&command.borrower_name, &command.borrower_email)
            .await?;

        let updated = match self
            .repository
            .books
            .decrement_copies(book_id, quantity)
            .await?
        {
            Some(updated) => updated,
            None => {
                let current = self.repository.books.get_by_id(book_id).await?;
                tracing::warn!(
                    book_id = %book_id,
                    requested = quantity,
                    copies = current.copies,
                    "Stock changed while borrowing"
                );
                return Err(ValidationError::InsufficientStock {
                    copies: current.copies,
                }
                .into());
            }
        };

        if book.became_unavailable(&updated) {
            tracing::info!("Book '{}' is now unavailable.", updated.title);
        }

        let record = self
            .repository
            .borrows
            .create(&NewBorrowRecord {
                book_id,
                borrower_id: borrower.id,
                quantity,
                borrow_date: command.borrow_date,
                due_date: command.due_date,
            })
            .await?;

        tracing::info!(
            "Borrow record created for bookId {} by borrowerId {}",
            record.book_id,
            record.borrower_id
        );

        Ok(record)
    }

    /// Reuse the borrower registered under `email`, or register one.
    ///
    /// If another request registers the same email between the lookup and
    /// the insert, the unique constraint rejects ours and the winner is read.
    async fn find_or_create_borrower(&self, name: &str, email: &str) -> AppResult<Borrower> {
        if let Some(borrower) = self.repository.borrowers.find_by_email(email).await? {
            return Ok(borrower);
        }

        let new = NewBorrower {
            name: name.to_string(),
            email: email.to_string(),
        };
        match self.repository.borrowers.create(&new).await {
            Ok(borrower) => {
                tracing::info!(borrower_id = %borrower.id, "Borrower registered");
                Ok(borrower)
            }
            Err(AppError::Validation(ValidationError::Duplicate { .. })) => self
                .repository
                .borrowers
                .find_by_email(email)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!("borrower {} vanished after conflict", email))
                }),
            Err(e) => Err(e),
        }
    }
}
