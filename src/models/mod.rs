//! Data models for the library

pub mod book;
pub mod borrow;
pub mod borrower;
pub mod summary;

// Re-export commonly used types
pub use book::{apply_borrow, Book, Genre, InsufficientStock};
pub use borrow::{BorrowRecord, BorrowRequest};
pub use borrower::Borrower;
pub use summary::BorrowSummary;
