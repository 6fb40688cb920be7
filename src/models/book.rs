//! Book (catalog entry) model and related types

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book genre classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "genre", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genre {
    Fiction,
    NonFiction,
    Science,
    History,
    Biography,
    Fantasy,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Science,
        Genre::History,
        Genre::Biography,
        Genre::Fantasy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "FICTION",
            Genre::NonFiction => "NON_FICTION",
            Genre::Science => "SCIENCE",
            Genre::History => "HISTORY",
            Genre::Biography => "BIOGRAPHY",
            Genre::Fantasy => "FANTASY",
        }
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("unknown genre: {}", s))
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Book as stored in the catalog.
///
/// `available` always equals `copies > 0`; every write path derives it
/// from `copies` instead of accepting it from callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: String,
    pub description: Option<String>,
    pub copies: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated book fields ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: String,
    pub description: Option<String>,
    pub copies: i32,
}

impl NewBook {
    pub fn available(&self) -> bool {
        self.copies > 0
    }
}

/// Create book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(required(message = "Title is required"), length(min = 1, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(required(message = "Author is required"), length(min = 1, message = "Author is required"))]
    pub author: Option<String>,
    #[validate(required(message = "Genre is required"))]
    pub genre: Option<Genre>,
    #[validate(required(message = "ISBN is required"), length(min = 1, message = "ISBN is required"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[validate(
        required(message = "Copies is required"),
        range(min = 0, message = "Copies must be a non-negative number")
    )]
    pub copies: Option<i32>,
}

impl CreateBook {
    /// Convert a request that already passed `validate()` into persisted fields
    pub fn into_new_book(self) -> Option<NewBook> {
        Some(NewBook {
            title: self.title?,
            author: self.author?,
            genre: self.genre?,
            isbn: self.isbn?,
            description: self.description,
            copies: self.copies?,
        })
    }
}

/// Update book request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: Option<String>,
    pub genre: Option<Genre>,
    #[validate(length(min = 1, message = "ISBN cannot be empty"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Copies must be a non-negative number"))]
    pub copies: Option<i32>,
}

/// Column a book listing can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Title,
    Author,
    Genre,
    Isbn,
    Copies,
    Available,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Parse a `sortBy` value; unknown fields fall back to `createdAt`
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("title") => SortField::Title,
            Some("author") => SortField::Author,
            Some("genre") => SortField::Genre,
            Some("isbn") => SortField::Isbn,
            Some("copies") => SortField::Copies,
            Some("available") => SortField::Available,
            Some("updatedAt") => SortField::UpdatedAt,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Genre => "genre",
            SortField::Isbn => "isbn",
            SortField::Copies => "copies",
            SortField::Available => "available",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Default number of books returned by a listing
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Book listing query string
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Exact genre match
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub filter: Option<String>,
    /// Field to sort by (default: createdAt)
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default: desc)
    pub sort: Option<String>,
    /// Maximum number of books (default: 10, `0` for no limit)
    pub limit: Option<i64>,
}

/// Resolved listing parameters handed to the store
#[derive(Debug, Clone, PartialEq)]
pub struct BookListing {
    pub genre: Option<Genre>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: Option<i64>,
}

impl Default for BookListing {
    fn default() -> Self {
        Self {
            genre: None,
            sort_by: SortField::default(),
            order: SortOrder::default(),
            limit: Some(DEFAULT_LIST_LIMIT),
        }
    }
}

impl Book {
    /// Whether going from `self` to `after` took the book out of circulation
    pub fn became_unavailable(&self, after: &Book) -> bool {
        self.available && !after.available
    }
}

/// Borrow would take more copies than the book currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientStock {
    pub copies: i32,
}

/// Take `quantity` copies out of `book`.
///
/// Fails when the book is unavailable or holds fewer than `quantity`
/// copies. On success the returned book has its copies decremented and
/// `available` cleared once the stock reaches zero.
pub fn apply_borrow(book: &Book, quantity: i64) -> Result<Book, InsufficientStock> {
    let stock = InsufficientStock { copies: book.copies };
    if !book.available || quantity < 1 || i64::from(book.copies) < quantity {
        return Err(stock);
    }
    let taken = i32::try_from(quantity).map_err(|_| stock)?;

    let mut updated = book.clone();
    updated.copies -= taken;
    updated.available = updated.copies > 0;
    Ok(updated)
}
