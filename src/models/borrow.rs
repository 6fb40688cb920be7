//! Borrow record model and the borrow request it is created from

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{MissingField, ValidationError};

/// Immutable log entry of one borrow transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: Uuid,
    /// Borrowed book
    #[serde(rename = "book")]
    pub book_id: Uuid,
    pub quantity: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// Borrower who took the copies
    #[serde(rename = "borrower")]
    pub borrower_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBorrowRecord {
    pub book_id: Uuid,
    pub borrower_id: Uuid,
    pub quantity: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Borrow request body.
///
/// Fields are kept as raw JSON so that a blank, null or mistyped value is
/// reported through the validation error instead of failing the body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    /// Book ID
    #[schema(value_type = Option<String>)]
    pub book: Option<Value>,
    /// Number of copies, at least 1
    #[schema(value_type = Option<i64>)]
    pub quantity: Option<Value>,
    /// RFC 3339 timestamp or YYYY-MM-DD
    #[schema(value_type = Option<String>)]
    pub borrow_date: Option<Value>,
    /// RFC 3339 timestamp or YYYY-MM-DD
    #[schema(value_type = Option<String>)]
    pub due_date: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub borrower_name: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub borrower_email: Option<Value>,
}

/// Borrow request whose fields are present and well formed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowCommand {
    pub book: String,
    pub quantity: i64,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub borrower_name: String,
    pub borrower_email: String,
}

/// Absent, null and whitespace-only strings count as missing
fn present(value: &Option<Value>) -> Option<&Value> {
    match value.as_ref()? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(other),
    }
}

/// Scalars are taken as text, numbers and booleans in their JSON form.
/// Strings are returned untouched.
fn text(field: &'static str, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ValidationError::InvalidType {
            field,
            expected: "string",
            value: other.clone(),
        }),
    }
}

/// Whole numbers, given as JSON numbers or numeric strings
fn integer(field: &'static str, value: &Value) -> Result<i64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::InvalidType {
        field,
        expected: "integer",
        value: value.clone(),
    })
}

fn parse_date(field: &'static str, value: &Value) -> Result<DateTime<Utc>, ValidationError> {
    let raw = text(field, value)?;
    let value = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ValidationError::InvalidDate {
            field,
            value: raw.clone(),
        })
}

impl BorrowRequest {
    /// Check presence of every field, then quantity, then the remaining
    /// field types and dates. The first failing stage wins.
    ///
    /// Name and email are carried over exactly as sent; only the presence
    /// check looks past surrounding whitespace.
    pub fn into_command(self) -> Result<BorrowCommand, ValidationError> {
        let book = present(&self.book);
        let quantity = present(&self.quantity);
        let borrow_date = present(&self.borrow_date);
        let due_date = present(&self.due_date);
        let borrower_name = present(&self.borrower_name);
        let borrower_email = present(&self.borrower_email);

        let mut missing = Vec::new();
        if book.is_none() {
            missing.push(MissingField { path: "book", label: "Book" });
        }
        if quantity.is_none() {
            missing.push(MissingField { path: "quantity", label: "Quantity" });
        }
        if borrow_date.is_none() {
            missing.push(MissingField { path: "borrowDate", label: "Borrow date" });
        }
        if due_date.is_none() {
            missing.push(MissingField { path: "dueDate", label: "Due date" });
        }
        if borrower_name.is_none() {
            missing.push(MissingField { path: "borrowerName", label: "Borrower name" });
        }
        if borrower_email.is_none() {
            missing.push(MissingField { path: "borrowerEmail", label: "Borrower email" });
        }

        let (
            Some(book),
            Some(quantity),
            Some(borrow_date),
            Some(due_date),
            Some(borrower_name),
            Some(borrower_email),
        ) = (book, quantity, borrow_date, due_date, borrower_name, borrower_email)
        else {
            return Err(ValidationError::MissingFields(missing));
        };

        let quantity = integer("quantity", quantity)?;
        if quantity <= 0 {
            return Err(ValidationError::InvalidQuantity(quantity));
        }

        Ok(BorrowCommand {
            book: text("book", book)?,
            quantity,
            borrow_date: parse_date("borrowDate", borrow_date)?,
            due_date: parse_date("dueDate", due_date)?,
            borrower_name: text("borrowerName", borrower_name)?,
            borrower_email: text("borrowerEmail", borrower_email)?,
        })
    }
}
