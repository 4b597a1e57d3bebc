use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};
use utoipa::ToSchema;

/// Timestamp carried by the zero-valued record, `0001-01-01T00:00:00Z`.
pub const ZERO_TIME: OffsetDateTime = match Date::from_calendar_date(1, Month::January, 1) {
    Ok(date) => PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc(),
    Err(_) => OffsetDateTime::UNIX_EPOCH,
};

/// A stored book record.
///
/// The audit fields keep their capitalized wire names (`ID`, `CreatedAt`, ...)
/// for compatibility with existing clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    /// Identifier assigned by the database, `0` for the zero-valued record
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "CreatedAt", with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(rename = "UpdatedAt", with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
    /// Set once the record has been deleted
    #[serde(rename = "DeletedAt", with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub deleted_at: Option<OffsetDateTime>,
    pub name: String,
    pub author: String,
    pub publication: String,
}

impl Default for Book {
    fn default() -> Self {
        Self {
            id: 0,
            created_at: ZERO_TIME,
            updated_at: ZERO_TIME,
            deleted_at: None,
            name: String::new(),
            author: String::new(),
            publication: String::new(),
        }
    }
}

impl Book {
    /// Overwrite each field the input actually carries; empty strings leave the
    /// stored value untouched.
    pub fn merge(&mut self, input: BookInput) {
        if !input.name.is_empty() {
            self.name = input.name;
        }
        if !input.author.is_empty() {
            self.author = input.author;
        }
        if !input.publication.is_empty() {
            self.publication = input.publication;
        }
    }
}

/// Request body for creating or updating a book.
///
/// Missing fields decode as empty strings and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookInput {
    pub name: String,
    pub author: String,
    pub publication: String,
}
