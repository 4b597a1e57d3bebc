//! Persistence access for books.

use async_trait::async_trait;
use bookstore_db::DbError;
use sqlx::SqlitePool;
use time::OffsetDateTime;

use super::models::{Book, BookInput};

/// Storage operations for [`Book`] records.
///
/// Soft-deleted rows are invisible to every operation.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All live books ordered by identifier.
    async fn find_all(&self) -> Result<Vec<Book>, DbError>;

    /// The live book with the given identifier, if any.
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, DbError>;

    /// Insert a new book and return it with its assigned identifier.
    async fn create(&self, input: &BookInput) -> Result<Book, DbError>;

    /// Soft-delete the book and return its final state, or `None` if no live
    /// book matched.
    async fn delete(&self, id: i64) -> Result<Option<Book>, DbError>;

    /// Persist the mutable fields of `book`, refreshing `updated_at`.
    ///
    /// Returns `None` when the row no longer exists.
    async fn save(&self, book: &Book) -> Result<Option<Book>, DbError>;
}

/// SQLite-backed [`BookRepository`].
#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, DbError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, created_at, updated_at, deleted_at, name, author, publication
             FROM books
             WHERE deleted_at IS NULL
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, DbError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, created_at, updated_at, deleted_at, name, author, publication
             FROM books
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn create(&self, input: &BookInput) -> Result<Book, DbError> {
        let now = OffsetDateTime::now_utc();

        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (created_at, updated_at, name, author, publication)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, created_at, updated_at, deleted_at, name, author, publication",
        )
        .bind(now)
        .bind(now)
        .bind(&input.name)
        .bind(&input.author)
        .bind(&input.publication)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(book_id = book.id, "book inserted");
        Ok(book)
    }

    async fn delete(&self, id: i64) -> Result<Option<Book>, DbError> {
        let book = sqlx::query_as::<_, Book>(
            "UPDATE books
             SET deleted_at = ?
             WHERE id = ? AND deleted_at IS NULL
             RETURNING id, created_at, updated_at, deleted_at, name, author, publication",
        )
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn save(&self, book: &Book) -> Result<Option<Book>, DbError> {
        let saved = sqlx::query_as::<_, Book>(
            "UPDATE books
             SET name = ?, author = ?, publication = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL
             RETURNING id, created_at, updated_at, deleted_at, name, author, publication",
        )
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.publication)
        .bind(OffsetDateTime::now_utc())
        .bind(book.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::BOOKS_SCHEMA;
    use bookstore_db::Database;

    async fn repository() -> SqliteBookRepository {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        db.apply_migration("books", "001_create_books", BOOKS_SCHEMA)
            .await
            .unwrap();
        SqliteBookRepository::new(db.pool().clone())
    }

    fn input(name: &str, author: &str, publication: &str) -> BookInput {
        BookInput {
            name: name.to_string(),
            author: author.to_string(),
            publication: publication.to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let repo = repository().await;

        let first = repo.create(&input("A", "B", "C")).await.unwrap();
        let second = repo.create(&input("D", "E", "F")).await.unwrap();

        assert!(first.id > 0);
        assert!(second.id > first.id);
        assert_eq!(first.created_at, first.updated_at);
        assert!(first.deleted_at.is_none());
    }

    #[tokio::test]
    async fn find_by_id_round_trips_fields() {
        let repo = repository().await;
        let created = repo
            .create(&input("Test Book", "Test Author", "Test Publisher"))
            .await
            .unwrap();

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Test Book");
        assert_eq!(found.author, "Test Author");
        assert_eq!(found.publication, "Test Publisher");

        assert!(repo.find_by_id(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_skips_deleted_rows() {
        let repo = repository().await;
        assert!(repo.find_all().await.unwrap().is_empty());

        let kept = repo.create(&input("kept", "", "")).await.unwrap();
        let gone = repo.create(&input("gone", "", "")).await.unwrap();
        repo.delete(gone.id).await.unwrap();

        let ids: Vec<i64> = repo.find_all().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![kept.id]);
    }

    #[tokio::test]
    async fn delete_is_soft_and_only_once() {
        let repo = repository().await;
        let book = repo.create(&input("Emma", "Jane Austen", "John Murray")).await.unwrap();

        let deleted = repo.delete(book.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, book.id);
        assert_eq!(deleted.name, "Emma");
        assert!(deleted.deleted_at.is_some());

        assert!(repo.delete(book.id).await.unwrap().is_none());
        assert!(repo.find_by_id(book.id).await.unwrap().is_none());

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn save_updates_live_rows_only() {
        let repo = repository().await;
        let mut book = repo.create(&input("Old", "Author", "Press")).await.unwrap();

        book.name = "New".to_string();
        let saved = repo.save(&book).await.unwrap().unwrap();
        assert_eq!(saved.name, "New");
        assert_eq!(saved.author, "Author");
        assert!(saved.updated_at >= saved.created_at);

        repo.delete(book.id).await.unwrap();
        assert!(repo.save(&book).await.unwrap().is_none());
    }
}
