pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookstore_kernel::{settings::ApiSettings, InitCtx, Migration, Module};
use utoipa::OpenApi;

use repository::BookRepository;
use routes::BooksState;

/// Schema for the `books` table.
pub const BOOKS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        deleted_at  TEXT NULL,
        name        TEXT NOT NULL DEFAULT '',
        author      TEXT NOT NULL DEFAULT '',
        publication TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_books_deleted_at ON books (deleted_at);
"#;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::list_books,
        routes::get_book,
        routes::create_book,
        routes::update_book,
        routes::delete_book
    ),
    components(schemas(models::Book, models::BookInput)),
    tags((name = "Books", description = "Book record management"))
)]
struct BooksApi;

/// Books module: CRUD over book records
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(repository: Arc<dyn BookRepository>, api: &ApiSettings) -> Self {
        Self {
            state: BooksState {
                repository,
                missing_as_not_found: api.missing_as_not_found,
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            missing_as_not_found = self.state.missing_as_not_found,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<utoipa::openapi::OpenApi> {
        Some(BooksApi::openapi())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: BOOKS_SCHEMA,
        }]
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        ctx.db.ping().await?;
        tracing::info!(
            module = self.name(),
            database = %ctx.settings.database.url,
            "books module started"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(repository: Arc<dyn BookRepository>, api: &ApiSettings) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repository, api))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_covers_every_book_route() {
        let doc = BooksApi::openapi();
        let book_root = doc.paths.paths.get("/book/").expect("/book/ documented");
        assert!(book_root.get.is_some());
        assert!(book_root.post.is_some());

        let book_item = doc.paths.paths.get("/book/{id}").expect("/book/{id} documented");
        assert!(book_item.get.is_some());
        assert!(book_item.put.is_some());
        assert!(book_item.delete.is_some());
    }
}
