pub mod books;

use std::sync::Arc;

use bookstore_db::Database;
use bookstore_kernel::{settings::Settings, ModuleRegistry};

use books::repository::SqliteBookRepository;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database, settings: &Settings) {
    let repository = Arc::new(SqliteBookRepository::new(db.pool().clone()));
    registry.register(books::create_module(repository, &settings.api));
}
