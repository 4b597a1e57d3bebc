use anyhow::Context;
use std::sync::Arc;

use bookstore_db::Database;

use crate::module::{InitCtx, Migration, Module};

/// Module registry for managing module lifecycle in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Get the number of registered modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect all migrations from all modules
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        let mut migrations = Vec::new();

        for module in &self.modules {
            for migration in module.migrations() {
                migrations.push((module.name().to_string(), migration));
            }
        }

        // Sort by module name and migration ID for deterministic ordering
        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));

        migrations
    }

    /// Apply every pending migration. Returns how many actually ran.
    pub async fn apply_migrations(&self, db: &Database) -> anyhow::Result<usize> {
        let migrations = self.collect_migrations();
        tracing::info!("checking {} migrations", migrations.len());

        let mut applied = 0;
        for (scope, migration) in &migrations {
            let ran = db
                .apply_migration(scope, migration.id, migration.up)
                .await
                .with_context(|| format!("failed to apply migration '{}/{}'", scope, migration.id))?;
            if ran {
                applied += 1;
            }
        }

        tracing::info!(applied, "schema up to date");
        Ok(applied)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestModule {
        name: &'static str,
        stopped_at: Arc<AtomicUsize>,
        clock: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![
                Migration {
                    id: "002_seed",
                    up: "INSERT INTO test_items (label) VALUES ('seed');",
                },
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE test_items (id INTEGER PRIMARY KEY, label TEXT);",
                },
            ]
        }

        async fn stop(&self) -> anyhow::Result<()> {
            let tick = self.clock.fetch_add(1, Ordering::SeqCst);
            self.stopped_at.store(tick, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_module(
        name: &'static str,
        clock: &Arc<AtomicUsize>,
    ) -> (Arc<TestModule>, Arc<AtomicUsize>) {
        let stopped_at = Arc::new(AtomicUsize::new(usize::MAX));
        let module = Arc::new(TestModule {
            name,
            stopped_at: stopped_at.clone(),
            clock: clock.clone(),
        });
        (module, stopped_at)
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
        assert!(registry.collect_migrations().is_empty());
    }

    #[test]
    fn test_migrations_sorted_by_id() {
        let clock = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(test_module("test", &clock).0);

        let ids: Vec<_> = registry
            .collect_migrations()
            .into_iter()
            .map(|(scope, m)| format!("{}/{}", scope, m.id))
            .collect();
        assert_eq!(ids, vec!["test/001_init", "test/002_seed"]);
        assert!(registry.get_module("test").is_some());
        assert!(registry.get_module("missing").is_none());
    }

    #[tokio::test]
    async fn test_apply_migrations_is_idempotent() {
        let clock = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(test_module("test", &clock).0);

        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        assert_eq!(registry.apply_migrations(&db).await.unwrap(), 2);
        assert_eq!(registry.apply_migrations(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_module_lifecycle_stops_in_reverse() {
        let clock = Arc::new(AtomicUsize::new(0));
        let (first, first_stopped) = test_module("first", &clock);
        let (second, second_stopped) = test_module("second", &clock);

        let mut registry = ModuleRegistry::new();
        registry.register(first);
        registry.register(second);
        assert_eq!(registry.module_count(), 2);

        let settings = Settings::default();
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        registry.init_modules(&ctx).await.unwrap();
        registry.start_modules(&ctx).await.unwrap();
        registry.stop_modules().await.unwrap();

        assert_eq!(second_stopped.load(Ordering::SeqCst), 0);
        assert_eq!(first_stopped.load(Ordering::SeqCst), 1);
    }
}
