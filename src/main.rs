use anyhow::Context;
use bookstore_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;
    bookstore_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        address = %settings.server.bind_address(),
        "bookstore bootstrap starting"
    );

    bookstore_app::bootstrap::serve(&settings).await?;

    tracing::info!("bookstore shut down cleanly");
    Ok(())
}
