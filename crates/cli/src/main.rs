use anyhow::Context;
use bookstore_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Administrative entrypoint for the bookstore service
#[derive(Debug, Parser)]
#[command(name = "bookstore-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server until interrupted
    Serve,
    /// Apply pending schema setup and exit
    Migrate,
    /// Print the resolved settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;

    match cli.command {
        Command::Serve => {
            bookstore_telemetry::init(&settings.telemetry)?;
            bookstore_app::bootstrap::serve(&settings).await?;
        }
        Command::Migrate => {
            bookstore_telemetry::init(&settings.telemetry)?;
            let applied = bookstore_app::bootstrap::migrate(&settings).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {} migration(s)", applied);
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{}", rendered);
        }
    }

    Ok(())
}
