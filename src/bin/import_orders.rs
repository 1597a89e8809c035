use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pressroom_api::{config, db, services::importer::ImportService};

/// Import a storefront order export into the pressroom database.
#[derive(Debug, Parser)]
#[command(name = "import-orders", version)]
struct Cli {
    /// Path to the CSV export; defaults to the configured import path
    #[arg(long)]
    file: Option<PathBuf>,

    /// Run the migrations before importing
    #[arg(long)]
    migrate: bool,

    /// After importing, set order_date from the ingestion timestamp for
    /// orders that never received a storefront date
    #[arg(long)]
    backfill_dates: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    let db = db::establish_connection(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cli.migrate {
        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;
    }

    let path = cli
        .file
        .unwrap_or_else(|| PathBuf::from(&cfg.import.file_path));

    let service = ImportService::new(Arc::new(db));
    let summary = service
        .import_file(&path)
        .await
        .with_context(|| format!("import failed for {}", path.display()))?;

    info!(
        orders_created = summary.orders_created,
        orders_updated = summary.orders_updated,
        items_created = summary.items_created,
        items_merged = summary.items_merged,
        rows_skipped = summary.rows_skipped,
        "Import complete"
    );

    if cli.backfill_dates {
        let touched = service
            .backfill_order_dates()
            .await
            .context("order date backfill failed")?;
        info!(orders = touched, "Order date backfill complete");
    }

    Ok(())
}
