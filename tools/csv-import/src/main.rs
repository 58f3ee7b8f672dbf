//! Loads the YaMDb CSV fixtures into an empty database.
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/yamdb cargo run -p csv-import -- --dir static/data
//! ```
//!
//! Run the migrations first. The whole import is one transaction.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use sea_orm::Database;
use tracing::info;

use csv_import::import_dir;
use yamdb_core::tracing::init_tracing;

#[derive(Parser)]
#[command(about = "Import YaMDb CSV fixtures into the database")]
struct Args {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Directory holding users.csv, category.csv, genre.csv and the rest
    #[arg(long, default_value = "static/data")]
    dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let db = Database::connect(&args.database_url)
        .await
        .context("connect to database")?;

    let report = import_dir(&db, &args.dir).await?;
    let loaded: usize = report.iter().filter_map(|(_, rows)| *rows).sum();
    info!(dir = %args.dir.display(), rows = loaded, "import finished");
    Ok(())
}
