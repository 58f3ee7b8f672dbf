//! Bulk loader for the YaMDb CSV fixtures.
//!
//! Every file is read and inserted inside one transaction, parents before
//! children, keeping the ids from the files. A missing file is skipped.

use std::path::Path;

use anyhow::{Context as _, Result};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait,
    IntoActiveModel, TransactionTrait,
};
use tracing::{info, warn};

pub mod rows;

use rows::{
    CategoryRow, CommentRow, CsvRow, GenreRow, GenreTitleRow, ReviewRow, TitleRow, UserRow,
};

/// Rows per `INSERT` statement.
const BATCH_SIZE: usize = 500;

/// Tables whose id sequences need moving past the imported ids.
const TABLES: [&str; 7] = [
    "users",
    "categories",
    "genres",
    "titles",
    "title_genres",
    "reviews",
    "comments",
];

/// How many rows each file contributed. `None` marks a skipped file.
pub type ImportReport = Vec<(&'static str, Option<usize>)>;

pub async fn import_dir(db: &DatabaseConnection, dir: &Path) -> Result<ImportReport> {
    let txn = db.begin().await.context("begin import transaction")?;

    let report = vec![
        (UserRow::FILE, load::<UserRow, _>(&txn, dir).await?),
        (CategoryRow::FILE, load::<CategoryRow, _>(&txn, dir).await?),
        (GenreRow::FILE, load::<GenreRow, _>(&txn, dir).await?),
        (TitleRow::FILE, load::<TitleRow, _>(&txn, dir).await?),
        (GenreTitleRow::FILE, load::<GenreTitleRow, _>(&txn, dir).await?),
        (ReviewRow::FILE, load::<ReviewRow, _>(&txn, dir).await?),
        (CommentRow::FILE, load::<CommentRow, _>(&txn, dir).await?),
    ];

    reset_sequences(&txn).await?;
    txn.commit().await.context("commit import transaction")?;
    Ok(report)
}

async fn load<R: CsvRow, C: ConnectionTrait>(conn: &C, dir: &Path) -> Result<Option<usize>>
where
    <<R::ActiveModel as ActiveModelTrait>::Entity as EntityTrait>::Model:
        IntoActiveModel<R::ActiveModel>,
{
    let path = dir.join(R::FILE);
    if !path.is_file() {
        warn!(file = R::FILE, "fixture file missing, skipped");
        return Ok(None);
    }

    let mut reader =
        csv::Reader::from_path(&path).with_context(|| format!("open {}", path.display()))?;
    let mut models = Vec::new();
    for (index, record) in reader.deserialize::<R>().enumerate() {
        let row = record.with_context(|| format!("{} record {}", R::FILE, index + 1))?;
        models.push(row.into_active_model()?);
    }

    for batch in models.chunks(BATCH_SIZE) {
        <<R::ActiveModel as ActiveModelTrait>::Entity as EntityTrait>::insert_many(batch.to_vec())
            .exec_without_returning(conn)
            .await
            .with_context(|| format!("insert {}", R::FILE))?;
    }
    info!(file = R::FILE, rows = models.len(), "fixture file loaded");
    Ok(Some(models.len()))
}

/// Explicit ids leave PostgreSQL sequences behind; move them past the max.
async fn reset_sequences<C: ConnectionTrait>(conn: &C) -> Result<()> {
    if conn.get_database_backend() != DatabaseBackend::Postgres {
        return Ok(());
    }
    for table in TABLES {
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
             COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
        );
        conn.execute_unprepared(&sql)
            .await
            .with_context(|| format!("reset {table} id sequence"))?;
    }
    Ok(())
}
