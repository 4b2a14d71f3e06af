//! `users` CLI commands over the record store.

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::NameRecord;
use crate::records::{NameRecords, SqliteRecordStore, Submission};

async fn open_records(config: &Config) -> Result<NameRecords> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    Ok(NameRecords::new(Arc::new(SqliteRecordStore::new(pool))))
}

fn print_records(records: &[NameRecord]) {
    if records.is_empty() {
        println!("No users yet.");
        return;
    }
    for record in records {
        println!(
            "{}  {}  {}",
            record.created_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            record.id,
            record.name
        );
    }
}

pub async fn run_list(config: &Config) -> Result<()> {
    let records = open_records(config).await?;
    print_records(&records.list().await?);
    Ok(())
}

/// Adds `name` and prints the refreshed list. A whitespace-only name is a
/// silent no-op.
pub async fn run_add(config: &Config, name: &str) -> Result<()> {
    let records = open_records(config).await?;
    match records.submit(name).await? {
        Submission::Skipped => {}
        Submission::Added(list) => print_records(&list),
    }
    Ok(())
}
