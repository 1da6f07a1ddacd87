//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured store and print per-table row counts.
//! - Keep output deterministic for quick local sanity checks.

use anyhow::{anyhow, Context, Result};
use clapboard_core::{core_version, CoreConfig};
use log::info;
use rusqlite::Connection;

const TABLES: [&str; 3] = ["profile", "story", "clap"];

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .with_context(|| format!("failed to count rows in `{table}`"))
}

fn main() -> Result<()> {
    // A missing .env file is fine; the process environment still applies.
    dotenv::dotenv().ok();

    let config = CoreConfig::from_env().map_err(|err| anyhow!(err))?;
    let logging = config.init_logging().map_err(|err| anyhow!(err))?;

    let conn = config.open_db().context("failed to open clapboard store")?;
    info!(
        "event=cli_probe module=cli status=ok logging={logging} in_memory={}",
        config.db_path.is_none()
    );

    println!("clapboard_core version={}", core_version());
    for table in TABLES {
        println!("{table} rows={}", count_rows(&conn, table)?);
    }
    Ok(())
}
