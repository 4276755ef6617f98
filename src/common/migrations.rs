// src/common/migrations.rs
//! Database schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Create the schema at startup.
///
/// Tables are created idempotently; set RESET_DB=true to drop and recreate
/// everything from scratch.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("RESET_DB=true - dropping all tables and recreating schema");
        drop_all_tables(pool).await?;
    }

    create_job_tables(pool).await?;
    create_talent_tables(pool).await?;
    create_application_tables(pool).await?;
    create_indexes(pool).await?;

    info!("Database migration completed");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP TABLE IF EXISTS applications")
        .execute(pool)
        .await?;
    sqlx::query("DROP TABLE IF EXISTS talents")
        .execute(pool)
        .await?;
    sqlx::query("DROP TABLE IF EXISTS jobs")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_job_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // skills is a JSON array string; embedding is a JSON array of floats,
    // cleared whenever the posting text changes
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            company_name TEXT NOT NULL,
            role TEXT NOT NULL,
            department TEXT,
            country TEXT,
            experience TEXT,
            skills TEXT,
            description TEXT NOT NULL,
            embedding TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_talent_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS talents (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            profession TEXT NOT NULL,
            experience_years TEXT,
            resume_url TEXT,
            resume_embedding TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_application_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL,
            talent_id TEXT NOT NULL,
            score REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'Under Review',
            feedback TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE (job_id, talent_id),
            FOREIGN KEY (job_id) REFERENCES jobs (id),
            FOREIGN KEY (talent_id) REFERENCES talents (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_applications_job_id ON applications (job_id)",
        "CREATE INDEX IF NOT EXISTS idx_applications_talent_id ON applications (talent_id)",
        "CREATE INDEX IF NOT EXISTS idx_applications_status ON applications (status)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}
