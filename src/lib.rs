pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;
pub mod uploads;

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqlitePool, SqlitePoolOptions},
};

/// Apply the bundled schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Connect to SQLite and bring the schema up to date.
pub async fn connect_database(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}
