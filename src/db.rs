use log::{info, LevelFilter};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::{AppConfig, POOL_ACQUIRE_TIMEOUT, POOL_IDLE_TIMEOUT};

/// Opens the connection pool and checks the database is reachable.
///
/// Tables are expected to exist already; nothing here creates or alters schema.
pub async fn connect_db(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.pool_max)
        .min_connections(config.pool_min)
        .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
        .idle_timeout(POOL_IDLE_TIMEOUT)
        .sqlx_logging(config.sql_logging)
        .sqlx_logging_level(LevelFilter::Debug);

    let db = Database::connect(options).await?;
    db.ping().await?;
    info!(
        "database connection established (pool {}..={})",
        config.pool_min, config.pool_max
    );
    Ok(db)
}
