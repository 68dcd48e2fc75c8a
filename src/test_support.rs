use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema};

use crate::entity::{board, news, notice, quote_inquiry};

/// In-memory SQLite with all four tables created from the entities.
///
/// The pool is pinned to a single connection, since every SQLite memory
/// connection would otherwise see its own empty database.
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("open in-memory sqlite");

    let schema = Schema::new(DbBackend::Sqlite);
    let tables = [
        schema.create_table_from_entity(board::Entity),
        schema.create_table_from_entity(notice::Entity),
        schema.create_table_from_entity(news::Entity),
        schema.create_table_from_entity(quote_inquiry::Entity),
    ];
    let backend = db.get_database_backend();
    for table in tables {
        db.execute(backend.build(&table))
            .await
            .expect("create table");
    }
    db
}
