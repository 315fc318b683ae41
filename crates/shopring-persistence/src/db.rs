//! SQLite connection and schema setup

use std::path::Path;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::Index,
};
use tracing::info;

use crate::entity::{client_list, server_list};

/// Build a `sqlite://` URL for `path`, creating parent directories
pub fn sqlite_url(path: &Path) -> anyhow::Result<String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(format!("sqlite://{}?mode=rwc", path.display()))
}

/// Open a connection pool.
///
/// An in-memory database lives only as long as its connection, so those
/// pools are limited to a single connection.
pub async fn connect(url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_string());
    if url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(url, "Connected to database");
    Ok(db)
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

pub async fn init_server_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    create_table(db, server_list::Entity).await?;

    let backend = db.get_database_backend();
    let index = Index::create()
        .if_not_exists()
        .name("idx_shopping_lists_uuid_vnode")
        .table(server_list::Entity)
        .col(server_list::Column::ListUuid)
        .col(server_list::Column::VirtualnodeId)
        .to_owned();
    db.execute(backend.build(&index)).await?;
    Ok(())
}

pub async fn init_client_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    create_table(db, client_list::Entity).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("server_1.db");
        let url = sqlite_url(&path).unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("server_1.db?mode=rwc"));
        assert!(dir.path().join("nested").is_dir());
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let db = connect("sqlite::memory:").await.unwrap();
        init_server_schema(&db).await.unwrap();
        init_server_schema(&db).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = sqlite_url(&dir.path().join("alice_shopping.db")).unwrap();
        let db = connect(&url).await.unwrap();
        init_client_schema(&db).await.unwrap();
        assert!(dir.path().join("alice_shopping.db").exists());
    }
}
