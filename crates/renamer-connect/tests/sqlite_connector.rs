use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use renamer_connect::{read_schema, Connector, ReadOptions, SqliteConnector};
use renamer_core::FkAction;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

const FIXTURE: &[&str] = &[
    "create table users (id integer primary key, name text not null)",
    "create table orders (
       id integer primary key,
       user_id integer not null references users(id) on delete cascade,
       note text
     )",
    "create table audit (entry text, user_ref integer references users)",
    "insert into users (id, name) values (1, 'Ada')",
    "insert into orders (id, user_id, note) values (10, 1, 'first')",
];

async fn create_fixture(path: &Path) -> Result<()> {
    create_database(path, FIXTURE).await
}

async fn create_database(path: &Path, statements: &[&str]) -> Result<()> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    for statement in statements {
        sqlx::query(statement).execute(&pool).await?;
    }
    pool.close().await;
    Ok(())
}

#[tokio::test]
async fn reads_tables_columns_and_foreign_keys() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shop.db");
    create_fixture(&path).await?;

    let mut connector = SqliteConnector::open(&path, Duration::from_secs(5)).await?;
    let schema = read_schema(&mut connector, &ReadOptions::default()).await?;

    assert_eq!(schema.engine, "sqlite");
    let names: Vec<&str> = schema.schemas[0]
        .tables
        .iter()
        .map(|table| table.name.as_str())
        .collect();
    assert_eq!(names, vec!["audit", "orders", "users"]);

    let orders = schema
        .table("main", "orders")
        .ok_or_else(|| anyhow!("orders missing"))?;
    assert_eq!(orders.single_primary_key(), Some("id"));
    let fk = orders
        .foreign_keys()
        .next()
        .ok_or_else(|| anyhow!("orders fk missing"))?;
    assert_eq!(fk.columns, vec!["user_id"]);
    assert_eq!(fk.referenced_table, "users");
    assert_eq!(fk.referenced_columns, vec!["id"]);
    assert_eq!(fk.on_delete, FkAction::Cascade);

    let audit = schema
        .table("main", "audit")
        .ok_or_else(|| anyhow!("audit missing"))?;
    let implicit = audit
        .foreign_keys()
        .next()
        .ok_or_else(|| anyhow!("audit fk missing"))?;
    assert_eq!(implicit.referenced_columns, vec!["id"]);
    Ok(())
}

#[tokio::test]
async fn rollback_discards_renames_and_commit_keeps_them() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shop.db");
    create_fixture(&path).await?;

    let mut connector = SqliteConnector::open(&path, Duration::from_secs(5)).await?;
    let before = read_schema(&mut connector, &ReadOptions::default()).await?;

    connector.begin().await?;
    connector.rename_table("main", "users", "table_a").await?;
    connector.rollback().await?;
    assert_eq!(read_schema(&mut connector, &ReadOptions::default()).await?, before);

    connector.begin().await?;
    connector.rename_table("main", "users", "table_a").await?;
    connector
        .rename_column("main", "table_a", "id", "column1")
        .await?;
    connector.commit().await?;

    let after = read_schema(&mut connector, &ReadOptions::default()).await?;
    assert!(after.table("main", "users").is_none());
    let fk = after
        .table("main", "orders")
        .and_then(|table| table.foreign_keys().next())
        .ok_or_else(|| anyhow!("orders fk missing"))?;
    assert_eq!(fk.referenced_table, "table_a");
    assert_eq!(fk.referenced_columns, vec!["column1"]);
    Ok(())
}

#[tokio::test]
async fn rejects_unknown_namespace() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shop.db");
    create_fixture(&path).await?;

    let mut connector = SqliteConnector::open(&path, Duration::from_secs(5)).await?;
    assert!(connector.rename_table("other", "users", "x").await.is_err());
    Ok(())
}

#[tokio::test]
async fn references_are_reported_in_catalog_spelling() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("mixed.db");
    create_database(
        &path,
        &[
            "create table users (id integer primary key, name text)",
            "create table orders (id integer primary key, user_id integer references Users(ID))",
            "create table notes (body text, Author integer, foreign key (AUTHOR) references USERS)",
        ],
    )
    .await?;

    let mut connector = SqliteConnector::open(&path, Duration::from_secs(5)).await?;
    let schema = read_schema(&mut connector, &ReadOptions::default()).await?;

    let orders = schema
        .table("main", "orders")
        .ok_or_else(|| anyhow!("orders missing"))?;
    let fk = orders
        .foreign_keys()
        .next()
        .ok_or_else(|| anyhow!("orders fk missing"))?;
    assert_eq!(fk.referenced_table, "users");
    assert_eq!(fk.referenced_columns, vec!["id"]);

    let notes = schema
        .table("main", "notes")
        .ok_or_else(|| anyhow!("notes missing"))?;
    let fk = notes
        .foreign_keys()
        .next()
        .ok_or_else(|| anyhow!("notes fk missing"))?;
    assert_eq!(fk.columns, vec!["Author"]);
    assert_eq!(fk.referenced_table, "users");
    assert_eq!(fk.referenced_columns, vec!["id"]);
    Ok(())
}
