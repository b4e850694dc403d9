use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use renamer_core::{Column, FkAction, ForeignKey};

use crate::adapter::{Connector, TableRef};
use crate::errors::{ConnectorError, ConnectorResult};
use crate::ident::quote_ident;
use crate::options::ReadOptions;

mod queries;

/// SQLite exposes one namespace per attached file; only `main` is renamed.
pub const SQLITE_NAMESPACE: &str = "main";

/// Connector for SQLite database files.
pub struct SqliteConnector {
    pool: SqlitePool,
    database: Option<String>,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteConnector {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            database: None,
            tx: None,
        }
    }

    /// Open an existing database file. Never creates one.
    pub async fn open(path: &Path, acquire_timeout: Duration) -> ConnectorResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .foreign_keys(true);
        Self::connect_with(options, acquire_timeout, path.display().to_string()).await
    }

    /// Open a `sqlite://` URL.
    pub async fn connect(url: &str, acquire_timeout: Duration) -> ConnectorResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.foreign_keys(true);
        Self::connect_with(options, acquire_timeout, url.to_string()).await
    }

    async fn connect_with(
        options: SqliteConnectOptions,
        acquire_timeout: Duration,
        label: String,
    ) -> ConnectorResult<Self> {
        // A single connection keeps reads and the rename transaction on one handle.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            database: Some(label),
            tx: None,
        })
    }

    async fn execute(&mut self, sql: &str) -> ConnectorResult<()> {
        tracing::debug!(event = "statement", sql = %sql);
        match self.tx.as_mut() {
            Some(tx) => sqlx::query(sql).execute(&mut **tx).await?,
            None => sqlx::query(sql).execute(&self.pool).await?,
        };
        Ok(())
    }

    async fn primary_key_columns(&self, table: &str) -> ConnectorResult<Vec<String>> {
        let mut columns: Vec<(i64, String)> = queries::table_info(&self.pool, table)
            .await?
            .into_iter()
            .filter(|column| column.pk > 0)
            .map(|column| (column.pk, column.name))
            .collect();
        columns.sort();
        Ok(columns.into_iter().map(|(_, name)| name).collect())
    }

    /// Column names of `table` as spelled in its definition.
    async fn column_names(&self, table: &str) -> ConnectorResult<Vec<String>> {
        Ok(queries::table_info(&self.pool, table)
            .await?
            .into_iter()
            .map(|column| column.name)
            .collect())
    }

    fn check_namespace(schema: &str) -> ConnectorResult<()> {
        if schema == SQLITE_NAMESPACE {
            Ok(())
        } else {
            Err(ConnectorError::NotFound(format!("namespace {schema}")))
        }
    }
}

/// The catalog entry matching `name` ignoring ASCII case, or `name` itself.
fn catalog_spelling(catalog: &[String], name: &str) -> String {
    catalog
        .iter()
        .find(|entry| entry.as_str() == name)
        .or_else(|| catalog.iter().find(|entry| entry.eq_ignore_ascii_case(name)))
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

#[async_trait]
impl Connector for SqliteConnector {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    fn database(&self) -> Option<String> {
        self.database.clone()
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    async fn list_tables(&mut self, opts: &ReadOptions) -> ConnectorResult<Vec<TableRef>> {
        if !opts.allows_schema(SQLITE_NAMESPACE, false) {
            return Ok(Vec::new());
        }

        Ok(queries::list_tables(&self.pool)
            .await?
            .into_iter()
            .filter(|name| opts.include_system_schemas || !name.starts_with("sqlite_"))
            .map(|name| TableRef::new(SQLITE_NAMESPACE, name))
            .collect())
    }

    async fn list_columns(&mut self, table: &TableRef) -> ConnectorResult<Vec<Column>> {
        Self::check_namespace(&table.schema)?;
        queries::table_info(&self.pool, &table.name)
            .await?
            .into_iter()
            .map(|column| -> ConnectorResult<Column> {
                let ordinal_position = i16::try_from(column.cid + 1).map_err(|_| {
                    ConnectorError::Malformed(format!(
                        "{}: column {} is beyond position {}",
                        table.name,
                        column.name,
                        i16::MAX
                    ))
                })?;
                Ok(Column {
                    ordinal_position,
                    name: column.name,
                    data_type: column.declared_type,
                    is_nullable: !column.not_null && column.pk == 0,
                    is_primary_key: column.pk > 0,
                })
            })
            .collect()
    }

    async fn list_foreign_keys(&mut self, table: &TableRef) -> ConnectorResult<Vec<ForeignKey>> {
        Self::check_namespace(&table.schema)?;
        let raw = queries::foreign_key_list(&self.pool, &table.name).await?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite resolves identifiers case-insensitively; report catalog spelling.
        let tables = queries::list_tables(&self.pool).await?;
        let own_columns = self.column_names(&table.name).await?;

        let mut foreign_keys = Vec::with_capacity(raw.len());
        for fk in raw {
            let referenced_table = catalog_spelling(&tables, &fk.referenced_table);
            let referenced_columns = if fk.referenced_columns.iter().all(Option::is_some) {
                let parent_columns = self.column_names(&referenced_table).await?;
                fk.referenced_columns
                    .into_iter()
                    .flatten()
                    .map(|column| catalog_spelling(&parent_columns, &column))
                    .collect()
            } else {
                self.primary_key_columns(&referenced_table).await?
            };

            foreign_keys.push(ForeignKey {
                name: Some(format!("fk_{}_{}", table.name, fk.id)),
                columns: fk
                    .columns
                    .iter()
                    .map(|column| catalog_spelling(&own_columns, column))
                    .collect(),
                referenced_schema: SQLITE_NAMESPACE.to_string(),
                referenced_table,
                referenced_columns,
                on_update: FkAction::from_sql(&fk.on_update),
                on_delete: FkAction::from_sql(&fk.on_delete),
            });
        }

        Ok(foreign_keys)
    }

    async fn rename_table(&mut self, schema: &str, from: &str, to: &str) -> ConnectorResult<()> {
        Self::check_namespace(schema)?;
        let sql = format!(
            "alter table {} rename to {}",
            quote_ident(from),
            quote_ident(to)
        );
        self.execute(&sql).await
    }

    async fn rename_column(
        &mut self,
        schema: &str,
        table: &str,
        from: &str,
        to: &str,
    ) -> ConnectorResult<()> {
        Self::check_namespace(schema)?;
        let sql = format!(
            "alter table {} rename column {} to {}",
            quote_ident(table),
            quote_ident(from),
            quote_ident(to)
        );
        self.execute(&sql).await
    }

    async fn begin(&mut self) -> ConnectorResult<()> {
        if self.tx.is_some() {
            return Err(ConnectorError::Transaction(
                "transaction already open".to_string(),
            ));
        }
        self.tx = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn commit(&mut self) -> ConnectorResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ConnectorError::Transaction("no open transaction".to_string()))?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> ConnectorResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ConnectorError::Transaction("no open transaction".to_string()))?;
        tx.rollback().await?;
        Ok(())
    }
}
