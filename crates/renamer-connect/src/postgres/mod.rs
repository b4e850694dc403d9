use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use renamer_core::{Column, ForeignKey, UniqueConstraint};

use crate::adapter::{Connector, TableRef};
use crate::errors::{ConnectorError, ConnectorResult};
use crate::ident::quote_ident;
use crate::options::ReadOptions;

mod mapper;
mod queries;

/// `NAMEDATALEN - 1` on a stock build.
pub const PG_MAX_IDENTIFIER_LEN: usize = 63;

/// Connector for PostgreSQL databases.
pub struct PostgresConnector {
    pool: PgPool,
    database: Option<String>,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresConnector {
    /// Create a connector using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            database: None,
            tx: None,
        }
    }

    /// Connect with a small pool; one connection is enough for a single run.
    pub async fn connect(url: &str, acquire_timeout: Duration) -> ConnectorResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        let database = queries::fetch_database_name(&pool).await?;

        Ok(Self {
            pool,
            database: Some(database),
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
}

#[async_trait]
impl Connector for PostgresConnector {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    fn database(&self) -> Option<String> {
        self.database.clone()
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    fn max_identifier_len(&self) -> Option<usize> {
        Some(PG_MAX_IDENTIFIER_LEN)
    }

    async fn list_tables(&mut self, opts: &ReadOptions) -> ConnectorResult<Vec<TableRef>> {
        let raw = queries::list_tables(&self.pool).await?;
        Ok(mapper::filter_tables(raw, opts))
    }

    async fn list_columns(&mut self, table: &TableRef) -> ConnectorResult<Vec<Column>> {
        let raw = queries::list_columns(&self.pool, &table.schema, &table.name).await?;
        Ok(mapper::map_columns(raw))
    }

    async fn list_foreign_keys(&mut self, table: &TableRef) -> ConnectorResult<Vec<ForeignKey>> {
        let raw = queries::list_foreign_keys(&self.pool, &table.schema, &table.name).await?;
        Ok(mapper::map_foreign_keys(raw))
    }

    async fn list_unique_constraints(
        &mut self,
        table: &TableRef,
    ) -> ConnectorResult<Vec<UniqueConstraint>> {
        let raw = queries::list_unique_constraints(&self.pool, &table.schema, &table.name).await?;
        Ok(mapper::map_unique_constraints(raw))
    }

    async fn rename_table(&mut self, schema: &str, from: &str, to: &str) -> ConnectorResult<()> {
        let sql = format!(
            "alter table {}.{} rename to {}",
            quote_ident(schema),
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
        let sql = format!(
            "alter table {}.{} rename column {} to {}",
            quote_ident(schema),
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
