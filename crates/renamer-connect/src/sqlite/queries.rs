use std::collections::BTreeMap;

use sqlx::{Row, SqlitePool};

use crate::errors::ConnectorResult;
use crate::ident::quote_ident;

pub async fn list_tables(pool: &SqlitePool) -> ConnectorResult<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "select name from sqlite_master where type = 'table' order by name",
    )
    .fetch_all(pool)
    .await?;
    Ok(names)
}

/// One row of `PRAGMA table_info`.
pub struct RawColumn {
    pub cid: i64,
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    /// 1-based position in the primary key, 0 when not part of it.
    pub pk: i64,
}

pub async fn table_info(pool: &SqlitePool, table: &str) -> ConnectorResult<Vec<RawColumn>> {
    let sql = format!("pragma table_info({})", quote_ident(table));
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.into_iter()
        .map(|row| -> ConnectorResult<RawColumn> {
            Ok(RawColumn {
                cid: row.try_get("cid")?,
                name: row.try_get("name")?,
                declared_type: row.try_get("type")?,
                not_null: row.try_get::<i64, _>("notnull")? != 0,
                pk: row.try_get("pk")?,
            })
        })
        .collect()
}

/// A foreign key assembled from the rows of `PRAGMA foreign_key_list`
/// sharing one `id`.
pub struct RawForeignKey {
    pub id: i64,
    pub referenced_table: String,
    pub columns: Vec<String>,
    /// `None` entries reference the parent's primary key implicitly.
    pub referenced_columns: Vec<Option<String>>,
    pub on_update: String,
    pub on_delete: String,
}

pub async fn foreign_key_list(
    pool: &SqlitePool,
    table: &str,
) -> ConnectorResult<Vec<RawForeignKey>> {
    let sql = format!("pragma foreign_key_list({})", quote_ident(table));
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    let mut grouped: BTreeMap<i64, RawForeignKey> = BTreeMap::new();
    let mut ordered: Vec<(i64, i64, String, Option<String>)> = Vec::new();

    for row in rows {
        let id: i64 = row.try_get("id")?;
        let seq: i64 = row.try_get("seq")?;
        let from: String = row.try_get("from")?;
        let to: Option<String> = row.try_get("to")?;

        grouped.entry(id).or_insert(RawForeignKey {
            id,
            referenced_table: row.try_get("table")?,
            columns: Vec::new(),
            referenced_columns: Vec::new(),
            on_update: row.try_get("on_update")?,
            on_delete: row.try_get("on_delete")?,
        });
        ordered.push((id, seq, from, to));
    }

    ordered.sort_by_key(|(id, seq, _, _)| (*id, *seq));
    for (id, _, from, to) in ordered {
        if let Some(fk) = grouped.get_mut(&id) {
            fk.columns.push(from);
            fk.referenced_columns.push(to);
        }
    }

    Ok(grouped.into_values().collect())
}
