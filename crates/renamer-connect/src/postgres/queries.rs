use sqlx::{PgPool, Row};

use crate::errors::ConnectorResult;

pub async fn fetch_database_name(pool: &PgPool) -> ConnectorResult<String> {
    let name = sqlx::query_scalar::<_, String>("select current_database()")
        .fetch_one(pool)
        .await?;
    Ok(name)
}

pub struct RawTable {
    pub schema: String,
    pub name: String,
}

pub async fn list_tables(pool: &PgPool) -> ConnectorResult<Vec<RawTable>> {
    let rows = sqlx::query(
        r#"
        select
          n.nspname::text as schema,
          c.relname::text as name
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where c.relkind in ('r', 'p')
          and not c.relispartition
        order by n.nspname, c.relname
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> ConnectorResult<RawTable> {
            Ok(RawTable {
                schema: row.try_get("schema")?,
                name: row.try_get("name")?,
            })
        })
        .collect()
}

pub struct RawColumn {
    pub ordinal_position: i16,
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
}

pub async fn list_columns(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> ConnectorResult<Vec<RawColumn>> {
    let rows = sqlx::query(
        r#"
        select
          a.attnum as ordinal_position,
          a.attname::text as name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as data_type,
          (not a.attnotnull) as is_nullable,
          exists (
            select 1
            from pg_index i
            where i.indrelid = c.oid
              and i.indisprimary
              and a.attnum = any(i.indkey)
          ) as is_primary_key
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> ConnectorResult<RawColumn> {
            Ok(RawColumn {
                ordinal_position: row.try_get("ordinal_position")?,
                name: row.try_get("name")?,
                data_type: row.try_get("data_type")?,
                is_nullable: row.try_get("is_nullable")?,
                is_primary_key: row.try_get("is_primary_key")?,
            })
        })
        .collect()
}

pub struct RawUniqueConstraint {
    pub name: String,
    pub columns: Vec<String>,
}

pub async fn list_unique_constraints(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> ConnectorResult<Vec<RawUniqueConstraint>> {
    let rows = sqlx::query(
        r#"
        select
          con.conname::text as name,
          array_agg(att.attname::text order by k.ordinality) as columns
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        join unnest(con.conkey) with ordinality as k(attnum, ordinality) on true
        join pg_attribute att on att.attrelid = rel.oid and att.attnum = k.attnum
        where nsp.nspname = $1
          and rel.relname = $2
          and con.contype = 'u'
        group by con.conname
        order by con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> ConnectorResult<RawUniqueConstraint> {
            Ok(RawUniqueConstraint {
                name: row.try_get("name")?,
                columns: row.try_get("columns")?,
            })
        })
        .collect()
}

pub struct RawForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_update_code: i8,
    pub on_delete_code: i8,
}

pub async fn list_foreign_keys(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> ConnectorResult<Vec<RawForeignKey>> {
    let rows = sqlx::query(
        r#"
        select
          con.conname::text as name,
          array_agg(src_att.attname::text order by s_ord.ordinality) as columns,
          ref_nsp.nspname::text as referenced_schema,
          ref_rel.relname::text as referenced_table,
          array_agg(ref_att.attname::text order by s_ord.ordinality) as referenced_columns,
          con.confupdtype as on_update_code,
          con.confdeltype as on_delete_code
        from pg_constraint con
        join pg_class src_rel on src_rel.oid = con.conrelid
        join pg_namespace src_nsp on src_nsp.oid = src_rel.relnamespace
        join pg_class ref_rel on ref_rel.oid = con.confrelid
        join pg_namespace ref_nsp on ref_nsp.oid = ref_rel.relnamespace
        join unnest(con.conkey, con.confkey) with ordinality as s_ord(src_attnum, ref_attnum, ordinality) on true
        join pg_attribute src_att on src_att.attrelid = src_rel.oid and src_att.attnum = s_ord.src_attnum
        join pg_attribute ref_att on ref_att.attrelid = ref_rel.oid and ref_att.attnum = s_ord.ref_attnum
        where src_nsp.nspname = $1
          and src_rel.relname = $2
          and con.contype = 'f'
        group by
          con.conname, ref_nsp.nspname, ref_rel.relname,
          con.confupdtype, con.confdeltype
        order by con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> ConnectorResult<RawForeignKey> {
            Ok(RawForeignKey {
                name: row.try_get("name")?,
                columns: row.try_get("columns")?,
                referenced_schema: row.try_get("referenced_schema")?,
                referenced_table: row.try_get("referenced_table")?,
                referenced_columns: row.try_get("referenced_columns")?,
                on_update_code: row.try_get("on_update_code")?,
                on_delete_code: row.try_get("on_delete_code")?,
            })
        })
        .collect()
}
