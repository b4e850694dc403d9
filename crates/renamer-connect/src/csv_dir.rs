//! A directory of CSV files viewed as one namespace.
//!
//! Each `<name>.csv` is a table named `<name>`; its header row is the column
//! list. A header field named `id` is treated as the table's primary key so
//! that naming conventions such as `user_id` can link files together.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use renamer_core::{Column, ForeignKey};

use crate::adapter::{Connector, TableRef};
use crate::atomic::temp_path;
use crate::errors::{ConnectorError, ConnectorResult, SchemaReadError};
use crate::options::ReadOptions;

pub const CSV_NAMESPACE: &str = "main";
const PRIMARY_KEY_HEADER: &str = "id";

#[derive(Debug, Clone)]
pub struct CsvDirConnector {
    dir: PathBuf,
}

impl CsvDirConnector {
    pub fn open(dir: &Path) -> Result<Self, SchemaReadError> {
        if !dir.is_dir() {
            return Err(SchemaReadError::Unreachable {
                target: dir.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    fn existing_table_path(&self, table: &str) -> ConnectorResult<PathBuf> {
        let path = self.table_path(table);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ConnectorError::NotFound(format!("csv file {}", path.display())))
        }
    }

    fn read_headers(&self, table: &str) -> ConnectorResult<Vec<String>> {
        let path = self.existing_table_path(table)?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(&path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        if headers.is_empty() || headers.iter().all(|header| header.is_empty()) {
            return Err(ConnectorError::Malformed(format!(
                "{}: missing header row",
                path.display()
            )));
        }
        if let Some(position) = headers.iter().position(|header| header.trim().is_empty()) {
            return Err(ConnectorError::Malformed(format!(
                "{}: empty header field at position {}",
                path.display(),
                position + 1
            )));
        }
        for (index, header) in headers.iter().enumerate() {
            if headers[..index].contains(header) {
                return Err(ConnectorError::Malformed(format!(
                    "{}: duplicate header '{header}'",
                    path.display()
                )));
            }
        }

        Ok(headers)
    }

    fn check_namespace(schema: &str) -> ConnectorResult<()> {
        if schema == CSV_NAMESPACE {
            Ok(())
        } else {
            Err(ConnectorError::NotFound(format!("namespace {schema}")))
        }
    }
}

#[async_trait]
impl Connector for CsvDirConnector {
    fn engine(&self) -> &'static str {
        "csv"
    }

    async fn list_tables(&mut self, opts: &ReadOptions) -> ConnectorResult<Vec<TableRef>> {
        if !opts.allows_schema(CSV_NAMESPACE, false) {
            return Ok(Vec::new());
        }

        let mut tables = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                tables.push(TableRef::new(CSV_NAMESPACE, stem));
            }
        }
        tables.sort();
        Ok(tables)
    }

    async fn list_columns(&mut self, table: &TableRef) -> ConnectorResult<Vec<Column>> {
        Self::check_namespace(&table.schema)?;
        self.read_headers(&table.name)?
            .into_iter()
            .enumerate()
            .map(|(index, name)| -> ConnectorResult<Column> {
                let ordinal_position = i16::try_from(index + 1).map_err(|_| {
                    ConnectorError::Malformed(format!(
                        "{}.csv has more than {} columns",
                        table.name,
                        i16::MAX
                    ))
                })?;
                Ok(Column {
                    ordinal_position,
                    is_primary_key: name == PRIMARY_KEY_HEADER,
                    name,
                    data_type: "text".to_string(),
                    is_nullable: true,
                })
            })
            .collect()
    }

    async fn list_foreign_keys(&mut self, table: &TableRef) -> ConnectorResult<Vec<ForeignKey>> {
        Self::check_namespace(&table.schema)?;
        Ok(Vec::new())
    }

    async fn rename_table(&mut self, schema: &str, from: &str, to: &str) -> ConnectorResult<()> {
        Self::check_namespace(schema)?;
        let source = self.existing_table_path(from)?;
        let destination = self.table_path(to);
        if destination.exists() {
            return Err(ConnectorError::Conflict(destination.display().to_string()));
        }
        std::fs::rename(source, destination)?;
        Ok(())
    }

    async fn rename_column(
        &mut self,
        schema: &str,
        table: &str,
        from: &str,
        to: &str,
    ) -> ConnectorResult<()> {
        Self::check_namespace(schema)?;
        let mut headers = self.read_headers(table)?;
        if headers.iter().any(|header| header == to) {
            return Err(ConnectorError::Conflict(format!("column {table}.{to}")));
        }
        let position = headers
            .iter()
            .position(|header| header == from)
            .ok_or_else(|| ConnectorError::NotFound(format!("column {table}.{from}")))?;
        headers[position] = to.to_string();

        let path = self.existing_table_path(table)?;
        let tmp_path = temp_path(&path)?;
        {
            let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(&path)?;
            let file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&tmp_path)?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(&headers)?;
            for record in reader.records() {
                writer.write_record(&record?)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}
