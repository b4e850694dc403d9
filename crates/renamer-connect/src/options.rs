/// Options that control which tables the schema reader sees.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Include engine-internal namespaces/tables (`pg_catalog`, `sqlite_sequence`).
    pub include_system_schemas: bool,
    /// Restrict reading to these namespaces.
    pub schemas: Option<Vec<String>>,
}

impl ReadOptions {
    /// Whether a namespace passes the filter.
    pub fn allows_schema(&self, schema: &str, is_system: bool) -> bool {
        match &self.schemas {
            Some(list) => list.iter().any(|item| item == schema),
            None => self.include_system_schemas || !is_system,
        }
    }
}
