use std::path::{Path, PathBuf};

use clap::ValueEnum;
use renamer_core::{ConventionKind, RenameConfig};

use crate::CliError;

/// Built-in conventions selectable with `--convention`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum ConventionArg {
    SingularTableId,
    TablePrimaryKey,
    /// Disable inference; only declared foreign keys link columns.
    None,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub prefix_table: Option<String>,
    pub prefix_column: Option<String>,
    pub exclude_tables: Vec<String>,
    pub conventions: Vec<ConventionArg>,
    pub fk_patterns: Vec<String>,
}

/// Read a TOML config file; missing keys take their defaults.
pub fn load_config(path: Option<&Path>) -> Result<RenameConfig, CliError> {
    let Some(path) = path else {
        return Ok(RenameConfig::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| CliError::ConfigParse {
        path: PathBuf::from(path),
        source,
    })
}

/// Apply flag values on top of `config` and validate the result.
pub fn apply_overrides(
    mut config: RenameConfig,
    overrides: Overrides,
) -> Result<RenameConfig, CliError> {
    if let Some(prefix) = overrides.prefix_table {
        config.prefix_table = prefix;
    }
    if let Some(prefix) = overrides.prefix_column {
        config.prefix_column = prefix;
    }
    config.exclude_tables.extend(overrides.exclude_tables);

    if !overrides.conventions.is_empty() {
        config.conventions = overrides
            .conventions
            .iter()
            .filter_map(|arg| match arg {
                ConventionArg::SingularTableId => Some(ConventionKind::SingularTableId),
                ConventionArg::TablePrimaryKey => Some(ConventionKind::TablePrimaryKey),
                ConventionArg::None => None,
            })
            .collect();
    }
    config.conventions.extend(
        overrides
            .fk_patterns
            .into_iter()
            .map(|regex| ConventionKind::Pattern { regex }),
    );

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renamer.toml");
        std::fs::write(
            &path,
            r#"
prefix_table = "t"
exclude_tables = ["public.schema_migrations"]
conventions = [
  { kind = "table_primary_key" },
  { kind = "pattern", regex = "^fk_(?P<table>\\w+)$" },
]
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.prefix_table, "t");
        assert_eq!(config.prefix_column, "column");
        assert_eq!(config.conventions.len(), 2);
        assert!(config.is_excluded("public", "schema_migrations"));
    }

    #[test]
    fn unknown_convention_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renamer.toml");
        std::fs::write(&path, "conventions = [{ kind = \"guess\" }]\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(CliError::ConfigParse { .. })
        ));
    }

    #[test]
    fn flags_override_file_values() {
        let config = RenameConfig {
            prefix_table: "file".to_string(),
            ..RenameConfig::default()
        };
        let overrides = Overrides {
            prefix_table: Some("tbl".to_string()),
            conventions: vec![ConventionArg::None],
            fk_patterns: vec!["^ref_(?P<table>\\w+)$".to_string()],
            ..Overrides::default()
        };

        let config = apply_overrides(config, overrides).unwrap();
        assert_eq!(config.prefix_table, "tbl");
        assert_eq!(
            config.conventions,
            vec![ConventionKind::Pattern {
                regex: "^ref_(?P<table>\\w+)$".to_string()
            }]
        );
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let overrides = Overrides {
            prefix_column: Some("9col".to_string()),
            ..Overrides::default()
        };
        assert!(matches!(
            apply_overrides(RenameConfig::default(), overrides),
            Err(CliError::Core(_))
        ));
    }
}
