use renamer_core::{Column, Constraint, DatabaseSchema, PrimaryKey, Schema, Table};

#[test]
fn serializes_schema_deterministically() {
    let schema = DatabaseSchema {
        schema_version: "0.1".to_string(),
        engine: "sqlite".to_string(),
        database: None,
        schemas: vec![Schema {
            name: "main".to_string(),
            tables: Vec::new(),
        }],
    };

    let json = serde_json::to_string_pretty(&schema).expect("serialize schema");
    let expected = r#"{
  "schema_version": "0.1",
  "engine": "sqlite",
  "database": null,
  "schemas": [
    {
      "name": "main",
      "tables": []
    }
  ]
}"#;
    assert_eq!(json, expected);
}

#[test]
fn constraints_are_tagged_by_kind() {
    let table = Table {
        name: "users".to_string(),
        columns: vec![Column {
            ordinal_position: 1,
            name: "id".to_string(),
            data_type: "integer".to_string(),
            is_nullable: false,
            is_primary_key: true,
        }],
        constraints: vec![Constraint::PrimaryKey(PrimaryKey {
            name: None,
            columns: vec!["id".to_string()],
        })],
    };

    let value = serde_json::to_value(&table).expect("serialize table");
    assert_eq!(value["constraints"][0]["kind"], "primary_key");

    let decoded: Table = serde_json::from_value(value).expect("decode table");
    assert_eq!(decoded, table);
    assert_eq!(decoded.single_primary_key(), Some("id"));
}

#[test]
fn missing_constraints_default_to_empty() {
    let json = r#"{
      "name": "events",
      "columns": [
        { "ordinal_position": 1, "name": "payload", "data_type": "text", "is_nullable": true }
      ]
    }"#;
    let table: Table = serde_json::from_str(json).expect("decode table");
    assert!(table.constraints.is_empty());
    assert!(!table.columns[0].is_primary_key);
}
