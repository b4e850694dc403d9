use std::collections::{BTreeMap, HashSet};

use renamer_core::{
    Column, Constraint, ConventionKind, DatabaseSchema, FkAction, ForeignKey, PrimaryKey,
    RenameConfig, Schema, Table,
};
use renamer_plan::{
    build_plan, generate_names, plan_renames, resolve, PlanConflict, PlanningError, RenameOp,
    RelationshipOrigin,
};

struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    fn new(name: &str) -> Self {
        Self {
            table: Table {
                name: name.to_string(),
                columns: Vec::new(),
                constraints: Vec::new(),
            },
        }
    }

    fn column(mut self, name: &str) -> Self {
        self.table.columns.push(Column {
            ordinal_position: self.table.columns.len() as i16 + 1,
            name: name.to_string(),
            data_type: "integer".to_string(),
            is_nullable: true,
            is_primary_key: false,
        });
        self
    }

    fn pk(mut self, name: &str) -> Self {
        self = self.column(name);
        if let Some(column) = self.table.columns.last_mut() {
            column.is_primary_key = true;
            column.is_nullable = false;
        }
        self.table
            .constraints
            .push(Constraint::PrimaryKey(PrimaryKey {
                name: Some(format!("{}_pkey", self.table.name)),
                columns: vec![name.to_string()],
            }));
        self
    }

    fn fk(mut self, columns: &[&str], table: &str, referenced: &[&str]) -> Self {
        self.table
            .constraints
            .push(Constraint::ForeignKey(ForeignKey {
                name: Some(format!("{}_{}_fkey", self.table.name, columns.join("_"))),
                columns: columns.iter().map(|c| c.to_string()).collect(),
                referenced_schema: "public".to_string(),
                referenced_table: table.to_string(),
                referenced_columns: referenced.iter().map(|c| c.to_string()).collect(),
                on_update: FkAction::NoAction,
                on_delete: FkAction::NoAction,
            }));
        self
    }

    fn build(self) -> Table {
        self.table
    }
}

fn schema(mut tables: Vec<Table>) -> DatabaseSchema {
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    DatabaseSchema {
        schema_version: renamer_core::SCHEMA_VERSION.to_string(),
        engine: "postgres".to_string(),
        database: Some("shop".to_string()),
        schemas: vec![Schema {
            name: "public".to_string(),
            tables,
        }],
    }
}

fn shop(declared: bool) -> DatabaseSchema {
    let mut orders = TableBuilder::new("orders").pk("id").column("user_id");
    if declared {
        orders = orders.fk(&["user_id"], "users", &["id"]);
    }
    schema(vec![
        TableBuilder::new("users").pk("id").column("name").build(),
        orders.build(),
    ])
}

fn names(mapping: &renamer_plan::RenameMapping) -> BTreeMap<String, String> {
    mapping
        .tables
        .iter()
        .map(|t| (t.original.clone(), t.generated.clone()))
        .chain(
            mapping
                .columns
                .iter()
                .map(|c| (format!("{}.{}", c.table, c.original), c.generated.clone())),
        )
        .collect()
}

#[test]
fn users_and_orders_with_declared_key() {
    let output = plan_renames(&shop(true), &RenameConfig::default()).unwrap();
    let names = names(&output.mapping);

    assert_eq!(names["users"], "table_a");
    assert_eq!(names["orders"], "table_b");
    assert_eq!(names["users.id"], "column1");
    assert_eq!(names["orders.user_id"], "column1");
    assert_eq!(names["users.name"], "column2");
    assert_eq!(names["orders.id"], "column3");

    assert_eq!(
        output.plan.log_lines(),
        vec![
            "table\tpublic.users\ttable_a",
            "table\tpublic.orders\ttable_b",
            "column\tpublic.users.id\tcolumn1",
            "column\tpublic.users.name\tcolumn2",
            "column\tpublic.orders.id\tcolumn3",
            "column\tpublic.orders.user_id\tcolumn1",
        ]
    );

    match &output.plan.ops[5] {
        RenameOp::Column { table, .. } => assert_eq!(table, "table_b"),
        other => panic!("unexpected op {other:?}"),
    }
}

#[test]
fn users_and_orders_by_convention() {
    let declared = plan_renames(&shop(true), &RenameConfig::default()).unwrap();
    let inferred = plan_renames(&shop(false), &RenameConfig::default()).unwrap();

    assert_eq!(names(&declared.mapping), names(&inferred.mapping));
    assert_eq!(inferred.graph.inferred_count(), 1);
    assert!(matches!(
        &inferred.graph.relationships()[0].origin,
        RelationshipOrigin::Inferred { matcher } if matcher == "singular_table_id"
    ));
}

#[test]
fn conventions_can_be_disabled() {
    let config = RenameConfig {
        conventions: Vec::new(),
        ..RenameConfig::default()
    };
    let output = plan_renames(&shop(false), &config).unwrap();
    let names = names(&output.mapping);

    assert!(output.graph.relationships().is_empty());
    assert_ne!(names["users.id"], names["orders.user_id"]);
}

#[test]
fn bare_id_column_stays_a_singleton() {
    let schema = schema(vec![
        TableBuilder::new("users").pk("id").build(),
        TableBuilder::new("orders").pk("id").build(),
        TableBuilder::new("events").column("id").column("payload").build(),
    ]);
    let config = RenameConfig::default();
    let graph = resolve(&schema, &config).unwrap();

    assert!(graph.relationships().is_empty());
    let mapping = generate_names(&schema, &graph, &config).unwrap();
    let generated: HashSet<&str> = mapping
        .columns
        .iter()
        .filter(|c| c.original == "id")
        .map(|c| c.generated.as_str())
        .collect();
    assert_eq!(generated.len(), 3);
}

#[test]
fn shared_primary_key_links_to_parent() {
    let schema = schema(vec![
        TableBuilder::new("users").pk("id").column("name").build(),
        TableBuilder::new("profiles").pk("user_id").column("bio").build(),
    ]);
    let config = RenameConfig::default();
    let output = plan_renames(&schema, &config).unwrap();

    assert_eq!(output.graph.relationships().len(), 1);
    assert_eq!(output.graph.inferred_count(), 1);
    let names = names(&output.mapping);
    assert_eq!(names["users"], "table_a");
    assert_eq!(names["profiles"], "table_b");
    assert_eq!(names["users.id"], "column1");
    assert_eq!(names["profiles.user_id"], names["users.id"]);
    assert_ne!(names["profiles.bio"], names["users.name"]);
}

#[test]
fn ambiguous_matches_are_recorded_without_edges() {
    let schema = schema(vec![
        TableBuilder::new("box").pk("id").build(),
        TableBuilder::new("boxes").pk("id").build(),
        TableBuilder::new("items").pk("id").column("box_id").build(),
    ]);
    let graph = resolve(&schema, &RenameConfig::default()).unwrap();

    assert!(graph.relationships().is_empty());
    assert_eq!(graph.ambiguities().len(), 2);
    assert_eq!(graph.ambiguities()[0].column, "public.items.box_id");
    assert_eq!(
        graph.ambiguities()[0].candidates,
        vec!["public.box.id".to_string(), "public.boxes.id".to_string()]
    );
}

#[test]
fn composite_keys_pair_positionally() {
    let schema = schema(vec![
        TableBuilder::new("regions")
            .column("country")
            .column("code")
            .build(),
        TableBuilder::new("stores")
            .pk("id")
            .column("region_country")
            .column("region_code")
            .fk(&["region_country", "region_code"], "regions", &["country", "code"])
            .build(),
    ]);
    let output = plan_renames(&schema, &RenameConfig::default()).unwrap();
    let names = names(&output.mapping);

    assert_eq!(names["regions.country"], names["stores.region_country"]);
    assert_eq!(names["regions.code"], names["stores.region_code"]);
    assert_ne!(names["regions.country"], names["regions.code"]);
    assert_eq!(names["regions"], "table_a");
}

#[test]
fn self_reference_gets_table_suffix() {
    let schema = schema(vec![
        TableBuilder::new("employees")
            .pk("id")
            .column("manager_id")
            .column("name")
            .fk(&["manager_id"], "employees", &["id"])
            .build(),
    ]);
    let output = plan_renames(&schema, &RenameConfig::default()).unwrap();
    let names = names(&output.mapping);

    assert_eq!(names["employees"], "table_a");
    assert_eq!(names["employees.id"], "column1");
    assert_eq!(names["employees.manager_id"], "column1_a");
    assert_eq!(names["employees.name"], "column2");

    let manager = output
        .mapping
        .columns
        .iter()
        .find(|c| c.original == "manager_id")
        .unwrap();
    assert_eq!(manager.base, "column1");
}

#[test]
fn generated_names_skip_existing_identifiers() {
    let schema = schema(vec![
        TableBuilder::new("Table_A").pk("id").column("COLUMN1").build(),
        TableBuilder::new("notes").pk("id").build(),
    ]);
    let output = plan_renames(&schema, &RenameConfig::default()).unwrap();
    let names = names(&output.mapping);

    assert_eq!(names["Table_A"], "table_b");
    assert_eq!(names["notes"], "table_c");
    assert_eq!(names["Table_A.id"], "column2");
    assert_eq!(names["Table_A.COLUMN1"], "column3");
}

#[test]
fn mapping_is_injective_and_groups_share_bases() {
    let mut tables = vec![TableBuilder::new("accounts").pk("id").column("label").build()];
    for index in 0..30 {
        tables.push(
            TableBuilder::new(&format!("t{index:02}"))
                .pk("id")
                .column("account_id")
                .column("note")
                .build(),
        );
    }
    let schema = schema(tables);
    let output = plan_renames(&schema, &RenameConfig::default()).unwrap();

    let tables: HashSet<&str> = output
        .mapping
        .tables
        .iter()
        .map(|t| t.generated.as_str())
        .collect();
    assert_eq!(tables.len(), 31);
    assert!(tables.contains("table_aa"));
    assert_eq!(output.mapping.tables[0].original, "accounts");

    let mut per_table: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for column in &output.mapping.columns {
        assert!(per_table
            .entry(column.table.as_str())
            .or_default()
            .insert(column.generated.as_str()));
    }

    let account_refs: HashSet<&str> = output
        .mapping
        .columns
        .iter()
        .filter(|c| c.original == "account_id" || (c.table == "accounts" && c.original == "id"))
        .map(|c| c.generated.as_str())
        .collect();
    assert_eq!(account_refs.len(), 1);
}

#[test]
fn planning_is_deterministic() {
    let config = RenameConfig::default();
    let first = plan_renames(&shop(false), &config).unwrap();
    let second = plan_renames(&shop(false), &config).unwrap();

    assert_eq!(first.plan, second.plan);
    assert_eq!(
        serde_json::to_vec(&first.plan).unwrap(),
        serde_json::to_vec(&second.plan).unwrap()
    );
}

#[test]
fn excluded_tables_keep_their_names() {
    let config = RenameConfig {
        exclude_tables: vec!["public.users".to_string()],
        ..RenameConfig::default()
    };
    let output = plan_renames(&shop(true), &config).unwrap();
    let names = names(&output.mapping);

    assert!(!names.contains_key("users"));
    assert!(!names.contains_key("users.id"));
    assert_eq!(names["orders"], "table_a");
    assert!(output
        .plan
        .iter()
        .all(|op| !op.source_name().starts_with("public.users")));
}

#[test]
fn long_identifiers_are_a_conflict() {
    let config = RenameConfig {
        prefix_table: "t".repeat(62),
        max_identifier_len: Some(63),
        ..RenameConfig::default()
    };
    let err = plan_renames(&shop(true), &config).unwrap_err();
    assert!(matches!(
        err,
        PlanningError::Conflict(PlanConflict::IdentifierTooLong { len: 64, max: 63, .. })
    ));
}

#[test]
fn tampered_mapping_is_rejected() {
    let schema = shop(true);
    let config = RenameConfig::default();
    let graph = resolve(&schema, &config).unwrap();
    let mut mapping = generate_names(&schema, &graph, &config).unwrap();

    mapping.tables[1].generated = mapping.tables[0].generated.clone();
    assert!(matches!(
        build_plan(&schema, &graph, &mapping),
        Err(PlanConflict::DuplicateTable { .. })
    ));
}

#[test]
fn invalid_pattern_is_a_config_error() {
    let config = RenameConfig {
        conventions: vec![ConventionKind::Pattern {
            regex: "(unclosed".to_string(),
        }],
        ..RenameConfig::default()
    };
    assert!(matches!(
        plan_renames(&shop(false), &config),
        Err(PlanningError::Config(_))
    ));
}

#[test]
fn pattern_convention_links_columns() {
    let schema = schema(vec![
        TableBuilder::new("users").pk("id").build(),
        TableBuilder::new("audit").column("ref_users").build(),
    ]);
    let config = RenameConfig {
        conventions: vec![ConventionKind::Pattern {
            regex: "^ref_(?P<table>[a-z]+)$".to_string(),
        }],
        ..RenameConfig::default()
    };
    let output = plan_renames(&schema, &config).unwrap();
    let names = names(&output.mapping);

    assert_eq!(names["users.id"], names["audit.ref_users"]);
    assert_eq!(names["users"], "table_a");
}
