//! Board schema parity tests
//!
//! The declared tables must render to DDL that parses back to the same
//! definition, and must match the DDL of the deployed database.

use trueno_track::schema::{
    board_migration, board_table, board_template_table, ColumnType, TableDef,
};
use trueno_track::Error;

const DEPLOYED_BOARD_TEMPLATE: &str = "
    CREATE TABLE board_template (
        id TEXT NOT NULL,
        created_at DATETIME,
        updated_at DATETIME,
        package TEXT NOT NULL,
        package_version TEXT,
        name TEXT NOT NULL,
        description TEXT,
        code TEXT,
        PRIMARY KEY (id),
        CONSTRAINT _board_template_uc UNIQUE (package, package_version, name)
    )";

const DEPLOYED_BOARD: &str = "
    CREATE TABLE board (
        id TEXT NOT NULL,
        created_at DATETIME,
        updated_at DATETIME,
        is_archived BOOLEAN,
        name TEXT NOT NULL,
        description TEXT,
        code TEXT,
        template_id TEXT,
        FOREIGN KEY(template_id) REFERENCES board_template (id),
        PRIMARY KEY (id)
    )";

#[test]
fn test_board_template_matches_deployed_ddl() {
    assert_eq!(TableDef::from_sql(DEPLOYED_BOARD_TEMPLATE).unwrap(), board_template_table());
}

#[test]
fn test_board_matches_deployed_ddl() {
    assert_eq!(TableDef::from_sql(DEPLOYED_BOARD).unwrap(), board_table());
}

#[test]
fn test_upgrade_ddl_parses_back() {
    let migration = board_migration();
    for (sql, table) in migration.upgrade().iter().zip(&migration.tables) {
        assert_eq!(&TableDef::from_sql(sql).unwrap(), table);
    }
}

#[test]
fn test_board_template_columns() {
    let table = board_template_table();
    let required: Vec<&str> = table
        .columns
        .iter()
        .filter(|c| !c.nullable)
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(required, vec!["id", "package", "name"]);
    assert_eq!(table.primary_key, vec!["id".to_string()]);
    assert_eq!(table.unique.len(), 1);
    assert_eq!(table.unique[0].name.as_deref(), Some("_board_template_uc"));
    assert_eq!(table.unique[0].columns, vec!["package", "package_version", "name"]);
}

#[test]
fn test_board_columns() {
    let table = board_table();
    assert_eq!(table.columns.len(), 8);
    assert_eq!(table.get_column("is_archived").unwrap().column_type, ColumnType::Boolean);
    assert_eq!(table.get_column("created_at").unwrap().column_type, ColumnType::DateTime);
    assert!(!table.get_column("name").unwrap().nullable);
}

#[test]
fn test_drifted_schema_detected() {
    let drifted = DEPLOYED_BOARD.replace("is_archived BOOLEAN,", "");
    assert_ne!(TableDef::from_sql(&drifted).unwrap(), board_table());
}

#[test]
fn test_invalid_ddl_is_parse_error() {
    assert!(matches!(
        TableDef::from_sql("CREATE TABLE board (id TEXT"),
        Err(Error::ParseError(_))
    ));
}
