//! Boards and board templates

use super::{ColumnDef, ColumnType, TableDef};

/// `board_template`: reusable board code published by a package.
#[must_use]
pub fn board_template_table() -> TableDef {
    TableDef::new("board_template")
        .column(ColumnDef::new("id", ColumnType::Text).not_null())
        .column(ColumnDef::new("created_at", ColumnType::DateTime))
        .column(ColumnDef::new("updated_at", ColumnType::DateTime))
        .column(ColumnDef::new("package", ColumnType::Text).not_null())
        .column(ColumnDef::new("package_version", ColumnType::Text))
        .column(ColumnDef::new("name", ColumnType::Text).not_null())
        .column(ColumnDef::new("description", ColumnType::Text))
        .column(ColumnDef::new("code", ColumnType::Text))
        .primary_key(["id"])
        .unique("_board_template_uc", ["package", "package_version", "name"])
}

/// `board`: a user board, optionally created from a template.
#[must_use]
pub fn board_table() -> TableDef {
    TableDef::new("board")
        .column(ColumnDef::new("id", ColumnType::Text).not_null())
        .column(ColumnDef::new("created_at", ColumnType::DateTime))
        .column(ColumnDef::new("updated_at", ColumnType::DateTime))
        .column(ColumnDef::new("is_archived", ColumnType::Boolean))
        .column(ColumnDef::new("name", ColumnType::Text).not_null())
        .column(ColumnDef::new("description", ColumnType::Text))
        .column(ColumnDef::new("code", ColumnType::Text))
        .column(ColumnDef::new("template_id", ColumnType::Text))
        .primary_key(["id"])
        .foreign_key("template_id", "board_template", "id")
}

/// One schema revision: tables it creates, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Revision id
    pub revision: &'static str,
    /// Revision this one applies on top of
    pub down_revision: Option<&'static str>,
    /// Tables created by the upgrade
    pub tables: Vec<TableDef>,
}

impl Migration {
    /// `CREATE TABLE` statements, referenced tables first
    #[must_use]
    pub fn upgrade(&self) -> Vec<String> {
        self.tables.iter().map(TableDef::to_sql).collect()
    }

    /// `DROP TABLE` statements, reverse creation order
    #[must_use]
    pub fn downgrade(&self) -> Vec<String> {
        self.tables
            .iter()
            .rev()
            .map(|t| format!("DROP TABLE {}", t.name))
            .collect()
    }
}

/// Revision adding boards and board templates.
#[must_use]
pub fn board_migration() -> Migration {
    Migration {
        revision: "da08eab59790",
        down_revision: Some("517a45b2e62c"),
        tables: vec![board_template_table(), board_table()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_created_before_board() {
        let upgrade = board_migration().upgrade();
        assert_eq!(upgrade.len(), 2);
        assert!(upgrade[0].starts_with("CREATE TABLE board_template"));
        assert!(upgrade[1].starts_with("CREATE TABLE board ("));
    }

    #[test]
    fn test_downgrade_drops_board_first() {
        assert_eq!(
            board_migration().downgrade(),
            vec!["DROP TABLE board".to_string(), "DROP TABLE board_template".to_string()]
        );
    }

    #[test]
    fn test_revision_chain() {
        let migration = board_migration();
        assert_eq!(migration.revision, "da08eab59790");
        assert_eq!(migration.down_revision, Some("517a45b2e62c"));
    }

    #[test]
    fn test_board_references_template() {
        let board = board_table();
        assert_eq!(board.foreign_keys.len(), 1);
        assert_eq!(board.foreign_keys[0].foreign_table, "board_template");
        assert!(board.get_column("template_id").unwrap().nullable);
    }
}
