//! Relational schema of the tracking UI
//!
//! Tables are declared as [`TableDef`] values and rendered to DDL with
//! [`TableDef::to_sql`]. [`TableDef::from_sql`] parses DDL back with
//! sqlparser, so a deployed schema can be checked against the declared one:
//!
//! ```rust
//! use trueno_track::schema::{board_template_table, TableDef};
//!
//! let declared = board_template_table();
//! let parsed = TableDef::from_sql(&declared.to_sql())?;
//! assert_eq!(parsed, declared);
//! # Ok::<(), trueno_track::Error>(())
//! ```
//!
//! References:
//! - sqlparser-rs: <https://docs.rs/sqlparser>

mod board;

pub use board::{board_migration, board_table, board_template_table, Migration};

use std::fmt;

use sqlparser::ast::{ColumnOption, Statement, TableConstraint};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::{Error, Result};

/// Column storage types used by the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Unbounded text
    Text,
    /// Timestamp without zone
    DateTime,
    /// Boolean flag
    Boolean,
}

impl ColumnType {
    /// SQL spelling of the type
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::DateTime => "DATETIME",
            Self::Boolean => "BOOLEAN",
        }
    }

    fn from_sql(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "DATETIME" | "TIMESTAMP" => Ok(Self::DateTime),
            "BOOLEAN" | "BOOL" => Ok(Self::Boolean),
            other => Err(Error::ParseError(format!("Unsupported column type: {other}"))),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Storage type
    pub column_type: ColumnType,
    /// Whether NULL is allowed
    pub nullable: bool,
}

impl ColumnDef {
    /// Nullable column
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    /// Make the column NOT NULL
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Named UNIQUE constraint over several columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    /// Constraint name, if any
    pub name: Option<String>,
    /// Covered columns, in order
    pub columns: Vec<String>,
}

/// FOREIGN KEY constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing columns
    pub columns: Vec<String>,
    /// Referenced table
    pub foreign_table: String,
    /// Referenced columns
    pub referred_columns: Vec<String>,
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDef>,
    /// Primary key columns
    pub primary_key: Vec<String>,
    /// UNIQUE constraints
    pub unique: Vec<UniqueConstraint>,
    /// FOREIGN KEY constraints
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    /// Empty table named `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Append a column
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key
    #[must_use]
    pub fn primary_key<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a named UNIQUE constraint
    #[must_use]
    pub fn unique<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.unique.push(UniqueConstraint {
            name: Some(name.into()),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add a single-column FOREIGN KEY
    #[must_use]
    pub fn foreign_key(
        mut self,
        column: impl Into<String>,
        foreign_table: impl Into<String>,
        referred_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            columns: vec![column.into()],
            foreign_table: foreign_table.into(),
            referred_columns: vec![referred_column.into()],
        });
        self
    }

    /// Look up a column by name
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Render as a `CREATE TABLE` statement
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.nullable {
                    format!("{} {}", c.name, c.column_type)
                } else {
                    format!("{} {} NOT NULL", c.name, c.column_type)
                }
            })
            .collect();

        if !self.primary_key.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        for unique in &self.unique {
            let columns = unique.columns.join(", ");
            lines.push(match &unique.name {
                Some(name) => format!("CONSTRAINT {name} UNIQUE ({columns})"),
                None => format!("UNIQUE ({columns})"),
            });
        }
        for fk in &self.foreign_keys {
            lines.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                fk.columns.join(", "),
                fk.foreign_table,
                fk.referred_columns.join(", ")
            ));
        }

        format!("CREATE TABLE {} (\n    {}\n)", self.name, lines.join(",\n    "))
    }

    /// Parse a single `CREATE TABLE` statement
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseError` if the SQL is invalid, is not exactly one
    /// `CREATE TABLE`, or uses a column type outside [`ColumnType`].
    pub fn from_sql(sql: &str) -> Result<Self> {
        let statements = Parser::parse_sql(&GenericDialect {}, sql)
            .map_err(|e| Error::ParseError(format!("SQL parse error: {e}")))?;

        if statements.len() != 1 {
            return Err(Error::ParseError(
                "Only single statements supported".to_string(),
            ));
        }

        let Statement::CreateTable(create) = &statements[0] else {
            return Err(Error::ParseError(
                "Only CREATE TABLE statements supported".to_string(),
            ));
        };

        let mut table = Self::new(create.name.to_string());

        for column in &create.columns {
            let column_type = ColumnType::from_sql(&column.data_type.to_string())?;
            let mut def = ColumnDef::new(column.name.value.clone(), column_type);
            for option in &column.options {
                match &option.option {
                    ColumnOption::NotNull => def.nullable = false,
                    ColumnOption::Unique { is_primary: true, .. } => {
                        def.nullable = false;
                        table.primary_key = vec![def.name.clone()];
                    }
                    _ => {}
                }
            }
            table.columns.push(def);
        }

        for constraint in &create.constraints {
            match constraint {
                TableConstraint::PrimaryKey { columns, .. } => {
                    table.primary_key = columns.iter().map(|c| c.value.clone()).collect();
                }
                TableConstraint::Unique { name, columns, .. } => {
                    table.unique.push(UniqueConstraint {
                        name: name.as_ref().map(|n| n.value.clone()),
                        columns: columns.iter().map(|c| c.value.clone()).collect(),
                    });
                }
                TableConstraint::ForeignKey {
                    columns,
                    foreign_table,
                    referred_columns,
                    ..
                } => {
                    table.foreign_keys.push(ForeignKey {
                        columns: columns.iter().map(|c| c.value.clone()).collect(),
                        foreign_table: foreign_table.to_string(),
                        referred_columns: referred_columns.iter().map(|c| c.value.clone()).collect(),
                    });
                }
                other => {
                    return Err(Error::ParseError(format!("Unsupported constraint: {other}")));
                }
            }
        }

        Ok(table)
    }
}
