//! Schema definition input: the caller-supplied description of tables and
//! columns, compiled into shared descriptors at database creation.

use crate::column::{Column, ColumnInner};
use crate::table::Table;
use std::collections::HashMap;
use std::sync::Arc;

/// A column specification: physical name plus value semantics.
///
/// Every column is selectable. Insert/update participation is opted out of
/// for generated or read-only columns.
#[derive(Clone, Debug)]
pub struct ColumnDef {
    physical: String,
    insertable: bool,
    updatable: bool,
}

impl ColumnDef {
    /// A column stored under `physical`, insertable and updatable.
    pub fn new(physical: impl Into<String>) -> Self {
        Self {
            physical: physical.into(),
            insertable: true,
            updatable: true,
        }
    }

    /// Exclude the column from INSERT value lists (e.g. serial keys).
    pub fn not_insertable(mut self) -> Self {
        self.insertable = false;
        self
    }

    /// Exclude the column from UPDATE SET clauses.
    pub fn not_updatable(mut self) -> Self {
        self.updatable = false;
        self
    }

    /// Select-only: neither insertable nor updatable.
    pub fn read_only(self) -> Self {
        self.not_insertable().not_updatable()
    }
}

/// A table definition: logical column name → column spec, in order.
#[derive(Clone, Debug, Default)]
pub struct TableDef {
    columns: Vec<(String, ColumnDef)>,
}

impl TableDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column under its logical name.
    pub fn column(mut self, logical: impl Into<String>, def: ColumnDef) -> Self {
        self.columns.push((logical.into(), def));
        self
    }
}

/// A schema: table name → table definition.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    tables: Vec<(String, TableDef)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table under its physical name.
    pub fn table(mut self, name: impl Into<String>, def: TableDef) -> Self {
        self.tables.push((name.into(), def));
        self
    }

    /// Compile the definition into shared descriptors.
    pub(crate) fn compile(self) -> HashMap<String, Arc<Table>> {
        self.tables
            .into_iter()
            .map(|(table_name, def)| {
                let columns = def
                    .columns
                    .into_iter()
                    .map(|(logical, column_def)| Column {
                        inner: Arc::new(ColumnInner {
                            logical,
                            physical: column_def.physical,
                            table: table_name.clone(),
                            insertable: column_def.insertable,
                            updatable: column_def.updatable,
                        }),
                    })
                    .collect();
                let table = Arc::new(Table::new(table_name.clone(), columns));
                (table_name, table)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_carries_semantics() {
        let tables = Schema::new()
            .table(
                "users",
                TableDef::new()
                    .column("id", ColumnDef::new("id").read_only())
                    .column("fullName", ColumnDef::new("full_name")),
            )
            .compile();

        let users = tables.get("users").unwrap();
        let id = users.column("id").unwrap();
        assert!(!id.is_insertable());
        assert!(!id.is_updatable());

        let name = users.column("fullName").unwrap();
        assert_eq!(name.physical_name(), "full_name");
        assert_eq!(name.table_name(), "users");
        assert!(name.is_insertable());
    }
}
