//! Table descriptors and facade binding.

use crate::column::Column;
use crate::error::{DbError, DbResult};
use std::sync::OnceLock;

/// A table: its physical name and its columns in definition order.
///
/// Constructed once from the schema definition at database creation and
/// shared read-only (`Arc`) by every builder. Binding to a facade is lazy and
/// idempotent: the first [`Database::table`](crate::Database::table) access
/// records the owning facade's id, and later accesses are no-ops. A table
/// bound to one facade refuses to serve another (the transaction-scoped
/// facade shares its parent's id, so it is not "another").
#[derive(Debug)]
pub struct Table {
    physical: String,
    columns: Vec<Column>,
    bound: OnceLock<u64>,
}

impl Table {
    pub(crate) fn new(physical: String, columns: Vec<Column>) -> Self {
        Self {
            physical,
            columns,
            bound: OnceLock::new(),
        }
    }

    /// The physical table name.
    pub fn name(&self) -> &str {
        &self.physical
    }

    /// Look up a column by logical name; unknown names are a build error.
    pub fn column(&self, logical: &str) -> DbResult<&Column> {
        self.get(logical).ok_or_else(|| {
            DbError::build(format!(
                "unknown column `{logical}` on table `{}`",
                self.physical
            ))
        })
    }

    /// Look up a column by logical name, `None` when unknown.
    pub(crate) fn get(&self, logical: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.logical_name() == logical)
    }

    /// All columns, in definition order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Record the owning facade. Repeated calls with the same id are no-ops.
    pub(crate) fn bind(&self, database_id: u64) -> DbResult<()> {
        let bound = self.bound.get_or_init(|| database_id);
        if *bound == database_id {
            Ok(())
        } else {
            Err(DbError::build(format!(
                "table `{}` is bound to a different database",
                self.physical
            )))
        }
    }

    #[cfg(test)]
    pub(crate) fn bound_to(&self) -> Option<u64> {
        self.bound.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, Schema, TableDef};

    fn users() -> std::sync::Arc<Table> {
        let tables = Schema::new()
            .table(
                "users",
                TableDef::new()
                    .column("id", ColumnDef::new("id").read_only())
                    .column("name", ColumnDef::new("name")),
            )
            .compile();
        tables.get("users").unwrap().clone()
    }

    #[test]
    fn test_column_lookup_preserves_order() {
        let table = users();
        let names: Vec<&str> = table.columns().iter().map(|c| c.logical_name()).collect();
        assert_eq!(names, ["id", "name"]);
    }

    #[test]
    fn test_unknown_column_is_build_error() {
        let table = users();
        assert!(table.column("missing").unwrap_err().is_build());
    }

    #[test]
    fn test_binding_is_idempotent() {
        let table = users();
        table.bind(7).unwrap();
        table.bind(7).unwrap();
        assert_eq!(table.bound_to(), Some(7));
    }

    #[test]
    fn test_binding_to_second_database_fails() {
        let table = users();
        table.bind(7).unwrap();
        assert!(table.bind(8).unwrap_err().is_build());
    }
}
