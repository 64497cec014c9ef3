//! Column descriptors and the expressions they produce.

use crate::expr::SqlExpr;
use crate::token::{Token, ToTokens};
use std::sync::Arc;
use tokio_postgres::types::ToSql;

#[derive(Debug)]
pub(crate) struct ColumnInner {
    pub(crate) logical: String,
    pub(crate) physical: String,
    pub(crate) table: String,
    pub(crate) insertable: bool,
    pub(crate) updatable: bool,
}

/// A column of a [`Table`](crate::Table): logical name, physical (storage)
/// name, and value semantics. Immutable after construction and shared
/// (`Arc`) across every builder touching the table.
///
/// A column is also a value expression: used as [`ToTokens`] it renders its
/// physical name, and its comparison/arithmetic methods produce [`SqlExpr`]
/// fragments for WHERE clauses, join conditions, and self-referencing
/// updates (`SET quantity = quantity + 1`).
#[derive(Clone, Debug)]
pub struct Column {
    pub(crate) inner: Arc<ColumnInner>,
}

impl Column {
    /// The logical name (the key result rows are addressed by).
    pub fn logical_name(&self) -> &str {
        &self.inner.logical
    }

    /// The physical (storage) name.
    pub fn physical_name(&self) -> &str {
        &self.inner.physical
    }

    /// The physical name of the owning table.
    pub fn table_name(&self) -> &str {
        &self.inner.table
    }

    /// Whether values may be supplied for this column in an INSERT.
    pub fn is_insertable(&self) -> bool {
        self.inner.insertable
    }

    /// Whether this column may be assigned in an UPDATE SET clause.
    pub fn is_updatable(&self) -> bool {
        self.inner.updatable
    }

    /// `table.column`, for disambiguation in multi-table statements.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.inner.table, self.inner.physical)
    }

    fn compare<T: ToSql + Send + Sync + 'static>(&self, op: &str, value: T) -> SqlExpr {
        SqlExpr::from_tokens(vec![
            Token::literal(self.physical_name()),
            Token::literal(op),
            Token::parameter(value),
        ])
    }

    /// `column = $n`
    pub fn eq<T: ToSql + Send + Sync + 'static>(&self, value: T) -> SqlExpr {
        self.compare("=", value)
    }

    /// `column != $n`
    pub fn ne<T: ToSql + Send + Sync + 'static>(&self, value: T) -> SqlExpr {
        self.compare("!=", value)
    }

    /// `column > $n`
    pub fn gt<T: ToSql + Send + Sync + 'static>(&self, value: T) -> SqlExpr {
        self.compare(">", value)
    }

    /// `column >= $n`
    pub fn gte<T: ToSql + Send + Sync + 'static>(&self, value: T) -> SqlExpr {
        self.compare(">=", value)
    }

    /// `column < $n`
    pub fn lt<T: ToSql + Send + Sync + 'static>(&self, value: T) -> SqlExpr {
        self.compare("<", value)
    }

    /// `column <= $n`
    pub fn lte<T: ToSql + Send + Sync + 'static>(&self, value: T) -> SqlExpr {
        self.compare("<=", value)
    }

    /// `column LIKE $n`
    pub fn like<T: ToSql + Send + Sync + 'static>(&self, pattern: T) -> SqlExpr {
        self.compare("LIKE", pattern)
    }

    /// `column ILIKE $n` (case-insensitive)
    pub fn ilike<T: ToSql + Send + Sync + 'static>(&self, pattern: T) -> SqlExpr {
        self.compare("ILIKE", pattern)
    }

    /// `column IS NULL`
    pub fn is_null(&self) -> SqlExpr {
        SqlExpr::from_tokens(vec![
            Token::literal(self.physical_name()),
            Token::literal("IS NULL"),
        ])
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(&self) -> SqlExpr {
        SqlExpr::from_tokens(vec![
            Token::literal(self.physical_name()),
            Token::literal("IS NOT NULL"),
        ])
    }

    /// `column IN ($n, $n+1, ...)`. An empty list renders a never-true
    /// predicate instead of invalid SQL.
    pub fn in_list<T: ToSql + Send + Sync + 'static>(&self, values: Vec<T>) -> SqlExpr {
        if values.is_empty() {
            return SqlExpr::raw("1=0");
        }
        let placeholders = values.into_iter().map(Token::parameter).collect();
        SqlExpr::from_tokens(vec![
            Token::literal(self.physical_name()),
            Token::literal("IN"),
            Token::parenthesized(vec![Token::separated(", ", placeholders)]),
        ])
    }

    /// `column IN <sub-select>`. The sub-select supplies its own parentheses
    /// (a [`Select`](crate::Select) used as tokens is parenthesized), and its
    /// parameters are renumbered as part of the enclosing statement's render.
    pub fn in_query(&self, query: &impl ToTokens) -> SqlExpr {
        SqlExpr::from_tokens(vec![
            Token::literal(self.physical_name()),
            Token::literal("IN"),
            Token::group(query.to_tokens()),
        ])
    }

    /// `table.column = other_table.other_column`, qualified on both sides.
    /// For join ON conditions.
    pub fn eq_col(&self, other: &Column) -> SqlExpr {
        SqlExpr::from_tokens(vec![
            Token::literal(self.qualified_name()),
            Token::literal("="),
            Token::literal(other.qualified_name()),
        ])
    }

    /// `column + $n`, for self-referencing updates.
    pub fn plus<T: ToSql + Send + Sync + 'static>(&self, value: T) -> SqlExpr {
        self.compare("+", value)
    }

    /// `column - $n`, for self-referencing updates.
    pub fn minus<T: ToSql + Send + Sync + 'static>(&self, value: T) -> SqlExpr {
        self.compare("-", value)
    }
}

impl ToTokens for Column {
    fn to_tokens(&self) -> Vec<Token> {
        vec![Token::literal(self.physical_name())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::render_statement;

    fn column(logical: &str, physical: &str) -> Column {
        Column {
            inner: Arc::new(ColumnInner {
                logical: logical.to_string(),
                physical: physical.to_string(),
                table: "users".to_string(),
                insertable: true,
                updatable: true,
            }),
        }
    }

    fn render(expr: &SqlExpr) -> (String, usize) {
        let rendered = render_statement(&expr.to_tokens());
        (rendered.sql, rendered.params.len())
    }

    #[test]
    fn test_eq_binds_one_parameter() {
        let name = column("name", "name");
        assert_eq!(render(&name.eq("Ann")), ("name = $1".to_string(), 1));
    }

    #[test]
    fn test_in_list() {
        let id = column("id", "id");
        assert_eq!(
            render(&id.in_list(vec![1i64, 2, 3])),
            ("id IN ($1, $2, $3)".to_string(), 3)
        );
    }

    #[test]
    fn test_empty_in_list_never_matches() {
        let id = column("id", "id");
        assert_eq!(render(&id.in_list::<i64>(vec![])), ("1=0".to_string(), 0));
    }

    #[test]
    fn test_eq_col_qualifies_both_sides() {
        let id = column("id", "id");
        let other = Column {
            inner: Arc::new(ColumnInner {
                logical: "userId".to_string(),
                physical: "user_id".to_string(),
                table: "orders".to_string(),
                insertable: true,
                updatable: true,
            }),
        };
        assert_eq!(
            render(&id.eq_col(&other)),
            ("users.id = orders.user_id".to_string(), 0)
        );
    }

    #[test]
    fn test_plus_keeps_bare_physical_name() {
        let quantity = column("quantity", "quantity");
        assert_eq!(render(&quantity.plus(1i32)), ("quantity + $1".to_string(), 1));
    }

    #[test]
    fn test_column_tokens_render_physical_name() {
        let name = column("fullName", "full_name");
        assert_eq!(render_statement(&name.to_tokens()).sql, "full_name");
    }
}
