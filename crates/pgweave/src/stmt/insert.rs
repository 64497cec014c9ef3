//! INSERT builder.

use crate::column::Column;
use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::row::FromRow;
use crate::stmt::patch::{Patch, SetValue};
use crate::stmt::returning_clause;
use crate::table::Table;
use crate::token::{render_statement, Rendered, Token};
use std::sync::Arc;
use tokio_postgres::Row;

/// An `INSERT INTO <table>` statement.
///
/// Values arrive through [`Insert::values`] and are validated against the
/// table's insertable columns: an unknown logical name or a non-insertable
/// column is a build error, surfaced at the terminal call.
#[derive(Clone)]
pub struct Insert<'q, 'db> {
    db: &'q Database<'db>,
    table: Arc<Table>,
    columns: Vec<Token>,
    values: Vec<Token>,
    do_nothing_on_conflict: bool,
    returning: Option<Token>,
    build_error: Option<String>,
}

impl<'q, 'db> Insert<'q, 'db> {
    pub(crate) fn new(db: &'q Database<'db>, table: &Arc<Table>) -> Self {
        let build_error = table.bind(db.id()).err().map(|e| e.to_string());
        Self {
            db,
            table: table.clone(),
            columns: Vec::new(),
            values: Vec::new(),
            do_nothing_on_conflict: false,
            returning: None,
            build_error,
        }
    }

    /// Supply the row values.
    pub fn values(mut self, patch: Patch) -> Self {
        for (logical, value) in patch.entries {
            let Some(column) = self.table.get(&logical) else {
                self.build_error.get_or_insert_with(|| {
                    format!(
                        "unknown column `{logical}` on table `{}`",
                        self.table.name()
                    )
                });
                continue;
            };
            if !column.is_insertable() {
                self.build_error.get_or_insert_with(|| {
                    format!(
                        "column `{logical}` on table `{}` is not insertable",
                        self.table.name()
                    )
                });
                continue;
            }
            self.columns.push(Token::literal(column.physical_name()));
            self.values.push(match value {
                SetValue::Value(param) => Token::param(param),
                SetValue::Expr(tokens) => Token::group(tokens),
            });
        }
        self
    }

    /// Append `ON CONFLICT DO NOTHING`.
    pub fn on_conflict_do_nothing(mut self) -> Self {
        self.do_nothing_on_conflict = true;
        self
    }

    /// Append a RETURNING clause.
    pub fn returning(mut self, columns: &[&Column]) -> Self {
        self.returning = Some(returning_clause(columns));
        self
    }

    fn clause_tokens(&self) -> Vec<Token> {
        let mut tokens = vec![
            Token::literal("INSERT INTO"),
            Token::literal(self.table.name()),
        ];
        if self.columns.is_empty() {
            tokens.push(Token::literal("DEFAULT VALUES"));
        } else {
            tokens.push(Token::parenthesized(vec![Token::separated(
                ",",
                self.columns.clone(),
            )]));
            tokens.push(Token::literal("VALUES"));
            tokens.push(Token::parenthesized(vec![Token::separated(
                ",",
                self.values.clone(),
            )]));
        }
        if self.do_nothing_on_conflict {
            tokens.push(Token::literal("ON CONFLICT DO NOTHING"));
        }
        if let Some(returning) = &self.returning {
            tokens.push(returning.clone());
        }
        tokens
    }

    fn validate(&self) -> DbResult<()> {
        match &self.build_error {
            Some(error) => Err(DbError::build(error.clone())),
            None => Ok(()),
        }
    }

    /// Render to SQL text plus the ordered parameter list without executing.
    pub fn render(&self) -> Rendered {
        render_statement(&self.clause_tokens())
    }

    /// Get the built SQL string (for debugging).
    pub fn to_sql(&self) -> String {
        self.render().sql
    }

    /// Execute and return the number of inserted rows.
    pub async fn execute(&self) -> DbResult<u64> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .execute(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and return all RETURNING rows.
    pub async fn fetch_all(&self) -> DbResult<Vec<Row>> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .query(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and return exactly one RETURNING row.
    pub async fn fetch_one(&self) -> DbResult<Row> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .query_one(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and map all RETURNING rows to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self) -> DbResult<Vec<T>> {
        let rows = self.fetch_all().await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute and map exactly one RETURNING row to `T`.
    pub async fn fetch_one_as<T: FromRow>(&self) -> DbResult<T> {
        let row = self.fetch_one().await?;
        T::from_row(&row)
    }
}
